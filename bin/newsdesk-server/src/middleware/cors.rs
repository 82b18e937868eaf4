use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// CORS from a comma-separated origin allow-list.
///
/// `None`, or a list with no parseable origin, allows any origin. Set
/// `NEWSDESK_CORS_ORIGINS` in production.
pub fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
