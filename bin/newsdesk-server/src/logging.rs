//! Tracing subscriber setup.
//!
//! Console output is always on (pretty or JSON). When a log directory is
//! configured a second, JSON-formatted daily-rolling file sink is added.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::Config;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// The returned guard flushes the file sink on drop and must be held for the
/// life of the process.
pub fn init(cfg: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = fmt::layer().with_target(true).with_thread_ids(true);
    layers.push(if cfg.log_json {
        console.json().with_filter(env_filter(cfg)).boxed()
    } else {
        console.with_filter(env_filter(cfg)).boxed()
    });

    let guard = match &cfg.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "newsdesk-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .json()
                    .with_filter(env_filter(cfg))
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(guard)
}

/// `RUST_LOG` wins, then the configured level, then `info`.
fn env_filter(cfg: &Config) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: NEWSDESK_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                EnvFilter::new("info")
            }
        },
    }
}
