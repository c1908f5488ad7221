//! Tracing setup for programs embedding droidtriage.
//!
//! [`init_tracing`] installs a global subscriber scoped to the droidtriage
//! crates: their events are shown at the requested level while every other
//! target stays at `warn`. `DROIDTRIAGE_LOG`, then `RUST_LOG`, override the
//! default directives. Only the first call in a process takes effect.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "DROIDTRIAGE_LOG";

const TARGETS: &[&str] = &["droidtriage_core", "droidtriage_remedy"];

/// Filter directives used when neither environment variable is set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: newline-delimited JSON with event fields flattened, so the
///   `event` key of each classification event sits at the top level.
/// * `level`: verbosity for the droidtriage targets.
pub fn init_tracing(json: bool, level: Level) {
    let json_layer = json.then(|| fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| fmt::layer().with_target(true));
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_droidtriage_targets() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,droidtriage_core=debug,droidtriage_remedy=debug"
        );
        assert!(EnvFilter::try_new(default_directives(Level::TRACE)).is_ok());
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::DEBUG);
        init_tracing(true, Level::INFO);
        tracing::debug!(event = "telemetry.ready");
    }
}
