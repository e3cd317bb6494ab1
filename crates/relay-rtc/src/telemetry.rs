use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default directive used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "relay_rtc=info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` if a global
/// subscriber was already installed (embedding applications usually bring
/// their own).
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
