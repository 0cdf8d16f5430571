use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "info,datacenter_emissions=debug";

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        DEFAULT_FILTER
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();
}
