use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default directives when `RUST_LOG` is unset in development
const DEVELOPMENT_FILTER: &str = "info,events_api=debug,domain_events=debug,database=debug";

/// Default directives when `RUST_LOG` is unset in production
const PRODUCTION_FILTER: &str = "warn,events_api=info,domain_events=info,tower_http=info";

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Directives used when `RUST_LOG` is unset
fn default_filter(environment: &Environment) -> EnvFilter {
    if environment.is_production() {
        EnvFilter::new(PRODUCTION_FILTER)
    } else {
        EnvFilter::new(DEVELOPMENT_FILTER)
    }
}

/// Initialize tracing for the given environment, with span capture for eyre.
///
/// Production writes flattened JSON lines for log aggregation; development
/// writes pretty output with module targets. `RUST_LOG` overrides the
/// default directives.
///
/// Later calls are no-ops, which keeps tests that share a process quiet.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(environment));

    let fmt_layer = if environment.is_production() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .pretty()
            .boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!(?environment, "Tracing initialized");
    } else {
        debug!("Tracing already initialized, skipping");
    }
}
