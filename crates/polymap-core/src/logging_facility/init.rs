//! Logging initialization module

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Bare registry; tests install their own capture layer
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default filter.
///
/// - **Development**: human-readable logs at debug level
/// - **Production**: JSON logs at info level
/// - **Test**: no output
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("polymap=debug")),
                )
                .with_writer(std::io::stderr)
                .finish()
                .try_init()
                .ok();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("polymap=info")),
                )
                .with_writer(std::io::stderr)
                .finish()
                .try_init()
                .ok();
        }
        Profile::Test => {
            tracing_subscriber::registry().try_init().ok();
        }
    });
}
