// mc-control - A tabular on-policy Monte Carlo control engine
// Learns action-value estimates for discrete MDPs purely from sampled episodes

pub mod config;
pub mod env;
pub mod episode;
pub mod error;
pub mod policy;
pub mod returns;
pub mod session;
pub mod stats;
pub mod table;

// Re-export the main components for easier access
pub use config::Hyperparameters;
pub use env::{Environment, Step};
pub use episode::{EpisodeLimits, TimeStep, Trajectory};
pub use error::{McError, McResult};
pub use policy::GreedyPolicy;
pub use session::{Progress, TrainingSession};
pub use stats::TrainingStats;
pub use table::ActionValueTable;

use anyhow::Result;
use tracing::info;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Initialize tracing with default settings
///
/// Opt-in: the library never installs a global subscriber on its own. Hosts
/// embedding the engine in their own process should configure their own
/// subscriber instead and skip this.
pub fn init() -> Result<()> {
    init_with_logger(true)
}

/// Initialize tracing with custom logger configuration
///
/// `ansi_colors` should be false when log output is consumed by another
/// process rather than a terminal.
pub fn init_with_logger(ansi_colors: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    if !ansi_colors {
        fmt::Subscriber::builder()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .init();
    } else {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(true)
            .init();
    }

    info!("Initializing mc-control v{}", version());
    Ok(())
}
