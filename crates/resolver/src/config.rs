use std::time::Duration;

/// Default countdown tick.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime settings of a deposit status resolver.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// How often the countdown advances between feed updates. One tick always accounts for one
    /// second of countdown.
    pub tick_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
