//! Deposit status resolution.
//!
//! Fuses the source chain finality feed, the bridge job feed and the bridge timings feed into a
//! stream of [`DepositSnapshot`](minter_primitives::snapshot::DepositSnapshot)s for one deposit.
//! The derivation itself is pure (see [`derive`]), [`tracker::DepositTracker`] keeps the latest
//! value of every feed and [`resolver::DepositStatusResolver`] drives it from the feed channels
//! and a local ticker.

pub mod config;
pub mod derive;
pub mod errors;
pub mod resolver;
pub mod timing;
pub mod tracker;

pub use config::ResolverConfig;
pub use errors::ResolverError;
pub use resolver::{DepositStatusResolver, SnapshotSubscription};
pub use timing::TimingModel;
pub use tracker::{DepositTracker, FeedUpdate};
