//! Reusable bits shared by the minter services, such as initializing the tracing framework.

pub mod logging;
