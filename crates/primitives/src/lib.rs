//! Collection of data types shared by the deposit status resolver, the orchestrator and the
//! client binary.

pub mod account;
pub mod bridge;
pub mod errors;
pub mod finality;
pub mod mint;
pub mod snapshot;
pub mod status;

pub mod prelude;
