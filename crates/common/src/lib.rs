//! Shared plumbing for the implicit-grant workspace: config errors, the
//! redacting `Secret` wrapper for token material, and tracing setup.

mod error;
mod secret;
pub mod telemetry;

pub use error::{Error, Result};
pub use secret::Secret;
