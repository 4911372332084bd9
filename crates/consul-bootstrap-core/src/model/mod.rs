//! Data model
//!
//! Types shared by the parameter builder and the document generators.
//! Each concern lives in its own module.

mod autopilot;
mod facts;
mod params;
mod role;

// Re-exports
pub use autopilot::*;
pub use facts::*;
pub use params::*;
pub use role::*;
