pub mod clustering;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod instance;
pub mod notify;
pub mod registry;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use instance::*;
pub use notify::*;
pub use registry::*;

#[cfg(test)]
pub(crate) mod fake;
