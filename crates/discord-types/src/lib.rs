//! Shared Discord types for the command bot

pub mod errors;
pub mod events;
pub mod types;

pub use errors::ClientErrorCode;
pub use events::*;
pub use types::*;
