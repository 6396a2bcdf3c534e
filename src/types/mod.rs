//! Type definitions

pub mod coordinates;
pub mod messages;

pub use coordinates::*;
pub use messages::*;
