//! CalcX Common Types
//!
//! Shared types used across the CalcX crates: the supported currency set,
//! decimal rounding rules and timestamp helpers.

pub mod monetary;
pub mod error;
pub mod time;

pub use monetary::*;
pub use error::*;
pub use time::*;
