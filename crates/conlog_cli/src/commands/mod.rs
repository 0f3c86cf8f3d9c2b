//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod rotate;
pub mod run;
