//! Domain layer: catalog rows, the hierarchy projection and filter evaluation.

pub mod entities;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod types;
