//! Application services: store read interface, envelope assembly and the batch façade.

pub mod assembler;
pub mod error;
pub mod repos;
pub mod snapshot;
