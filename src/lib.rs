//! Filtered, cached batch snapshots of an academic catalog.
//!
//! Schemes contain subjects, subjects contain resources. A caller asks for
//! one [`Envelope`](eesa_api_types::Envelope) matching a set of optional
//! filters and gets reference lists, the matching subjects and the matching
//! approved resources in a single consistent payload.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
