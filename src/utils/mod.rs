//! ## utils
//!
//! Utilities shared by the transports

pub mod path;
pub mod pattern;
