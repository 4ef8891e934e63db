//! Billboard Digital Signage Base Crate
//!
//! This crate contains shared type definitions and helper functions used by
//! the billboard server and its command-line client: the HTTP API types,
//! folder path rules, and the carousel that drives a display. It does not
//! contain any actual service implementation.

pub mod api;
pub mod carousel;
pub mod paths;
pub mod util;
