//! Domain models for Cursus.
//!
//! These are the core types shared across all crates.

pub mod course;
pub mod principal;
pub mod resource;
