//! Business logic services

pub mod generation;
pub mod import;
