//! Report generation module.
//!
//! This module handles generating the plain-text analysis report.

pub mod generator;

pub use generator::*;
