#![allow(dead_code)] // Test utilities may not all be used in every test

pub mod setup;

// Re-export main utilities for use by test files
pub use setup::{day, goal, kickoff, line, LedgerSetup};
