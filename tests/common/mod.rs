//! Common test utilities module
//!
//! Provides shared utilities for tests including:
//! - Temporary file management
//! - Sample survey tables

#![allow(dead_code)]

pub mod test_utils;

pub use test_utils::{create_test_csv, sex_weight_table, species_table, surveys_table, TempTestFile};
