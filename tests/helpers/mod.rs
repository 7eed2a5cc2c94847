//! Test helpers module
//!
//! Database setup against a throwaway Postgres plus builders for the
//! catalog and registration fixtures the integration tests share.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::*;
pub use test_data::*;
