//! Shared test utilities for the dota2-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`steam`]: [`TestSteam`] builder for fake Steam `userdata` trees

pub mod steam;

pub use steam::{DOTA2_APP_ID, TestSteam, file_map};
