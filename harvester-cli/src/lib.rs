//! Harvester CLI library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `harvester` is used as a binary (main.rs).

pub mod follow;
pub mod settings;
