//! Discnav - Optical disc navigation engine
//!
//! This library crate exposes configuration loading and the replay driver
//! used by the `discnav` binary and its integration tests.

pub mod config;
pub mod replay;
