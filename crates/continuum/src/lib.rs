//! Continuum - surprise-weighted memory store
//!
//! This crate provides a record store that ranks payloads by embedding
//! similarity and surprise, and consolidates itself into cluster summaries
//! once it grows past a configured capacity.

pub mod config;
pub mod error;
pub mod memory;
pub mod storage;
pub mod testing;

pub use error::ContinuumError;
pub use storage::{MemoryStore, SharedMemoryStore};
