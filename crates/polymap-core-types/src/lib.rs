//! Core types shared across polymap facilities
//!
//! This crate provides foundational types used by both error handling
//! and logging facilities:
//!
//! - **Correlation types**: UnitOfWorkId for tagging one persist transaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::UnitOfWorkId;
