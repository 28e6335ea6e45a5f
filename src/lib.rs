//! Stepform - multi-step form definition engine
//!
//! Holds the form being built, derives validators from its field definitions,
//! keeps it in a durable key-value store shared between execution contexts and
//! loads forms from templates.

pub mod config;
pub mod error;
pub mod schema;
pub mod state;
pub mod storage;
pub mod sync;
pub mod templates;
