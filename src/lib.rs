//! Cross-reference lookups (definitions, references, symbol and file
//! listings, completion) against a GNU Global tag database.
//!
//! [`engine::TagEngine`] is the entry point: build one per workspace and
//! share it by reference with every consumer.

pub mod color;
pub mod completion;
pub mod config;
pub mod engine;
pub mod errors;
pub mod include;
pub mod locator;
pub mod output;
pub mod parser;
pub mod runner;
pub mod types;
