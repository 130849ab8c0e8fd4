//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, IDs)
//! - `conversation` - Message history, turn counting, truncation, summarization triggers
//! - `extraction` - Extraction schema and extraction results

pub mod conversation;
pub mod extraction;
pub mod foundation;
