//! Conversation Context - bounded chat history and structured extraction.
//!
//! This crate keeps a chronologically ordered record of a user/assistant
//! conversation, condenses it with model-generated summaries when it grows,
//! and extracts schema-validated contact details from free-form chat text
//! through a language model's function-calling capability.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
