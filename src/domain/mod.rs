//! Core domain types and logic.

pub mod condition;
pub mod condition_eval;
pub mod condition_parser;
pub mod error;
pub mod history;
pub mod indicator_config;
pub mod realtime;
pub mod schema;
pub mod table;
