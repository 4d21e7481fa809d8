//! Session log parser for clawstat
//!
//! Reads the agent runtime's append-only session logs (one JSONL file per
//! session), extracts usage records and session metadata, and keeps one
//! parse result per file for as long as the file's identity is unchanged.

mod schema;

pub mod parser;

pub use parser::{
    DELETED_MARKER, DEFAULT_SYSTEM_MARKERS, MessageMark, MessageRole, ParseOutcome, ParsedSession,
    SessionParser, SkipReason,
};
