//! App Store Connect tool server.
//!
//! Incoming tool calls are decoded into typed requests ([`tools`]), executed against the App
//! Store Connect REST API ([`asc`]) or external command-line tools ([`process`]), and rendered
//! as plain text ([`format`]). [`server`] exposes the catalog over MCP.

pub mod archives;
pub mod asc;
pub mod config;
pub mod error;
pub mod format;
pub mod process;
pub mod server;
pub mod tools;
