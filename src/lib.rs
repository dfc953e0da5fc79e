// Library root: re-exports all modules so integration tests and embedding
// services can access the crate's public API.

pub mod catalog;
pub mod config;
pub mod draft;
pub mod engine;
pub mod events;
pub mod llm;
pub mod roster;
pub mod store;
pub mod ws_server;
