//! Integration tests for prefixfs

mod cli_commands;
mod local_store;
mod session_flow;
mod support;
mod tree_properties;
