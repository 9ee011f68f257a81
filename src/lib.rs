//! livepad: live in-browser preview for AI-edited front-end projects.
//!
//! A project lives in a virtual file map. Assistant responses are parsed
//! into file operations and terminal commands, applied to the map, bundled
//! into a single script and rendered into a sandboxed preview document.

pub mod api;
pub mod bundler;
pub mod cli;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod exec;
pub mod orchestrator;
pub mod ports;
pub mod protocol;
pub mod sandbox;
pub mod vfs;
pub mod workspace;
