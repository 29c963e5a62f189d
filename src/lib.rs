// m365ctl: Microsoft 365 command-line client
// Exposes the command implementations and their building blocks as a library

pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod csom;
pub mod drive;
pub mod error;
pub mod fs;
pub mod http;
pub mod output;
pub mod paginate;
pub mod prompt;
pub mod resolve;
pub mod validation;
