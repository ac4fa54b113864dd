//! Interactive command-line front end for skychat.

pub mod config;
pub mod repl;
