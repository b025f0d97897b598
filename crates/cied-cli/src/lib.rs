//! Library side of the `cied` binary: configuration, logging and the stage
//! commands.

pub mod commands;
pub mod config;
pub mod logging;
