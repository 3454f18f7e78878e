//! Step a recorded macro forward and backward against an editor buffer,
//! using the editor's undo history to rewind.

pub mod config;
pub mod debugger;
pub mod error;
pub mod host;
pub mod logging;
pub mod rpc;

pub use error::{MacroBugError, Result};
