// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeshader` editor layer.
//!
//! Everything between a user gesture and an emitted shader:
//! - Editor commands over the active graph
//! - Snapshot-based undo/redo history
//! - Editing session with preview and commit compiles
//! - RON editor configuration
//! - Debounced watching of graph documents
//! - The `nodeshader` command line
//!
//! ## Architecture
//!
//! An [`EditorSession`] owns the live [`nodeshader_graph::Graph`]. Commands
//! mutate it and report whether the change was structural; structural
//! changes are committed to the [`UndoStack`] and regenerate the shader,
//! value edits only refresh its parameter table.

pub mod cli;
pub mod commands;
pub mod config;
pub mod file_watcher;
pub mod history;
pub mod session;

pub use commands::{CommandError, CommandOutcome, EditorCommand};
pub use config::{ConfigError, EditorConfig};
pub use file_watcher::{GraphEvent, GraphWatcher, WatchError};
pub use history::{UndoStack, DEFAULT_HISTORY_CAPACITY};
pub use session::{CompileMode, EditorSession, SessionError, ShaderArtifact};
