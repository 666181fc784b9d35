// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session: the active graph, its history and its compiled shader.
//!
//! Structural edits are committed right away: the pre-edit state goes on
//! the undo stack and the shader is regenerated. Value edits only refresh
//! the parameter table of the last compiled shader; the caller commits them
//! with [`CompileMode::Commit`] once the interaction ends (for example when a
//! slider is released), which records a single undo entry for the whole drag.

use crate::commands::{CommandError, CommandOutcome, EditorCommand};
use crate::config::EditorConfig;
use crate::history::UndoStack;
use nodeshader_graph::{BackendError, BackendKind, CodeGenerateData, CodegenError, Graph, NodeType};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Maximum number of recent documents to track
const MAX_RECENT_DOCUMENTS: usize = 10;

/// How much work a compile request does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Refresh parameter values of the last shader; falls back to a full build
    /// when nothing was compiled yet or the parameter layout changed
    Preview,
    /// Record the current graph in the history and regenerate the shader
    Commit,
}

/// Output of the last successful compile
#[derive(Debug, Clone)]
pub struct ShaderArtifact {
    /// Backend the source was emitted with
    pub backend: BackendKind,
    /// Backend-neutral shader description, with live parameter values
    pub data: CodeGenerateData,
    /// Emitted source
    pub source: Vec<u8>,
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The bytes are not a graph document; nothing was changed
    #[error("Invalid graph file: {0}")]
    InvalidGraphFile(String),

    /// Command rejected
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Code generation failed
    #[error("Code generation failed: {0}")]
    Codegen(#[from] CodegenError),

    /// Backend emission failed
    #[error("Shader emission failed: {0}")]
    Backend(#[from] BackendError),

    /// Document could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// File access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Save requested for a document that was never saved
    #[error("No document path set")]
    NoDocumentPath,
}

/// The active document and everything derived from it
#[derive(Debug)]
pub struct EditorSession {
    /// Live graph
    graph: Graph,
    /// Undo/redo history
    history: UndoStack,
    /// Selected backend
    backend: BackendKind,
    /// Last compiled shader
    artifact: Option<ShaderArtifact>,
    /// Current document file path
    document_path: Option<PathBuf>,
    /// Whether the document has unsaved changes
    dirty: bool,
    /// Recently opened or saved documents, newest first
    recent_documents: VecDeque<PathBuf>,
}

impl EditorSession {
    /// Create a session with a fresh document
    pub fn new(config: &EditorConfig) -> Self {
        let mut session = Self {
            graph: Graph::new(),
            history: UndoStack::new(config.history_capacity),
            backend: config.default_backend,
            artifact: None,
            document_path: None,
            dirty: false,
            recent_documents: VecDeque::new(),
        };
        session.new_document();
        session
    }

    /// Replace the document with an empty graph holding a single output node
    pub fn new_document(&mut self) {
        let mut graph = Graph::new();
        graph.add(NodeType::Output, [0, 0]);
        self.replace_document(graph);
        self.document_path = None;
        tracing::info!("Created new document");
    }

    /// Apply a command to the live graph and recompile as needed.
    ///
    /// A compile failure after a successful command is logged, not returned:
    /// the edit stands and the last good shader stays in place.
    pub fn execute(&mut self, command: &dyn EditorCommand) -> Result<CommandOutcome, SessionError> {
        let outcome = command.execute(&mut self.graph)?;
        tracing::debug!(
            "Executed '{}' (changed: {}, structural: {})",
            command.description(),
            outcome.changed,
            outcome.structural
        );

        if outcome.changed {
            self.dirty = true;
            let mode = if outcome.structural {
                CompileMode::Commit
            } else {
                CompileMode::Preview
            };
            if let Err(err) = self.compile(mode) {
                tracing::warn!("Compile after '{}' failed: {}", command.description(), err);
            }
        }
        Ok(outcome)
    }

    /// Compile the live graph
    pub fn compile(&mut self, mode: CompileMode) -> Result<&ShaderArtifact, SessionError> {
        match mode {
            CompileMode::Preview => self.refresh_parameters(),
            CompileMode::Commit => {
                if self.history.push_undo(self.graph.clone()) {
                    tracing::debug!("Committed edit ({} undo entries)", self.history.undo_depth());
                }
                self.rebuild()
            }
        }
    }

    /// Step back one history entry; returns whether anything changed.
    ///
    /// Pending preview edits are committed first, so they are what gets undone.
    pub fn undo(&mut self) -> bool {
        self.commit_pending();
        if !self.history.undo_available() {
            return false;
        }
        let live = std::mem::take(&mut self.graph);
        self.graph = self.history.pop_undo(live);
        self.dirty = true;
        tracing::debug!("Undo ({} left)", self.history.undo_depth());
        self.rebuild_or_warn();
        true
    }

    /// Step forward one history entry; returns whether anything changed.
    ///
    /// A pending preview edit counts as a new edit and discards the redo entries.
    pub fn redo(&mut self) -> bool {
        self.commit_pending();
        if !self.history.redo_available() {
            return false;
        }
        let live = std::mem::take(&mut self.graph);
        self.graph = self.history.pop_redo(live);
        self.dirty = true;
        tracing::debug!("Redo ({} left)", self.history.redo_depth());
        self.rebuild_or_warn();
        true
    }

    /// Replace the document with one parsed from `bytes`.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let graph = parse_document(bytes).inspect_err(|err| {
            tracing::warn!("Rejected graph file: {}", err);
        })?;
        self.replace_document(graph);
        Ok(())
    }

    /// Serialized document bytes
    pub fn save(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.graph.serialize()?.into_bytes())
    }

    /// Load a document from disk
    pub fn open(&mut self, path: &Path) -> Result<(), SessionError> {
        let bytes = std::fs::read(path)?;
        self.load(&bytes)?;
        self.document_path = Some(path.to_path_buf());
        self.add_to_recent(path.to_path_buf());
        tracing::info!("Opened document {:?}", path);
        Ok(())
    }

    /// Save the document to a specific path
    pub fn save_to(&mut self, path: &Path) -> Result<(), SessionError> {
        std::fs::write(path, self.save()?)?;
        self.document_path = Some(path.to_path_buf());
        self.dirty = false;
        self.add_to_recent(path.to_path_buf());
        tracing::info!("Saved document to {:?}", path);
        Ok(())
    }

    /// Save the document to its current path
    pub fn save_document(&mut self) -> Result<(), SessionError> {
        let path = self.document_path.clone().ok_or(SessionError::NoDocumentPath)?;
        self.save_to(&path)
    }

    /// Switch backends and re-emit the last shader
    pub fn set_backend(&mut self, backend: BackendKind) {
        if self.backend == backend {
            return;
        }
        self.backend = backend;
        tracing::info!("Switched backend to {}", backend);
        if self.artifact.is_some() {
            self.rebuild_or_warn();
        }
    }

    /// Live graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Undo/redo history
    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Selected backend
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Last compiled shader
    pub fn artifact(&self) -> Option<&ShaderArtifact> {
        self.artifact.as_ref()
    }

    /// Current document path
    pub fn document_path(&self) -> Option<&Path> {
        self.document_path.as_deref()
    }

    /// Check if the document has unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Recently opened or saved documents, newest first
    pub fn recent_documents(&self) -> impl Iterator<Item = &Path> {
        self.recent_documents.iter().map(PathBuf::as_path)
    }

    /// Get the document name (file stem, or "Untitled")
    pub fn document_name(&self) -> String {
        self.document_path
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    }

    fn replace_document(&mut self, graph: Graph) {
        self.history.clear(graph.clone());
        self.graph = graph;
        self.artifact = None;
        self.dirty = false;
        self.rebuild_or_warn();
    }

    fn commit_pending(&mut self) {
        if self.history.push_undo(self.graph.clone()) {
            tracing::debug!("Committed pending edit before history step");
        }
    }

    fn refresh_parameters(&mut self) -> Result<&ShaderArtifact, SessionError> {
        let parameters = self.graph.generate_parameters()?;
        let Some(mut artifact) = self.artifact.take() else {
            return self.rebuild();
        };
        if artifact.backend != self.backend || !artifact.data.refresh_parameters(parameters) {
            self.artifact = Some(artifact);
            return self.rebuild();
        }
        tracing::debug!("Refreshed {} parameter(s)", artifact.data.parameters.len());
        Ok(&*self.artifact.insert(artifact))
    }

    fn rebuild(&mut self) -> Result<&ShaderArtifact, SessionError> {
        let data = self.graph.generate_code()?;
        let source = self.backend.create().emit(&data)?;
        tracing::debug!(
            "Compiled {} shader: {} statement(s), {} bytes",
            self.backend,
            data.statements.len(),
            source.len()
        );
        Ok(&*self.artifact.insert(ShaderArtifact {
            backend: self.backend,
            data,
            source,
        }))
    }

    fn rebuild_or_warn(&mut self) {
        if let Err(err) = self.rebuild() {
            tracing::warn!("Compile failed: {}", err);
        }
    }

    fn add_to_recent(&mut self, path: PathBuf) {
        self.recent_documents.retain(|p| p != &path);
        self.recent_documents.push_front(path);
        self.recent_documents.truncate(MAX_RECENT_DOCUMENTS);
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

/// Parse document bytes without touching any session state
pub fn parse_document(bytes: &[u8]) -> Result<Graph, SessionError> {
    let text =
        std::str::from_utf8(bytes).map_err(|err| SessionError::InvalidGraphFile(err.to_string()))?;
    Graph::parse(text).map_err(|err| SessionError::InvalidGraphFile(err.to_string()))
}
