// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line front end for the `nodeshader` binary.

use crate::config::EditorConfig;
use crate::file_watcher::{GraphEvent, GraphWatcher, WatchError};
use crate::session::{CompileMode, EditorSession, SessionError, ShaderArtifact};
use nodeshader_graph::{BackendError, BackendKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Usage text printed by `help` and on argument errors
pub const USAGE: &str = "Usage: nodeshader <command> [options]

Commands:
  new <file>                      Create a graph document with a single output node
  compile <file> [options]        Compile a graph document to shader source
  params <file>                   Print the parameter table as JSON
  watch <file> [options]          Recompile whenever the document changes
  check <file>                    Validate a graph document
  help                            Show this message

Options:
  --backend <wgsl|glsl>           Shader language (default from nodeshader.ron)
  --out <path>                    Output file (default: <output_dir>/<name>.<ext>)";

/// Error type for the command line
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad arguments
    #[error("{0}")]
    Usage(String),

    /// Unknown backend name
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Session failure
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Watcher failure
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// File access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `new` refuses to overwrite a file
    #[error("File already exists: {0:?}")]
    AlreadyExists(PathBuf),
}

/// Options shared by `compile` and `watch`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Backend override
    pub backend: Option<BackendKind>,
    /// Output file override
    pub out: Option<PathBuf>,
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a document
    New(PathBuf),
    /// Compile a document once
    Compile(PathBuf, CompileOptions),
    /// Print the parameter table
    Params(PathBuf),
    /// Compile on every change
    Watch(PathBuf, CompileOptions),
    /// Validate a document
    Check(PathBuf),
    /// Print usage
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut iter = args.iter();
        let Some(name) = iter.next() else {
            return Ok(Self::Help);
        };

        let mut file = None;
        let mut options = CompileOptions::default();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--backend" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| CliError::Usage("--backend requires a name".to_string()))?;
                    options.backend = Some(value.parse()?);
                }
                "--out" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| CliError::Usage("--out requires a path".to_string()))?;
                    options.out = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("Unknown option: {flag}")));
                }
                _ if file.is_none() => file = Some(PathBuf::from(arg)),
                _ => return Err(CliError::Usage(format!("Unexpected argument: {arg}"))),
            }
        }

        let takes_options = matches!(name.as_str(), "compile" | "watch");
        if !takes_options && options != CompileOptions::default() {
            return Err(CliError::Usage(format!("{name} takes no options")));
        }

        let require_file =
            || file.clone().ok_or_else(|| CliError::Usage(format!("{name} requires a file")));
        Ok(match name.as_str() {
            "new" => Self::New(require_file()?),
            "compile" => Self::Compile(require_file()?, options),
            "params" => Self::Params(require_file()?),
            "watch" => Self::Watch(require_file()?, options),
            "check" => Self::Check(require_file()?),
            "help" | "--help" | "-h" => Self::Help,
            other => return Err(CliError::Usage(format!("Unknown command: {other}"))),
        })
    }

    /// Run the command
    pub fn run(self, config: &EditorConfig) -> Result<(), CliError> {
        match self {
            Self::New(path) => new_document(&path, config),
            Self::Compile(path, options) => {
                let mut session = open_session(&path, &options, config)?;
                compile_to_disk(&mut session, &path, &options, config)?;
                Ok(())
            }
            Self::Params(path) => {
                let session = open_session(&path, &CompileOptions::default(), config)?;
                let parameters = session
                    .graph()
                    .generate_parameters()
                    .map_err(SessionError::from)?;
                println!("{}", serde_json::to_string_pretty(&parameters)?);
                Ok(())
            }
            Self::Watch(path, options) => watch(&path, &options, config),
            Self::Check(path) => check(&path, config),
            Self::Help => {
                println!("{USAGE}");
                Ok(())
            }
        }
    }
}

fn new_document(path: &Path, config: &EditorConfig) -> Result<(), CliError> {
    if path.exists() {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    let mut session = EditorSession::new(config);
    session.save_to(path)?;
    Ok(())
}

fn open_session(
    path: &Path,
    options: &CompileOptions,
    config: &EditorConfig,
) -> Result<EditorSession, CliError> {
    let mut session = EditorSession::new(config);
    if let Some(backend) = options.backend {
        session.set_backend(backend);
    }
    session.open(path)?;
    Ok(session)
}

/// Where compiled source for `document` goes
pub fn output_path(
    document: &Path,
    artifact: &ShaderArtifact,
    options: &CompileOptions,
    config: &EditorConfig,
) -> PathBuf {
    if let Some(out) = &options.out {
        return out.clone();
    }
    let stem = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("shader");
    let extension = artifact.backend.create().file_extension();
    config.output_dir.join(format!("{stem}.{extension}"))
}

fn compile_to_disk(
    session: &mut EditorSession,
    document: &Path,
    options: &CompileOptions,
    config: &EditorConfig,
) -> Result<PathBuf, CliError> {
    let artifact = session.compile(CompileMode::Commit)?;
    let out = output_path(document, artifact, options, config);
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&out, &artifact.source)?;
    tracing::info!(
        "Wrote {} shader to {:?} ({} parameter(s))",
        artifact.backend,
        out,
        artifact.data.parameters.len()
    );
    Ok(out)
}

fn check(path: &Path, config: &EditorConfig) -> Result<(), CliError> {
    let mut session = open_session(path, &CompileOptions::default(), config)?;
    let graph = session.graph();
    let (nodes, connections) = (graph.node_count(), graph.connection_count());
    let artifact = session.compile(CompileMode::Commit)?;
    println!(
        "{}: {} node(s), {} connection(s), {} statement(s), {} parameter(s)",
        path.display(),
        nodes,
        connections,
        artifact.data.statements.len(),
        artifact.data.parameters.len()
    );
    Ok(())
}

fn watch(path: &Path, options: &CompileOptions, config: &EditorConfig) -> Result<(), CliError> {
    let mut session = open_session(path, options, config)?;
    if let Err(err) = compile_to_disk(&mut session, path, options, config) {
        tracing::warn!("Initial compile failed: {}", err);
    }

    let mut watcher = GraphWatcher::new(config.watch_debounce())?;
    let watched = watcher.watch(path)?;
    tracing::info!("Watching {:?}, press Ctrl+C to stop", watched);

    loop {
        let Some(event) = watcher.wait_event(Duration::from_secs(1)) else {
            continue;
        };
        match event {
            GraphEvent::Changed(_) => {
                // A rejected document keeps the previous graph and shader
                if let Err(err) = session.open(path) {
                    tracing::warn!("Reload failed: {}", err);
                    continue;
                }
                if let Err(err) = compile_to_disk(&mut session, path, options, config) {
                    tracing::warn!("Compile failed: {}", err);
                }
            }
            GraphEvent::Removed(removed) => {
                tracing::warn!("Document removed: {:?}", removed);
            }
            GraphEvent::Error(err) => {
                tracing::warn!("Watcher error: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args(&["new", "a.ron"])).unwrap(),
            Command::New(PathBuf::from("a.ron"))
        );
        assert_eq!(
            Command::parse(&args(&["compile", "a.ron", "--backend", "glsl", "--out", "x.frag"]))
                .unwrap(),
            Command::Compile(
                PathBuf::from("a.ron"),
                CompileOptions {
                    backend: Some(BackendKind::Glsl),
                    out: Some(PathBuf::from("x.frag")),
                }
            )
        );
        assert_eq!(
            Command::parse(&args(&["watch", "--backend", "wgsl", "a.ron"])).unwrap(),
            Command::Watch(
                PathBuf::from("a.ron"),
                CompileOptions {
                    backend: Some(BackendKind::Wgsl),
                    out: None,
                }
            )
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            &["compile"][..],
            &["compile", "a.ron", "--backend"][..],
            &["compile", "a.ron", "--backend", "hlsl"][..],
            &["params", "a.ron", "--out", "x"][..],
            &["check", "a.ron", "b.ron"][..],
            &["frobnicate", "a.ron"][..],
            &["new", "a.ron", "--force"][..],
        ] {
            assert!(Command::parse(&args(bad)).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_output_path() {
        let session = EditorSession::default();
        let artifact = session.artifact().unwrap();
        let config = EditorConfig::default();
        let document = Path::new("graphs/marble.ron");

        assert_eq!(
            output_path(document, artifact, &CompileOptions::default(), &config),
            PathBuf::from("shaders/marble.wgsl")
        );
        let options = CompileOptions {
            backend: None,
            out: Some(PathBuf::from("out.wgsl")),
        };
        assert_eq!(
            output_path(document, artifact, &options, &config),
            PathBuf::from("out.wgsl")
        );
    }

    #[test]
    fn test_new_then_compile() {
        let dir = std::env::temp_dir().join(format!("nodeshader_cli_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let document = dir.join("flat.ron");
        let out = dir.join("flat.frag");
        let config = EditorConfig::default();

        Command::New(document.clone()).run(&config).unwrap();
        assert!(matches!(
            Command::New(document.clone()).run(&config),
            Err(CliError::AlreadyExists(_))
        ));

        let options = CompileOptions {
            backend: Some(BackendKind::Glsl),
            out: Some(out.clone()),
        };
        Command::Compile(document.clone(), options).run(&config).unwrap();
        let source = std::fs::read_to_string(&out).unwrap();
        assert!(source.starts_with("#version 450"));

        Command::Check(document).run(&config).unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }
}
