// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeshader` - node-based shader authoring from the command line
//!
//! Creates, validates and compiles graph documents to WGSL or GLSL, and can
//! watch a document to recompile it on every save.

use nodeshader_editor::cli::{CliError, Command, USAGE};
use nodeshader_editor::EditorConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let config = match EditorConfig::load_or_default(std::path::Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config: {e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting nodeshader v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = Command::parse(&args).and_then(|command| command.run(&config));
    if let Err(e) = result {
        tracing::error!("{e}");
        if matches!(e, CliError::Usage(_)) {
            eprintln!("{USAGE}");
        }
        std::process::exit(1);
    }
}
