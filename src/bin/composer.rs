//! CLI: compile composer sessions to compose files and restore sessions from exports.
//!
//! Usage:
//!   composer export <session.json> [-o docker-compose.yml]
//!   composer compile <session.json>
//!   composer import <docker-compose.yml> [-o session.json]
//!   composer kinds [--images]
//!
//! Set RUST_LOG=composer_graph=trace for span and merge events.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use composer_graph::session_io::{compose_yaml, export_compose, import_compose, load_session, save_session};
use composer_graph::types::BuiltinKind;
use composer_graph::{Catalog, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Compile composer sessions and restore them from exported compose files.
#[derive(Parser, Debug)]
#[command(name = "composer", version)]
#[command(
  after_help = r#"Environment variables (used when the matching flag is absent):
  COMPOSER_IMAGE_CATALOG   Image catalog JSON feed.
  COMPOSER_PROXY_CATALOG   Reverse-proxy settings YAML feed.

Examples:
  composer export session.json -o docker-compose.yml
  composer import docker-compose.yml -o session.json"#
)]
struct Args {
  /// Image catalog feed (JSON). Missing or invalid feeds are logged and skipped.
  #[arg(long, value_name = "FILE", env = "COMPOSER_IMAGE_CATALOG", global = true)]
  image_catalog: Option<PathBuf>,

  /// Reverse-proxy settings feed (YAML).
  #[arg(long, value_name = "FILE", env = "COMPOSER_PROXY_CATALOG", global = true)]
  proxy_catalog: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Compose YAML with the session embedded for later import.
  Export {
    #[arg(value_name = "session.json")]
    session: PathBuf,
    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
  /// Plain compose YAML.
  Compile {
    #[arg(value_name = "session.json")]
    session: PathBuf,
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
  /// Restore the session embedded in an exported compose file.
  Import {
    #[arg(value_name = "compose.yml")]
    compose: PathBuf,
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
  /// Node kinds known to the catalog, built-in kinds first.
  Kinds {
    /// Only kinds registered from the image feed.
    #[arg(long)]
    images: bool,
  },
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
  eprintln!("Error {context}: {e}");
  process::exit(1);
}

fn load(path: &Path, catalog: &Catalog) -> Session {
  match load_session(path, catalog) {
    Ok(s) => s,
    Err(e) => fail(&format!("loading {}", path.display()), e),
  }
}

fn emit(output: Option<&Path>, text: &str) {
  match output {
    Some(path) => {
      if let Err(e) = fs::write(path, text) {
        fail(&format!("writing {}", path.display()), e);
      }
      info!(path = %path.display(), "written");
    }
    None => print!("{text}"),
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let catalog = Catalog::with_feeds(args.image_catalog.as_deref(), args.proxy_catalog.as_deref()).await;

  match args.command {
    Command::Export { session, output } => {
      let s = load(&session, &catalog);
      let text = export_compose(&s, &catalog).unwrap_or_else(|e| fail("exporting", e));
      emit(output.as_deref(), &text);
    }
    Command::Compile { session, output } => {
      let s = load(&session, &catalog);
      let yaml = compose_yaml(&s, &catalog).unwrap_or_else(|e| fail("compiling", e));
      emit(output.as_deref(), &yaml);
    }
    Command::Import { compose, output } => {
      let text = fs::read_to_string(&compose).unwrap_or_else(|e| fail(&format!("reading {}", compose.display()), e));
      let s = import_compose(&text, &catalog).unwrap_or_else(|e| fail("importing", e));
      match output {
        Some(path) => {
          if let Err(e) = save_session(&path, &s) {
            fail(&format!("writing {}", path.display()), e);
          }
          info!(path = %path.display(), nodes = s.nodes.len(), "session restored");
        }
        None => match serde_json::to_string_pretty(&s) {
          Ok(json) => println!("{json}"),
          Err(e) => fail("serializing session", e),
        },
      }
    }
    Command::Kinds { images } => {
      if !images {
        for kind in BuiltinKind::ALL {
          println!("{kind}");
        }
      }
      for kind in catalog.image_kinds() {
        println!("{kind}");
      }
    }
  }
}
