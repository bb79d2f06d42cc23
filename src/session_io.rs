//! Session files and exported compose files with an embedded session.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::compiler::compile;
use crate::error::{ImportError, SessionError};
use crate::types::Session;

/// First line of every exported compose file.
pub const EXPORT_HEADER: &str = "# Generated with composer-graph\n";

/// Body of an export whose session compiles to nothing.
pub const EMPTY_WORKSPACE: &str = "# Your workspace is empty. Add items to generate a compose file.\n";

/// Prefix of the trailing line carrying the base64 session.
pub const SESSION_MARKER: &str = "# COMPOSER_DATA::";

/// Top-level fields an embedded session must carry.
const REQUIRED_FIELDS: [&str; 3] = ["nodes", "edges", "viewTransform"];

/// Saves `session` to `path` as pretty JSON, creating parent directories.
#[instrument(level = "trace", skip(path, session))]
pub fn save_session(path: &Path, session: &Session) -> Result<(), SessionError> {
  let json = serde_json::to_string_pretty(session)?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)?;
  Ok(())
}

/// Loads a session from `path` and checks it against `catalog`.
#[instrument(level = "trace", skip(path, catalog))]
pub fn load_session(path: &Path, catalog: &Catalog) -> Result<Session, SessionError> {
  let bytes = std::fs::read(path)?;
  let session: Session = serde_json::from_slice(&bytes)?;
  session.validate(catalog)?;
  Ok(session)
}

/// Compiles `session` to compose YAML without header or embedded data.
pub fn compose_yaml(session: &Session, catalog: &Catalog) -> Result<String, SessionError> {
  Ok(compile(catalog, &session.nodes, &session.edges).to_yaml()?)
}

/// Full export text: header, compose YAML, then the session as a base64 comment.
#[instrument(level = "trace", skip_all, fields(nodes = session.nodes.len()))]
pub fn export_compose(session: &Session, catalog: &Catalog) -> Result<String, SessionError> {
  let doc = compile(catalog, &session.nodes, &session.edges);
  let mut out = String::from(EXPORT_HEADER);
  if doc.is_empty() {
    out.push_str(EMPTY_WORKSPACE);
  } else {
    out.push_str(&doc.to_yaml()?);
  }
  let payload = STANDARD.encode(serde_json::to_string(session)?);
  out.push('\n');
  out.push_str(SESSION_MARKER);
  out.push_str(&payload);
  info!(services = doc.services.len(), bytes = out.len(), "exported");
  Ok(out)
}

/// Restores the session embedded in an exported compose file.
///
/// The last non-blank line must carry the session marker.
#[instrument(level = "trace", skip_all)]
pub fn import_compose(text: &str, catalog: &Catalog) -> Result<Session, ImportError> {
  let last = text
    .lines()
    .rev()
    .map(str::trim)
    .find(|l| !l.is_empty())
    .ok_or(ImportError::MissingMarker)?;
  let payload = last.strip_prefix(SESSION_MARKER).ok_or(ImportError::MissingMarker)?;
  let json = String::from_utf8(STANDARD.decode(payload.trim())?)?;

  let raw: Value = serde_json::from_str(&json)?;
  for field in REQUIRED_FIELDS {
    if raw.get(field).is_none() {
      return Err(ImportError::MissingField(field));
    }
  }
  let session: Session = serde_json::from_value(raw)?;
  session.validate(catalog)?;
  info!(nodes = session.nodes.len(), edges = session.edges.len(), "imported");
  Ok(session)
}
