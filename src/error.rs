//! Error types for session, connection, import and catalog operations.
//!
//! Propagation itself never fails; anything it cannot interpret is skipped.

/// Errors from session-level operations and session files.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  /// A node's kind has no schema in the catalog.
  #[error("unknown node kind '{kind}' on node {node}")]
  UnknownKind {
    /// Node id.
    node: String,
    /// The unresolved kind.
    kind: String,
  },

  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("edge not found: {0}")]
  EdgeNotFound(String),

  /// An edge references a node that does not exist.
  #[error("edge {edge} references missing node {node}")]
  DanglingEdge {
    /// Edge id.
    edge: String,
    /// The missing node id.
    node: String,
  },

  #[error("session file: {0}")]
  Io(#[from] std::io::Error),

  #[error("session json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("compose yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

/// Reasons a connection attempt is rejected. No edge is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
  #[error("node not found: {0}")]
  UnknownNode(String),

  /// The port is not on the node's effective schema.
  #[error("node {node} has no port {port}")]
  UnknownPort {
    /// Node id.
    node: String,
    /// Port id.
    port: String,
  },

  #[error("cannot connect node {0} to itself")]
  SelfLoop(String),

  #[error("output port {port} on node {node} is disabled")]
  DisabledPort {
    /// Node id.
    node: String,
    /// Port id.
    port: String,
  },

  /// Destination port does not accept the source kind.
  #[error("port {port} does not accept '{kind}'")]
  IncompatibleKind {
    /// Destination port id.
    port: String,
    /// Source port kind.
    kind: String,
  },

  /// Single-valued destination port already has an edge.
  #[error("port {port} on node {node} is already connected")]
  Occupied {
    /// Node id.
    node: String,
    /// Port id.
    port: String,
  },
}

/// Why an exported compose file could not be imported. The current session is untouched.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("not a composer file: missing embedded session marker")]
  MissingMarker,

  #[error("embedded session is not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("embedded session is not valid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),

  #[error("embedded session is malformed: {0}")]
  Json(#[from] serde_json::Error),

  /// A required top-level field is absent.
  #[error("embedded session is missing '{0}'")]
  MissingField(&'static str),

  /// The decoded session is structurally invalid.
  #[error("embedded session is invalid: {0}")]
  Invalid(#[from] SessionError),
}

/// Failure loading an external catalog feed. Callers log it and continue without the feed.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("catalog read {path}: {source}")]
  Read {
    /// Feed path.
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("image catalog json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("proxy catalog yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),
}
