//! # composer-graph
//!
//! Core of a node-graph editor for Docker Compose files.
//!
//! ## Architecture
//!
//! A [`Session`] holds typed nodes and the edges between their ports. Every
//! editing operation takes the current session and returns a new one:
//!
//! - [`catalog`]: node-kind schemas, built in or loaded from image and proxy feeds
//! - [`resolver`]: the value a node exposes on its outputs
//! - [`derive`]: per-node ports derived from the node's data
//! - [`propagation`]: breadth-first value flow after a change
//! - [`lifecycle`]: node and edge operations with their side effects
//! - [`compiler`]: flattens the graph into a compose document
//! - [`session_io`]: session files and exports that embed the session

pub mod catalog;
pub mod compiler;
pub mod derive;
#[cfg(test)]
mod derive_test;
pub mod error;
pub mod lifecycle;
pub mod propagation;
pub mod resolver;
#[cfg(test)]
mod resolver_test;
pub mod session_io;
pub mod types;

pub use catalog::Catalog;
pub use compiler::{ComposeDocument, compile};
pub use derive::effective_schema;
pub use error::{CatalogError, ConnectError, ImportError, SessionError};
pub use propagation::{Propagated, propagate};
pub use resolver::resolve;
pub use session_io::{export_compose, import_compose, load_session, save_session};
pub use types::{Edge, Endpoint, Node, NodeData, Schema, Session};
