//! Composer graph data model.
//!
//! Nodes carry free-form `data`; their ports come from a kind [`Schema`]
//! and are re-derived from the data whenever it changes.

pub mod data;
mod edge;
mod node;
#[cfg(test)]
mod node_test;
pub mod port;
mod schema;
mod session;
#[cfg(test)]
mod session_test;

pub use data::NodeData;
pub use edge::{Edge, Endpoint};
pub use node::{Node, Rect};
pub use port::{InputPort, OutputPort};
pub use schema::{BindingAllowList, BuiltinKind, Schema, Size};
pub use session::{Session, ViewTransform};
