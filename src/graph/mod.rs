//! Hash-consed expression graph produced by symbolic execution

pub mod eval;
pub mod node;
pub mod table;

pub use eval::{evaluate, evaluate_all};
pub use node::{Node, NodeRef};
pub use table::NodeTable;
