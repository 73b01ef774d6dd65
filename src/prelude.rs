//! This module provides an easy single import for those using this crate.

pub use crate::channel::{self, Receiver, Sender};
pub use crate::node::{Node, NodeError, NodeReceiver, NodeSender};
pub use node_derive::Node;
pub use std::thread;
