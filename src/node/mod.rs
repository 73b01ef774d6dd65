//! Provides an infrastructure to wrap processing stages in nodes, connect
//! nodes together via crossbeam channels, and start nodes running in their
//! own independent threads.
//!
//! # Example
//!
//! ```
//! #[macro_use] extern crate tablet_filters;
//! use tablet_filters::prelude::*;
//!
//! # fn main() {
//! #[derive(Node)]
//! struct Source {
//!     remaining: u32,
//!     sender: NodeSender<u32>,
//! }
//!
//! impl Source {
//!     fn run(&mut self) -> Result<u32, NodeError> {
//!         if self.remaining == 0 {
//!             return Err(NodeError::DataEnd);
//!         }
//!         self.remaining -= 1;
//!         Ok(self.remaining)
//!     }
//! }
//!
//! #[derive(Node)]
//! struct Sink {
//!     input: NodeReceiver<u32>,
//!     total: u32,
//! }
//!
//! impl Sink {
//!     fn run(&mut self, x: u32) -> Result<(), NodeError> {
//!         self.total += x;
//!         Ok(())
//!     }
//! }
//!
//! let mut source = Source::new(4);
//! let mut sink = Sink::new(0);
//! connect_nodes!(source, sender, sink, input);
//! start_nodes!(source);
//!
//! // The sink stops once the source ran dry and hung up.
//! sink.start();
//! assert_eq!(sink.total, 3 + 2 + 1);
//! # }
//! ```

use log::{debug, warn};
use thiserror::Error;

use crate::channel::{Receiver, Sender};

/// The receiving end of a node input. `None` until connected.
pub type NodeReceiver<T> = Option<Receiver<T>>;

/// Every downstream node a node broadcasts its output to.
pub type NodeSender<T> = Vec<Sender<T>>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    #[error("Node received or produced invalid data")]
    DataError,
    #[error("Node input closed, no more data")]
    DataEnd,
    #[error("Node failed to send to a downstream node")]
    CommError,
    #[error("Node is not connected")]
    PermanentError,
}

/// The trait that all nodes in the library implement.
pub trait Node {
    /// Executes the node once: receive one value from every input, process
    /// it and broadcast the result.
    fn call(&mut self) -> Result<(), NodeError>;

    /// True when every input and output of the node has been connected.
    fn is_connected(&self) -> bool;

    /// Calls the node until it fails. Running out of input ends the node
    /// quietly; anything else is reported.
    fn start(&mut self) {
        loop {
            match self.call() {
                Ok(()) => continue,
                Err(NodeError::DataEnd) => {
                    debug!("node input closed, stopping");
                    break;
                }
                Err(err) => {
                    warn!("node stopped: {}", err);
                    break;
                }
            }
        }
    }
}

/// Connects the output `$send` of node `$n1` to the input `$recv` of node
/// `$n2`.
#[macro_export]
macro_rules! connect_nodes {
    ($n1:ident, $send:ident, $n2:ident, $recv:ident) => {{
        let (send, recv) = $crate::channel::unbounded();
        $n1.$send.push(send);
        $n2.$recv = Some(recv);
    }};
}

/// Moves each node into its own thread and starts it. Evaluates to the
/// join handles of the spawned threads.
#[macro_export]
macro_rules! start_nodes {
    ($($node:ident),+ $(,)?) => {{
        vec![
            $(
                ::std::thread::spawn(move || {
                    use $crate::node::Node;
                    $node.start();
                }),
            )+
        ]
    }};
}
