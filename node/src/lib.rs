//! The gossiper node: configuration, HTTP server, and the periodic sweep and
//! snapshot tasks wrapped around the gossip engine.

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod server;
pub mod snapshot;

pub use config::{GossiperConfig, KeyEntry};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::GossipNode;
pub use server::{router, AppState, StatusResponse};
