//! JSON-RPC API Layer
//!
//! Exposes the dispatch operations as JSON-RPC 2.0 methods over localhost TCP.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
