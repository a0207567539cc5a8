//! Observer transport: the event socket that carries the wire protocol

pub mod lines;
pub mod server;

pub use server::EventServer;
