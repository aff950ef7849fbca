//! IPC module for client communication

mod protocol;
mod server;

pub use protocol::{Notification, Request, Response, TrackerStatus};
pub use server::Server;
