//! Unix-socket command bus shared by the DB and system command services and
//! the API front door that calls them.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod client;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod server;

pub use client::{call, ClientConfig};
pub use error::{CmdBusError, CmdBusResult};
pub use protocol::{CommandRequest, CommandResponse};
pub use server::{bind, serve, CommandHandler};
