//! The `tickburst` command line probe.
//!
//! Wires the burst scheduler to an HTTP control plane: `create` bursts call create-network and
//! `read` bursts call list-networks or list-services.
pub mod cli;
pub mod client;
pub mod error;
pub mod run;

pub use cli::Cli;
pub use client::ControlPlaneClient;
pub use error::{RemoteError, SetupError};
pub use run::run;
