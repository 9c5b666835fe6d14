// Application layer: talking to the ledger service and driving the workflows.

mod cancel;
mod client;
mod config;
pub mod error;
mod handoff;
mod settlement;

pub use cancel::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use handoff::*;
pub use settlement::*;
