//! Order Processing Server
//!
//! The runnable service around the [`order_processing_engine`]. It wires the in-process broker, the correlator and
//! the channel listeners together: orders arriving on the order-created channel and payments arriving on the
//! payment-completed channel are fed to the correlator, and every completed match is published on the
//! order-processed channel.
//!
//! Configuration comes from `OPS_*` environment variables with sensible defaults; see [`config::ServerConfig`].

pub mod config;
pub mod errors;
pub mod listeners;
pub mod server;

#[cfg(test)]
mod test;
