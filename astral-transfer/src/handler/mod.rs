//! Builds and submits the transactions of each transfer strategy.
mod send_transfer;

pub use send_transfer::*;
