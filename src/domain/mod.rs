//! Domain types and the ports the booking logic depends on.

pub mod account;
pub mod batch;
pub mod config;
pub mod job;
pub mod message;
pub mod money;
pub mod ports;
pub mod transaction;
