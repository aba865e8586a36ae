//! Domain types and the ports the application layer talks through.

pub mod currency;
pub mod issue;
pub mod ports;
pub mod tracker;
