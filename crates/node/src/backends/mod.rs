//! Node backend implementations.

pub mod memory;
pub mod rpc;
