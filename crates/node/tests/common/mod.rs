#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{TrickleNode, collect, memory_node, party, zip_bytes};
