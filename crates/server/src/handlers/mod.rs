//! HTTP request handlers.

pub mod attachments;
pub mod common;
pub mod echo;
pub mod health;
pub mod membership;
pub mod network;
pub mod node;

pub use attachments::*;
pub use common::*;
pub use echo::*;
pub use health::*;
pub use membership::*;
pub use network::*;
pub use node::*;
