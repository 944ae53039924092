//! Core domain types and shared logic for the ledgerweb gateway.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Node names and request-side node selection
//! - Attachment hashes, uploads and receipts
//! - Composite identifiers and their text codec
//! - Party names, addresses and membership records
//! - Configuration

pub mod attachment;
pub mod config;
pub mod error;
pub mod hash;
pub mod identifier;
pub mod membership;
pub mod network;
pub mod node_name;
pub mod party;

pub use attachment::{AttachmentFile, AttachmentReceipt, AttachmentUpload};
pub use error::{Error, Result};
pub use hash::AttachmentHash;
pub use identifier::CompositeIdentifier;
pub use membership::{MembershipQuery, MembershipRequest, MembershipState, MembershipStatus};
pub use network::HostAndPort;
pub use node_name::{CORDFORM_NODE_NAME, NodeName, NodeSelector, default_node_name};
pub use party::{Party, PartyName, PartyNameModel};
