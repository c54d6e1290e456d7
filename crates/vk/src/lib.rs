//! Content-source collaborator: VK API client.
//!
//! Resolves a group link to a [`SourceSnapshot`](adsmith_core::SourceSnapshot)
//! by calling `groups.getById` and `wall.get`.

pub mod client;
pub mod link;

pub use client::{VkClient, VkError};
pub use link::parse_group_link;
