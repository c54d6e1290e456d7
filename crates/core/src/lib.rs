//! Domain types and pure logic shared by every adsmith crate.
//!
//! Nothing in here performs I/O: snapshots, campaign drafts, targeting
//! tables and the VK Ads request builder are all plain data plus pure
//! functions, so the collaborator crates (`adsmith-vk`, `adsmith-llm`,
//! `adsmith-pipeline`, `adsmith-delivery`) can depend on this one without
//! pulling in any transport.

pub mod ads_requests;
pub mod analysis;
pub mod campaign;
pub mod error;
pub mod snapshot;
pub mod targeting;

pub use analysis::Analysis;
pub use campaign::{AdVariant, CampaignDraft};
pub use error::GenerationError;
pub use snapshot::{ContentItem, GroupInfo, SourceSnapshot};
