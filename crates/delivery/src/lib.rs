//! Delivery layer: draft formatting, photo preparation and the
//! best-effort send walk.
//!
//! The formatter turns a [`CampaignDraft`](adsmith_core::CampaignDraft)
//! into ordered blocks respecting the transport limits; the deliverer
//! sends them through a [`Messenger`](transport::Messenger), retrying
//! photos and falling back to text so no variant is ever lost.

pub mod deliver;
pub mod format;
pub mod photo;
pub mod transport;

pub use deliver::deliver_campaign;
pub use format::{chunk_text, format_campaign, Block};
pub use photo::{prepare_photo, PhotoError};
pub use transport::{Messenger, SendError, CAPTION_LIMIT, MESSAGE_LIMIT};
