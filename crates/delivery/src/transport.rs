//! The delivery-channel seam and its transport limits.

/// Maximum length of one plain text message, in characters.
pub const MESSAGE_LIMIT: usize = 4096;

/// Maximum length of a media caption, in characters. Strictly smaller
/// than [`MESSAGE_LIMIT`].
pub const CAPTION_LIMIT: usize = 1024;

/// A failed send operation, after the transport gave up.
#[derive(Debug, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendError(pub String);

/// Outbound channel the deliverer writes to.
///
/// Implementations must enforce nothing themselves — the deliverer
/// guarantees that texts fit [`MESSAGE_LIMIT`] and captions fit
/// [`CAPTION_LIMIT`].
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &[u8],
        caption: &str,
    ) -> Result<(), SendError>;
}
