//! Best-effort delivery of a formatted campaign.
//!
//! Text blocks are chunked to the message limit. Photo blocks are
//! prepared, captioned and retried; when preparation or every send
//! attempt fails, the variant degrades to a text-only block instead of
//! being lost.

use std::time::Duration;

use adsmith_core::CampaignDraft;

use crate::format::{chunk_text, format_campaign, Block};
use crate::photo::prepare_photo;
use crate::transport::{Messenger, SendError, CAPTION_LIMIT, MESSAGE_LIMIT};

/// Maximum photo send attempts.
pub const MAX_PHOTO_ATTEMPTS: u32 = 3;

/// Fixed pause between photo send attempts.
pub const PHOTO_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Send `text` as consecutive message-limit chunks.
pub async fn send_text_chunked<M: Messenger + ?Sized>(
    messenger: &M,
    chat_id: i64,
    text: &str,
) -> Result<(), SendError> {
    for chunk in chunk_text(text, MESSAGE_LIMIT) {
        messenger.send_text(chat_id, &chunk).await?;
    }
    Ok(())
}

/// Send one photo with bounded retry.
///
/// Attempts are made up to [`MAX_PHOTO_ATTEMPTS`] times with a fixed
/// [`PHOTO_RETRY_DELAY`] pause between them; the last error is returned
/// when every attempt fails.
pub async fn send_photo_with_retry<M: Messenger + ?Sized>(
    messenger: &M,
    chat_id: i64,
    photo: &[u8],
    caption: &str,
) -> Result<(), SendError> {
    let mut last_err = None;
    for attempt in 1..=MAX_PHOTO_ATTEMPTS {
        match messenger.send_photo(chat_id, photo, caption).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(chat_id, attempt, error = %e, "photo send attempt failed");
                last_err = Some(e);
                if attempt < MAX_PHOTO_ATTEMPTS {
                    tokio::time::sleep(PHOTO_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| SendError("photo send failed".to_string())))
}

/// Deliver one block, degrading a photo block to text on terminal failure.
async fn deliver_block<M: Messenger + ?Sized>(
    messenger: &M,
    chat_id: i64,
    block: &Block,
) -> Result<(), SendError> {
    let Some(photo) = &block.photo else {
        return send_text_chunked(messenger, chat_id, &block.text).await;
    };

    let prepared = match prepare_photo(photo) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(chat_id, error = %e, "photo preparation failed, sending text only");
            return send_text_chunked(messenger, chat_id, &block.text).await;
        }
    };

    let caption: String = block.text.chars().take(CAPTION_LIMIT).collect();
    match send_photo_with_retry(messenger, chat_id, &prepared, &caption).await {
        Ok(()) => {
            // A truncated caption means part of the block was cut off;
            // follow up with the full text.
            if block.text.chars().count() > CAPTION_LIMIT {
                send_text_chunked(messenger, chat_id, &block.text).await?;
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(chat_id, error = %e, "photo delivery gave up, sending text only");
            send_text_chunked(messenger, chat_id, &block.text).await
        }
    }
}

/// Format and deliver a whole campaign draft to one chat.
pub async fn deliver_campaign<M: Messenger + ?Sized>(
    messenger: &M,
    chat_id: i64,
    draft: &CampaignDraft,
) -> Result<(), SendError> {
    for block in format_campaign(draft) {
        deliver_block(messenger, chat_id, &block).await?;
    }
    Ok(())
}
