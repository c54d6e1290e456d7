//! Inbound update handling and the per-trigger generation task.

use std::sync::Arc;

use uuid::Uuid;

use adsmith_core::{CampaignDraft, GenerationError, SourceSnapshot};
use adsmith_delivery::deliver_campaign;
use adsmith_pipeline::CampaignGenerator;
use adsmith_vk::VkClient;

use crate::coordinator::GenerationCoordinator;
use crate::telegram::{TelegramApi, Update};

/// How many recent wall posts go into a snapshot.
const POSTS_COUNT: u32 = 50;

pub const GREETING: &str = "Отправьте ссылку на группу ВКонтакте (например, vk.com/group_name \
или vk.com/club123). Я проанализирую группу и последние 50 постов и подготовлю данные для \
рекламной кампании.";

pub const CREATING_MESSAGE: &str =
    "Ваше объявление создаётся. Вы получите результат, когда всё будет готово.";

pub const BUSY_MESSAGE: &str =
    "Генерация для этого чата уже идёт. Дождитесь результата, затем отправьте ссылку ещё раз.";

pub const BAD_LINK_MESSAGE: &str =
    "Отправьте корректную ссылку на группу ВКонтакте (содержит vk.com).";

/// Everything a generation task needs, shared across all tasks.
pub struct BotContext {
    pub telegram: Arc<TelegramApi>,
    pub vk: Arc<VkClient>,
    pub generator: Arc<CampaignGenerator>,
    pub coordinator: Arc<GenerationCoordinator>,
}

/// Cheap pre-check before link parsing: the original audience pastes all
/// sorts of text, so anything without the VK host is rejected up front.
pub fn looks_like_vk_link(text: &str) -> bool {
    text.to_lowercase().contains("vk.com")
}

/// Route one inbound update.
pub async fn handle_update(ctx: &Arc<BotContext>, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;
    let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    else {
        return;
    };

    if text == "/start" {
        reply(ctx, chat_id, GREETING).await;
        return;
    }
    handle_link(ctx, chat_id, text).await;
}

/// Validate, admit and spawn a generation run for one pasted link.
async fn handle_link(ctx: &Arc<BotContext>, chat_id: i64, link: &str) {
    if !looks_like_vk_link(link) {
        reply(ctx, chat_id, BAD_LINK_MESSAGE).await;
        return;
    }

    let correlation_id = Uuid::new_v4();
    if !ctx.coordinator.try_admit(chat_id, correlation_id) {
        tracing::info!(chat_id, "trigger rejected: generation already active");
        reply(ctx, chat_id, BUSY_MESSAGE).await;
        return;
    }

    tracing::info!(chat_id, link, %correlation_id, "trigger admitted");
    reply(ctx, chat_id, CREATING_MESSAGE).await;

    let ctx = Arc::clone(ctx);
    let link = link.to_string();
    tokio::spawn(async move {
        run_campaign_task(ctx, chat_id, link, correlation_id).await;
    });
}

/// One full generation run: fetch, generate, gate, deliver.
///
/// The release guard removes the chat's record on every exit path.
pub async fn run_campaign_task(
    ctx: Arc<BotContext>,
    chat_id: i64,
    link: String,
    correlation_id: Uuid,
) {
    let _release = ctx.coordinator.release_guard(chat_id);
    tracing::info!(chat_id, link = %link, "task start");

    match generate_draft(&ctx, &link).await {
        Ok(draft) => {
            if !ctx.coordinator.should_deliver(chat_id, correlation_id) {
                tracing::info!(chat_id, %correlation_id, "duplicate result suppressed");
                return;
            }
            match deliver_campaign(ctx.telegram.as_ref(), chat_id, &draft).await {
                Ok(()) => {
                    ctx.coordinator.mark_delivered(chat_id);
                    tracing::info!(chat_id, "task done, campaign delivered");
                }
                Err(e) => {
                    tracing::error!(chat_id, error = %e, "campaign delivery failed");
                    reply(&ctx, chat_id, &format!("Произошла ошибка: {e}")).await;
                }
            }
        }
        Err(e) if e.is_user_error() => {
            tracing::warn!(chat_id, error = %e, "task failed: invalid input");
            reply(&ctx, chat_id, &format!("Ошибка: {e}")).await;
        }
        Err(e) => {
            tracing::error!(chat_id, error = %e, "task failed");
            reply(&ctx, chat_id, &format!("Произошла ошибка: {e}")).await;
        }
    }
}

/// Fetch the snapshot and run the pipeline.
async fn generate_draft(
    ctx: &Arc<BotContext>,
    link: &str,
) -> Result<CampaignDraft, GenerationError> {
    let snapshot: SourceSnapshot = ctx.vk.fetch_group_snapshot(link, POSTS_COUNT).await?;
    tracing::info!(
        group = %snapshot.group.name,
        posts = snapshot.posts.len(),
        "snapshot fetched",
    );
    ctx.generator.generate(&snapshot).await
}

/// Best-effort reply; a failed status message is logged, never fatal.
async fn reply(ctx: &Arc<BotContext>, chat_id: i64, text: &str) {
    if let Err(e) = ctx.telegram.send_message(chat_id, text).await {
        tracing::warn!(chat_id, error = %e, "failed to send reply");
    }
}
