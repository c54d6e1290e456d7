//! Bot entry point: configuration, client wiring and the long-poll loop.

mod config;
mod coordinator;
mod runner;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adsmith_imagegen::{GptunnelClient, ImageRenderer};
use adsmith_llm::OpenAiChat;
use adsmith_pipeline::CampaignGenerator;
use adsmith_vk::VkClient;

use crate::config::Config;
use crate::coordinator::GenerationCoordinator;
use crate::runner::{handle_update, BotContext};
use crate::telegram::TelegramApi;

/// Pause before retrying after a failed getUpdates call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adsmith_bot=info,adsmith_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let chat = Arc::new(OpenAiChat::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));
    let renderer: Option<Arc<dyn ImageRenderer>> = config
        .gptunnel_api_key
        .as_ref()
        .map(|key| {
            Arc::new(GptunnelClient::new(
                key.clone(),
                config.gptunnel_image_model.clone(),
            )) as Arc<dyn ImageRenderer>
        });
    if renderer.is_none() {
        tracing::warn!("GPTUNNEL_API_KEY not set — ad images will not be rendered");
    }

    let ctx = Arc::new(BotContext {
        telegram: Arc::new(TelegramApi::new(&config.telegram_bot_token)),
        vk: Arc::new(VkClient::new(
            config.vk_access_token.clone(),
            config.vk_api_version.clone(),
        )),
        generator: Arc::new(CampaignGenerator::new(chat, renderer)),
        coordinator: Arc::new(GenerationCoordinator::new()),
    });

    tracing::info!(model = %config.llm_model, "adsmith bot starting");
    run_polling(ctx).await
}

/// The long-poll loop: fetch updates, dispatch each to the handler.
async fn run_polling(ctx: Arc<BotContext>) -> anyhow::Result<()> {
    let mut offset = 0i64;
    loop {
        match ctx.telegram.get_updates(offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    handle_update(&ctx, update).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
            }
        }
    }
}
