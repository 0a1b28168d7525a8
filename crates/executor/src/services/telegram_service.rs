use std::env;

use teloxide::prelude::*;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub struct TelegramService {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramService {
    /// Builds the service from TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID. Alerts
    /// are fire-and-forget, so missing or malformed config disables the
    /// service instead of failing boot.
    pub fn from_env() -> Option<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").ok()?.parse::<i64>().ok()?;

        Some(Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        })
    }

    pub async fn start(self, mut rx: broadcast::Receiver<String>) {
        info!("Starting Telegram notification service");

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    // Send message and log error if it fails, but don't crash
                    if let Err(e) = self.bot.send_message(self.chat_id, msg).await {
                        error!("Failed to send Telegram message: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Telegram service lagged behind. Missed {} messages.", n);
                }
                Err(_) => {
                    info!("Alert channel closed. Stopping service.");
                    break;
                }
            }
        }
    }
}
