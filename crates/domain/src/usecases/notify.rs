//! Notification use case - translate, render and fan out one item to every channel

use std::sync::Arc;
use tokio::time::{Duration, sleep};

use crate::model::{CandidateItem, Category, ChannelOutcome, DeliveryReport};
use crate::ports::{MessageChannel, MessageFormat, OutgoingMessage, Translator};
use crate::usecases::render::{MessageParts, RenderConfig, Renderer};

/// Configuration for the notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Destination identifiers, fixed for the run
    pub channels: Vec<String>,
    /// Target language for titles and summaries; `None` disables translation
    pub target_language: Option<String>,
    /// Pause between successive item deliveries
    pub delivery_delay: Duration,
    pub render_config: RenderConfig,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channels: vec![],
            target_language: Some("ru".to_string()),
            delivery_delay: Duration::from_millis(1500),
            render_config: RenderConfig::default(),
        }
    }
}

/// Formats items and delivers them to each configured channel independently
pub struct Notifier<M, T>
where
    M: MessageChannel + ?Sized,
    T: Translator + ?Sized,
{
    sender: Arc<M>,
    translator: Arc<T>,
    renderer: Renderer,
    config: NotifierConfig,
}

impl<M, T> Notifier<M, T>
where
    M: MessageChannel + ?Sized,
    T: Translator + ?Sized,
{
    pub fn new(sender: Arc<M>, translator: Arc<T>, config: NotifierConfig) -> Self {
        let renderer = Renderer::new(config.render_config.clone());
        Self {
            sender,
            translator,
            renderer,
            config,
        }
    }

    pub fn channels(&self) -> &[String] {
        &self.config.channels
    }

    /// Translate and render the message text for an item
    pub async fn render_message(&self, item: &CandidateItem, category: &Category) -> String {
        let title = self.translate_or_original(&item.title).await;
        let summary = self.translate_or_original(&item.summary).await;

        self.renderer.render(&MessageParts {
            title: &title,
            summary: &summary,
            source_name: &item.source_name,
            url: &item.url,
            category_label: &category.label,
        })
    }

    /// Deliver an item to every channel. A failing channel never affects the others.
    pub async fn deliver(&self, item: &CandidateItem, category: &Category) -> DeliveryReport {
        let text = self.render_message(item, category).await;
        let mut report = DeliveryReport::default();

        for channel in &self.config.channels {
            let message = OutgoingMessage {
                destination: channel.clone(),
                text: text.clone(),
                format: MessageFormat::Html,
                item_url: item.url.clone(),
            };

            let result = match self.sender.send(&message).await {
                Ok(sent) => {
                    tracing::info!(
                        channel = %channel,
                        platform = self.sender.platform(),
                        message_id = %sent.id,
                        url = %item.url,
                        "Delivered item"
                    );
                    Ok(sent.id)
                }
                Err(e) => {
                    tracing::error!(
                        channel = %channel,
                        platform = self.sender.platform(),
                        url = %item.url,
                        error = %e,
                        "Failed to deliver item"
                    );
                    Err(e.to_string())
                }
            };

            report.outcomes.push(ChannelOutcome {
                channel: channel.clone(),
                result,
            });
        }

        report
    }

    /// Wait out the pacing delay between two deliveries
    pub async fn pause_between_deliveries(&self) {
        if !self.config.delivery_delay.is_zero() {
            sleep(self.config.delivery_delay).await;
        }
    }

    async fn translate_or_original(&self, text: &str) -> String {
        let Some(target) = self.config.target_language.as_deref() else {
            return text.to_string();
        };
        if text.trim().is_empty() {
            return text.to_string();
        }

        match self.translator.translate(text, target).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, target = %target, "Translation failed, using original text");
                text.to_string()
            }
        }
    }
}
