//! Discord webhook notifier
//!
//! Posts one embed announcing the refreshed map. The embed's timestamp
//! comes from the renderer's chunk database next to the output, when it
//! exists; without it the embed simply carries no timestamp.
//!
//! ```yaml
//! webhook:
//!   type: discord
//!   url: https://discord.com/api/webhooks/1234/abcd
//!   link: https://maps.example.net/survival/
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mapforge_core::definition::DefinitionDoc;
use mapforge_core::document::Document;
use mapforge_core::extensions::{Notifier, OwnerRef};
use mapforge_core::{Error, Result};

/// Side artifact whose modification time dates the notification
pub const TIMESTAMP_FILE: &str = "chunks.sqlite";

fn extension_error(message: impl Into<String>) -> Error {
    Error::Extension {
        name: "discord",
        message: message.into(),
    }
}

/// Typed fields of a `type: discord` block
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordWebhookConfig {
    /// Webhook endpoint
    pub url: String,

    /// Public map link placed on the embed
    pub link: String,
}

/// Notifier posting to a Discord webhook
pub struct DiscordWebhook {
    config: DiscordWebhookConfig,
    client: reqwest::Client,
    owner: OwnerRef,
}

/// Construct a [`DiscordWebhook`] from a tagged block
pub fn factory(block: &Document, owner: OwnerRef) -> Result<Arc<dyn Notifier>> {
    let config: DiscordWebhookConfig = block.typed()?;
    Ok(Arc::new(DiscordWebhook {
        config,
        client: reqwest::Client::new(),
        owner,
    }))
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl DiscordWebhook {
    fn payload(&self, doc: &DefinitionDoc) -> WebhookPayload {
        let timestamp = std::fs::metadata(doc.dest.join(TIMESTAMP_FILE))
            .and_then(|metadata| metadata.modified())
            .ok()
            .map(|modified| DateTime::<Utc>::from(modified).to_rfc3339());

        WebhookPayload {
            embeds: vec![Embed {
                title: "Map updated!".to_string(),
                url: self.config.link.clone(),
                timestamp,
            }],
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    async fn push(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()> {
        let doc = self.owner.resolve(context)?;
        let payload = self.payload(&doc);

        let response = self
            .client
            .post(&self.config.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| extension_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(extension_error(format!("webhook returned {}", status)));
        }
        tracing::debug!("Webhook accepted with {}", status);
        Ok(())
    }
}
