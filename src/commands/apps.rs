//! `apps`: lists the organisation's applications on Wercker.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::commands::{Command, Dispatcher, Invocation, Trigger};
use crate::config::CiConfig;
use crate::error::BotError;
use crate::slack::Message;

const NAME: &str = "apps";
/// Longer form users may still type.
const ALIAS: &str = "list apps";

#[derive(Debug, Deserialize)]
struct Application {
    name: String,
}

pub struct Apps {
    trigger: Trigger,
    alias: Trigger,
    http: reqwest::Client,
    api_url: String,
    org: String,
    token: String,
}

impl Apps {
    pub fn new(ci: &CiConfig) -> Result<Self, BotError> {
        Ok(Self {
            trigger: Trigger::new(NAME)?,
            alias: Trigger::new(ALIAS)?,
            http: reqwest::Client::new(),
            api_url: ci.api_url.trim_end_matches('/').to_string(),
            org: ci.org.clone(),
            token: ci.token.clone(),
        })
    }

    async fn fetch(&self) -> Result<Vec<Application>, reqwest::Error> {
        self.http
            .get(format!("{}/applications/{}", self.api_url, self.org))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn list(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError> {
        let text = match self.fetch().await {
            Ok(apps) => {
                info!("Listing {} Wercker app(s)", apps.len());
                let mut text = "The following apps are currently available on Wercker:\n".to_string();
                for app in &apps {
                    text.push_str(&app.name);
                    text.push('\n');
                }
                text
            }
            Err(e) => {
                warn!("Wercker request failed: {e}");
                "Sorry, I couldn't get the list of apps from Wercker right now.".to_string()
            }
        };
        dispatcher.reply(message, text).await?;
        Ok(())
    }
}

#[async_trait]
impl Command for Apps {
    fn name(&self) -> &str {
        NAME
    }

    async fn hear(
        &self,
        dispatcher: &Dispatcher<'_>,
        message: &Message,
        input: &str,
    ) -> Result<bool, BotError> {
        let parsed = self.trigger.parse(input).or_else(|| self.alias.parse(input));
        let Some(invocation) = parsed else {
            return Ok(false);
        };

        match invocation {
            Invocation::Bare => self.list(dispatcher, message).await?,
            Invocation::Help | Invocation::Args(_) => self.help(dispatcher, message).await?,
        }
        Ok(true)
    }

    async fn help(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError> {
        let text = format!(
            "<apps> will list the {} applications currently available on Wercker.\nThis command does not take any option.",
            self.org
        );
        dispatcher.reply(message, text).await?;
        Ok(())
    }
}
