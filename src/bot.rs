//! Receive loop: filters for messages that mention the bot and hands them to the registry.

use tracing::{debug, error, info, warn};

use crate::commands::{Dispatcher, Registry};
use crate::config::SendErrorPolicy;
use crate::error::BotError;
use crate::slack::{mention_token, Message, Transport};

pub struct Bot<T: Transport> {
    transport: T,
    registry: Registry,
    mention: String,
    bot_name: String,
    on_send_error: SendErrorPolicy,
}

impl<T: Transport> Bot<T> {
    pub fn new(transport: T, registry: Registry, self_id: &str, bot_name: impl Into<String>) -> Self {
        Self {
            transport,
            registry,
            mention: mention_token(self_id),
            bot_name: bot_name.into(),
            on_send_error: SendErrorPolicy::default(),
        }
    }

    pub fn with_send_error_policy(mut self, policy: SendErrorPolicy) -> Self {
        self.on_send_error = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn fallback(&self) -> String {
        format!(
            "I don't understand what you are asking me to do.\n\
             Please ensure that your message doesn't contain any spelling mistake.\n\
             You can type '@{} help' to see a list of the available tasks I can perform.",
            self.bot_name
        )
    }

    /// Handle one inbound event. Events not addressed to the bot are ignored.
    pub async fn handle(&self, message: &Message) -> Result<(), BotError> {
        let Some(input) = message.addressed_to(&self.mention) else {
            return Ok(());
        };

        info!("📨 {} in {}: \"{input}\"", self.mention, message.channel);
        let dispatcher = Dispatcher::new(&self.transport, &self.registry, &self.bot_name);
        if !dispatcher.dispatch(message, input).await? {
            debug!("Sending fallback reply");
            dispatcher.reply(message, self.fallback()).await?;
        }
        Ok(())
    }

    /// Receive and handle events until the connection fails.
    ///
    /// Receive errors always end the loop. Send errors end it under
    /// [`SendErrorPolicy::Exit`] and are logged and skipped under `Continue`.
    pub async fn run(&self) -> Result<(), BotError> {
        loop {
            let message = self.transport.receive().await?;
            if let Err(e) = self.handle(&message).await {
                match self.on_send_error {
                    SendErrorPolicy::Exit => {
                        error!("Failed to reply: {e}");
                        return Err(e);
                    }
                    SendErrorPolicy::Continue => warn!("Failed to reply, continuing: {e}"),
                }
            }
        }
    }
}
