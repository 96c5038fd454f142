//! `hello`: a greeting.

use async_trait::async_trait;

use crate::commands::{Command, Dispatcher, Invocation, Trigger};
use crate::error::BotError;
use crate::slack::Message;

const NAME: &str = "hello";

/// Reply sent for a bare `hello`.
pub const GREETING: &str = "Yo";

pub struct Hello {
    trigger: Trigger,
}

impl Hello {
    pub fn new() -> Result<Self, BotError> {
        Ok(Self {
            trigger: Trigger::new(NAME)?,
        })
    }
}

#[async_trait]
impl Command for Hello {
    fn name(&self) -> &str {
        NAME
    }

    async fn hear(
        &self,
        dispatcher: &Dispatcher<'_>,
        message: &Message,
        input: &str,
    ) -> Result<bool, BotError> {
        let Some(invocation) = self.trigger.parse(input) else {
            return Ok(false);
        };

        match invocation {
            Invocation::Bare => {
                dispatcher.reply(message, GREETING).await?;
            }
            Invocation::Help | Invocation::Args(_) => self.help(dispatcher, message).await?,
        }
        Ok(true)
    }

    async fn help(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError> {
        dispatcher
            .reply(
                message,
                "The <hello> command simply prints a hello message to Slack.\n\
                 This command doesn't take any other options",
            )
            .await?;
        Ok(())
    }
}
