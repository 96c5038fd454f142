//! `say`: repeats the given text in the channel.

use async_trait::async_trait;

use crate::commands::{Command, Dispatcher, Invocation, Trigger};
use crate::error::BotError;
use crate::slack::Message;

const NAME: &str = "say";

pub struct Say {
    trigger: Trigger,
}

impl Say {
    pub fn new() -> Result<Self, BotError> {
        Ok(Self {
            trigger: Trigger::new(NAME)?,
        })
    }
}

/// Join the arguments back into one line and drop a surrounding pair of quotes.
fn utterance(args: &[&str]) -> String {
    let joined = args.join(" ");
    joined
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(joined)
}

#[async_trait]
impl Command for Say {
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
            Invocation::Bare | Invocation::Help => self.help(dispatcher, message).await?,
            Invocation::Args(args) => {
                dispatcher.reply(message, utterance(&args)).await?;
            }
        }
        Ok(true)
    }

    async fn help(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError> {
        let text = format!(
            "Use this command to tell me to send a message to Slack.\nUsage:\n- @{} say \"the message to post to Slack\"",
            dispatcher.bot_name()
        );
        dispatcher.reply(message, text).await?;
        Ok(())
    }
}
