//! `help`: lists the registered commands or forwards to one command's help.

use async_trait::async_trait;
use tracing::info;

use crate::commands::{Command, Dispatcher, Invocation, Trigger};
use crate::error::BotError;
use crate::slack::Message;

const NAME: &str = "help";

pub struct Help {
    trigger: Trigger,
}

impl Help {
    pub fn new() -> Result<Self, BotError> {
        Ok(Self {
            trigger: Trigger::new(NAME)?,
        })
    }

    /// Ask `command` for its help by dispatching `"<command> help"`.
    async fn forward(
        &self,
        dispatcher: &Dispatcher<'_>,
        message: &Message,
        command: &str,
    ) -> Result<(), BotError> {
        let request = format!("{command} help");
        if dispatcher.dispatch(message, &request).await? {
            return Ok(());
        }

        info!(command, "Help requested for unknown command");
        let text = format!(
            "I don't understand what you need help with.\nType \"@{} help\" for a list of tasks I can perform.",
            dispatcher.bot_name()
        );
        dispatcher.reply(message, text).await?;
        Ok(())
    }
}

#[async_trait]
impl Command for Help {
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
            Invocation::Bare => self.help(dispatcher, message).await?,
            Invocation::Help => {
                let text = format!(
                    "The <help> command doesn't take any argument.\nDid you mean \"@{} help\" ?",
                    dispatcher.bot_name()
                );
                dispatcher.reply(message, text).await?;
            }
            Invocation::Args(args) => match args.as_slice() {
                [command] => self.forward(dispatcher, message, command).await?,
                _ => return Ok(false),
            },
        }
        Ok(true)
    }

    async fn help(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError> {
        let mut text = format!(
            "Use this command to get an explanation about how to ask me to perform a task.\n\
             Usage:\n\
             - @{} help <command name>\n\n\
             Here is a list of the tasks I can currently perform:\n",
            dispatcher.bot_name()
        );
        for name in dispatcher.registry().names() {
            text.push_str("- ");
            text.push_str(name);
            text.push('\n');
        }
        dispatcher.reply(message, text).await?;
        Ok(())
    }
}
