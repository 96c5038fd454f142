//! Command handlers and the ordered registry that dispatches to them.
//!
//! Every handler implements [`Command`]. The [`Registry`] holds them in
//! priority order; a [`Dispatcher`] offers input text to each in turn and
//! stops at the first one that claims it.

use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::error::BotError;
use crate::slack::{Message, Transport};

pub mod apps;
pub mod hello;
pub mod help;
pub mod say;


pub use apps::Apps;
pub use hello::Hello;
pub use help::Help;
pub use say::Say;

/// A chat command.
///
/// `hear` returns `Ok(true)` when the input starts with this command's name,
/// even if the arguments turn out to be unusable; in that case the handler
/// replies with its usage instead. Send failures are returned, not retried.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name used for matching, for registry uniqueness and in help listings.
    fn name(&self) -> &str;

    /// Try to handle `input`. Returns whether this command claimed it.
    async fn hear(
        &self,
        dispatcher: &Dispatcher<'_>,
        message: &Message,
        input: &str,
    ) -> Result<bool, BotError>;

    /// Post this command's usage to the channel of `message`.
    async fn help(&self, dispatcher: &Dispatcher<'_>, message: &Message) -> Result<(), BotError>;
}

/// What followed a command's name in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// Nothing after the name.
    Bare,
    /// A single `help` argument.
    Help,
    /// Any other arguments, whitespace-split.
    Args(Vec<&'a str>),
}

/// Case-insensitive, whole-word matcher for a command name.
#[derive(Debug, Clone)]
pub struct Trigger {
    pattern: Regex,
}

impl Trigger {
    pub fn new(name: &str) -> Result<Self, BotError> {
        let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
        let pattern = Regex::new(&format!(r"(?i)^{}(?:\s+|$)", words.join(r"\s+")))?;
        Ok(Self { pattern })
    }

    /// Parse `input` if it starts with the command name.
    pub fn parse<'a>(&self, input: &'a str) -> Option<Invocation<'a>> {
        let matched = self.pattern.find(input)?;
        let rest: Vec<&str> = input[matched.end()..].split_whitespace().collect();
        Some(match rest.as_slice() {
            [] => Invocation::Bare,
            [arg] if arg.eq_ignore_ascii_case("help") => Invocation::Help,
            _ => Invocation::Args(rest),
        })
    }
}

/// Ordered, immutable set of commands, unique by name.
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
}

impl Registry {
    /// Build a registry; the first command has the highest priority.
    pub fn new(commands: Vec<Box<dyn Command>>) -> Result<Self, BotError> {
        let mut seen = HashSet::new();
        for command in &commands {
            if !seen.insert(command.name().to_lowercase()) {
                return Err(BotError::DuplicateCommand(command.name().to_string()));
            }
        }
        Ok(Self { commands })
    }

    /// Command names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Built-in commands in their dispatch order.
pub fn default_registry(config: &Config) -> Result<Registry, BotError> {
    Registry::new(vec![
        Box::new(Help::new()?),
        Box::new(Hello::new()?),
        Box::new(Say::new()?),
        Box::new(Apps::new(&config.ci)?),
    ])
}

/// Routes input to the registry and gives handlers a way to reply.
pub struct Dispatcher<'a> {
    transport: &'a dyn Transport,
    registry: &'a Registry,
    bot_name: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(transport: &'a dyn Transport, registry: &'a Registry, bot_name: &'a str) -> Self {
        Self {
            transport,
            registry,
            bot_name,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Name users address the bot by, for help texts.
    pub fn bot_name(&self) -> &str {
        self.bot_name
    }

    /// Offer `input` to each command in order. Returns whether one claimed it.
    pub async fn dispatch(&self, message: &Message, input: &str) -> Result<bool, BotError> {
        for command in &self.registry.commands {
            if command.hear(self, message, input).await? {
                debug!(command = command.name(), input, "Command handled input");
                return Ok(true);
            }
        }
        debug!(input, "No command claimed input");
        Ok(false)
    }

    /// Reply in the channel `message` came from. Returns the sequence id.
    pub async fn reply(&self, message: &Message, text: impl Into<String>) -> Result<u64, BotError> {
        self.transport.send(message.reply(text)).await
    }
}
