//! mario: a Slack bot that answers commands addressed to it over the RTM API.

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod slack;

#[cfg(test)]
mod testing;
