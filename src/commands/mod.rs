pub mod start;

use log::{info, warn};
use teloxide::{prelude::*, types::UpdateKind, utils::command::BotCommands};

use crate::client::{BotClient, ClientError};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    Handled(Command),
    Ignored,
}

/// Routes text messages carrying a known command to their handler.
/// Anything else is acknowledged and dropped.
pub struct CommandRouter {
    bot_username: String,
}

impl CommandRouter {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
        }
    }

    pub async fn dispatch(
        &self,
        client: &dyn BotClient,
        update: &Update,
    ) -> Result<Dispatch, ClientError> {
        let msg = match &update.kind {
            UpdateKind::Message(msg) => msg,
            UpdateKind::Error(_) => {
                warn!("Ignoring unparseable update {}", update.id);
                return Ok(Dispatch::Ignored);
            }
            _ => {
                info!("Ignoring non-message update {}", update.id);
                return Ok(Dispatch::Ignored);
            }
        };

        let Some(command) = self.parse(msg) else {
            info!("Ignoring message without a known command in chat {}", msg.chat.id);
            return Ok(Dispatch::Ignored);
        };

        match command {
            Command::Start => start::process(client, msg).await?,
        }

        Ok(Dispatch::Handled(command))
    }

    fn parse(&self, msg: &Message) -> Option<Command> {
        // Arguments (e.g. deep-link payloads) don't select a handler.
        let token = msg.text()?.split_whitespace().next()?;

        Command::parse(token, &self.bot_username).ok()
    }
}
