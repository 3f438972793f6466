//! Telegram long-polling front end.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{info, warn};

use crate::command::Command;
use crate::dispatcher::Dispatcher;

/// Command menu shown by Telegram clients
pub fn bot_commands() -> Vec<BotCommand> {
    Command::ALL
        .into_iter()
        .map(|command| BotCommand::new(command.name(), command.description()))
        .collect()
}

/// Poll for updates until interrupted. Each message is handled on its own task.
pub async fn run(bot: Bot, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    let username = me.username().to_string();
    info!("Connected to Telegram as @{}", username);

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("Failed to register command menu: {}", e);
    }

    let username = Arc::new(username);
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let dispatcher = Arc::clone(&dispatcher);
        let username = Arc::clone(&username);
        async move {
            let (Some(text), Some(user)) = (msg.text(), msg.from()) else {
                return respond(());
            };
            let user_id = user.id.0.to_string();

            if let Some(reply) = dispatcher
                .handle_text(&user_id, text, Some(username.as_str()))
                .await
            {
                bot.send_message(msg.chat.id, reply).await?;
            }
            respond(())
        }
    })
    .await;

    info!("Telegram polling stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_menu_covers_all_commands() {
        let commands = bot_commands();
        assert_eq!(commands.len(), Command::ALL.len());
        assert_eq!(commands[0].command, "start");
        assert!(commands.iter().all(|c| !c.description.is_empty()));
    }
}
