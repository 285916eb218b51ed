//! Update Loop and Command Dispatch
//!
//! Long-polls Telegram and routes messages: `/start`, `/help`, `/ask`, and
//! bare text in private chats. Group chatter without a command is ignored
//! so the bot never replies to every message in a group.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use agent_core::{ConversationId, UserQuery};

use crate::orchestrator::Orchestrator;
use crate::telegram::{ChatTransport, TelegramClient, Update};

/// Long-poll timeout handed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause before retrying a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

const WELCOME_MESSAGE: &str = "Hey there! Welcome to CoinCub, your AI Crypto Intelligence Assistant!\n\n\
I can provide real-time analysis on any cryptocurrency. To get started, just ask me a question!\n\n\
Please use the /ask command to ask anything and append your queries after.\n\n\
Example Commands:\n\
- `/ask btc` - Get a full analysis of Bitcoin.\n\
- `/ask eth vs sol` - Compare Ethereum and Solana.\n\
- `/ask what is trending?` - Get the latest market trends.\n\n\
Type `/help` to see all available commands.";

const HELP_MESSAGE: &str = "Here's how you can use CoinCub:\n\n\
/ask [your query]\n\
This is the main command to get crypto analysis. It works in private chats and groups.\n\n\
Examples:\n\
1. Single Token Analysis:\n\
`/ask What is the latest on Dogecoin?`\n\
`/ask price of $ETH`\n\n\
2. Token Comparison:\n\
`/ask compare avax vs sui`\n\n\
3. General Questions:\n\
`/ask what are the top gainers today?`\n\n\
In a PRIVATE CHAT with me, you can also just type your query WITHOUT the `/ask` command.";

const ASK_USAGE: &str = "Please provide a question after the `/ask` command. Example: `/ask btc`";

pub struct Bot {
    client: TelegramClient,
    transport: Arc<dyn ChatTransport>,
    orchestrator: Arc<Orchestrator>,
}

impl Bot {
    pub fn new(
        client: TelegramClient,
        transport: Arc<dyn ChatTransport>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            client,
            transport,
            orchestrator,
        }
    }

    /// Long-poll forever, spawning one task per analysis request.
    pub async fn run(&self) {
        info!("bot is now listening");
        let mut offset = 0_i64;

        loop {
            let updates = match self.client.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.dispatch(update).await;
            }
        }
    }

    async fn dispatch(&self, update: Update) {
        let Some(message) = update.message else { return };
        let Some(text) = message.text else { return };
        let conversation = ConversationId::from(message.chat.id);
        let is_private = message.chat.kind == "private";

        match parse_command(&text) {
            Some(("start", _)) => self.send(&conversation, WELCOME_MESSAGE).await,
            Some(("help", _)) => self.send(&conversation, HELP_MESSAGE).await,
            Some(("ask", args)) => {
                if args.is_empty() {
                    self.send(&conversation, ASK_USAGE).await;
                } else {
                    self.spawn_analysis(conversation, args.to_string());
                }
            }
            // Unknown command: stay quiet.
            Some(_) => {}
            None if is_private => self.spawn_analysis(conversation, text.clone()),
            None => {}
        }
    }

    fn spawn_analysis(&self, conversation: ConversationId, text: String) {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .handle_query(UserQuery { text, conversation })
                .await;
        });
    }

    async fn send(&self, conversation: &ConversationId, text: &str) {
        if let Err(e) = self.transport.send_reply(conversation.as_str(), text).await {
            warn!(conversation = %conversation, error = %e, "command reply failed");
        }
    }
}

/// Split `/cmd@BotName args` into the command name and its argument tail.
fn parse_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let command = head.split('@').next().unwrap_or(head);
    Some((command, args.trim()))
}
