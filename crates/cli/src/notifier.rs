//! Stand-in for the chat bot: messages are written to stdout

use async_trait::async_trait;
use speedy_core::TelegramId;
use speedy_engine::{Notifier, NotifyError};

pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, recipient: TelegramId, message: &str) -> Result<(), NotifyError> {
        println!("📨 {} <- {}", recipient, message);
        Ok(())
    }
}
