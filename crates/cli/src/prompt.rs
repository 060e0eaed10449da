//! Terminal session-expiry prompt

use async_trait::async_trait;
use cutline_app::ExpiryPrompt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Prints the expiry message and waits for Enter
pub struct TerminalPrompt;

#[async_trait]
impl ExpiryPrompt for TerminalPrompt {
    async fn acknowledge(&self, message: &str) {
        eprintln!("{message}");
        eprintln!("Press Enter to continue.");

        let mut line = String::new();
        if let Err(e) = BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            warn!("Could not read acknowledgment: {e}");
        }
    }
}
