//! Chat - streaming product assistant in the terminal.

use std::io::Write;

use dashboard::render;
use shared::chat::ChatEntry;
use shared::{ApiClient, ChatController, ChatSession, Config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Prints the reply as it streams: the typing placeholder first, then only the
/// newly arrived suffix of the partial buffer.
#[derive(Default)]
struct StreamPrinter {
    typing_shown: bool,
    printed: usize,
}

impl StreamPrinter {
    fn update(&mut self, session: &ChatSession) {
        let view = session.view();
        let mut stdout = std::io::stdout();

        if view.typing && !self.typing_shown {
            let _ = write!(stdout, "assistant is typing...");
            self.typing_shown = true;
        }
        if let Some(partial) = view.partial {
            if self.printed == 0 && self.typing_shown {
                // Drop the placeholder once bytes arrive.
                let _ = write!(stdout, "\r\x1b[2K");
                self.typing_shown = false;
            }
            if partial.len() > self.printed {
                let _ = write!(stdout, "\x1b[2m{}\x1b[0m", &partial[self.printed..]);
                self.printed = partial.len();
            }
        }
        let _ = stdout.flush();
    }

    fn finish(&self) {
        if self.typing_shown {
            print!("\r\x1b[2K");
        } else if self.printed > 0 {
            println!();
        }
    }
}

async fn send(chat: &mut ChatController, line: &str) {
    let mut printer = StreamPrinter::default();
    let trimmed = line.trim();

    let outcome = match trimmed.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
        Some(n) if n >= 1 => {
            if let Some(text) = chat.session().suggestion(n - 1) {
                println!("{}", render::chat_entry(&ChatEntry::User(text.to_string())));
            }
            chat.send_suggestion(n - 1, |s| printer.update(s)).await
        }
        _ => chat.send_message(trimmed, |s| printer.update(s)).await,
    };
    printer.finish();

    match &outcome {
        Ok(false) => println!("(nothing sent)"),
        Ok(true) | Err(_) => {
            if let Some(entry) = chat.session().transcript().last() {
                // The user's echo is already on screen.
                if !matches!(entry, ChatEntry::User(_)) {
                    println!("{}", render::chat_entry(entry));
                }
            }
        }
    }
    if let Err(e) = outcome {
        warn!(error = %e, "Chat message failed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dashboard::init_tracing();

    let config = Config::from_env()?;
    info!(api = %config.api_base_url, "Starting chat");

    let mut chat = ChatController::new(ApiClient::from_config(&config), &config);
    println!("Ask about products. /1../4 sends a suggestion, /quit exits.");
    if chat.open_panel().await {
        println!("{}", render::chat(&chat.session().view()));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "" => continue,
            _ => send(&mut chat, &line).await,
        }
    }

    Ok(())
}
