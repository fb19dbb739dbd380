//! Interactive chat command for Sidekick
//!
//! Renders the conversation in the terminal, streams replies as they
//! arrive, and keeps the history archive and attached context in sync.

use anyhow::Result;
use futures_util::StreamExt;
use std::io::{self, Write};
use tracing::{debug, warn};

use crate::ai::chat::{with_context, ChatClient, ChatMessage};
use crate::ai::ApiError;
use crate::config::Config;
use crate::context::{ContextDraft, ContextStore};
use crate::history::HistoryArchive;
use crate::storage::FileStorage;

// ANSI color codes from design system
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const ERROR: &str = "\x1b[38;2;239;154;154m";        // #EF9A9A
    pub const AI_ACCENT: &str = "\x1b[38;2;255;202;40m";     // #FFCA28
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
    pub const FG: &str = "\x1b[38;2;212;212;215m";           // #D4D4D7
}

// Unicode symbols
mod symbols {
    pub const AI_ICON: &str = "󰌤";
    pub const USER_ICON: &str = ">";
    pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    pub const SUCCESS: &str = "󰄂";
    pub const ERROR: &str = "󰅚";
    pub const DIVIDER: &str = "─";
}

/// One interactive session: live turns plus the stores behind them.
struct ChatSession {
    client: ChatClient,
    store: ContextStore,
    archive: Option<HistoryArchive>,
    turns: Vec<ChatMessage>,
    record_id: Option<String>,
    stream: bool,
}

/// Main chat loop
pub async fn run(config: Config, initial_prompt: Option<String>) -> Result<()> {
    // The window size is advertised to the user only; item pruning has its
    // own fixed ceiling.
    debug!("configured context window: {} tokens", config.context.window_size);

    let client = ChatClient::from_config(&config)?;
    let storage = FileStorage::open_default()?;
    let store = ContextStore::load(Box::new(storage));

    let archive = if config.general.save_history {
        match super::history::open_archive() {
            Ok(archive) => Some(archive),
            Err(e) => {
                warn!("History archiving disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut session = ChatSession {
        client,
        store,
        archive,
        turns: Vec::new(),
        record_id: None,
        stream: config.api.stream,
    };

    print_banner(session.client.model(), session.store.len());

    if let Some(prompt) = initial_prompt {
        session.send(&prompt).await;
    }

    loop {
        let input = match read_input() {
            Some(i) => i,
            None => {
                println!();
                break;
            }
        };

        if let Some(should_break) = session.handle_command(&input).await {
            if should_break {
                break;
            }
            continue;
        }

        session.send(&input).await;
    }

    println!();
    Ok(())
}

impl ChatSession {
    async fn send(&mut self, prompt: &str) {
        print_user_message(prompt);
        self.turns.push(ChatMessage::user(prompt));

        let messages = with_context(self.store.serialize(), &self.turns);

        let reply = if self.stream {
            self.send_streaming(messages).await
        } else {
            self.send_blocking(messages).await
        };

        match reply {
            Ok(content) => {
                self.turns.push(ChatMessage::assistant(content));
                self.save_history();
            }
            Err(e) => {
                // Drop the failed turn so it can be retried cleanly.
                self.turns.pop();
                print_error(&describe_error(&e));
            }
        }
    }

    async fn send_blocking(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        print_thinking();
        let result = self.client.complete(messages).await;
        clear_thinking();

        result.map(|message| {
            print_ai_message(&message.content);
            message.content
        })
    }

    async fn send_streaming(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        print_thinking();
        let mut stream = match self.client.stream(messages).await {
            Ok(stream) => {
                clear_thinking();
                stream
            }
            Err(e) => {
                clear_thinking();
                return Err(e);
            }
        };

        print_ai_header();
        let mut content = String::new();

        while let Some(delta) = stream.next().await {
            match delta {
                Ok(text) => {
                    print!("{}", text);
                    io::stdout().flush().ok();
                    content.push_str(&text);
                }
                Err(e) => {
                    println!();
                    if content.is_empty() {
                        return Err(e);
                    }
                    // Keep the partial reply; the failure is terminal anyway.
                    print_error(&format!("stream interrupted: {}", describe_error(&e)));
                    break;
                }
            }
        }

        println!();
        print_divider();
        Ok(content)
    }

    fn save_history(&mut self) {
        let Some(archive) = &self.archive else {
            return;
        };

        match &self.record_id {
            None => match archive.create(None, self.turns.clone()) {
                Ok(item) => self.record_id = Some(item.id),
                Err(e) => warn!("Failed to archive conversation: {:#}", e),
            },
            Some(id) => match archive.update_messages(id, self.turns.clone()) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!("History record {} vanished; recreating", id);
                    match archive.create(None, self.turns.clone()) {
                        Ok(item) => self.record_id = Some(item.id),
                        Err(e) => warn!("Failed to archive conversation: {:#}", e),
                    }
                }
                Err(e) => warn!("Failed to update history record: {:#}", e),
            },
        }
    }

    /// Handle slash commands. Returns Some(true) to leave the loop.
    async fn handle_command(&mut self, input: &str) -> Option<bool> {
        if !input.starts_with('/') {
            return None;
        }

        match input.to_lowercase().as_str() {
            "/exit" | "/quit" | "/q" => {
                print_success("Goodbye!");
                Some(true)
            }
            "/help" | "/h" | "/?" => {
                print_help();
                Some(false)
            }
            "/clear" | "/c" => {
                self.turns.clear();
                self.record_id = None;
                print_success("Conversation cleared");
                Some(false)
            }
            "/model" | "/m" => {
                println!(
                    "\n{}  Current model: {}{}",
                    colors::MUTED,
                    self.client.model(),
                    colors::RESET
                );
                Some(false)
            }
            "/context" => {
                self.print_context();
                Some(false)
            }
            "/attach" => {
                if self.turns.is_empty() {
                    print_error("Nothing to attach yet");
                } else {
                    let item = self.store.add(ContextDraft::from_conversation(&self.turns));
                    print_success(&format!(
                        "Conversation attached as context (relevance {})",
                        item.relevance
                    ));
                }
                Some(false)
            }
            "/history" => {
                self.print_history();
                Some(false)
            }
            "/status" => {
                match self.client.health().await {
                    Ok(health) => print_success(&format!(
                        "Endpoint {} (server v{})",
                        health.status, health.version
                    )),
                    Err(e) => print_error(&describe_error(&e)),
                }
                Some(false)
            }
            _ => {
                print_error(&format!("Unknown command: {}", input));
                println!("{}  Type /help for available commands{}", colors::MUTED, colors::RESET);
                Some(false)
            }
        }
    }

    fn print_context(&self) {
        let items = self.store.list();
        if items.is_empty() {
            println!("\n{}  No context attached{}", colors::MUTED, colors::RESET);
            return;
        }

        println!(
            "\n{}{}  {} context item(s):{}",
            colors::PRIMARY,
            colors::BOLD,
            items.len(),
            colors::RESET
        );
        for item in items {
            let path = item.path.as_deref().unwrap_or("-");
            println!(
                "{}  {:<12} {:>3}  {}{}",
                colors::MUTED, item.source, item.relevance, path, colors::RESET
            );
        }
    }

    fn print_history(&self) {
        let Some(archive) = &self.archive else {
            println!("\n{}  History archiving is disabled{}", colors::MUTED, colors::RESET);
            return;
        };

        let items = archive.list();
        if items.is_empty() {
            println!("\n{}  No saved conversations{}", colors::MUTED, colors::RESET);
            return;
        }

        println!(
            "\n{}{}  Recent conversations:{}",
            colors::PRIMARY,
            colors::BOLD,
            colors::RESET
        );
        for item in items.iter().take(5) {
            println!(
                "{}  {}  {}{}",
                colors::MUTED,
                item.last_interaction_at.format("%Y-%m-%d %H:%M"),
                item.title,
                colors::RESET
            );
        }
    }
}

fn describe_error(e: &ApiError) -> String {
    if e.is_transient() {
        format!("{} (temporary; try again)", e)
    } else {
        e.to_string()
    }
}

/// Print a horizontal divider
fn print_divider() {
    println!(
        "{}{}{}",
        colors::MUTED,
        symbols::DIVIDER.repeat(55),
        colors::RESET
    );
}

/// Print user message bubble
fn print_user_message(content: &str) {
    println!();
    println!(
        "{}{}  You {}{}",
        colors::PRIMARY, colors::BOLD, colors::RESET, colors::MUTED
    );
    for line in content.lines() {
        println!("{}  │ {}{}", colors::MUTED, colors::FG, line);
    }
    println!("{}  ╰{}─{}", colors::MUTED, symbols::DIVIDER.repeat(50), colors::RESET);
}

/// Print AI response bubble (blocking mode)
fn print_ai_message(content: &str) {
    println!();
    println!(
        "{}{}  {} Sidekick {}{}",
        colors::AI_ACCENT, colors::BOLD, symbols::AI_ICON, colors::RESET, colors::MUTED
    );
    for line in content.lines() {
        println!("{}  │ {}{}", colors::MUTED, colors::FG, line);
    }
    println!("{}  ╰{}─{}", colors::MUTED, symbols::DIVIDER.repeat(50), colors::RESET);
}

/// Print the response header before streamed output
fn print_ai_header() {
    println!();
    println!(
        "{}{}  {} Sidekick{}",
        colors::AI_ACCENT, colors::BOLD, symbols::AI_ICON, colors::RESET
    );
}

/// Print thinking indicator
fn print_thinking() {
    print!(
        "\r{}  {} Sidekick is thinking {}{}",
        colors::AI_ACCENT,
        symbols::AI_ICON,
        symbols::SPINNER[0],
        colors::RESET
    );
    io::stdout().flush().ok();
}

/// Clear thinking indicator
fn clear_thinking() {
    print!("\r{}\r", " ".repeat(50));
    io::stdout().flush().ok();
}

/// Print error message
fn print_error(message: &str) {
    println!(
        "\n{}  {} Error: {}{}",
        colors::ERROR, symbols::ERROR, message, colors::RESET
    );
}

/// Print success message
fn print_success(message: &str) {
    println!(
        "\n{}  {} {}{}",
        colors::SUCCESS, symbols::SUCCESS, message, colors::RESET
    );
}

/// Print help information
fn print_help() {
    println!();
    println!(
        "{}{}  Available Commands:{}",
        colors::PRIMARY, colors::BOLD, colors::RESET
    );
    println!("{}  /help{}     - Show this help message", colors::FG, colors::MUTED);
    println!("{}  /clear{}    - Clear the conversation and start a new record", colors::FG, colors::MUTED);
    println!("{}  /context{}  - List attached context items", colors::FG, colors::MUTED);
    println!("{}  /attach{}   - Save this conversation as a context item", colors::FG, colors::MUTED);
    println!("{}  /history{}  - Show recent conversations", colors::FG, colors::MUTED);
    println!("{}  /model{}    - Show current model", colors::FG, colors::MUTED);
    println!("{}  /status{}   - Check endpoint health", colors::FG, colors::MUTED);
    println!("{}  /exit{}     - Exit the chat", colors::FG, colors::MUTED);
    println!();
    println!("{}  Tips:{}", colors::PRIMARY, colors::RESET);
    println!("{}  • Attach files before asking: sidekick context add-file <path>", colors::MUTED);
    println!("{}  • Attached context rides along with every prompt", colors::MUTED);
    println!();
}

/// Read a line of input from the user
fn read_input() -> Option<String> {
    loop {
        print!(
            "\n{}  {} {}",
            colors::PRIMARY, symbols::USER_ICON, colors::RESET
        );
        io::stdout().flush().ok();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => return None, // EOF
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                return Some(trimmed.to_string());
            }
            Err(_) => return None,
        }
    }
}

/// Print banner with model and context info
fn print_banner(model: &str, context_items: usize) {
    println!();
    println!(
        "{}{}╭─────────────────────────────────────────────────────╮{}",
        colors::PRIMARY, colors::BOLD, colors::RESET
    );
    println!(
        "{}│{}   Sidekick v{} - context-aware chat              {}│{}",
        colors::PRIMARY,
        colors::RESET,
        env!("CARGO_PKG_VERSION"),
        colors::PRIMARY,
        colors::RESET
    );
    println!(
        "{}╰─────────────────────────────────────────────────────╯{}",
        colors::PRIMARY, colors::RESET
    );
    println!(
        "{}  {} Model: {}{}",
        colors::AI_ACCENT, symbols::AI_ICON, model, colors::RESET
    );
    println!(
        "{}  Context items attached: {}{}",
        colors::MUTED, context_items, colors::RESET
    );
    println!(
        "{}  Commands: /help, /context, /attach, /exit{}",
        colors::MUTED, colors::RESET
    );
    print_divider();
}
