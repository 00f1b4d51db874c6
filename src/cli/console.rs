//! Terminal I/O: prompts, the Genie information block, colored notices.

use std::fmt::Write as _;
use std::io::Write as _;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::GenieError;
use crate::genie::{MessageSnapshot, StartedConversation};
use crate::util::sweep::SweepReport;

/// Line reader over stdin.
pub struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `question` and read one line. `None` at end of input.
    pub async fn ask(&mut self, question: &str, inline: bool) -> std::io::Result<Option<String>> {
        if inline {
            print!("{question}");
        } else {
            println!("{question}");
        }
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }
}

pub fn print_menu() {
    println!("{}", "=== Main Menu ===".bold());
    println!("1. Call Genie API");
    println!("2. Call Azure AI Agent");
    println!("3. Exit");
}

/// The Genie information block printed after every status observation.
pub fn genie_info_block(
    conversation: &StartedConversation,
    snapshot: &MessageSnapshot,
    result: &str,
) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "=== Genie Information ===");
    let _ = writeln!(block, "Message ID: {}", conversation.message_id);
    let _ = writeln!(block, "Conversation ID: {}", conversation.conversation_id);
    let _ = writeln!(block, "Status: {}", snapshot.status);
    let _ = writeln!(block, "Attachments ID: {}", snapshot.attachment_id);
    let _ = writeln!(block, "Query Description: {}", snapshot.description);
    let _ = writeln!(block, "Generated Query: {}", snapshot.query);
    let _ = writeln!(block, "Query Result: {result}");
    let _ = writeln!(block, "=========================");
    block
}

pub fn print_genie_info(conversation: &StartedConversation, snapshot: &MessageSnapshot, result: &str) {
    println!("{}", genie_info_block(conversation, snapshot, result).cyan());
}

/// Streamed assistant text, no newline.
pub fn print_delta(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

pub fn print_notice(message: &str) {
    println!("{}", message.yellow());
}

pub fn print_error(err: &GenieError) {
    eprintln!("{} {err}", "Error:".red().bold());
    let hint = err.recovery_suggestion().to_string();
    if !hint.is_empty() {
        eprintln!("  {}", hint.dimmed());
    }
}

pub fn print_sweep_report(report: &SweepReport) {
    if !report.removed.is_empty() {
        print_notice(&format!("Removed {} generated image(s).", report.removed.len()));
    }
    for failure in &report.failures {
        eprintln!("{} {failure}", "Cleanup:".yellow());
    }
}
