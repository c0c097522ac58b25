//! Terminal rendering and the printed stand-in for speech output

use chrono::Local;
use mail::{Category, Email, Mailbox, Speaker};

/// Speaker that prints what would be said
pub struct TerminalSpeaker;

impl Speaker for TerminalSpeaker {
    fn speak(&self, text: &str) {
        println!("🔊 {}", text);
    }
}

/// Print the current folder with unread counts
pub fn print_list(mailbox: &Mailbox) {
    let counts = mailbox.unread_counts();
    let folders: Vec<String> = Category::ALL
        .iter()
        .map(|c| {
            let marker = if *c == mailbox.category() { "*" } else { " " };
            format!("{}{} ({})", marker, c, counts.get(*c))
        })
        .collect();
    println!("{}", folders.join("  "));

    let emails = mailbox.filtered();
    if emails.is_empty() {
        println!("  (no emails)");
        return;
    }

    let selected = mailbox.selected().map(|e| &e.id);
    for email in emails {
        println!("{}", list_line(email, selected == Some(&email.id)));
    }
}

fn list_line(email: &Email, selected: bool) -> String {
    format!(
        "{}{} {:<12} {:<16} {:<24} {}",
        if selected { ">" } else { " " },
        if email.read { " " } else { "●" },
        email.id,
        email.date.with_timezone(&Local).format("%b %d %H:%M"),
        truncate(email.sender().short_name(), 24),
        if email.subject.is_empty() { "(no subject)" } else { &email.subject },
    )
}

/// Print a full email
pub fn print_email(email: &Email) {
    println!("From:    {}", email.from);
    println!("To:      {}", email.to);
    println!("Date:    {}", email.date.with_timezone(&Local).to_rfc2822());
    println!("Subject: {}", email.subject);
    println!();
    println!("{}", email.body);
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars.saturating_sub(1)) {
        Some((idx, _)) if s.chars().count() > max_chars => format!("{}…", &s[..idx]),
        _ => s.to_string(),
    }
}
