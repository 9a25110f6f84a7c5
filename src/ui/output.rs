use crate::inspector::Inspector;
use crate::models::Session;
use chrono::Local;
use colored::*;
use std::io::{self, Write};

/// Print a streamed fragment as soon as it arrives.
pub fn print_delta(delta: &str) {
    print!("{}", delta);
    let _ = io::stdout().flush();
}

/// Messages the client writes itself, such as the apology on failure.
pub fn display_notice(text: &str) {
    println!("{}", text.yellow());
}

pub fn display_error(text: &str) {
    eprintln!("{} {}", "Error:".red(), text);
}

pub fn display_sessions(sessions: &[Session], active_id: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No chat sessions.".dimmed());
        return;
    }

    for session in sessions {
        let marker = if Some(session.id.as_str()) == active_id {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        let created = session
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        println!(
            "{} {}  {}  {}",
            marker,
            session.id.dimmed(),
            session.title.bold(),
            format!(
                "({} messages, {}, {})",
                session.messages.len(),
                session.agent,
                created
            )
            .dimmed()
        );
    }
}

pub fn display_inspector(inspector: &Inspector<'_>) {
    println!();
    for (i, line) in inspector.to_string().lines().enumerate() {
        if i == 0 {
            println!("{}", line.cyan());
        } else if line.starts_with("  ") {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line.bold());
        }
    }
}
