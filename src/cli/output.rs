//! Terminal and JSON output

use crate::core::{Declined, Note, Status, Ticket};
use crate::error::Result;
use crate::service::Page;
use chrono::{DateTime, Local, Utc};
use colored::{Color, Colorize};
use serde::Serialize;

/// Formats command results for humans or as JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    /// Create a formatter; `no_color` disables ANSI colors process-wide
    #[must_use]
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {message}", "!".yellow().bold());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "Error:".red().bold());
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Report a declined operation
    pub fn declined(&self, operation: &str, reason: Declined) -> Result<()> {
        if self.json {
            return self.print_json(&serde_json::json!({
                "status": "declined",
                "operation": operation,
                "declined": reason,
                "message": reason.to_string(),
            }));
        }
        self.warning(&format!("Cannot {operation}: {reason}"));
        Ok(())
    }

    /// Full ticket view
    pub fn print_ticket(&self, ticket: &Ticket) -> Result<()> {
        if self.json {
            return self.print_json(ticket);
        }

        println!("{}", format!("═══ ModReq {} ═══", ticket.id).cyan().bold());
        println!("{} {}", "Player:".cyan(), ticket.reporter.name);

        let mut status = status_label(ticket.status);
        if let Some(staff) = &ticket.claimed_by {
            status = format!("{status} {}", format!("(claimed by {})", staff.name).dimmed());
        }
        println!("{} {status}", "Status:".cyan());
        println!("{} {}", "Created:".cyan(), local_time(&ticket.created_at));
        println!("{} {}", "Updated:".cyan(), local_time(&ticket.updated_at));
        if let Some(closed_at) = &ticket.closed_at {
            match ticket.resolved_by() {
                Some(staff) => println!(
                    "{} {} by {}",
                    format!("{}:", ticket.status).cyan(),
                    local_time(closed_at),
                    staff.name
                ),
                None => println!("{} {}", "Closed:".cyan(), local_time(closed_at)),
            }
        }

        println!("{}", "Description:".cyan());
        println!("  {}", ticket.description);

        if let Some(location) = &ticket.location {
            println!("{} {location}", "Location:".cyan());
        }

        if ticket.notes.is_empty() {
            println!("{} {}", "Notes:".cyan(), "None".dimmed());
        } else {
            println!("{}", "Notes:".cyan());
            for note in &ticket.notes {
                println!("  {}", note_line(note));
            }
        }
        Ok(())
    }

    /// Paged ticket listing
    pub fn print_page(&self, page: &Page<Ticket>) -> Result<()> {
        if self.json {
            return self.print_json(page);
        }

        if page.items.is_empty() {
            self.info("No mod requests found.");
            return Ok(());
        }

        println!(
            "{}",
            format!("═══ Mod Requests (page {}/{}) ═══", page.page, page.page_count)
                .cyan()
                .bold()
        );
        for ticket in &page.items {
            let claim = ticket
                .claimed_by
                .as_ref()
                .map(|staff| format!(" [{}]", staff.name))
                .unwrap_or_default();
            println!(
                "{} {} {}{}",
                ticket.id.to_string().bold(),
                status_label(ticket.status),
                ticket.reporter.name,
                claim.dimmed()
            );
            println!(
                "  {} {}",
                local_time(&ticket.created_at).dimmed(),
                truncate(&ticket.description, 60)
            );
        }
        if page.has_next() {
            self.info(&format!("Use --page {} for more", page.page + 1));
        }
        self.info(&format!(
            "Showing {} of {} requests",
            page.items.len(),
            page.total
        ));
        Ok(())
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Open => Color::BrightGreen,
        Status::Elevated => Color::Yellow,
        Status::Completed => Color::Green,
        Status::Closed => Color::BrightBlack,
    }
}

fn status_label(status: Status) -> String {
    status.display_name().color(status_color(status)).to_string()
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn note_line(note: &Note) -> String {
    format!(
        "{} {}: {}",
        local_time(&note.created_at).dimmed(),
        note.author.name.bold(),
        note.content
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
