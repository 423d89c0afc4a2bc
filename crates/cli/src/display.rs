use std::time::Duration;

use colored::Colorize;
use events::{ResultPayload, WireMessage};
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal rendering of one attempt: a spinner for progress, a coloured line
/// for the terminal record.
pub struct AttemptDisplay {
    spinner: ProgressBar,
}

impl AttemptDisplay {
    pub fn new(username: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Looking up {username}..."));
        Self { spinner }
    }

    /// Render `message`; returns `Some(success)` once the terminal record arrives.
    pub fn show(&self, message: &WireMessage) -> Option<bool> {
        match message {
            WireMessage::Progress { message } => {
                self.spinner.println(format!("  {} {}", "›".dimmed(), message));
                self.spinner.set_message(message.clone());
                None
            }
            WireMessage::Result {
                result:
                    ResultPayload::Success {
                        name,
                        total_percentage,
                    },
            } => {
                self.spinner.finish_and_clear();
                println!();
                println!("  {}  {}", "Student:".bold(), name);
                println!("  {}  {}", "Attendance:".bold(), total_percentage.green().bold());
                Some(true)
            }
            WireMessage::Result {
                result: ResultPayload::Rejected { error },
            } => {
                self.spinner.finish_and_clear();
                println!("{} {}", "Rejected:".yellow().bold(), error);
                Some(false)
            }
            WireMessage::Fault { fault } => {
                self.spinner.finish_and_clear();
                println!("{} {}", "Failed:".red().bold(), fault.message);
                Some(false)
            }
        }
    }

    pub fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}
