use crate::config::RewardsSection;
use crate::notify::{Notification, NotificationLevel, Notifier};
use crate::ui::icons::{CHECK, CROSS, GIFT, INFO, MONEY};
use crate::validate::FieldErrors;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal rendering for the referral popup.
///
/// Notifications and spinners share one `MultiProgress` so toasts printed
/// while a request is pending do not tear the spinner line.
#[derive(Clone)]
pub struct PopupUI {
    multi: MultiProgress,
}

impl Default for PopupUI {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupUI {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// The landing section shown before the popup opens.
    pub fn banner(&self, rewards: &RewardsSection) {
        self.print_line("");
        self.print_line(format!(
            "{}{}",
            GIFT,
            style("Refer & Earn").bold().magenta()
        ));
        self.print_line(format!(
            "  {}{} {}   {} {}",
            MONEY,
            style(&rewards.referrer).green().bold(),
            style("You Earn").dim(),
            style(&rewards.referee).green().bold(),
            style("They Earn").dim()
        ));
        self.print_line("");
    }

    pub fn heading(&self, title: &str) {
        self.print_line("");
        self.print_line(format!("{}", style(title).bold().underlined()));
    }

    /// List each field message under the form.
    pub fn field_errors(&self, errors: &FieldErrors) {
        for error in errors.iter() {
            self.print_line(format!(
                "  {} {}",
                style(error.field).yellow(),
                style(&error.message).red()
            ));
        }
    }

    /// Start a spinner that runs until the returned guard is dropped.
    pub fn pending(&self, msg: &str) -> Pending {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("progress bar template is a valid static string");

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style);
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Pending { bar }
    }
}

impl Notifier for PopupUI {
    fn notify(&self, notification: Notification) {
        self.print_line(format_notification(&notification));
    }
}

/// One styled toast line.
pub fn format_notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Success => {
            format!("{}{}", CHECK, style(&notification.message).green())
        }
        NotificationLevel::Info => format!("{}{}", INFO, style(&notification.message).cyan()),
        NotificationLevel::Error => format!("{}{}", CROSS, style(&notification.message).red()),
    }
}

/// A running spinner; cleared when dropped.
pub struct Pending {
    bar: ProgressBar,
}

impl Drop for Pending {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_lines_carry_message() {
        let line = format_notification(&Notification::success("OTP sent to your email"));
        assert!(console::strip_ansi_codes(&line).contains("OTP sent to your email"));

        let line = format_notification(&Notification::error("Invalid OTP"));
        assert!(console::strip_ansi_codes(&line).contains("Invalid OTP"));

        let line = format_notification(&Notification::info("Your details are kept"));
        assert!(console::strip_ansi_codes(&line).contains("Your details are kept"));
    }

    #[test]
    fn test_error_and_success_lines_differ() {
        let ok = format_notification(&Notification::success("x"));
        let err = format_notification(&Notification::error("x"));
        assert_ne!(ok, err);
    }

    #[test]
    fn test_pending_guard_clears_on_drop() {
        let ui = PopupUI::new();
        let pending = ui.pending("Sending code...");
        assert!(!pending.bar.is_finished());
        let bar = pending.bar.clone();
        drop(pending);
        assert!(bar.is_finished());
    }
}
