//! Terminal progress and confirmation for apply and destroy runs.

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over one batch of resources
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(pb);
    }

    fn on_resource_start(&mut self, id: &str, _description: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(id.to_string());
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => "✓".green(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "⊘".yellow(),
        };
        let line = match result {
            ApplyResult::Failed { error } => format!("  {symbol} {id}: {error}"),
            _ => format!("  {symbol} {id}"),
        };

        match &self.bar {
            Some(pb) => {
                pb.println(line);
                pb.inc(1);
            }
            None if !self.quiet || matches!(result, ApplyResult::Failed { .. }) => {
                eprintln!("{line}");
            }
            None => {}
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Yes/no prompt on the terminal
pub struct PromptConfirm {
    assume_yes: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !console::user_attended() {
            bail!("Refusing to prompt without a terminal; pass --yes to proceed");
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(PromptConfirm::new(true).confirm("Apply?").unwrap());
    }

    #[test]
    fn test_quiet_progress_has_no_bar() {
        let mut progress = BarProgress::new(true);
        progress.on_batch_start(3);
        assert!(progress.bar.is_none());
        progress.on_resource_complete("editors", &ApplyResult::Created);
        progress.on_batch_complete();
    }

    #[test]
    fn test_bar_lifecycle() {
        let mut progress = BarProgress::new(false);
        progress.on_batch_start(1);
        progress.on_resource_start("editors", "group editors");
        progress.on_resource_complete("editors", &ApplyResult::Modified);
        assert_eq!(progress.bar.as_ref().map(ProgressBar::position), Some(1));
        progress.on_batch_complete();
        assert!(progress.bar.is_none());
    }
}
