use crate::output;
use docshift_core::{ConversionObserver, Converter};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing which converter step is running.
pub struct ConversionSpinner {
    bar: ProgressBar,
}

impl ConversionSpinner {
    /// Create a new spinner; hidden in quiet mode.
    pub fn new(message: &str) -> Self {
        let bar = if output::is_quiet() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Handle for pausing the spinner around prompts.
    pub fn progress_bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    /// Remove the spinner before the command prints its results.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionObserver for ConversionSpinner {
    fn step_started(&self, step: usize, total: usize, converter: &Converter) {
        self.set_message(&format!(
            "[{}/{}] {} -> {}",
            step, total, converter.from, converter.to
        ));
    }

    fn latex_pass(&self, pass: u32) {
        self.set_message(&format!("Running LaTeX (pass {})", pass));
    }
}

impl Drop for ConversionSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
