//! Interactive prompts
//!
//! Commands never talk to the terminal directly. Confirmation of destructive
//! actions, picking one of several matches and asking for a missing option all go
//! through [`Prompter`], so tests can answer on the user's behalf.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

/// Interactive questions a command may ask the user
pub trait Prompter: Send + Sync {
    /// Yes/no question, defaulting to no
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Single choice; returns the index into `choices`
    fn select(&self, message: &str, choices: &[String]) -> Result<usize>;

    /// Free-text answer
    fn input(&self, message: &str) -> Result<String>;
}

/// Prompts on the controlling terminal using dialoguer
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    /// Prompter on the controlling terminal
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()?;
        Ok(answer)
    }

    fn select(&self, message: &str, choices: &[String]) -> Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact()?;
        Ok(index)
    }

    fn input(&self, message: &str) -> Result<String> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(message)
            .interact_text()?;
        Ok(answer)
    }
}
