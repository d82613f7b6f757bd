//! Terminal prompts: a filterable selector and a plain or masked text input.
//!
//! [`Selector`] and [`TextInput`] are pure state machines driven by
//! [`KeyInput`] events. [`TerminalPrompter`] owns the terminal and feeds them.

use crate::lib::errors::PromptError;

mod input;
mod selector;
mod terminal;
pub mod wizard;

pub use input::TextInput;
pub use selector::Selector;
pub use terminal::TerminalPrompter;
pub use wizard::{ConfigWizard, WizardSummary};

/// One selectable entry: the identifier returned on confirm and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Key events understood by the prompt state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Up,
    Down,
    Enter,
    Escape,
    /// Ctrl-C.
    Interrupt,
}

/// Prompt lifecycle. `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    Editing,
    Confirmed(String),
    Cancelled,
}

impl PromptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PromptState::Editing)
    }
}

/// Visual role of a rendered line; the terminal driver maps it to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Field,
    Placeholder,
    Muted,
    Selected,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub style: LineStyle,
    pub text: String,
}

impl ViewLine {
    pub fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::new(LineStyle::Normal, "")
    }
}

/// Prompt surface used by the setup wizard.
pub trait Prompter {
    /// Pick one option; `current` pre-selects the option with that identifier.
    fn select(
        &mut self,
        title: &str,
        placeholder: &str,
        options: &[SelectOption],
        current: &str,
    ) -> Result<String, PromptError>;

    fn input(&mut self, title: &str, placeholder: &str, initial: &str)
        -> Result<String, PromptError>;

    /// Masked input. Never pre-filled.
    fn password(&mut self, title: &str, placeholder: &str) -> Result<String, PromptError>;
}
