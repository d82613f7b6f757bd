use super::{KeyInput, LineStyle, PromptState, ViewLine};

const MASK_CHAR: char = '•';
const HELP_TEXT: &str = "Enter: confirm • Esc: cancel";

/// Single-line text field, optionally masked.
#[derive(Debug, Clone)]
pub struct TextInput {
    title: String,
    placeholder: String,
    value: String,
    masked: bool,
    state: PromptState,
}

impl TextInput {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>, initial: &str) -> Self {
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
            value: initial.to_string(),
            masked: false,
            state: PromptState::Editing,
        }
    }

    /// A masked field that starts empty.
    pub fn masked(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            masked: true,
            ..Self::new(title, placeholder, "")
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn handle(&mut self, key: KeyInput) -> PromptState {
        if self.state.is_terminal() {
            return self.state.clone();
        }
        match key {
            KeyInput::Escape | KeyInput::Interrupt => self.state = PromptState::Cancelled,
            KeyInput::Enter => self.state = PromptState::Confirmed(self.value.clone()),
            KeyInput::Char(ch) => self.value.push(ch),
            KeyInput::Backspace => {
                self.value.pop();
            }
            KeyInput::Up | KeyInput::Down => {}
        }
        self.state.clone()
    }

    pub fn view(&self) -> Vec<ViewLine> {
        let field = if self.value.is_empty() {
            ViewLine::new(LineStyle::Placeholder, format!("> {}", self.placeholder))
        } else if self.masked {
            let mask: String = self.value.chars().map(|_| MASK_CHAR).collect();
            ViewLine::new(LineStyle::Field, format!("> {mask}"))
        } else {
            ViewLine::new(LineStyle::Field, format!("> {}", self.value))
        };
        vec![
            ViewLine::new(LineStyle::Title, &self.title),
            field,
            ViewLine::blank(),
            ViewLine::new(LineStyle::Muted, HELP_TEXT),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_and_confirms_raw_text() {
        let mut input = TextInput::new("Endpoint", "https://...", "https://old");
        for _ in 0..3 {
            input.handle(KeyInput::Backspace);
        }
        for ch in "new/".chars() {
            input.handle(KeyInput::Char(ch));
        }
        assert_eq!(input.value(), "https://new/");
        assert_eq!(
            input.handle(KeyInput::Enter),
            PromptState::Confirmed("https://new/".into())
        );
    }

    #[test]
    fn empty_confirm_is_allowed() {
        let mut input = TextInput::new("Deployment", "<deployment>", "");
        assert_eq!(input.handle(KeyInput::Enter), PromptState::Confirmed(String::new()));
    }

    #[test]
    fn cancel_discards_partial_value() {
        let mut input = TextInput::new("Deployment", "<deployment>", "");
        input.handle(KeyInput::Char('g'));
        assert_eq!(input.handle(KeyInput::Escape), PromptState::Cancelled);
        assert_eq!(input.handle(KeyInput::Char('x')), PromptState::Cancelled);
        assert_eq!(input.handle(KeyInput::Enter), PromptState::Cancelled);
    }

    #[test]
    fn masked_view_never_shows_secret() {
        let mut input = TextInput::masked("API Key", "paste API key...");
        assert_eq!(input.view()[1].style, LineStyle::Placeholder);

        for ch in "sk-1".chars() {
            input.handle(KeyInput::Char(ch));
        }
        let lines = input.view();
        assert_eq!(lines[1].text, "> ••••");
        assert!(lines.iter().all(|line| !line.text.contains("sk-1")));
        assert_eq!(input.handle(KeyInput::Enter), PromptState::Confirmed("sk-1".into()));
    }
}
