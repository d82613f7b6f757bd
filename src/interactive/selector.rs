use std::ops::Range;

use super::{KeyInput, LineStyle, PromptState, SelectOption, ViewLine};

/// Longest filter the selector accepts.
pub const FILTER_CHAR_LIMIT: usize = 100;
/// Options shown at once.
pub const VISIBLE_OPTIONS: usize = 10;

const HELP_TEXT: &str = "↑/↓: navigate • Enter: select • Esc: cancel";

/// Filterable single-choice list.
#[derive(Debug, Clone)]
pub struct Selector {
    title: String,
    placeholder: String,
    options: Vec<SelectOption>,
    filter: String,
    /// Indexes into `options` matching `filter`, in original order.
    filtered: Vec<usize>,
    cursor: usize,
    state: PromptState,
}

impl Selector {
    pub fn new(
        title: impl Into<String>,
        placeholder: impl Into<String>,
        options: Vec<SelectOption>,
        current: &str,
    ) -> Self {
        let cursor = options
            .iter()
            .position(|option| option.id == current)
            .unwrap_or(0);
        let filtered = (0..options.len()).collect();
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
            options,
            filter: String::new(),
            filtered,
            cursor,
            state: PromptState::Editing,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Options matching the current filter.
    pub fn visible(&self) -> impl Iterator<Item = &SelectOption> + '_ {
        self.filtered.iter().map(|&index| &self.options[index])
    }

    pub fn visible_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn handle(&mut self, key: KeyInput) -> PromptState {
        if self.state.is_terminal() {
            return self.state.clone();
        }

        match key {
            KeyInput::Escape | KeyInput::Interrupt => self.state = PromptState::Cancelled,
            KeyInput::Enter => {
                if let Some(&index) = self.filtered.get(self.cursor) {
                    self.state = PromptState::Confirmed(self.options[index].id.clone());
                }
            }
            KeyInput::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Down => {
                if self.cursor + 1 < self.filtered.len() {
                    self.cursor += 1;
                }
            }
            KeyInput::Char(ch) => {
                if self.filter.chars().count() < FILTER_CHAR_LIMIT {
                    self.filter.push(ch);
                    self.refilter();
                }
            }
            KeyInput::Backspace => {
                if self.filter.pop().is_some() {
                    self.refilter();
                }
            }
        }
        self.state.clone()
    }

    fn refilter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.filtered = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| {
                needle.is_empty()
                    || option.id.to_lowercase().contains(&needle)
                    || option.label.to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();
        self.cursor = self.cursor.min(self.filtered.len().saturating_sub(1));
    }

    /// Range of filtered positions currently on screen.
    ///
    /// Centred on the cursor, clamped so it never runs past either end.
    pub fn window(&self) -> Range<usize> {
        let len = self.filtered.len();
        let mut start = self.cursor.saturating_sub(VISIBLE_OPTIONS / 2);
        let mut end = start + VISIBLE_OPTIONS;
        if end > len {
            end = len;
            start = end.saturating_sub(VISIBLE_OPTIONS);
        }
        start..end
    }

    pub fn view(&self) -> Vec<ViewLine> {
        let mut lines = vec![ViewLine::new(LineStyle::Title, &self.title)];
        lines.push(if self.filter.is_empty() {
            ViewLine::new(LineStyle::Placeholder, format!("> {}", self.placeholder))
        } else {
            ViewLine::new(LineStyle::Field, format!("> {}", self.filter))
        });
        lines.push(ViewLine::blank());
        lines.push(ViewLine::new(
            LineStyle::Muted,
            format!(
                "Showing {} of {} options",
                self.filtered.len(),
                self.options.len()
            ),
        ));
        lines.push(ViewLine::blank());
        for position in self.window() {
            let option = &self.options[self.filtered[position]];
            lines.push(if position == self.cursor {
                ViewLine::new(LineStyle::Selected, format!("> {}", option.label))
            } else {
                ViewLine::new(LineStyle::Normal, format!("  {}", option.label))
            });
        }
        lines.push(ViewLine::blank());
        lines.push(ViewLine::new(LineStyle::Muted, HELP_TEXT));
        lines
    }
}
