use std::io::{self, IsTerminal, Write};

use crossterm::{
    cursor::{Hide, MoveToColumn, MoveUp, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{style, Color, Print, Stylize},
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use super::{
    KeyInput, LineStyle, PromptState, Prompter, SelectOption, Selector, TextInput, ViewLine,
};
use crate::lib::errors::PromptError;

/// Common surface of the prompt state machines.
trait PromptModel {
    fn handle(&mut self, key: KeyInput) -> PromptState;
    fn view(&self) -> Vec<ViewLine>;
}

impl PromptModel for Selector {
    fn handle(&mut self, key: KeyInput) -> PromptState {
        Selector::handle(self, key)
    }

    fn view(&self) -> Vec<ViewLine> {
        Selector::view(self)
    }
}

impl PromptModel for TextInput {
    fn handle(&mut self, key: KeyInput) -> PromptState {
        TextInput::handle(self, key)
    }

    fn view(&self) -> Vec<ViewLine> {
        TextInput::view(self)
    }
}

/// Prompter that draws inline on stderr and reads keys from the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn select(
        &mut self,
        title: &str,
        placeholder: &str,
        options: &[SelectOption],
        current: &str,
    ) -> Result<String, PromptError> {
        let mut selector = Selector::new(title, placeholder, options.to_vec(), current);
        run_prompt(&mut selector)?.ok_or(PromptError::SelectionCancelled)
    }

    fn input(
        &mut self,
        title: &str,
        placeholder: &str,
        initial: &str,
    ) -> Result<String, PromptError> {
        let mut input = TextInput::new(title, placeholder, initial);
        run_prompt(&mut input)?.ok_or(PromptError::InputCancelled)
    }

    fn password(&mut self, title: &str, placeholder: &str) -> Result<String, PromptError> {
        let mut input = TextInput::masked(title, placeholder);
        run_prompt(&mut input)?.ok_or(PromptError::InputCancelled)
    }
}

/// Raw mode for the lifetime of the guard; the cursor is restored on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stderr(), Hide)?;
        Ok(guard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stderr(), Show);
        let _ = disable_raw_mode();
    }
}

/// Block until the model reaches a terminal state. `None` means cancelled.
fn run_prompt(model: &mut dyn PromptModel) -> Result<Option<String>, PromptError> {
    if !io::stdin().is_terminal() {
        return Err(PromptError::Terminal(io::Error::new(
            io::ErrorKind::Unsupported,
            "interactive prompt requires a terminal on stdin",
        )));
    }

    let _guard = RawModeGuard::acquire()?;
    let mut out = io::stderr();
    let mut drawn = draw(&mut out, &model.view(), 0)?;

    let outcome = loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(input) = map_key(key) else {
            continue;
        };
        match model.handle(input) {
            PromptState::Editing => drawn = draw(&mut out, &model.view(), drawn)?,
            PromptState::Confirmed(value) => break Some(value),
            PromptState::Cancelled => break None,
        }
    };

    erase(&mut out, drawn)?;
    out.flush()?;
    debug!(target: "codezure::interactive", cancelled = outcome.is_none(), "Prompt finished");
    Ok(outcome)
}

/// Translate a crossterm key press into a prompt event.
fn map_key(key: KeyEvent) -> Option<KeyInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if control => Some(KeyInput::Interrupt),
        KeyCode::Char(_) if control || key.modifiers.contains(KeyModifiers::ALT) => None,
        KeyCode::Char(ch) => Some(KeyInput::Char(ch)),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Esc => Some(KeyInput::Escape),
        _ => None,
    }
}

/// Replace the previous frame of `previous` lines; returns the new height.
fn draw(out: &mut impl Write, lines: &[ViewLine], previous: u16) -> io::Result<u16> {
    erase(out, previous)?;
    let width = terminal::size().map(|(cols, _)| cols as usize).unwrap_or(80);
    for line in lines {
        let text = fit_width(&line.text, width.saturating_sub(1));
        let styled = match line.style {
            LineStyle::Title => style(text).with(Color::AnsiValue(12)).bold(),
            LineStyle::Selected => style(text).with(Color::AnsiValue(10)).bold(),
            LineStyle::Muted | LineStyle::Placeholder => style(text).with(Color::AnsiValue(8)),
            LineStyle::Field | LineStyle::Normal => style(text),
        };
        queue!(out, Print(styled), Print("\r\n"))?;
    }
    out.flush()?;
    Ok(u16::try_from(lines.len()).unwrap_or(u16::MAX))
}

/// Longest prefix of `text` occupying at most `columns` terminal cells.
/// Keeps every frame line on one row so the redraw height stays exact.
fn fit_width(text: &str, columns: usize) -> String {
    let mut used = 0;
    text.chars()
        .take_while(|ch| {
            used += ch.width().unwrap_or(0);
            used <= columns
        })
        .collect()
}

fn erase(out: &mut impl Write, lines: u16) -> io::Result<()> {
    if lines > 0 {
        queue!(out, MoveUp(lines))?;
    }
    queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))
}
