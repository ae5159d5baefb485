//! Key bindings for the main view.
//!
//! Character keys are matched on the character itself, so `R` means the
//! shifted letter whatever modifier flags the terminal reports with it.

use std::collections::HashMap;

use tailgrid_render::input::{Key, KeyEvent};
use tailgrid_runtime::types::ContainerAction;

use crate::focus::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyChord {
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    #[must_use]
    pub const fn ch(ch: char) -> Self {
        Self::plain(Key::Char(ch))
    }

    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self {
            key: Key::Char(ch),
            ctrl: true,
            shift: false,
        }
    }

    #[must_use]
    pub fn from_event(event: KeyEvent) -> Self {
        let shift = match event.key {
            Key::Char(_) => false,
            _ => event.modifiers.shift,
        };
        Self {
            key: event.key,
            ctrl: event.modifiers.ctrl,
            shift,
        }
    }

    #[must_use]
    pub fn display(self) -> String {
        let key = match self.key {
            Key::Char(' ') => "Space".to_owned(),
            Key::Char(ch) => ch.to_string(),
            Key::Enter => "Enter".to_owned(),
            Key::Escape => "Esc".to_owned(),
            Key::Tab => "Tab".to_owned(),
            Key::Backspace => "Backspace".to_owned(),
            Key::Up => "Up".to_owned(),
            Key::Down => "Down".to_owned(),
            Key::Left => "Left".to_owned(),
            Key::Right => "Right".to_owned(),
            Key::PageUp => "PgUp".to_owned(),
            Key::PageDown => "PgDn".to_owned(),
            Key::Home => "Home".to_owned(),
            Key::End => "End".to_owned(),
        };
        match (self.ctrl, self.shift) {
            (true, _) => format!("Ctrl+{key}"),
            (false, true) => format!("Shift+{key}"),
            (false, false) => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Quit,
    FocusNext,
    FocusPrev,
    FocusDirection(Direction),
    JumpTo(usize),
    ToggleMaximize,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
    ScrollLeft,
    ScrollRight,
    TogglePause,
    ToggleWrap,
    StartSearch,
    NextMatch,
    PrevMatch,
    GrowColumn,
    ShrinkColumn,
    GrowRow,
    ShrinkRow,
    CycleTheme,
    Action(ContainerAction),
    RestartAll,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyChord, KeyCommand>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        for (chord, command) in default_bindings() {
            bindings.insert(chord, command);
        }
        Self { bindings }
    }
}

impl Keymap {
    #[must_use]
    pub fn resolve(&self, event: KeyEvent) -> Option<KeyCommand> {
        self.bindings.get(&KeyChord::from_event(event)).copied()
    }

    /// Chords bound to `command`, sorted by display text.
    #[must_use]
    pub fn chords_for(&self, command: KeyCommand) -> Vec<String> {
        let mut chords: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == command)
            .map(|(chord, _)| chord.display())
            .collect();
        chords.sort();
        chords
    }
}

fn default_bindings() -> Vec<(KeyChord, KeyCommand)> {
    let mut bindings = vec![
        (KeyChord::ch('q'), KeyCommand::Quit),
        (KeyChord::ctrl('c'), KeyCommand::Quit),
        (KeyChord::plain(Key::Tab), KeyCommand::FocusNext),
        (
            KeyChord {
                key: Key::Tab,
                ctrl: false,
                shift: true,
            },
            KeyCommand::FocusPrev,
        ),
        (KeyChord::plain(Key::Left), KeyCommand::FocusDirection(Direction::Left)),
        (KeyChord::plain(Key::Right), KeyCommand::FocusDirection(Direction::Right)),
        (KeyChord::plain(Key::Up), KeyCommand::FocusDirection(Direction::Up)),
        (KeyChord::plain(Key::Down), KeyCommand::FocusDirection(Direction::Down)),
        (KeyChord::ch('z'), KeyCommand::ToggleMaximize),
        (KeyChord::plain(Key::Enter), KeyCommand::ToggleMaximize),
        (KeyChord::ch('k'), KeyCommand::ScrollUp),
        (KeyChord::ch('j'), KeyCommand::ScrollDown),
        (KeyChord::plain(Key::PageUp), KeyCommand::PageUp),
        (KeyChord::plain(Key::PageDown), KeyCommand::PageDown),
        (KeyChord::ctrl('u'), KeyCommand::PageUp),
        (KeyChord::ctrl('d'), KeyCommand::PageDown),
        (KeyChord::ch('g'), KeyCommand::ScrollTop),
        (KeyChord::plain(Key::Home), KeyCommand::ScrollTop),
        (KeyChord::ch('G'), KeyCommand::ScrollBottom),
        (KeyChord::plain(Key::End), KeyCommand::ScrollBottom),
        (KeyChord::ch('h'), KeyCommand::ScrollLeft),
        (KeyChord::ch('l'), KeyCommand::ScrollRight),
        (KeyChord::ch('p'), KeyCommand::TogglePause),
        (KeyChord::ch(' '), KeyCommand::TogglePause),
        (KeyChord::ch('w'), KeyCommand::ToggleWrap),
        (KeyChord::ch('/'), KeyCommand::StartSearch),
        (KeyChord::ch('n'), KeyCommand::NextMatch),
        (KeyChord::ch('N'), KeyCommand::PrevMatch),
        (KeyChord::ch(']'), KeyCommand::GrowColumn),
        (KeyChord::ch('['), KeyCommand::ShrinkColumn),
        (KeyChord::ch('='), KeyCommand::GrowRow),
        (KeyChord::ch('-'), KeyCommand::ShrinkRow),
        (KeyChord::ch('t'), KeyCommand::CycleTheme),
        (KeyChord::ch('r'), KeyCommand::Action(ContainerAction::Restart)),
        (KeyChord::ch('x'), KeyCommand::Action(ContainerAction::Kill)),
        (KeyChord::ch('X'), KeyCommand::Action(ContainerAction::Remove)),
        (KeyChord::ch('u'), KeyCommand::Action(ContainerAction::ComposeUp)),
        (KeyChord::ch('d'), KeyCommand::Action(ContainerAction::ComposeDown)),
        (KeyChord::ch('D'), KeyCommand::Action(ContainerAction::ComposeDownUp)),
        (KeyChord::ch('b'), KeyCommand::Action(ContainerAction::ComposeBuildUp)),
        (KeyChord::ch('R'), KeyCommand::RestartAll),
        (KeyChord::plain(Key::Escape), KeyCommand::Cancel),
    ];
    for digit in 1..=9u32 {
        if let Some(ch) = char::from_digit(digit, 10) {
            bindings.push((KeyChord::ch(ch), KeyCommand::JumpTo(digit as usize)));
        }
    }
    bindings
}

/// One-line hint for the status bar.
#[must_use]
pub fn hint_line() -> &'static str {
    "q quit  tab focus  z zoom  / search  p pause  w wrap  r restart  R restart all"
}
