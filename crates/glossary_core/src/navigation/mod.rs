//! Screen navigation state.
//!
//! # Responsibility
//! - Track the stack of visible screens for the UI shell.
//! - Hold reader position and text selection (`read_state`).
//!
//! # Invariants
//! - The stack is never empty; `pop` never removes the root screen.

pub mod read_state;

use crate::model::glossary::GlossaryId;
use crate::model::resource::ResourceId;
use log::debug;
use serde::Serialize;

pub use read_state::ReadState;

/// One application screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// First-run initialization.
    Splash,
    /// Glossary list.
    Main,
    /// Phrase list of one glossary.
    Glossary { glossary: GlossaryId },
    /// Scripture reader used to pick phrases and refs.
    Read {
        glossary: GlossaryId,
        resource: ResourceId,
    },
    Settings,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Splash => "splash",
            Self::Main => "main",
            Self::Glossary { .. } => "glossary",
            Self::Read { .. } => "read",
            Self::Settings => "settings",
        }
    }
}

/// Screen stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Screen::Splash)
    }
}

impl Navigator {
    pub fn new(root: Screen) -> Self {
        Self { stack: vec![root] }
    }

    /// Top of the stack.
    pub fn current(&self) -> &Screen {
        // The stack always holds the root.
        &self.stack[self.stack.len() - 1]
    }

    pub fn push(&mut self, screen: Screen) {
        debug!(
            "event=navigate module=navigation action=push from={} to={}",
            self.current().name(),
            screen.name()
        );
        self.stack.push(screen);
    }

    /// Removes the top screen; returns `None` when only the root is left.
    pub fn pop(&mut self) -> Option<Screen> {
        if self.stack.len() <= 1 {
            return None;
        }
        let popped = self.stack.pop();
        debug!(
            "event=navigate module=navigation action=pop to={}",
            self.current().name()
        );
        popped
    }

    /// Clears the stack and makes `screen` the new root.
    pub fn replace_all(&mut self, screen: Screen) {
        debug!(
            "event=navigate module=navigation action=replace_all to={}",
            screen.name()
        );
        self.stack.clear();
        self.stack.push(screen);
    }

    pub fn can_pop(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Screens from root to top.
    pub fn stack(&self) -> &[Screen] {
        &self.stack
    }
}
