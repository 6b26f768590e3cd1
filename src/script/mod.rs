// src/script/mod.rs - Plot script model and command classification
pub mod parser;

pub use parser::{parse, parse_str, ScriptError, END_DEFINITIONS, END_OPTIONS};

use std::collections::VecDeque;

/// Section of a plot script that non-sentinel lines are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Options,
    Definitions,
    Commands,
}

/// A parsed plot script.
///
/// `options` and `definitions` are handed to the plot service once at
/// initialization; `commands` is consumed front to back by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotScript {
    pub options: Vec<String>,
    pub definitions: Vec<String>,
    commands: VecDeque<String>,
    command_count: usize,
}

impl PlotScript {
    pub fn new(options: Vec<String>, definitions: Vec<String>, commands: Vec<String>) -> Self {
        let command_count = commands.iter().filter(|line| !is_comment(line)).count();
        Self {
            options,
            definitions,
            commands: VecDeque::from(commands),
            command_count,
        }
    }

    /// Number of executable command lines, fixed at parse time.
    pub fn command_count(&self) -> usize {
        self.command_count
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn next_command(&mut self) -> Option<String> {
        self.commands.pop_front()
    }

    /// Commands not yet consumed, in dispatch order.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    pub fn remaining_len(&self) -> usize {
        self.commands.len()
    }

    /// Drop every unconsumed command.
    pub fn discard_remaining(&mut self) -> usize {
        let dropped = self.commands.len();
        self.commands.clear();
        dropped
    }
}

/// How the dispatcher treats one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `pause` directive, handled by the dispatcher itself.
    Pause,
    /// `#` comment, logged but never sent.
    Comment,
    /// Opaque device command forwarded to the plot service.
    Device,
}

impl CommandKind {
    pub fn classify(line: &str) -> Self {
        if is_comment(line) {
            CommandKind::Comment
        } else if line.split_whitespace().next() == Some("pause") {
            CommandKind::Pause
        } else {
            CommandKind::Device
        }
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}
