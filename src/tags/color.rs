// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The fixed seven-color tag table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PixcullError;

/// One of the seven color tags, keyed `1` through `7`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

impl TagColor {
    /// All colors in key order
    pub const ALL: [TagColor; 7] = [
        TagColor::Red,
        TagColor::Orange,
        TagColor::Yellow,
        TagColor::Green,
        TagColor::Blue,
        TagColor::Purple,
        TagColor::Gray,
    ];

    /// Single-character key used on the keyboard and in the store
    pub fn key(self) -> &'static str {
        match self {
            TagColor::Red => "1",
            TagColor::Orange => "2",
            TagColor::Yellow => "3",
            TagColor::Green => "4",
            TagColor::Blue => "5",
            TagColor::Purple => "6",
            TagColor::Gray => "7",
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            TagColor::Red => "Red",
            TagColor::Orange => "Orange",
            TagColor::Yellow => "Yellow",
            TagColor::Green => "Green",
            TagColor::Blue => "Blue",
            TagColor::Purple => "Purple",
            TagColor::Gray => "Gray",
        }
    }

    /// Color value stored alongside the name (Finder label color names)
    pub fn color(self) -> &'static str {
        self.name()
    }

    /// Colored bullet for terminal output
    pub fn symbol(self) -> &'static str {
        match self {
            TagColor::Red => "\x1b[31m●\x1b[0m",
            TagColor::Orange => "\x1b[38;5;208m●\x1b[0m",
            TagColor::Yellow => "\x1b[33m●\x1b[0m",
            TagColor::Green => "\x1b[32m●\x1b[0m",
            TagColor::Blue => "\x1b[34m●\x1b[0m",
            TagColor::Purple => "\x1b[35m●\x1b[0m",
            TagColor::Gray => "\x1b[90m●\x1b[0m",
        }
    }

    /// Look up a color by its key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key.trim())
    }

    /// Look up a color by its name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl FromStr for TagColor {
    type Err = PixcullError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| PixcullError::InvalidTagKey(s.to_string()))
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
