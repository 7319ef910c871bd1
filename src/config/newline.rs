//! Newline conventions for generated files.

use std::fmt;
use std::path::Path;

/// Line ending written to generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

/// Suffixes whose newline convention is fixed regardless of host or
/// configuration. Matched case-insensitively against the file extension.
const SUFFIX_NEWLINES: &[(&str, Newline)] = &[
    ("sh", Newline::Lf),
    ("bat", Newline::CrLf),
    ("cmd", Newline::CrLf),
    ("ps1", Newline::CrLf),
];

impl Newline {
    /// The host platform's convention.
    pub fn native() -> Self {
        if cfg!(windows) {
            Newline::CrLf
        } else {
            Newline::Lf
        }
    }

    /// Parse a configuration value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "lf" | "unix" | "\n" => Some(Newline::Lf),
            "crlf" | "windows" | "\r\n" => Some(Newline::CrLf),
            "native" | "" => Some(Self::native()),
            _ => None,
        }
    }

    /// Newline for `path`: the suffix table wins over `default`.
    pub fn for_path(path: &Path, default: Newline) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| {
                SUFFIX_NEWLINES
                    .iter()
                    .find(|(suffix, _)| suffix.eq_ignore_ascii_case(ext))
                    .map(|(_, newline)| *newline)
            })
            .unwrap_or(default)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }

    /// Rewrite every line ending in `text` to this convention.
    pub fn apply(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        match self {
            Newline::Lf => normalized,
            Newline::CrLf => normalized.replace('\n', "\r\n"),
        }
    }
}

impl Default for Newline {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Newline::Lf => write!(f, "lf"),
            Newline::CrLf => write!(f, "crlf"),
        }
    }
}
