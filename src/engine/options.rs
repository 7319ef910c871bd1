//! Engine options applied uniformly to every template source.

use serde::Deserialize;

/// Whitespace and escaping behaviour of the template engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Remove the first newline after a block or comment tag.
    pub trim_blocks: bool,
    /// Strip spaces and tabs from the start of a line up to a block or
    /// comment tag.
    pub lstrip_blocks: bool,
    /// HTML-escape every expression. Off by default: output is source code.
    pub autoescape: bool,
}

/// A template source after option processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Text as read from disk.
    pub original: String,
    /// Text handed to the engine.
    pub processed: String,
    /// `line_map[n]` is the original line of processed line `n + 1`.
    line_map: Vec<usize>,
}

impl Source {
    pub fn new(original: String, options: &EngineOptions) -> Self {
        let mut processed = String::with_capacity(original.len());
        let mut line_map = vec![1];

        for (index, line) in original.split_inclusive('\n').enumerate() {
            let (content, ending) = split_line_ending(line);

            let stripped = content.trim_start_matches(is_blank);
            let content = if options.lstrip_blocks && starts_with_tag(stripped) {
                stripped
            } else {
                content
            };
            processed.push_str(content);

            let trimmed = options.trim_blocks && ends_with_tag(content);
            if !ending.is_empty() && !trimmed {
                processed.push_str(ending);
                line_map.push(index + 2);
            }
        }

        Self {
            original,
            processed,
            line_map,
        }
    }

    /// Map a 1-based line of the processed text back to the original.
    pub fn original_line(&self, processed_line: usize) -> usize {
        processed_line
            .checked_sub(1)
            .and_then(|i| self.line_map.get(i))
            .copied()
            .unwrap_or(processed_line)
    }

    /// First 1-based original line containing `needle`.
    pub fn find_line(&self, needle: &str) -> Option<usize> {
        self.original
            .lines()
            .position(|line| line.contains(needle))
            .map(|i| i + 1)
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        (stripped, "\r\n")
    } else if let Some(stripped) = line.strip_suffix('\n') {
        (stripped, "\n")
    } else {
        (line, "")
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn starts_with_tag(text: &str) -> bool {
    text.starts_with("{%") || text.starts_with("{#")
}

fn ends_with_tag(text: &str) -> bool {
    text.ends_with("%}") || text.ends_with("#}")
}
