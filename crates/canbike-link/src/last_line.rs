//! Most recent raw line, for the dashboard's diagnostic display.

use parking_lot::RwLock;

/// Characters shown before the diagnostic line is cut off.
pub const DIAGNOSTIC_MAX_CHARS: usize = 160;

/// Latest raw line seen by the reader.
#[derive(Debug, Default)]
pub struct LastLine {
    line: RwLock<Option<String>>,
}

impl LastLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, line: &str) {
        let mut slot = self.line.write();
        match slot.as_mut() {
            Some(existing) => {
                existing.clear();
                existing.push_str(line);
            }
            None => *slot = Some(line.to_owned()),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.line.read().clone()
    }

    /// The line cut to `max_chars` characters, with `...` appended when cut.
    pub fn truncated(&self, max_chars: usize) -> Option<String> {
        self.line.read().as_deref().map(|line| truncate_chars(line, max_chars))
    }
}

/// Cut `line` to `max_chars` characters, appending `...` if anything was
/// removed.
pub fn truncate_chars(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = line.get(..cut).unwrap_or(line).to_owned();
            out.push_str("...");
            out
        }
        None => line.to_owned(),
    }
}
