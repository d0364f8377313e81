//! Newline framing over an arbitrary byte stream.

/// Longest unterminated fragment kept before it is thrown away.
pub const DEFAULT_MAX_FRAGMENT: usize = 4096;

/// Reassembles newline-terminated lines from reads that split anywhere.
///
/// Lines are decoded as UTF-8 with invalid sequences dropped, then trimmed;
/// empty results are not emitted. A trailing `\r` disappears with the trim.
///
/// ```
/// use canbike_link::LineFramer;
///
/// let mut framer = LineFramer::new();
/// assert!(framer.push(b"SPD:1").is_empty());
/// assert_eq!(framer.push(b"2\r\nRPM"), vec!["SPD:12".to_owned()]);
/// assert_eq!(framer.pending(), 3);
/// ```
#[derive(Debug)]
pub struct LineFramer {
    fragment: Vec<u8>,
    max_fragment: usize,
    overflowed: bool,
    discarded: u64,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::with_max_fragment(DEFAULT_MAX_FRAGMENT)
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framer that discards a line once it grows past `max_fragment` bytes
    /// without a terminator. The rest of that line, up to the next newline,
    /// is discarded with it.
    pub fn with_max_fragment(max_fragment: usize) -> Self {
        Self {
            fragment: Vec::with_capacity(max_fragment.min(DEFAULT_MAX_FRAGMENT)),
            max_fragment: max_fragment.max(1),
            overflowed: false,
            discarded: 0,
        }
    }

    /// Feed one read's worth of bytes. Returns the lines it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for piece in bytes.split_inclusive(|b| *b == b'\n') {
            let (body, terminated) = match piece.split_last() {
                Some((b'\n', body)) => (body, true),
                _ => (piece, false),
            };

            if !self.overflowed {
                self.fragment.extend_from_slice(body);
                if self.fragment.len() > self.max_fragment {
                    self.fragment.clear();
                    self.overflowed = true;
                    self.discarded = self.discarded.saturating_add(1);
                }
            }

            if terminated {
                if !self.overflowed
                    && let Some(line) = decode_line(&self.fragment)
                {
                    lines.push(line);
                }
                self.fragment.clear();
                self.overflowed = false;
            }
        }
        lines
    }

    /// Bytes buffered for the current unterminated line.
    pub fn pending(&self) -> usize {
        self.fragment.len()
    }

    /// Over-long fragments thrown away so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Drop any partial line.
    pub fn clear(&mut self) {
        self.fragment.clear();
        self.overflowed = false;
    }
}

/// Decode `bytes` skipping invalid UTF-8 and trim surrounding whitespace.
/// Returns `None` when nothing is left.
pub fn decode_line(bytes: &[u8]) -> Option<String> {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_lines_in_one_read() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"SPD:1\nRPM:2\n"),
            vec!["SPD:1".to_owned(), "RPM:2".to_owned()]
        );
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_split_reassembly() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"ODO:123.").is_empty());
        assert!(framer.push(b"45").is_empty());
        assert_eq!(framer.push(b"6\n"), vec!["ODO:123.456".to_owned()]);
    }

    #[test]
    fn test_blank_and_crlf_lines_dropped() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"\r\n\n   \nHL:1\r\n"),
            vec!["HL:1".to_owned()]
        );
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"SPD\xff\xfe:5\n"),
            vec!["SPD:5".to_owned()]
        );
        assert_eq!(framer.push(b"\xc3\n"), Vec::<String>::new());
    }

    #[test]
    fn test_utf8_sequence_split_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"x\xc3").is_empty());
        assert_eq!(framer.push(b"\xa9\n"), vec!["x\u{e9}".to_owned()]);
    }

    #[test]
    fn test_overlong_fragment_discarded_until_newline() {
        let mut framer = LineFramer::with_max_fragment(8);
        assert!(framer.push(b"0123456789").is_empty());
        assert_eq!(framer.discarded(), 1);
        assert_eq!(framer.pending(), 0);
        assert!(framer.push(b"SPD:9").is_empty());
        assert_eq!(framer.push(b"\nRPM:1\n"), vec!["RPM:1".to_owned()]);
    }

    #[test]
    fn test_fragment_at_cap_is_kept() {
        let mut framer = LineFramer::with_max_fragment(5);
        assert_eq!(framer.push(b"FB:12\n"), vec!["FB:12".to_owned()]);
        assert_eq!(framer.discarded(), 0);
    }

    #[test]
    fn test_clear_drops_partial() {
        let mut framer = LineFramer::new();
        framer.push(b"SPD:4");
        framer.clear();
        assert_eq!(framer.push(b"0\n"), vec!["0".to_owned()]);
    }
}
