//! Tolerant telemetry line parser.
//!
//! Controller lines look like `SPD:12.5,RPM:3400;THR:40 BRK:0`, but the
//! firmware also emits free text, torn fragments and noise. The parser
//! extracts every well-formed `<letters>:<number>` token and drops the rest.
//! It never fails: bad input only means fewer updates.

use std::sync::OnceLock;

use regex::Regex;

use crate::field::{FieldUpdate, TelemetryField, WireNumber};

/// `<letters> : <number>` with optional whitespace around the colon. Digits
/// are ASCII only.
const TOKEN_PATTERN: &str = r"([A-Za-z]+)\s*:\s*([-+]?[0-9]+\.?[0-9]*)";

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_RE
        .get_or_init(|| Regex::new(TOKEN_PATTERN).ok())
        .as_ref()
}

/// Raw `(key, number)` token pairs found in `line`, in order.
///
/// Keys are returned as written; numbers are the unparsed token text.
pub fn tokenize(line: &str) -> Vec<(String, String)> {
    let Some(re) = token_regex() else {
        return Vec::new();
    };

    let normalized = line.replace(',', ";");
    re.captures_iter(&normalized)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let number = caps.get(2)?.as_str();
            Some((key.to_owned(), number.to_owned()))
        })
        .collect()
}

/// Parse one telemetry line into field updates.
///
/// Unknown keys and unparseable numbers are skipped. Updates are returned in
/// line order, so when a key repeats the later value wins once applied.
pub fn parse_line(line: &str) -> Vec<FieldUpdate> {
    tokenize(line)
        .into_iter()
        .filter_map(|(key, number)| {
            let field = TelemetryField::from_wire_key(&key)?;
            let number = WireNumber::parse(&number)?;
            Some(FieldUpdate::coerce(field, number))
        })
        .collect()
}
