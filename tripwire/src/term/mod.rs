//! Term language: the text that says when and how a failpoint fires.
//!
//! A term is a chain of entries separated by `->`:
//!
//! ```text
//! term      := <blank> | entry ( "->" entry )* [ "->" "loop" ]
//! entry     := [ prob "%" ] [ count "*" ] action [ "(" payload ")" ]
//! action    := off | return | sleep | panic | print
//! ```
//!
//! | Example                      | Meaning                                        |
//! |------------------------------|------------------------------------------------|
//! | `return(1)`                  | return `1` on every firing                     |
//! | `3*return("eio")`            | return `"eio"` three times, then exhausted     |
//! | `25%sleep(100ms)`            | sleep 100ms on a quarter of firings            |
//! | `2*off->panic("boom")`       | two quiet firings, then panic forever          |
//! | `1*return(true)->1*off->loop` | alternate between a return and a quiet firing |
//!
//! Parsing is a pure function of the text. Everything is checked here so a
//! call site never sees a half-understood term.

mod value;

pub use value::Value;

use std::str::FromStr;
use std::time::Duration;

/// Separator between entries of a term.
pub const DELIMITER: &str = "->";

/// Final pseudo-entry that makes the chain start over once it runs out.
pub const LOOP_MARKER: &str = "loop";

/// Reasons a term is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TermError {
    /// The action keyword is not part of the vocabulary.
    #[error("unknown action {action:?} in {entry:?}")]
    UnknownAction {
        /// The entry being parsed.
        entry: String,
        /// The unrecognised keyword.
        action: String,
    },

    /// The payload does not fit the action.
    #[error("bad payload for `{action}` in {entry:?}: {reason}")]
    BadPayload {
        /// The entry being parsed.
        entry: String,
        /// Keyword of the action.
        action: &'static str,
        /// What was expected.
        reason: String,
    },

    /// Probability is not a number in `[0, 100]`.
    #[error("probability must be within [0, 100] in {entry:?}")]
    BadProbability {
        /// The entry being parsed.
        entry: String,
    },

    /// Count is not a positive integer.
    #[error("count must be a positive integer in {entry:?}")]
    BadCount {
        /// The entry being parsed.
        entry: String,
    },

    /// Two delimiters with nothing between them, or a dangling delimiter.
    #[error("empty entry in {term:?}")]
    EmptyEntry {
        /// The whole term.
        term: String,
    },

    /// `loop` is only allowed as the final entry, after at least one action.
    #[error("`loop` must follow at least one entry and come last in {term:?}")]
    MisplacedLoop {
        /// The whole term.
        term: String,
    },

    /// A quoted string is never closed.
    #[error("unterminated string in {term:?}")]
    UnterminatedString {
        /// The whole term.
        term: String,
    },

    /// Text after the action that is not a parenthesised payload.
    #[error("unexpected input after action in {entry:?}")]
    Trailing {
        /// The entry being parsed.
        entry: String,
    },
}

/// What an entry does once its qualifiers let it through.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fire quietly: the call site carries on as normal.
    Off,
    /// Hand a value back to the call site.
    Return(Value),
    /// Ask the call site to pause.
    Sleep(Duration),
    /// Ask the call site to panic, with an optional message.
    Panic(Option<String>),
    /// Log a line, then carry on as normal.
    Print(Option<String>),
}

impl Action {
    /// The keyword this action is spelled with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Action::Off => "off",
            Action::Return(_) => "return",
            Action::Sleep(_) => "sleep",
            Action::Panic(_) => "panic",
            Action::Print(_) => "print",
        }
    }
}

/// One `[P%][N*]action(payload)` element of a term.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Percent chance, in `[0, 100]`, that a firing applies the action.
    pub probability: Option<f64>,
    /// How many applications before moving to the next entry.
    pub count: Option<u64>,
    /// The action itself.
    pub action: Action,
}

/// A parsed term, ready to become an [`ActionSequence`](crate::ActionSequence).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Term {
    entries: Vec<Entry>,
    looping: bool,
}

impl Term {
    /// Parse term text.
    pub fn parse(text: &str) -> Result<Self, TermError> {
        if text.trim().is_empty() {
            return Ok(Term::default());
        }

        let mut raw = split_entries(text)?;
        let looping = raw.last().map(|s| s.trim()) == Some(LOOP_MARKER);
        if looping {
            raw.pop();
        }
        if raw.is_empty() {
            return Err(TermError::MisplacedLoop {
                term: text.to_string(),
            });
        }

        let mut entries = Vec::with_capacity(raw.len());
        for part in raw {
            match part.trim() {
                "" => {
                    return Err(TermError::EmptyEntry {
                        term: text.to_string(),
                    })
                }
                LOOP_MARKER => {
                    return Err(TermError::MisplacedLoop {
                        term: text.to_string(),
                    })
                }
                entry => entries.push(parse_entry(entry)?),
            }
        }

        Ok(Term { entries, looping })
    }

    /// Entries in chain order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether the chain restarts after its last entry.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// True for the blank term, which is enabled but never does anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Term {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Term::parse(s)
    }
}

/// Split on `->`, leaving delimiters inside quoted strings alone.
fn split_entries(text: &str) -> Result<Vec<&str>, TermError> {
    let bytes = text.as_bytes();
    let delimiter = DELIMITER.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(delimiter) {
            parts.push(&text[start..i]);
            i += delimiter.len();
            start = i;
            continue;
        }
        i += 1;
    }

    if in_string {
        return Err(TermError::UnterminatedString {
            term: text.to_string(),
        });
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_entry(entry: &str) -> Result<Entry, TermError> {
    let mut rest = entry;

    let mut probability = None;
    if let Some((num, tail)) = split_qualifier(rest, '%') {
        probability = Some(parse_probability(entry, num)?);
        rest = tail.trim_start();
    }

    let mut count = None;
    if let Some((num, tail)) = split_qualifier(rest, '*') {
        count = Some(parse_count(entry, num)?);
        rest = tail.trim_start();
    }

    let keyword_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (keyword, tail) = rest.split_at(keyword_end);

    let action = match keyword {
        "off" => Action::Off,
        "return" => Action::Return(Value::Unit),
        "sleep" => Action::Sleep(Duration::ZERO),
        "panic" => Action::Panic(None),
        "print" => Action::Print(None),
        "" => {
            return Err(TermError::UnknownAction {
                entry: entry.to_string(),
                action: rest.to_string(),
            })
        }
        other => {
            return Err(TermError::UnknownAction {
                entry: entry.to_string(),
                action: other.to_string(),
            })
        }
    };

    let keyword = action.keyword();
    let bad = |reason: &str| TermError::BadPayload {
        entry: entry.to_string(),
        action: keyword,
        reason: reason.to_string(),
    };

    let action = match (action, payload(entry, tail)?) {
        (Action::Off, None | Some("")) => Action::Off,
        (Action::Off, Some(_)) => return Err(bad("takes no payload")),
        (Action::Return(_), None | Some("")) => Action::Return(Value::Unit),
        (Action::Return(_), Some(p)) => Action::Return(
            parse_value(p).ok_or_else(|| bad("expected true, false, an integer or a quoted string"))?,
        ),
        (Action::Sleep(_), None | Some("")) => return Err(bad("needs a duration")),
        (Action::Sleep(_), Some(p)) => Action::Sleep(
            parse_sleep(p).ok_or_else(|| bad("expected a duration such as 100 or 2s"))?,
        ),
        (Action::Panic(_), message) => Action::Panic(parse_message(message).map_err(bad)?),
        (Action::Print(_), message) => Action::Print(parse_message(message).map_err(bad)?),
    };

    Ok(Entry {
        probability,
        count,
        action,
    })
}

/// Split a leading `<number><marker>` off `s`.
fn split_qualifier(s: &str, marker: char) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | ' ')))?;
    if end == 0 || !s[end..].starts_with(marker) {
        return None;
    }
    Some((s[..end].trim(), &s[end + marker.len_utf8()..]))
}

fn parse_probability(entry: &str, num: &str) -> Result<f64, TermError> {
    match num.parse::<f64>() {
        Ok(p) if (0.0..=100.0).contains(&p) => Ok(p),
        _ => Err(TermError::BadProbability {
            entry: entry.to_string(),
        }),
    }
}

fn parse_count(entry: &str, num: &str) -> Result<u64, TermError> {
    match num.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(TermError::BadCount {
            entry: entry.to_string(),
        }),
    }
}

/// The text inside `( ... )`, or `None` when the action has no parentheses.
fn payload<'a>(entry: &str, tail: &'a str) -> Result<Option<&'a str>, TermError> {
    let tail = tail.trim();
    if tail.is_empty() {
        return Ok(None);
    }
    tail.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map(|inner| Some(inner.trim()))
        .ok_or_else(|| TermError::Trailing {
            entry: entry.to_string(),
        })
}

fn parse_value(p: &str) -> Option<Value> {
    match p {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ if p.starts_with('"') => parse_quoted(p).map(Value::Str),
        _ => p.parse::<i64>().ok().map(Value::Int),
    }
}

fn parse_sleep(p: &str) -> Option<Duration> {
    if p.starts_with('"') {
        parse_duration(&parse_quoted(p)?)
    } else {
        parse_duration(p)
    }
}

fn parse_message(payload: Option<&str>) -> Result<Option<String>, &'static str> {
    match payload {
        None | Some("") => Ok(None),
        Some(p) if p.starts_with('"') => parse_quoted(p)
            .map(Some)
            .ok_or("malformed quoted string"),
        Some(p) if p.contains('"') => Err("stray quote in message"),
        Some(p) => Ok(Some(p.to_string())),
    }
}

/// Decode `"..."` with `\"`, `\\`, `\n` and `\t` escapes.
fn parse_quoted(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                _ => return None,
            },
            '"' => return chars.as_str().is_empty().then_some(out),
            c => out.push(c),
        }
    }
    None
}

/// `<integer>[ns|us|ms|s|m|h]`; a bare integer is milliseconds.
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let n: u64 = digits.parse().ok()?;
    match unit.trim() {
        "" | "ms" => Some(Duration::from_millis(n)),
        "ns" => Some(Duration::from_nanos(n)),
        "us" | "µs" => Some(Duration::from_micros(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs),
        "h" => n.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
