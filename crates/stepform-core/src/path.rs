use crate::error::{Result, StepformError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Object key this segment addresses when it lands on an object.
    /// Numeric segments fall back to their decimal form.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

/// A parsed address into an answer record.
///
/// Accepts dot-separated keys with array indices written either as their
/// own segment (`thoughts.0.text`) or in brackets (`thoughts[0].text`).
/// The first segment is always an object key because answer records are
/// objects at the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| StepformError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }

            let (head, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if head.is_empty() {
                return Err(invalid("index must follow a key"));
            }
            if head.contains(']') {
                return Err(invalid("unbalanced brackets"));
            }
            segments.push(parse_segment(head));

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(invalid("unexpected text after index"));
                };
                let Some(close) = inner.find(']') else {
                    return Err(invalid("unbalanced brackets"));
                };
                let digits = &inner[..close];
                let index = digits
                    .bytes()
                    .all(|b| b.is_ascii_digit())
                    .then(|| digits.parse::<usize>().ok())
                    .flatten()
                    .ok_or_else(|| invalid("bracket index must be a non-negative integer"))?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        if matches!(segments.first(), Some(Segment::Index(_))) {
            return Err(invalid("path must start with a key"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Render the first `depth` segments, for error messages.
    pub fn prefix(&self, depth: usize) -> String {
        let mut out = String::new();
        for seg in self.segments.iter().take(depth) {
            match seg {
                Segment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }
}

/// Canonical decimals (`0`, `12`) are indices. Anything else, including
/// `007`, stays a key so `as_key` reproduces the text as written.
fn parse_segment(s: &str) -> Segment {
    let canonical = s == "0" || !s.starts_with('0');
    if canonical && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<usize>() {
            return Segment::Index(i);
        }
    }
    Segment::Key(s.to_string())
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FieldPath {
    type Err = StepformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = StepformError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = StepformError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<FieldPath> for String {
    fn from(p: FieldPath) -> String {
        p.raw
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_key() {
        let p = FieldPath::parse("rating").unwrap();
        assert_eq!(p.segments(), &[Segment::Key("rating".to_string())]);
    }

    #[test]
    fn dotted_and_bracketed_forms_agree() {
        let dotted = FieldPath::parse("thoughts.0.text").unwrap();
        let bracketed = FieldPath::parse("thoughts[0].text").unwrap();
        assert_eq!(dotted.segments(), bracketed.segments());
        assert_eq!(
            dotted.segments(),
            &[
                Segment::Key("thoughts".to_string()),
                Segment::Index(0),
                Segment::Key("text".to_string()),
            ]
        );
    }

    #[test]
    fn chained_brackets() {
        let p = FieldPath::parse("grid[2][3]").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Key("grid".to_string()),
                Segment::Index(2),
                Segment::Index(3),
            ]
        );
        assert_eq!(p.prefix(2), "grid[2]");
    }

    #[test]
    fn invalid_paths() {
        for raw in [
            "",
            "  ",
            "a..b",
            ".a",
            "a.",
            "[0]",
            "0.a",
            "a[",
            "a[x]",
            "a[-1]",
            "a[0]b",
            "a]",
            "a[+1]",
            "a[]",
        ] {
            assert!(FieldPath::parse(raw).is_err(), "expected invalid: {raw:?}");
        }
    }

    #[test]
    fn leading_zero_segments_stay_keys() {
        let p = FieldPath::parse("codes.007").unwrap();
        assert_eq!(
            p.segments(),
            &[Segment::Key("codes".to_string()), Segment::Key("007".to_string())]
        );
        let p = FieldPath::parse("days.0").unwrap();
        assert_eq!(p.segments()[1], Segment::Index(0));
    }

    #[test]
    fn serde_as_string() {
        let p: FieldPath = serde_json::from_str("\"goals[1].title\"").unwrap();
        assert_eq!(p.as_str(), "goals[1].title");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"goals[1].title\"");
        assert!(serde_json::from_str::<FieldPath>("\"a..b\"").is_err());
    }
}
