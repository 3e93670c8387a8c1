use crate::binding::lookup;
use crate::error::{Result, StepformError};
use crate::path::FieldPath;
use crate::record::{kind_name, AnswerRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    SingleSelect,
    MultiSelect,
    Scale,
    Boolean,
    StructuredList,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::SingleSelect => "single_select",
            FieldKind::MultiSelect => "multi_select",
            FieldKind::Scale => "scale",
            FieldKind::Boolean => "boolean",
            FieldKind::StructuredList => "structured_list",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, FieldKind::MultiSelect | FieldKind::StructuredList)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldConstraints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConstraints {
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Default for FieldConstraints {
    fn default() -> Self {
        Self {
            required: default_required(),
            min: None,
            max: None,
            options: Vec::new(),
            min_items: None,
            max_items: None,
            max_length: None,
            pattern: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldIssue
// ---------------------------------------------------------------------------

/// Why a field does not yet satisfy its constraints. Gating state, not an
/// error: the host shows it next to a disabled "Next".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    fn new(path: &FieldPath, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub path: FieldPath,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub constraints: FieldConstraints,
}

impl FieldSpec {
    pub fn new(path: &str, kind: FieldKind) -> Result<Self> {
        Ok(Self {
            path: FieldPath::parse(path)?,
            kind,
            label: None,
            constraints: FieldConstraints::default(),
        })
    }

    pub fn optional(mut self) -> Self {
        self.constraints.required = false;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.constraints.min = Some(min);
        self.constraints.max = Some(max);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_items(mut self, n: usize) -> Self {
        self.constraints.min_items = Some(n);
        self
    }

    pub fn with_max_items(mut self, n: usize) -> Self {
        self.constraints.max_items = Some(n);
        self
    }

    pub fn with_max_length(mut self, n: usize) -> Self {
        self.constraints.max_length = Some(n);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Reject constraint sets that no answer could ever satisfy, or that
    /// do not apply to this kind of field.
    pub fn validate(&self) -> Result<()> {
        let c = &self.constraints;
        let bad = |msg: String| {
            Err(StepformError::InvalidDefinition(format!(
                "field '{}': {msg}",
                self.path
            )))
        };

        if let (Some(min), Some(max)) = (c.min, c.max) {
            if min > max {
                return bad(format!("min {min} is greater than max {max}"));
            }
        }
        if let (Some(lo), Some(hi)) = (c.min_items, c.max_items) {
            if lo > hi {
                return bad(format!("min_items {lo} is greater than max_items {hi}"));
            }
        }
        if matches!(self.kind, FieldKind::SingleSelect | FieldKind::MultiSelect)
            && c.options.is_empty()
        {
            return bad(format!("{} field has no options", self.kind));
        }
        if (c.min_items.is_some() || c.max_items.is_some()) && !self.kind.is_list() {
            return bad(format!("item limits do not apply to a {} field", self.kind));
        }
        if let Some(pattern) = &c.pattern {
            if self.kind != FieldKind::Text {
                return bad(format!("pattern does not apply to a {} field", self.kind));
            }
            if let Err(e) = Regex::new(pattern) {
                return bad(format!("invalid pattern: {e}"));
            }
        }
        Ok(())
    }

    /// First unmet constraint for this field, if any.
    pub fn check(&self, answers: &AnswerRecord) -> Option<FieldIssue> {
        let value = lookup(answers.as_value(), &self.path).filter(|v| !is_blank(v));
        let Some(value) = value else {
            return self
                .constraints
                .required
                .then(|| FieldIssue::new(&self.path, "a value is required"));
        };

        match self.kind {
            FieldKind::Text => self.check_text(value),
            FieldKind::SingleSelect => self.check_single(value),
            FieldKind::MultiSelect => self.check_list(value, true),
            FieldKind::StructuredList => self.check_list(value, false),
            FieldKind::Scale => self.check_scale(value),
            FieldKind::Boolean => (!value.is_boolean())
                .then(|| self.wrong_type("boolean", value)),
        }
    }

    fn wrong_type(&self, expected: &str, found: &Value) -> FieldIssue {
        FieldIssue::new(
            &self.path,
            format!("expected {expected}, found {}", kind_name(found)),
        )
    }

    fn check_text(&self, value: &Value) -> Option<FieldIssue> {
        let Some(text) = value.as_str() else {
            return Some(self.wrong_type("string", value));
        };
        if let Some(max) = self.constraints.max_length {
            if text.chars().count() > max {
                return Some(FieldIssue::new(
                    &self.path,
                    format!("must be at most {max} characters"),
                ));
            }
        }
        if let Some(pattern) = &self.constraints.pattern {
            // An unparseable pattern is rejected by validate(); treat it as unmet here.
            let matched = compiled(pattern).is_some_and(|re| re.is_match(text));
            if !matched {
                return Some(FieldIssue::new(&self.path, "does not match the expected format"));
            }
        }
        None
    }

    fn check_single(&self, value: &Value) -> Option<FieldIssue> {
        let Some(choice) = value.as_str() else {
            return Some(self.wrong_type("string", value));
        };
        if !self.constraints.options.iter().any(|o| o == choice) {
            return Some(FieldIssue::new(
                &self.path,
                format!("'{choice}' is not one of the options"),
            ));
        }
        None
    }

    fn check_list(&self, value: &Value, restrict_to_options: bool) -> Option<FieldIssue> {
        let Some(items) = value.as_array() else {
            return Some(self.wrong_type("array", value));
        };
        let c = &self.constraints;
        let min = c.min_items.unwrap_or(if c.required { 1 } else { 0 });
        if items.len() < min {
            return Some(FieldIssue::new(
                &self.path,
                format!("select at least {min} item(s)"),
            ));
        }
        if let Some(max) = c.max_items {
            if items.len() > max {
                return Some(FieldIssue::new(
                    &self.path,
                    format!("select at most {max} item(s)"),
                ));
            }
        }
        if restrict_to_options {
            for item in items {
                let known = item
                    .as_str()
                    .map(|s| c.options.iter().any(|o| o == s))
                    .unwrap_or(false);
                if !known {
                    return Some(FieldIssue::new(
                        &self.path,
                        format!("{item} is not one of the options"),
                    ));
                }
            }
        }
        None
    }

    fn check_scale(&self, value: &Value) -> Option<FieldIssue> {
        let Some(n) = value.as_f64() else {
            return Some(self.wrong_type("number", value));
        };
        let c = &self.constraints;
        let below = c.min.map(|min| n < min).unwrap_or(false);
        let above = c.max.map(|max| n > max).unwrap_or(false);
        if below || above {
            let range = match (c.min, c.max) {
                (Some(lo), Some(hi)) => format!("between {lo} and {hi}"),
                (Some(lo), None) => format!("at least {lo}"),
                (None, Some(hi)) => format!("at most {hi}"),
                (None, None) => String::new(),
            };
            return Some(FieldIssue::new(&self.path, format!("must be {range}")));
        }
        None
    }
}

static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

/// Compile each distinct text pattern once per process.
fn compiled(pattern: &str) -> Option<Regex> {
    let mut cache = PATTERNS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    if let Some(re) = cache.get(pattern) {
        return Some(re.clone());
    }
    let re = Regex::new(pattern).ok()?;
    cache.insert(pattern.to_string(), re.clone());
    Some(re)
}

/// `null`, whitespace-only strings and, for scalars, nothing else.
/// Empty lists are not blank: list minimums are checked separately.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> AnswerRecord {
        AnswerRecord::from_value(v).unwrap()
    }

    #[test]
    fn required_scale_gates_on_range() {
        let f = FieldSpec::new("rating", FieldKind::Scale)
            .unwrap()
            .with_range(1.0, 10.0);
        assert!(f.check(&AnswerRecord::new()).is_some());
        assert!(f.check(&record(json!({"rating": 0}))).is_some());
        assert!(f.check(&record(json!({"rating": "7"}))).is_some());
        assert!(f.check(&record(json!({"rating": 7}))).is_none());
        assert!(f.check(&record(json!({"rating": 10}))).is_none());
    }

    #[test]
    fn optional_missing_is_fine_but_wrong_type_is_not() {
        let f = FieldSpec::new("note", FieldKind::Text).unwrap().optional();
        assert!(f.check(&AnswerRecord::new()).is_none());
        assert!(f.check(&record(json!({"note": "  "}))).is_none());
        assert!(f.check(&record(json!({"note": 4}))).is_some());
    }

    #[test]
    fn multi_select_requires_one_known_item() {
        let f = FieldSpec::new("selected", FieldKind::MultiSelect)
            .unwrap()
            .with_options(["item-a", "item-b"]);
        assert!(f.check(&record(json!({"selected": []}))).is_some());
        assert!(f.check(&record(json!({"selected": ["item-z"]}))).is_some());
        assert!(f.check(&record(json!({"selected": ["item-a"]}))).is_none());
    }

    #[test]
    fn structured_list_item_limits() {
        let f = FieldSpec::new("thoughts", FieldKind::StructuredList)
            .unwrap()
            .with_min_items(2)
            .with_max_items(3);
        assert!(f.check(&record(json!({"thoughts": [{}]}))).is_some());
        assert!(f.check(&record(json!({"thoughts": [{}, {}]}))).is_none());
        assert!(f.check(&record(json!({"thoughts": [{}, {}, {}, {}]}))).is_some());
    }

    #[test]
    fn text_pattern_and_length() {
        let f = FieldSpec::new("time", FieldKind::Text)
            .unwrap()
            .with_pattern(r"^\d{2}:\d{2}$")
            .with_max_length(5);
        assert!(f.validate().is_ok());
        assert!(f.check(&record(json!({"time": "07:30"}))).is_none());
        assert!(f.check(&record(json!({"time": "7:30am"}))).is_some());
    }

    #[test]
    fn text_pattern_compiled_once_and_reused() {
        let f = FieldSpec::new("code", FieldKind::Text)
            .unwrap()
            .with_pattern(r"^[A-Z]{3}-\d{4}$");
        for _ in 0..3 {
            assert!(f.check(&record(json!({"code": "ABC-1234"}))).is_none());
            assert!(f.check(&record(json!({"code": "abc-1234"}))).is_some());
        }
        let cached = PATTERNS.get().unwrap().lock().unwrap();
        assert!(cached.contains_key(r"^[A-Z]{3}-\d{4}$"));
    }

    #[test]
    fn single_select_must_match_option() {
        let f = FieldSpec::new("technique", FieldKind::SingleSelect)
            .unwrap()
            .with_options(["box", "4-7-8"]);
        assert!(f.check(&record(json!({"technique": "box"}))).is_none());
        assert!(f.check(&record(json!({"technique": "square"}))).is_some());
    }

    #[test]
    fn validate_rejects_contradictions() {
        let inverted = FieldSpec::new("r", FieldKind::Scale).unwrap().with_range(5.0, 1.0);
        assert!(inverted.validate().is_err());

        let no_options = FieldSpec::new("s", FieldKind::SingleSelect).unwrap();
        assert!(no_options.validate().is_err());

        let bad_regex = FieldSpec::new("t", FieldKind::Text).unwrap().with_pattern("(");
        assert!(bad_regex.validate().is_err());

        let items_on_text = FieldSpec::new("t", FieldKind::Text).unwrap().with_min_items(1);
        assert!(items_on_text.validate().is_err());
    }

    #[test]
    fn yaml_defaults_required() {
        let yaml = "path: rating\nkind: scale\nconstraints:\n  min: 1\n  max: 10\n";
        let f: FieldSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(f.constraints.required);
        assert_eq!(f.constraints.max, Some(10.0));
        assert_eq!(f.kind, FieldKind::Scale);
    }

    #[test]
    fn yaml_rejects_unknown_constraint() {
        let yaml = "path: rating\nkind: scale\nconstraints:\n  maximum: 10\n";
        assert!(serde_yaml::from_str::<FieldSpec>(yaml).is_err());
    }
}
