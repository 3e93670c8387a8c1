//! Read-only projections over a finished answer record: "most common
//! distortion this week", "average mood", and similar summary panels.

use crate::binding::lookup;
use crate::error::{Result, StepformError};
use crate::path::FieldPath;
use crate::record::{kind_name, AnswerRecord};
use serde_json::Value;

/// Gather the values under `list_path`, optionally projecting each entry
/// through `item_path`. Nested arrays produced by the projection are
/// flattened one level; entries missing the projected path are skipped.
/// A missing list reads as empty.
pub fn collect<'a>(
    answers: &'a AnswerRecord,
    list_path: &str,
    item_path: Option<&str>,
) -> Result<Vec<&'a Value>> {
    let list_path = FieldPath::parse(list_path)?;
    let item_path = item_path.map(FieldPath::parse).transpose()?;

    let items = match lookup(answers.as_value(), &list_path) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(StepformError::TypeMismatch {
                path: list_path.to_string(),
                expected: format!("array, found {}", kind_name(other)),
            })
        }
    };

    let mut out = Vec::new();
    for item in items {
        let projected = match &item_path {
            Some(p) => lookup(item, p),
            None => Some(item),
        };
        match projected {
            Some(Value::Array(inner)) if item_path.is_some() => out.extend(inner.iter()),
            Some(Value::Null) | None => {}
            Some(v) => out.push(v),
        }
    }
    Ok(out)
}

/// Distinct values with their occurrence counts, in first-seen order.
pub fn counts<'a>(values: &[&'a Value]) -> Vec<(&'a Value, usize)> {
    let mut out: Vec<(&Value, usize)> = Vec::new();
    for v in values {
        match out.iter_mut().find(|(seen, _)| seen == v) {
            Some((_, n)) => *n += 1,
            None => out.push((*v, 1)),
        }
    }
    out
}

/// Most frequent value; ties go to the value seen first.
pub fn most_common<'a>(values: &[&'a Value]) -> Option<(&'a Value, usize)> {
    counts(values)
        .into_iter()
        .fold(None, |best, (v, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((v, n)),
        })
}

/// Mean of the numeric values; non-numbers are ignored.
pub fn average(values: &[&Value]) -> Option<f64> {
    let nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if nums.is_empty() {
        return None;
    }
    Some(nums.iter().sum::<f64>() / nums.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn week() -> AnswerRecord {
        AnswerRecord::from_value(json!({
            "days": [
                {"mood": 4, "distortions": ["catastrophizing"]},
                {"mood": 6, "distortions": ["labeling", "catastrophizing"]},
                {"mood": 8},
                {"mood": null, "distortions": ["labeling", "catastrophizing"]}
            ],
            "tags": ["calm", "tired", "calm"]
        }))
        .unwrap()
    }

    #[test]
    fn average_mood_skips_missing() {
        let w = week();
        let moods = collect(&w, "days", Some("mood")).unwrap();
        assert_eq!(moods.len(), 3);
        assert_eq!(average(&moods), Some(6.0));
    }

    #[test]
    fn most_common_distortion_flattens_lists() {
        let w = week();
        let d = collect(&w, "days", Some("distortions")).unwrap();
        assert_eq!(d.len(), 5);
        let (value, n) = most_common(&d).unwrap();
        assert_eq!(value, &json!("catastrophizing"));
        assert_eq!(n, 3);
    }

    #[test]
    fn counts_in_first_seen_order() {
        let w = week();
        let tags = collect(&w, "tags", None).unwrap();
        let c = counts(&tags);
        assert_eq!(c, vec![(&json!("calm"), 2), (&json!("tired"), 1)]);
    }

    #[test]
    fn ties_go_to_first_seen() {
        let a = json!("a");
        let b = json!("b");
        assert_eq!(most_common(&[&b, &a, &a, &b]), Some((&b, 2)));
    }

    #[test]
    fn empty_inputs() {
        let empty = AnswerRecord::new();
        assert!(collect(&empty, "days", None).unwrap().is_empty());
        assert_eq!(average(&[]), None);
        assert_eq!(most_common(&[]), None);
    }

    #[test]
    fn non_list_is_type_mismatch() {
        let r = AnswerRecord::from_value(json!({"days": 3})).unwrap();
        assert!(matches!(
            collect(&r, "days", None),
            Err(StepformError::TypeMismatch { .. })
        ));
    }
}
