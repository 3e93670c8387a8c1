use crate::error::{Result, StepformError};
use crate::record::AnswerRecord;
use crate::step::{validate_id, StepDefinition, StepSequence};
use crate::wizard::WizardController;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// DefinitionWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WizardDescriptor
// ---------------------------------------------------------------------------

/// One wizard as a host registry supplies it: identity, copy, default
/// answers and the ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub initial_answers: AnswerRecord,
    pub steps: Vec<StepDefinition>,
}

impl WizardDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<StepDefinition>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            initial_answers: AnswerRecord::new(),
            steps,
        }
    }

    pub fn with_initial_answers(mut self, answers: AnswerRecord) -> Self {
        self.initial_answers = answers;
        self
    }

    /// Load a `.json` file as JSON and anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(serde_yaml::from_str(&data)?)
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn build(&self) -> Result<StepSequence> {
        validate_id(&self.id)?;
        StepSequence::build(self.steps.clone())
    }

    /// Build the step sequence and open a session on the default answers.
    pub fn start(&self) -> Result<WizardController> {
        Ok(WizardController::new(self.build()?, &self.initial_answers))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<DefinitionWarning> {
        let mut warnings = Vec::new();

        // 1. Anything build() rejects is an error
        if let Err(e) = self.build() {
            warnings.push(DefinitionWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        // 2. Steps that can never gate
        for step in &self.steps {
            if step.fields.is_empty() && step.complete_when.is_none() && step.predicate.is_none() {
                warnings.push(DefinitionWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "step '{}' has no fields and no completion condition; it never gates",
                        step.id
                    ),
                });
            }
        }

        // 3. The same path bound by two steps
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for step in &self.steps {
            for field in &step.fields {
                if let Some(first) = owners.insert(field.path.as_str(), step.id.as_str()) {
                    if first != step.id {
                        warnings.push(DefinitionWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "field '{}' is bound by both step '{}' and step '{}'",
                                field.path, first, step.id
                            ),
                        });
                    }
                }
            }
        }

        // 4. Conditions reading paths that no field declares
        for step in &self.steps {
            let Some(cond) = &step.complete_when else {
                continue;
            };
            for path in cond.paths() {
                let declared = owners.contains_key(path.as_str())
                    || crate::binding::lookup(self.initial_answers.as_value(), path).is_some();
                if !declared {
                    warnings.push(DefinitionWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "step '{}' condition reads '{}', which no field declares",
                            step.id, path
                        ),
                    });
                }
            }
        }

        warnings
    }
}

impl std::str::FromStr for WizardDescriptor {
    type Err = StepformError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const MOOD: &str = r#"
id: mood-check
title: Daily Mood Check
initial_answers:
  selectedItems: []
steps:
  - id: rate
    title: Rate your mood
    fields:
      - path: rating
        kind: scale
        constraints: { min: 1, max: 10 }
  - id: pick
    title: What helped today?
    fields:
      - path: selectedItems
        kind: multi_select
        constraints:
          options: [sleep, water, walk]
"#;

    #[test]
    fn parse_and_start() {
        let d: WizardDescriptor = MOOD.parse().unwrap();
        assert_eq!(d.id, "mood-check");
        assert_eq!(d.steps.len(), 2);
        let w = d.start().unwrap();
        assert_eq!(w.current_index(), 0);
        assert_eq!(w.answers().as_value(), &json!({"selectedItems": []}));
        assert!(d.validate().is_empty());
    }

    #[test]
    fn yaml_round_trip() {
        let d: WizardDescriptor = MOOD.parse().unwrap();
        let yaml = d.to_yaml().unwrap();
        let again: WizardDescriptor = yaml.parse().unwrap();
        assert_eq!(again.steps[1].fields[0].constraints.options.len(), 3);
        assert_eq!(again.initial_answers, d.initial_answers);
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let yaml = "id: x\ntitle: X\nstepz: []\nsteps: []\n";
        assert!(yaml.parse::<WizardDescriptor>().is_err());
    }

    #[test]
    fn invalid_wizard_id_fails_build() {
        let d = WizardDescriptor::new("Bad Id", "X", vec![StepDefinition::new("a", "A")]);
        assert!(matches!(d.build(), Err(StepformError::InvalidDefinition(_))));
        let warnings = d.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn validate_flags_ungated_steps_and_unknown_paths() {
        let yaml = r#"
id: journal
title: Journal
steps:
  - id: intro
    title: Intro
  - id: write
    title: Write
    complete_when: { type: non_empty, path: entry }
"#;
        let d: WizardDescriptor = yaml.parse().unwrap();
        let warnings = d.validate();
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
        assert!(warnings.iter().any(|w| w.message.contains("'intro'") && w.message.contains("never gates")));
        assert!(warnings.iter().any(|w| w.message.contains("reads 'entry'")));
    }

    #[test]
    fn validate_flags_shared_paths() {
        let yaml = r#"
id: twice
title: Twice
steps:
  - id: a
    title: A
    fields: [{ path: mood, kind: text }]
  - id: b
    title: B
    fields: [{ path: mood, kind: text }]
"#;
        let d: WizardDescriptor = yaml.parse().unwrap();
        assert!(d
            .validate()
            .iter()
            .any(|w| w.message.contains("bound by both step 'a' and step 'b'")));
    }

    #[test]
    fn load_json_and_yaml_files() {
        let dir = TempDir::new().unwrap();
        let yaml_path = dir.path().join("mood.yaml");
        std::fs::write(&yaml_path, MOOD).unwrap();
        let from_yaml = WizardDescriptor::load(&yaml_path).unwrap();

        let json_path = dir.path().join("mood.json");
        std::fs::write(&json_path, serde_json::to_string(&from_yaml).unwrap()).unwrap();
        let from_json = WizardDescriptor::load(&json_path).unwrap();
        assert_eq!(from_json.id, "mood-check");
        assert_eq!(from_json.steps.len(), 2);
    }
}
