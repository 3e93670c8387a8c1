use crate::descriptor::WizardDescriptor;
use crate::error::{Result, StepformError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const WIZARDS_DIR: &str = ".stepform/wizards";
pub const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Clone)]
struct Entry {
    source: PathBuf,
    descriptor: WizardDescriptor,
}

/// Wizard descriptors loaded from one directory, keyed by wizard id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    wizards: BTreeMap<String, Entry>,
}

impl Registry {
    /// Load every definition file directly under `dir`. A missing directory
    /// yields an empty registry.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut registry = Self::default();
        if !dir.exists() {
            return Ok(registry);
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if is_definition_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            let descriptor = WizardDescriptor::load(&path).map_err(|e| match e {
                StepformError::Yaml(_) | StepformError::Json(_) => StepformError::InvalidDefinition(
                    format!("{}: {e}", path.display()),
                ),
                other => other,
            })?;
            tracing::debug!(wizard = %descriptor.id, file = %path.display(), "loaded wizard");
            registry.insert(path, descriptor)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, source: PathBuf, descriptor: WizardDescriptor) -> Result<()> {
        if let Some(existing) = self.wizards.get(&descriptor.id) {
            return Err(StepformError::DuplicateWizard {
                id: descriptor.id,
                first: existing.source.display().to_string(),
                second: source.display().to_string(),
            });
        }
        self.wizards
            .insert(descriptor.id.clone(), Entry { source, descriptor });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&WizardDescriptor> {
        self.wizards
            .get(id)
            .map(|e| &e.descriptor)
            .ok_or_else(|| StepformError::WizardNotFound(id.to_string()))
    }

    pub fn source(&self, id: &str) -> Option<&Path> {
        self.wizards.get(id).map(|e| e.source.as_path())
    }

    /// Descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WizardDescriptor> {
        self.wizards.values().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.wizards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wizards.is_empty()
    }
}

fn is_definition_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            DEFINITION_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

pub fn wizards_dir(root: &Path) -> PathBuf {
    root.join(WIZARDS_DIR)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
