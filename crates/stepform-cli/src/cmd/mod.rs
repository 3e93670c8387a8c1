pub mod list;
pub mod run;
pub mod show;
pub mod validate;

use anyhow::Context;
use std::path::Path;
use stepform_core::registry::Registry;

pub(crate) fn load_registry(dir: &Path) -> anyhow::Result<Registry> {
    Registry::load(dir).with_context(|| format!("failed to load wizards from {}", dir.display()))
}
