use std::path::{Path, PathBuf};

use stepform_core::registry::{wizards_dir, WIZARDS_DIR};

/// Resolve the directory wizard definitions are loaded from.
///
/// Priority:
/// 1. `--dir` flag / `STEPFORM_DIR` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.stepform/wizards/`
/// 3. Fall back to `cwd/wizards`
pub fn resolve_wizards_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or_else(|| cwd.join("wizards"))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(WIZARDS_DIR).is_dir() {
            return Some(wizards_dir(&dir));
        }
        dir = dir.parent()?.to_path_buf();
    }
}
