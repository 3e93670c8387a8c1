use crate::output::print_json;
use std::path::Path;
use stepform_core::descriptor::{DefinitionWarning, WarnLevel};

pub fn run(dir: &Path, id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = super::load_registry(dir)?;

    let targets = match id {
        Some(id) => vec![registry.get(id)?],
        None => registry.iter().collect(),
    };

    let reports: Vec<(&str, Vec<DefinitionWarning>)> = targets
        .iter()
        .map(|d| (d.id.as_str(), d.validate()))
        .collect();
    let errors = reports
        .iter()
        .flat_map(|(_, w)| w)
        .filter(|w| w.level == WarnLevel::Error)
        .count();

    if json {
        #[derive(serde::Serialize)]
        struct Report<'a> {
            wizard: &'a str,
            warnings: &'a [DefinitionWarning],
        }
        let out: Vec<Report> = reports
            .iter()
            .map(|(wizard, warnings)| Report { wizard, warnings })
            .collect();
        print_json(&out)?;
    } else {
        for (wizard, warnings) in &reports {
            if warnings.is_empty() {
                println!("{wizard}: ok");
                continue;
            }
            for w in warnings {
                let tag = match w.level {
                    WarnLevel::Error => "error",
                    WarnLevel::Warning => "warning",
                };
                println!("{wizard}: {tag}: {}", w.message);
            }
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} definition error(s)");
    }
    Ok(())
}
