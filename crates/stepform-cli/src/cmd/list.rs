use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(dir: &Path, json: bool) -> anyhow::Result<()> {
    let registry = super::load_registry(dir)?;

    if json {
        #[derive(serde::Serialize)]
        struct Row<'a> {
            id: &'a str,
            title: &'a str,
            steps: usize,
            source: String,
        }
        let rows: Vec<Row> = registry
            .iter()
            .map(|d| Row {
                id: &d.id,
                title: &d.title,
                steps: d.steps.len(),
                source: registry
                    .source(&d.id)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            })
            .collect();
        return print_json(&rows);
    }

    if registry.is_empty() {
        println!("No wizards in {}.", dir.display());
        return Ok(());
    }

    let rows = registry
        .iter()
        .map(|d| vec![d.id.clone(), d.title.clone(), d.steps.len().to_string()])
        .collect();
    print_table(&["ID", "TITLE", "STEPS"], rows);
    Ok(())
}
