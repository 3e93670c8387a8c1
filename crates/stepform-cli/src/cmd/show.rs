use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(dir: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let registry = super::load_registry(dir)?;
    let descriptor = registry.get(id)?;

    if json {
        return print_json(descriptor);
    }

    println!("{} ({})", descriptor.title, descriptor.id);
    if let Some(desc) = &descriptor.description {
        println!("{desc}");
    }
    println!();

    let mut rows = Vec::new();
    for (i, step) in descriptor.steps.iter().enumerate() {
        let gate = if step.complete_when.is_some() {
            "condition"
        } else {
            "-"
        };
        if step.fields.is_empty() {
            rows.push(vec![
                (i + 1).to_string(),
                step.id.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                gate.to_string(),
            ]);
        }
        for field in &step.fields {
            rows.push(vec![
                (i + 1).to_string(),
                step.id.clone(),
                field.path.to_string(),
                field.kind.as_str().to_string(),
                if field.constraints.required { "yes" } else { "no" }.to_string(),
                gate.to_string(),
            ]);
        }
    }
    print_table(&["#", "STEP", "FIELD", "KIND", "REQUIRED", "GATE"], rows);
    Ok(())
}
