use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use stepform_core::script::{self, Outcome};
use stepform_core::{CompletionEmitter, CompletionPayload, WizardHost};

/// Keeps what a UI host would forward: the payload on completion and the
/// close signal.
#[derive(Default)]
struct CliHost {
    payload: Option<CompletionPayload>,
    closed: bool,
}

impl WizardHost for CliHost {
    fn on_complete(&mut self, payload: &CompletionPayload) {
        self.payload = Some(payload.clone());
    }

    fn on_close(&mut self) {
        self.closed = true;
    }
}

pub fn run(dir: &Path, id: &str, script_path: &Path, json: bool) -> anyhow::Result<()> {
    let registry = super::load_registry(dir)?;
    let descriptor = registry.get(id)?;
    let actions = script::load(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;

    let mut wizard = descriptor
        .start()
        .with_context(|| format!("wizard '{id}' is not runnable"))?;
    let mut emitter = CompletionEmitter::new(CliHost::default());
    let outcomes = script::replay(&mut wizard, &mut emitter, &descriptor.id, &actions)
        .context("script aborted")?;
    let host = emitter.into_host();

    if json {
        #[derive(serde::Serialize)]
        struct Report<'a> {
            wizard: &'a str,
            status: String,
            step: &'a str,
            outcomes: &'a [Outcome],
            #[serde(skip_serializing_if = "Option::is_none")]
            payload: Option<&'a CompletionPayload>,
        }
        return print_json(&Report {
            wizard: &descriptor.id,
            status: wizard.status().to_string(),
            step: &wizard.current_step().id,
            outcomes: &outcomes,
            payload: host.payload.as_ref(),
        });
    }

    let rows = outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| {
            vec![
                (i + 1).to_string(),
                o.action.clone(),
                if o.accepted { "ok" } else { "refused" }.to_string(),
                (o.step + 1).to_string(),
                o.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["#", "ACTION", "RESULT", "STEP", "NOTE"], rows);
    println!();
    println!(
        "Session {} on step '{}' ({} of {}).",
        wizard.status(),
        wizard.current_step().id,
        wizard.current_index() + 1,
        wizard.steps().len()
    );

    if let Some(payload) = &host.payload {
        println!();
        println!("{}", serde_json::to_string_pretty(payload)?);
    } else if host.closed {
        println!("Closed without completing.");
    }
    Ok(())
}
