use crate::output::{print_json, print_table};
use deployer_core::Stage;
use serde::Serialize;

#[derive(Serialize)]
struct StageSummary {
    stage: &'static str,
    components: Vec<ComponentSummary>,
}

#[derive(Serialize)]
struct ComponentSummary {
    name: String,
    artifact: String,
    gas: u64,
    libraries: Vec<String>,
    post_actions: Vec<String>,
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let mut summaries = Vec::new();
    for &name in Stage::builtin_names() {
        let stage = Stage::builtin(name)?;
        let components = stage
            .steps
            .iter()
            .map(|step| ComponentSummary {
                name: step.component.name.clone(),
                artifact: step.component.artifact.clone(),
                gas: step.component.gas,
                libraries: step.component.libraries.clone(),
                post_actions: step.post_actions.iter().map(|a| a.name().to_string()).collect(),
            })
            .collect();
        summaries.push(StageSummary {
            stage: name,
            components,
        });
    }

    if json {
        return print_json(&summaries);
    }

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .flat_map(|s| {
            s.components.iter().map(move |c| {
                vec![
                    s.stage.to_string(),
                    c.name.clone(),
                    c.artifact.clone(),
                    c.gas.to_string(),
                    c.libraries.join(","),
                    c.post_actions.join(","),
                ]
            })
        })
        .collect();
    print_table(
        &["STAGE", "COMPONENT", "ARTIFACT", "GAS", "LIBRARIES", "POST-ACTIONS"],
        rows,
    );
    Ok(())
}
