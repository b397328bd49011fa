//! Runs a stage: one step at a time, in declaration order, flushing the
//! registry after every step so a crash never loses completed work.
//!
//! There are no retries. A failed step aborts the run and the registry on
//! disk holds exactly the steps that completed before it; invoking the same
//! stage again resumes from there, because components with an override or a
//! registry entry are skipped.

use crate::args::Resolver;
use crate::artifact::ArtifactSource;
use crate::config::Config;
use crate::error::{DeployerError, Result};
use crate::executor::{DeployRequest, Executor};
use crate::link::LinkResolver;
use crate::post_action::PostAction;
use crate::registry::{MergeOutcome, Registry};
use crate::stage::Stage;
use crate::step::{Step, StepRun, StepState};
use crate::types::{Address, Receipt};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Options and reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Forget this stage's components from the prior registry before the
    /// first step, so all of them are deployed again.
    pub fresh: bool,
}

/// Where a step's effective address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    Override,
    Registry,
    Deployed,
}

impl AddressSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AddressSource::Override => "override",
            AddressSource::Registry => "registry",
            AddressSource::Deployed => "deployed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionCall {
    pub action: String,
    pub position: usize,
    pub target: String,
    pub method: String,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub component: String,
    pub state: StepState,
    pub source: AddressSource,
    pub address: Address,
    pub history: Vec<StepState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<ActionCall>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forgotten: Vec<String>,
    pub steps: Vec<StepReport>,
    pub registry: Registry,
}

impl RunReport {
    pub fn deployed(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| s.source == AddressSource::Deployed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| s.source != AddressSource::Deployed)
    }
}

enum Decision {
    Skip(Address, AddressSource),
    Deploy,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    executor: &'a mut dyn Executor,
    artifacts: &'a dyn ArtifactSource,
    destination: PathBuf,
    options: RunOptions,
}

impl<'a> Orchestrator<'a> {
    /// `destination` is where the registry is flushed after every step.
    pub fn new(
        executor: &'a mut dyn Executor,
        artifacts: &'a dyn ArtifactSource,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            artifacts,
            destination: destination.into(),
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(&mut self, stage: &Stage, config: &Config, prior: Registry) -> Result<RunReport> {
        stage.validate()?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", stage = %stage.name, %run_id);
        let _enter = span.enter();
        let started_at = Utc::now();

        let mut registry = prior;
        let forgotten = if self.options.fresh {
            let forgotten = registry.forget(stage.component_names());
            if !forgotten.is_empty() {
                tracing::warn!(components = ?forgotten, "fresh run: forgetting prior registry entries");
            }
            forgotten
        } else {
            Vec::new()
        };

        let mut steps = Vec::with_capacity(stage.steps.len());
        for (i, step) in stage.steps.iter().enumerate() {
            let report = match self.run_step(step, config, &registry) {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(
                        step = step.name(),
                        position = i + 1,
                        kind = %e.kind(),
                        error = %e,
                        "step failed, aborting run"
                    );
                    return Err(e);
                }
            };

            let outcome = registry.merge(&report.component, report.address.clone())?;
            registry.flush(&self.destination)?;
            tracing::debug!(
                component = %report.component,
                new_entry = outcome == MergeOutcome::Inserted,
                destination = %self.destination.display(),
                "registry flushed"
            );
            steps.push(report);
        }

        let report = RunReport {
            run_id,
            stage: stage.name.clone(),
            started_at,
            finished_at: Utc::now(),
            forgotten,
            steps,
            registry,
        };
        tracing::info!(
            deployed = report.deployed().count(),
            skipped = report.skipped().count(),
            "stage complete"
        );
        Ok(report)
    }

    fn run_step(&mut self, step: &Step, config: &Config, registry: &Registry) -> Result<StepReport> {
        let mut run = StepRun::new();
        let result = self.execute_step(step, config, registry, &mut run);
        if result.is_err() {
            run.fail();
            tracing::debug!(step = step.name(), history = ?run.history(), "step state at failure");
        }
        result
    }

    fn execute_step(
        &mut self,
        step: &Step,
        config: &Config,
        registry: &Registry,
        run: &mut StepRun,
    ) -> Result<StepReport> {
        let name = step.name();
        let component = &step.component;

        let (address, source, receipt, linked) = match decide(step, config, registry)? {
            Decision::Skip(address, source) => {
                run.advance(StepState::Skipped)?;
                tracing::info!(component = name, %address, source = source.as_str(), "skipping deploy");
                (address, source, None, Vec::new())
            }
            Decision::Deploy => {
                run.advance(StepState::Deploying)?;
                let linker = LinkResolver::new(registry);
                linker.ensure_registered(&component.libraries, name)?;
                let artifact = self.artifacts.load(&component.artifact)?;
                let artifact = linker.link_all(&component.libraries, artifact)?;
                let args = Resolver::new(name, config, registry, &mut *self.executor)
                    .resolve_all(&component.args)?;
                let linked: Vec<String> = artifact.links.keys().cloned().collect();

                let request = DeployRequest {
                    component: name.to_string(),
                    artifact,
                    args,
                    gas: component.gas,
                };
                tracing::info!(component = name, artifact = %component.artifact, gas = component.gas, "deploying");
                let result = self
                    .executor
                    .deploy(&request)
                    .map_err(|e| DeployerError::Deploy {
                        component: name.to_string(),
                        reason: e.to_string(),
                    })?;
                run.advance(StepState::Deployed)?;
                tracing::info!(component = name, address = %result.address, "deployed");
                (
                    result.address,
                    AddressSource::Deployed,
                    Some(result.receipt),
                    linked,
                )
            }
        };

        let deployed = source == AddressSource::Deployed;
        let actions: Vec<(usize, &dyn PostAction)> = step
            .post_actions
            .iter()
            .enumerate()
            .filter(|(_, action)| deployed || action.runs_on_skip())
            .map(|(i, action)| (i + 1, &**action))
            .collect();

        let mut calls = Vec::new();
        if !actions.is_empty() {
            run.advance(StepState::PostActionsRunning)?;
            for (position, action) in actions {
                let outcome = self.run_action(name, position, action, &address, config, registry);
                match outcome {
                    Ok(mut done) => calls.append(&mut done),
                    Err(e) => {
                        if deployed {
                            tracing::warn!(
                                component = name,
                                %address,
                                "deployed but not registered; configure it as an override to reuse it"
                            );
                        }
                        return Err(e);
                    }
                }
            }
        }

        run.advance(StepState::Completed)?;
        Ok(StepReport {
            component: name.to_string(),
            state: run.state(),
            source,
            address,
            history: run.history().to_vec(),
            linked,
            receipt,
            calls,
        })
    }

    fn run_action(
        &mut self,
        step: &str,
        position: usize,
        action: &dyn PostAction,
        address: &Address,
        config: &Config,
        registry: &Registry,
    ) -> Result<Vec<ActionCall>> {
        let requests = {
            let mut resolver =
                Resolver::new(step, config, registry, &mut *self.executor).with_address(address);
            action.plan(&mut resolver)?
        };

        let mut calls = Vec::with_capacity(requests.len());
        for request in requests {
            tracing::debug!(
                step,
                action = action.name(),
                position,
                target = %request.target,
                method = %request.method,
                "post-action call"
            );
            let receipt = self
                .executor
                .call(&request)
                .map_err(|e| DeployerError::PostAction {
                    step: step.to_string(),
                    action: action.name().to_string(),
                    position,
                    reason: format!("{}.{}: {e}", request.target, request.method),
                })?;
            calls.push(ActionCall {
                action: action.name().to_string(),
                position,
                target: request.target,
                method: request.method,
                receipt,
            });
        }
        Ok(calls)
    }
}

/// Skip-vs-deploy. An override that disagrees with what the registry already
/// holds is a caller inconsistency, not something to paper over.
fn decide(step: &Step, config: &Config, registry: &Registry) -> Result<Decision> {
    let name = step.name();
    match (config.override_for(name)?, registry.get(name)) {
        (Some(overridden), Some(existing)) if overridden != *existing => {
            Err(DeployerError::RegistryConflict {
                name: name.to_string(),
                existing: existing.to_string(),
                attempted: overridden.to_string(),
            })
        }
        (Some(overridden), _) => Ok(Decision::Skip(overridden, AddressSource::Override)),
        (None, Some(existing)) => Ok(Decision::Skip(existing.clone(), AddressSource::Registry)),
        (None, None) => Ok(Decision::Deploy),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
