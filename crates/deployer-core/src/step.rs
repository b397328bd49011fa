use crate::args::Arg;
use crate::error::{DeployerError, Result};
use crate::post_action::PostAction;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A deployable unit: which artifact to deploy, with what arguments and gas,
/// and which libraries must be linked into it first.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub artifact: String,
    pub args: Vec<Arg>,
    pub gas: u64,
    pub libraries: Vec<String>,
}

impl Component {
    /// A component whose artifact has the same name as the component.
    pub fn new(name: impl Into<String>, gas: u64) -> Self {
        let name = name.into();
        Self {
            artifact: name.clone(),
            name,
            args: Vec::new(),
            gas,
            libraries: Vec::new(),
        }
    }

    pub fn artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = artifact.into();
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    pub fn libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries.extend(libraries.into_iter().map(Into::into));
        self
    }

    /// Component names that must already be registered before this one can
    /// be deployed.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.libraries
            .iter()
            .map(String::as_str)
            .chain(self.args.iter().filter_map(Arg::registry_reference))
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Exactly one component plus the actions to run once it is in place.
#[derive(Debug)]
pub struct Step {
    pub component: Component,
    pub post_actions: Vec<Box<dyn PostAction>>,
}

impl Step {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            post_actions: Vec::new(),
        }
    }

    pub fn then(mut self, action: impl PostAction + 'static) -> Self {
        self.post_actions.push(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }
}

// ---------------------------------------------------------------------------
// StepState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Skipped,
    Deploying,
    Deployed,
    PostActionsRunning,
    Completed,
    Failed,
}

impl StepState {
    pub fn as_str(self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Skipped => "skipped",
            StepState::Deploying => "deploying",
            StepState::Deployed => "deployed",
            StepState::PostActionsRunning => "post_actions_running",
            StepState::Completed => "completed",
            StepState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Completed | StepState::Failed)
    }

    pub fn can_transition_to(self, next: StepState) -> bool {
        use StepState::*;
        matches!(
            (self, next),
            (Pending, Skipped)
                | (Pending, Deploying)
                | (Pending, Failed)
                | (Deploying, Deployed)
                | (Deploying, Failed)
                | (Deployed, PostActionsRunning)
                | (Deployed, Completed)
                | (Skipped, PostActionsRunning)
                | (Skipped, Completed)
                | (PostActionsRunning, Completed)
                | (PostActionsRunning, Failed)
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StepRun
// ---------------------------------------------------------------------------

/// Tracks one step through its state machine.
#[derive(Debug, Clone)]
pub struct StepRun {
    state: StepState,
    history: Vec<StepState>,
}

impl StepRun {
    pub fn new() -> Self {
        Self {
            state: StepState::Pending,
            history: vec![StepState::Pending],
        }
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    pub fn history(&self) -> &[StepState] {
        &self.history
    }

    pub fn advance(&mut self, next: StepState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(DeployerError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed` from wherever the step currently is, if that is legal.
    pub fn fail(&mut self) {
        if self.state.can_transition_to(StepState::Failed) {
            self.state = StepState::Failed;
            self.history.push(StepState::Failed);
        }
    }
}

impl Default for StepRun {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
