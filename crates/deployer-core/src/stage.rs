use crate::error::{DeployerError, Result};
use crate::link;
use crate::paths;
use crate::step::Step;
use std::collections::HashMap;

/// An independently invoked, ordered list of steps.
///
/// Declaration order is dependency order: a step may only rely on components
/// declared before it, or on components registered by an earlier stage.
#[derive(Debug)]
pub struct Stage {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Step::name)
    }

    /// Structural checks that need neither config nor registry: unique
    /// component names, linkable library names, and no reference to a
    /// component declared later.
    pub fn validate(&self) -> Result<()> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, step) in self.steps.iter().enumerate() {
            if !paths::is_valid_component_name(step.name()) {
                return Err(self.invalid(format!(
                    "'{}' is not a valid component name",
                    step.name()
                )));
            }
            if positions.insert(step.name(), i).is_some() {
                return Err(self.invalid(format!(
                    "component '{}' is declared more than once",
                    step.name()
                )));
            }
        }

        for step in &self.steps {
            if let Some(lib) = step
                .component
                .libraries
                .iter()
                .find(|lib| !link::has_unique_placeholder(lib))
            {
                return Err(self.invalid(format!(
                    "library '{lib}' of '{}' must be at most 36 characters and not end in '_'",
                    step.name()
                )));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            for dep in step.component.dependencies() {
                if let Some(&at) = positions.get(dep) {
                    if at >= i {
                        return Err(self.invalid(format!(
                            "'{}' depends on '{dep}', which is declared at or after it",
                            step.name()
                        )));
                    }
                }
            }
            for action in &step.post_actions {
                for dep in action.references() {
                    if let Some(&at) = positions.get(dep) {
                        if at > i {
                            return Err(self.invalid(format!(
                                "post-action '{}' of '{}' refers to '{dep}', which is declared later",
                                action.name(),
                                step.name()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> DeployerError {
        DeployerError::InvalidStage {
            stage: self.name.clone(),
            reason,
        }
    }
}
