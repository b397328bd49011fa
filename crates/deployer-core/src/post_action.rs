//! Calls issued against a component once it has an address.

use crate::args::{Arg, Resolver};
use crate::error::Result;
use crate::executor::CallRequest;
use std::fmt;

/// The component a call is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The step's own component.
    Own,
    /// Another component, looked up in the registry.
    Component(String),
}

impl Target {
    pub fn component(name: impl Into<String>) -> Self {
        Target::Component(name.into())
    }
}

/// A side-effecting action that runs after its step's component is in place.
///
/// `plan` expands the action into concrete calls using the config and
/// registry as they stand when the step runs; an empty plan means there is
/// nothing to do this time (for example an optional funding amount is unset).
pub trait PostAction: fmt::Debug {
    fn name(&self) -> &str;

    /// Whether the action also runs when the component was not deployed by
    /// this run (override or earlier registry entry).
    fn runs_on_skip(&self) -> bool {
        false
    }

    /// Component names this action reads from the registry.
    fn references(&self) -> Vec<&str> {
        Vec::new()
    }

    fn plan(&self, r: &mut Resolver<'_>) -> Result<Vec<CallRequest>>;
}

fn call_request(
    r: &mut Resolver<'_>,
    target: &Target,
    method: &str,
    args: &[Arg],
) -> Result<CallRequest> {
    let (name, address) = match target {
        Target::Own => (r.step().to_string(), r.own_address()?.clone()),
        Target::Component(name) => (name.clone(), r.registered(name)?.clone()),
    };
    let args = r.resolve_all(args)?;
    Ok(CallRequest {
        target: name,
        address,
        method: method.to_string(),
        args,
    })
}

fn target_references<'s>(target: &'s Target, args: &'s [Arg]) -> Vec<&'s str> {
    let mut refs: Vec<&str> = args.iter().filter_map(Arg::registry_reference).collect();
    if let Target::Component(name) = target {
        refs.push(name);
    }
    refs
}

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// A single method call, optionally gated on a config value being set.
#[derive(Debug, Clone)]
pub struct Call {
    name: String,
    target: Target,
    method: String,
    args: Vec<Arg>,
    when: Option<String>,
    on_skip: bool,
}

impl Call {
    pub fn new(name: impl Into<String>, target: Target, method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target,
            method: method.into(),
            args: Vec::new(),
            when: None,
            on_skip: false,
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Only run when the config path is set.
    pub fn when(mut self, path: impl Into<String>) -> Self {
        self.when = Some(path.into());
        self
    }

    pub fn on_skip(mut self) -> Self {
        self.on_skip = true;
        self
    }
}

impl PostAction for Call {
    fn name(&self) -> &str {
        &self.name
    }

    fn runs_on_skip(&self) -> bool {
        self.on_skip
    }

    fn references(&self) -> Vec<&str> {
        target_references(&self.target, &self.args)
    }

    fn plan(&self, r: &mut Resolver<'_>) -> Result<Vec<CallRequest>> {
        if let Some(path) = &self.when {
            if !r.config().is_set(path) {
                tracing::debug!(action = %self.name, %path, "condition unset, nothing to do");
                return Ok(Vec::new());
            }
        }
        Ok(vec![call_request(r, &self.target, &self.method, &self.args)?])
    }
}

// ---------------------------------------------------------------------------
// ForEach
// ---------------------------------------------------------------------------

/// One call per element of a config list.
///
/// Elements without the `require` field set are skipped; a missing list means
/// there is nothing to register.
#[derive(Debug, Clone)]
pub struct ForEach {
    name: String,
    list: String,
    require: Option<String>,
    target: Target,
    method: String,
    args: Vec<Arg>,
    on_skip: bool,
}

impl ForEach {
    pub fn new(
        name: impl Into<String>,
        list: impl Into<String>,
        target: Target,
        method: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            list: list.into(),
            require: None,
            target,
            method: method.into(),
            args: Vec::new(),
            on_skip: false,
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.require = Some(field.into());
        self
    }

    pub fn on_skip(mut self) -> Self {
        self.on_skip = true;
        self
    }
}

impl PostAction for ForEach {
    fn name(&self) -> &str {
        &self.name
    }

    fn runs_on_skip(&self) -> bool {
        self.on_skip
    }

    fn references(&self) -> Vec<&str> {
        target_references(&self.target, &self.args)
    }

    fn plan(&self, r: &mut Resolver<'_>) -> Result<Vec<CallRequest>> {
        let config = r.config();
        if config.lookup(&self.list).is_none() {
            return Ok(Vec::new());
        }
        let items = config.require_list(&self.list)?;

        let mut calls = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if let Some(field) = &self.require {
                let present = item
                    .get(field)
                    .map(|v| !crate::config::is_unset(v))
                    .unwrap_or(false);
                if !present {
                    tracing::debug!(action = %self.name, index = i, %field, "skipping list entry");
                    continue;
                }
            }
            r.set_item(format!("{}.{i}", self.list), item);
            let call = call_request(r, &self.target, &self.method, &self.args);
            r.clear_item();
            calls.push(call?);
        }
        Ok(calls)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::SimulatedExecutor;
    use crate::registry::Registry;
    use crate::types::Address;
    use serde_json::json;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from_bytes(&bytes)
    }

    fn exec() -> SimulatedExecutor {
        SimulatedExecutor::new(addr(0xff))
    }

    #[test]
    fn conditional_call_skips_when_unset() {
        let config = Config::new().with("farm_param", json!({ "fund": "" }));
        let registry = Registry::new();
        let own = addr(2);
        let mut ex = exec();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        let fund = Call::new("fund", Target::Own, "fund")
            .arg(Arg::config_amount("farm_param.fund"))
            .when("farm_param.fund");
        assert!(fund.plan(&mut r).unwrap().is_empty());
    }

    #[test]
    fn call_targets_other_component() {
        let config = Config::new().with("farm_param", json!({ "fund": "500" }));
        let mut registry = Registry::new();
        registry.merge("PAYR", addr(1)).unwrap();
        let own = addr(2);
        let mut ex = exec();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        let approve = Call::new("approve-fund", Target::component("PAYR"), "approve")
            .arg(Arg::registered("Farm"))
            .arg(Arg::config_amount("farm_param.fund"))
            .when("farm_param.fund");

        let calls = approve.plan(&mut r).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, "PAYR");
        assert_eq!(calls[0].address, addr(1));
        assert_eq!(calls[0].args, vec![json!(addr(2).to_string()), json!("500")]);
        assert_eq!(approve.references(), vec!["Farm", "PAYR"]);
    }

    #[test]
    fn for_each_skips_entries_without_required_field() {
        let config = Config::new().with(
            "farm_param",
            json!({ "lp": [
                { "address": addr(7).to_string(), "allocPoint": 10 },
                { "address": "", "allocPoint": 20 },
                { "address": addr(8).to_string(), "allocPoint": 30 }
            ]}),
        );
        let registry = Registry::new();
        let own = addr(2);
        let mut ex = exec();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        let pools = ForEach::new("register-pools", "farm_param.lp", Target::Own, "add")
            .require("address")
            .arg(Arg::ItemAmount("allocPoint".to_string()))
            .arg(Arg::ItemAddress("address".to_string()))
            .arg(Arg::value(false));

        let calls = pools.plan(&mut r).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].args,
            vec![json!("10"), json!(addr(7).to_string()), json!(false)]
        );
        assert_eq!(calls[1].args[0], json!("30"));
    }

    #[test]
    fn for_each_without_list_is_empty() {
        let config = Config::new();
        let registry = Registry::new();
        let own = addr(2);
        let mut ex = exec();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        let pools = ForEach::new("register-pools", "farm_param.lp", Target::Own, "add");
        assert!(pools.plan(&mut r).unwrap().is_empty());
    }

    #[test]
    fn for_each_rejects_non_list() {
        let config = Config::new().with("farm_param", json!({ "lp": "oops" }));
        let registry = Registry::new();
        let own = addr(2);
        let mut ex = exec();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        let pools = ForEach::new("register-pools", "farm_param.lp", Target::Own, "add");
        assert!(pools.plan(&mut r).is_err());
    }
}
