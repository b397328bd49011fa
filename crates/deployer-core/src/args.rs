//! Constructor and call arguments, resolved when their step runs.

use crate::config::{self, Config};
use crate::error::{DeployerError, Result};
use crate::executor::Executor;
use crate::registry::Registry;
use crate::types::Address;
use serde_json::Value;

/// A single argument to a deploy or post-action call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A fixed value passed through unchanged.
    Value(Value),
    /// Address of a component registered by an earlier step (or by this
    /// step, inside its own post-actions).
    Registered(String),
    /// A required address from config, by dotted path.
    ConfigAddress(String),
    /// A required integer amount from config, by dotted path.
    ConfigAmount(String),
    /// An optional unsigned integer from config, with a fallback.
    ConfigUintOr { path: String, default: u64 },
    /// An explicit block number from config, or the current block plus a
    /// configured delay.
    StartBlock { explicit: String, delay: String },
    /// A field of the current list element inside a [`crate::post_action::ForEach`].
    ItemAddress(String),
    ItemAmount(String),
}

impl Arg {
    pub fn value(v: impl Into<Value>) -> Self {
        Arg::Value(v.into())
    }

    pub fn registered(name: impl Into<String>) -> Self {
        Arg::Registered(name.into())
    }

    pub fn config_address(path: impl Into<String>) -> Self {
        Arg::ConfigAddress(path.into())
    }

    pub fn config_amount(path: impl Into<String>) -> Self {
        Arg::ConfigAmount(path.into())
    }

    pub fn config_uint_or(path: impl Into<String>, default: u64) -> Self {
        Arg::ConfigUintOr {
            path: path.into(),
            default,
        }
    }

    pub fn start_block(explicit: impl Into<String>, delay: impl Into<String>) -> Self {
        Arg::StartBlock {
            explicit: explicit.into(),
            delay: delay.into(),
        }
    }

    /// Component name this argument needs from the registry, if any.
    pub fn registry_reference(&self) -> Option<&str> {
        match self {
            Arg::Registered(name) => Some(name),
            _ => None,
        }
    }

    pub fn resolve(&self, r: &mut Resolver<'_>) -> Result<Value> {
        match self {
            Arg::Value(v) => Ok(v.clone()),
            Arg::Registered(name) => Ok(Value::String(r.registered(name)?.to_string())),
            Arg::ConfigAddress(path) => Ok(Value::String(
                r.config.require_address(path)?.to_string(),
            )),
            Arg::ConfigAmount(path) => Ok(Value::String(
                r.config.require_amount(path)?.to_string(),
            )),
            Arg::ConfigUintOr { path, default } => Ok(Value::from(
                r.config.optional_u64(path)?.unwrap_or(*default),
            )),
            Arg::StartBlock { explicit, delay } => r.start_block(explicit, delay).map(Value::from),
            Arg::ItemAddress(field) => {
                let (path, value) = r.item_field(field)?;
                Ok(Value::String(
                    config::value_as_address(&path, value)?.to_string(),
                ))
            }
            Arg::ItemAmount(field) => {
                let (path, value) = r.item_field(field)?;
                Ok(Value::String(config::value_as_amount(&path, value)?.to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Everything an argument may draw on while its step runs.
pub struct Resolver<'a> {
    step: &'a str,
    address: Option<&'a Address>,
    pub(crate) config: &'a Config,
    registry: &'a Registry,
    executor: &'a mut dyn Executor,
    item: Option<(String, &'a Value)>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        step: &'a str,
        config: &'a Config,
        registry: &'a Registry,
        executor: &'a mut dyn Executor,
    ) -> Self {
        Self {
            step,
            address: None,
            config,
            registry,
            executor,
            item: None,
        }
    }

    /// The step's own address, once it has one.
    pub fn with_address(mut self, address: &'a Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn step(&self) -> &str {
        self.step
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn own_address(&self) -> Result<&'a Address> {
        self.address.ok_or_else(|| DeployerError::NotRegistered {
            name: self.step.to_string(),
            needed_by: self.step.to_string(),
        })
    }

    pub fn registered(&self, name: &str) -> Result<&'a Address> {
        match self.address {
            Some(own) if name == self.step => Ok(own),
            _ => self.registry.require(name, self.step),
        }
    }

    pub fn resolve_all(&mut self, args: &[Arg]) -> Result<Vec<Value>> {
        args.iter().map(|arg| arg.resolve(self)).collect()
    }

    pub(crate) fn set_item(&mut self, path: String, item: &'a Value) {
        self.item = Some((path, item));
    }

    pub(crate) fn clear_item(&mut self) {
        self.item = None;
    }

    fn item_field(&self, field: &str) -> Result<(String, &'a Value)> {
        let (base, item): (&str, &'a Value) = match &self.item {
            Some((base, item)) => (base.as_str(), *item),
            None => {
                return Err(DeployerError::config(
                    field,
                    "item argument used outside a list",
                ))
            }
        };
        let path = format!("{base}.{field}");
        match item.get(field) {
            Some(v) if !config::is_unset(v) => Ok((path, v)),
            _ => Err(DeployerError::config(path, "required field is missing")),
        }
    }

    fn start_block(&mut self, explicit: &str, delay: &str) -> Result<u64> {
        // A zero start block means "derive it from the delay".
        if let Some(block) = self.config.optional_u64(explicit)?.filter(|b| *b != 0) {
            return Ok(block);
        }
        let delay = self.config.optional_u64(delay)?.ok_or_else(|| {
            DeployerError::config(
                delay,
                format!("required when '{explicit}' is not given"),
            )
        })?;
        let current = self
            .executor
            .block_number()
            .map_err(|e| DeployerError::Deploy {
                component: self.step.to_string(),
                reason: format!("cannot read current block: {e}"),
            })?;
        Ok(current.saturating_add(delay))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::executor::SimulatedExecutor;
    use serde_json::json;

    fn exec(start: u64) -> SimulatedExecutor {
        SimulatedExecutor::new(Address::parse("0x00000000000000000000000000000000000000ff").unwrap())
            .with_start_block(start)
    }

    fn payr() -> Address {
        Address::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    #[test]
    fn registered_args_come_from_the_registry() {
        let mut registry = Registry::new();
        registry.merge("PAYR", payr()).unwrap();
        let config = Config::new();
        let mut ex = exec(0);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        let v = Arg::registered("PAYR").resolve(&mut r).unwrap();
        assert_eq!(v, json!(payr().to_string()));

        let err = Arg::registered("PAYRLINK").resolve(&mut r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[test]
    fn own_name_resolves_to_own_address() {
        let registry = Registry::new();
        let config = Config::new();
        let mut ex = exec(0);
        let own = payr();
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex).with_address(&own);
        assert_eq!(
            Arg::registered("Farm").resolve(&mut r).unwrap(),
            json!(own.to_string())
        );
    }

    #[test]
    fn start_block_prefers_explicit_value() {
        let registry = Registry::new();
        let config = Config::new().with("farm_param", json!({ "startBlock": 500, "delay": 10 }));
        let mut ex = exec(42);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        let arg = Arg::start_block("farm_param.startBlock", "farm_param.delay");
        assert_eq!(arg.resolve(&mut r).unwrap(), json!(500));
    }

    #[test]
    fn start_block_falls_back_to_current_plus_delay() {
        let registry = Registry::new();
        let config = Config::new().with("farm_param", json!({ "delay": 10 }));
        let mut ex = exec(42);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        let arg = Arg::start_block("farm_param.startBlock", "farm_param.delay");
        assert_eq!(arg.resolve(&mut r).unwrap(), json!(52));
    }

    #[test]
    fn zero_start_block_falls_back_to_delay() {
        let registry = Registry::new();
        let config = Config::new().with("farm_param", json!({ "startBlock": 0, "delay": 10 }));
        let mut ex = exec(42);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        let arg = Arg::start_block("farm_param.startBlock", "farm_param.delay");
        assert_eq!(arg.resolve(&mut r).unwrap(), json!(52));
    }

    #[test]
    fn start_block_without_either_names_delay() {
        let registry = Registry::new();
        let config = Config::new().with("farm_param", json!({}));
        let mut ex = exec(0);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        let err = Arg::start_block("farm_param.startBlock", "farm_param.delay")
            .resolve(&mut r)
            .unwrap_err();
        match err {
            DeployerError::Config { field, .. } => assert_eq!(field, "farm_param.delay"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_uint_or_uses_default() {
        let registry = Registry::new();
        let config = Config::new().with("sale_param", json!({ "icoEnd": 7 }));
        let mut ex = exec(0);
        let mut r = Resolver::new("Crowdsale", &config, &registry, &mut ex);
        let args = [
            Arg::config_uint_or("sale_param.icoStart", 3),
            Arg::config_uint_or("sale_param.icoEnd", 9),
        ];
        assert_eq!(r.resolve_all(&args).unwrap(), vec![json!(3), json!(7)]);
    }

    #[test]
    fn item_fields_report_full_path() {
        let registry = Registry::new();
        let config = Config::new();
        let item = json!({ "allocPoint": 10, "address": "" });
        let mut ex = exec(0);
        let mut r = Resolver::new("Farm", &config, &registry, &mut ex);
        r.set_item("farm_param.lp.0".to_string(), &item);
        assert_eq!(
            Arg::ItemAmount("allocPoint".to_string())
                .resolve(&mut r)
                .unwrap(),
            json!("10")
        );
        let err = Arg::ItemAddress("address".to_string())
            .resolve(&mut r)
            .unwrap_err();
        assert!(err.to_string().contains("farm_param.lp.0.address"));
    }
}
