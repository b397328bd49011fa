//! The project's stages, in the order they are meant to be run.
//!
//! Each stage reads the registry written by the ones before it, so `farm` and
//! `factories` expect `PAYR` to be registered (or overridden) already.

use crate::args::Arg;
use crate::error::{DeployerError, Result};
use crate::post_action::{Call, ForEach, Target};
use crate::stage::Stage;
use crate::step::{Component, Step};
use chrono::{TimeZone, Utc};

pub const LIBRARY_GAS: u64 = 1_000_000;
pub const CONTRACT_GAS: u64 = 5_000_000;

pub const TOKEN_SALE: &str = "token-sale";
pub const FARM: &str = "farm";
pub const FACTORIES: &str = "factories";

impl Stage {
    pub fn builtin_names() -> &'static [&'static str] {
        &[TOKEN_SALE, FARM, FACTORIES]
    }

    pub fn builtin(name: &str) -> Result<Stage> {
        match name {
            TOKEN_SALE => Ok(token_sale()),
            FARM => Ok(farm()),
            FACTORIES => Ok(factories()),
            other => Err(DeployerError::UnknownStage(other.to_string())),
        }
    }
}

/// Unix timestamp of midnight UTC on the given day.
fn midnight_utc(year: i32, month: u32, day: u32) -> u64 {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .map(|t| t.timestamp().max(0) as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// token-sale
// ---------------------------------------------------------------------------

/// Shared libraries, the PAYR token, and the presale/crowdsale contracts.
///
/// The sale schedule comes from `sale_param.{presaleStart,presaleEnd,icoStart,icoEnd}`
/// (unix seconds) and defaults to the April 2021 schedule.
pub fn token_sale() -> Stage {
    let presale_start = Arg::config_uint_or("sale_param.presaleStart", midnight_utc(2021, 4, 1));
    let presale_end = Arg::config_uint_or("sale_param.presaleEnd", midnight_utc(2021, 4, 2));
    let ico_start = Arg::config_uint_or("sale_param.icoStart", midnight_utc(2021, 4, 3));
    let ico_end = Arg::config_uint_or("sale_param.icoEnd", midnight_utc(2021, 4, 7));

    let sale_libraries = ["Ownable", "SafeMath", "ReentrancyGuard"];

    Stage::new(TOKEN_SALE)
        .step(Step::new(Component::new("Ownable", LIBRARY_GAS)))
        .step(Step::new(Component::new("SafeMath", LIBRARY_GAS)))
        .step(Step::new(Component::new("ReentrancyGuard", LIBRARY_GAS)))
        .step(Step::new(
            Component::new("PAYR", CONTRACT_GAS).library("Ownable"),
        ))
        .step(Step::new(
            Component::new("Presale", CONTRACT_GAS)
                .libraries(sale_libraries)
                .arg(Arg::registered("PAYR"))
                .arg(presale_start)
                .arg(presale_end)
                .arg(ico_end.clone()),
        ))
        .step(Step::new(
            Component::new("Crowdsale", CONTRACT_GAS)
                .libraries(sale_libraries)
                .arg(Arg::registered("PAYR"))
                .arg(ico_start)
                .arg(ico_end),
        ))
}

// ---------------------------------------------------------------------------
// farm
// ---------------------------------------------------------------------------

/// The staking farm, funded and populated with its pools right after deploy.
pub fn farm() -> Stage {
    Stage::new(FARM).step(
        Step::new(
            Component::new("Farm", CONTRACT_GAS)
                .arg(Arg::registered("PAYR"))
                .arg(Arg::config_amount("farm_param.rewardPerBlock"))
                .arg(Arg::start_block("farm_param.startBlock", "farm_param.delay")),
        )
        .then(
            Call::new("approve-fund", Target::component("PAYR"), "approve")
                .arg(Arg::registered("Farm"))
                .arg(Arg::config_amount("farm_param.fund"))
                .when("farm_param.fund"),
        )
        .then(
            Call::new("fund", Target::Own, "fund")
                .arg(Arg::config_amount("farm_param.fund"))
                .when("farm_param.fund"),
        )
        .then(
            ForEach::new("register-pools", "farm_param.lp", Target::Own, "add")
                .require("address")
                .arg(Arg::ItemAmount("allocPoint".to_string()))
                .arg(Arg::ItemAddress("address".to_string()))
                .arg(Arg::value(false)),
        ),
    )
}

// ---------------------------------------------------------------------------
// factories
// ---------------------------------------------------------------------------

/// The PayrLink hub and its ETH and DAI payment pool factories.
pub fn factories() -> Stage {
    Stage::new(FACTORIES)
        .step(Step::new(
            Component::new("PAYRLINK", CONTRACT_GAS)
                .artifact("PayrLink")
                .arg(Arg::registered("PAYR")),
        ))
        .step(
            Step::new(
                Component::new("ETH_FACTORY", CONTRACT_GAS)
                    .artifact("ETHFactory")
                    .arg(Arg::value("ETH"))
                    .arg(Arg::registered("PAYRLINK")),
            )
            .then(
                Call::new("add-eth-pool", Target::component("PAYRLINK"), "addEthPool")
                    .arg(Arg::registered("ETH_FACTORY"))
                    .arg(Arg::value(true)),
            ),
        )
        .step(
            Step::new(
                Component::new("DAI_FACTORY", CONTRACT_GAS)
                    .artifact("ERC20Factory")
                    .arg(Arg::config_address("DAI"))
                    .arg(Arg::value("DAI"))
                    .arg(Arg::registered("PAYRLINK")),
            )
            .then(
                Call::new("add-erc20-pool", Target::component("PAYRLINK"), "addERC20Pool")
                    .arg(Arg::config_address("DAI"))
                    .arg(Arg::registered("DAI_FACTORY"))
                    .arg(Arg::value(true)),
            ),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stages_are_structurally_valid() {
        for name in Stage::builtin_names() {
            let stage = Stage::builtin(name).unwrap();
            assert_eq!(stage.name, *name);
            stage
                .validate()
                .unwrap_or_else(|e| panic!("{name} should validate: {e}"));
        }
    }

    #[test]
    fn unknown_stage() {
        let err = Stage::builtin("airdrop").unwrap_err();
        assert!(matches!(err, DeployerError::UnknownStage(_)));
    }

    #[test]
    fn token_sale_order() {
        let names: Vec<String> = token_sale()
            .component_names()
            .map(str::to_string)
            .collect();
        assert_eq!(
            names,
            vec!["Ownable", "SafeMath", "ReentrancyGuard", "PAYR", "Presale", "Crowdsale"]
        );
    }

    #[test]
    fn default_schedule_is_april_2021() {
        assert_eq!(midnight_utc(2021, 4, 1), 1_617_235_200);
        assert_eq!(midnight_utc(2021, 4, 7) - midnight_utc(2021, 4, 3), 4 * 86_400);
    }

    #[test]
    fn factories_use_distinct_artifacts() {
        let stage = factories();
        let artifacts: Vec<&str> = stage
            .steps
            .iter()
            .map(|s| s.component.artifact.as_str())
            .collect();
        assert_eq!(artifacts, vec!["PayrLink", "ETHFactory", "ERC20Factory"]);
    }
}
