//! Resolution of the effective deployment parameters of a contract.

use {
    super::{ContractSpec, DeploymentConfig, Error},
    alloy::primitives::{Address, U256},
    serde_json::Value,
    std::str::FromStr,
};

/// The sender, gas and value a deployment is submitted with. `None` leaves
/// the field out of the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveParams {
    pub from: Option<Address>,
    pub gas: Option<u64>,
    /// Only ever set for payable contracts. Sending value to a constructor
    /// that is not payable reverts the deployment.
    pub value: Option<U256>,
}

/// How the constructor gets called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    None,
    Positional(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub params: EffectiveParams,
    pub arguments: Arguments,
}

/// Merges the contract's own settings with the config level defaults.
///
/// `fallback_sender` is the first account of the node and is only used when
/// neither the contract nor the config name a sender.
pub fn resolve(
    config: &DeploymentConfig,
    contract: &ContractSpec,
    fallback_sender: Option<Address>,
) -> Result<Resolved, Error> {
    let from = match contract.from.or(&config.from) {
        Some(from) => Some(parse_address(from)?),
        None => fallback_sender,
    };
    let gas = contract
        .gas
        .or(&config.gas)
        .map(|gas| {
            let gas = gas.parse("gas")?;
            u64::try_from(gas).map_err(|_| Error::InvalidAmount {
                field: "gas",
                raw: gas.to_string(),
            })
        })
        .transpose()?;
    let value = if contract.is_payable() {
        contract
            .value
            .or(&config.value)
            .map(|value| value.parse("value"))
            .transpose()?
    } else {
        None
    };
    let arguments = match contract.constructor_arity() {
        0 => Arguments::None,
        _ => Arguments::Positional(contract.arguments().to_vec()),
    };

    Ok(Resolved {
        params: EffectiveParams { from, gas, value },
        arguments,
    })
}

fn parse_address(raw: &str) -> Result<Address, Error> {
    Address::from_str(raw.trim()).map_err(|_| Error::InvalidAddress(raw.to_owned()))
}
