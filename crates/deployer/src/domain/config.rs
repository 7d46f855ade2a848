//! The in-memory model of one configuration file.
//!
//! Every type in here serializes back to the exact shape it was read from,
//! so a file that went through a run differs from its input only in the
//! `deployed` and `address` keys of the contracts that were attempted.

use {
    super::{Error, Outcome},
    alloy::primitives::U256,
    serde::{
        Deserialize,
        Deserializer,
        Serialize,
        Serializer,
        de::{DeserializeOwned, Error as _},
    },
    serde_json::{Map, Value},
    std::{path::PathBuf, str::FromStr},
};

/// The literal used in configuration files to request the enclosing default.
pub const INHERIT: &str = "none";

/// A field that may be overridden per contract or left to the enclosing
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Setting<T> {
    /// The key is not present in the file.
    #[default]
    Absent,
    /// The key is present and holds the `"none"` sentinel.
    Inherit,
    /// The key is present and holds `null`. Treated like the sentinel.
    Null,
    Set(T),
}

impl<T> Setting<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the explicitly configured value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Absent | Self::Inherit | Self::Null => None,
        }
    }

    /// Resolves an (override, default) pair: the own value wins unless it is
    /// absent or inherited.
    pub fn or<'a>(&'a self, default: &'a Setting<T>) -> Option<&'a T> {
        self.value().or_else(|| default.value())
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::Null => serializer.serialize_unit(),
            Self::Absent | Self::Inherit => serializer.serialize_str(INHERIT),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::Null),
            Value::String(text) if text == INHERIT => Ok(Self::Inherit),
            value => T::deserialize(value).map(Self::Set).map_err(D::Error::custom),
        }
    }
}

/// A gas limit or an ether value as written in the file. Kept in its on-disk
/// form and only interpreted when deployment parameters get resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    /// Parses the amount. Accepts non-negative JSON integers, integral floats
    /// (`1e18`), decimal strings and `0x`-prefixed hex strings.
    pub fn parse(&self, field: &'static str) -> Result<U256, Error> {
        let invalid = || Error::InvalidAmount {
            field,
            raw: self.to_string(),
        };
        match self {
            Self::Number(number) => {
                if let Some(value) = number.as_u64() {
                    return Ok(U256::from(value));
                }
                match number.as_f64() {
                    Some(value)
                        if value.is_finite()
                            && value >= 0.0
                            && value.fract() == 0.0
                            && value < u128::MAX as f64 =>
                    {
                        Ok(U256::from(value as u128))
                    }
                    _ => Err(invalid()),
                }
            }
            Self::Text(text) => U256::from_str(text.trim()).map_err(|_| invalid()),
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Lifecycle of a single contract across runs.
///
/// `NotAttempted -> {Succeeded | Failed}`, `Failed -> {Succeeded | Failed}`.
/// `Succeeded` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    NotAttempted,
    Succeeded,
    Failed,
}

impl Status {
    pub fn is_not_attempted(&self) -> bool {
        matches!(self, Self::NotAttempted)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotAttempted => serializer.serialize_none(),
            Self::Succeeded => serializer.serialize_u8(1),
            Self::Failed => serializer.serialize_u8(0),
        }
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<u8>::deserialize(deserializer)? {
            None => Ok(Self::NotAttempted),
            Some(1) => Ok(Self::Succeeded),
            Some(0) => Ok(Self::Failed),
            Some(other) => Err(D::Error::custom(format!(
                "deployed must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// One configuration file: shared defaults plus the contracts to deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Where the configuration was read from and gets written back to.
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub home: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub value: Setting<Amount>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub gas: Setting<Amount>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub from: Setting<String>,
    pub contracts: Vec<ContractSpec>,
    /// Keys this tool does not interpret. Written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeploymentConfig {
    /// Contracts that a run still has to deploy.
    pub fn pending(&self) -> impl Iterator<Item = &ContractSpec> {
        self.contracts.iter().filter(|contract| !contract.is_deployed())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub home: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub childhome: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub gas: Setting<Amount>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub value: Setting<Amount>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub from: Setting<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
    /// Only the number of keys matters: zero selects a deployment without
    /// constructor arguments.
    #[serde(
        rename = "param_Values",
        default,
        skip_serializing_if = "Setting::is_absent"
    )]
    pub param_values: Setting<Map<String, Value>>,
    /// Constructor arguments in declaration order. Only read when
    /// `param_Values` has keys.
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub values: Setting<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Status::is_not_attempted")]
    pub deployed: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContractSpec {
    pub fn is_deployed(&self) -> bool {
        self.deployed == Status::Succeeded
    }

    pub fn is_payable(&self) -> bool {
        self.payable.unwrap_or(false)
    }

    /// The directory artifacts are looked up in: the contract's own `home`
    /// (or the config's) with `childhome` appended verbatim.
    pub fn workplace(&self, default_home: &Setting<String>) -> PathBuf {
        let home = self.home.or(default_home).map(String::as_str).unwrap_or("");
        match self.childhome.value() {
            Some(child) => PathBuf::from(format!("{home}{child}")),
            None => PathBuf::from(home),
        }
    }

    /// Number of constructor parameters the contract declares.
    pub fn constructor_arity(&self) -> usize {
        self.param_values.value().map_or(0, Map::len)
    }

    pub fn arguments(&self) -> &[Value] {
        self.values.value().map(Vec::as_slice).unwrap_or_default()
    }

    /// Applies the outcome of a deployment attempt. A contract that already
    /// succeeded never transitions again; returns whether the status changed.
    pub fn record(&mut self, outcome: &Outcome) -> bool {
        if self.is_deployed() {
            return false;
        }
        match outcome {
            Ok(address) => {
                self.deployed = Status::Succeeded;
                self.address = Some(address.to_string());
            }
            Err(_) => {
                self.deployed = Status::Failed;
                self.address = None;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, serde_json::json};

    fn parse(value: Value) -> DeploymentConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_sentinels_and_absent_keys() {
        let config = parse(json!({
            "home": "/work/",
            "gas": 3000000,
            "value": "none",
            "contracts": [{
                "name": "Token",
                "gas": "none",
                "from": "none",
                "param_Values": "none",
            }],
        }));

        assert_eq!(config.home, Setting::Set("/work/".to_string()));
        assert_eq!(config.value, Setting::Inherit);
        assert_eq!(config.from, Setting::Absent);
        let contract = &config.contracts[0];
        assert_eq!(contract.gas, Setting::Inherit);
        assert_eq!(contract.value, Setting::Absent);
        assert_eq!(contract.param_values, Setting::Inherit);
        assert_eq!(contract.constructor_arity(), 0);
        assert_eq!(contract.deployed, Status::NotAttempted);
        assert!(!contract.is_payable());
    }

    #[test]
    fn null_and_sentinel_fall_back_to_defaults() {
        let original = json!({
            "gas": 3000000,
            "from": null,
            "contracts": [{
                "name": "Token",
                "gas": null,
                "home": null,
                "param_Values": "none",
                "values": "none",
            }],
        });
        let config = parse(original.clone());

        assert_eq!(config.from, Setting::Null);
        let contract = &config.contracts[0];
        assert_eq!(contract.gas, Setting::Null);
        assert_eq!(contract.gas.or(&config.gas), config.gas.value());
        assert_eq!(contract.values, Setting::Inherit);
        assert!(contract.arguments().is_empty());
        assert_eq!(serde_json::to_value(&config).unwrap(), original);
    }

    #[test]
    fn setting_prefers_own_value() {
        let default = Setting::Set(1);
        assert_eq!(Setting::Set(2).or(&default), Some(&2));
        assert_eq!(Setting::Inherit.or(&default), Some(&1));
        assert_eq!(Setting::Absent.or(&default), Some(&1));
        assert_eq!(Setting::Null.or(&default), Some(&1));
        assert_eq!(Setting::<i32>::Absent.or(&Setting::Inherit), None);
    }

    #[test]
    fn reads_deployment_status() {
        let config = parse(json!({
            "contracts": [
                { "name": "A", "deployed": 1, "address": "0x0000000000000000000000000000000000000001" },
                { "name": "B", "deployed": 0 },
                { "name": "C" },
            ],
        }));
        let status: Vec<_> = config.contracts.iter().map(|c| c.deployed).collect();
        assert_eq!(
            status,
            [Status::Succeeded, Status::Failed, Status::NotAttempted]
        );
        assert_eq!(config.pending().count(), 2);
    }

    #[test]
    fn rejects_unknown_status() {
        let result = serde_json::from_value::<DeploymentConfig>(json!({
            "contracts": [{ "name": "A", "deployed": 2 }],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn untouched_config_serializes_unchanged() {
        let original = json!({
            "home": "/work/",
            "value": "1000",
            "gas": 800000,
            "from": "none",
            "comment": "kept",
            "contracts": [{
                "name": "Token",
                "childhome": "token",
                "gas": "none",
                "value": "0x10",
                "payable": true,
                "param_Values": { "supply": "uint256" },
                "values": [100],
                "audited": false,
            }],
        });
        let config = parse(original.clone());
        assert_eq!(serde_json::to_value(&config).unwrap(), original);
    }

    #[test]
    fn known_keys_are_written_in_field_order() {
        let config = parse(json!({
            "zeta": 1,
            "contracts": [],
            "from": "none",
            "alpha": 2,
            "home": "/work/",
        }));
        let written = serde_json::to_value(&config).unwrap();
        let keys = written.as_object().unwrap().keys().collect::<Vec<_>>();
        assert_eq!(keys, ["home", "from", "contracts", "zeta", "alpha"]);
    }

    #[test]
    fn workplace_appends_childhome() {
        let contract = parse(json!({
            "contracts": [{ "name": "A", "childhome": "sub" }],
        }))
        .contracts
        .remove(0);
        assert_eq!(
            contract.workplace(&Setting::Set("/home/".into())),
            PathBuf::from("/home/sub")
        );

        let contract = ContractSpec {
            home: Setting::Set("/own".into()),
            ..contract
        };
        assert_eq!(
            contract.workplace(&Setting::Set("/home/".into())),
            PathBuf::from("/ownsub")
        );
    }

    #[test]
    fn succeeded_is_terminal() {
        let mut contract = parse(json!({ "contracts": [{ "name": "A" }] }))
            .contracts
            .remove(0);

        assert!(contract.record(&Err(Error::DeploymentTimeout)));
        assert_eq!(contract.deployed, Status::Failed);
        assert_eq!(contract.address, None);

        let first = address!("0x00000000000000000000000000000000000000aa");
        assert!(contract.record(&Ok(first)));
        assert_eq!(contract.deployed, Status::Succeeded);
        assert_eq!(contract.address, Some(first.to_string()));

        let second = address!("0x00000000000000000000000000000000000000bb");
        assert!(!contract.record(&Ok(second)));
        assert!(!contract.record(&Err(Error::DeploymentTimeout)));
        assert_eq!(contract.deployed, Status::Succeeded);
        assert_eq!(contract.address, Some(first.to_string()));
    }

    #[test]
    fn parses_amounts() {
        let amount = |value: Value| serde_json::from_value::<Amount>(value).unwrap();
        assert_eq!(amount(json!(500000)).parse("gas").unwrap(), U256::from(500000));
        assert_eq!(amount(json!("0x10")).parse("gas").unwrap(), U256::from(16));
        assert_eq!(
            amount(json!(1e18)).parse("value").unwrap(),
            U256::from(10u64.pow(18))
        );
        assert_eq!(amount(json!(" 42 ")).parse("value").unwrap(), U256::from(42));
        assert!(amount(json!(-1)).parse("value").is_err());
        assert!(amount(json!(1.5)).parse("value").is_err());
        assert!(amount(json!("lots")).parse("value").is_err());
    }
}
