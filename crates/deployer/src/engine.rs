//! Turns an artifact and resolved parameters into a deployed contract.

use {
    crate::{
        domain::{Arguments, EffectiveParams, Error, Outcome},
        infra::{
            artifacts::Artifact,
            blockchain::{self, Chain, Creation},
        },
    },
    alloy::{
        dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
        json_abi::Param,
        primitives::Bytes,
    },
    serde_json::Value,
    std::sync::Arc,
};

/// Submits one creation transaction per call and waits for it. There are no
/// retries, a failure is returned to the caller right away.
pub struct Engine {
    chain: Arc<dyn Chain>,
}

impl Engine {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        Self { chain }
    }

    pub async fn deploy(
        &self,
        artifact: &Artifact,
        params: &EffectiveParams,
        arguments: &Arguments,
    ) -> Outcome {
        let code = creation_code(artifact, arguments)?;
        self.chain
            .create(Creation {
                from: params.from,
                gas: params.gas,
                value: params.value,
                code,
            })
            .await
            .map_err(Into::into)
    }
}

impl From<blockchain::Error> for Error {
    fn from(err: blockchain::Error) -> Self {
        match err {
            blockchain::Error::Reverted(reason) => Self::DeploymentReverted(reason),
            blockchain::Error::Timeout => Self::DeploymentTimeout,
            blockchain::Error::Transport(reason) => Self::TransportError(reason),
        }
    }
}

/// The bytecode, followed by the ABI encoded constructor arguments when the
/// constructor takes any.
pub fn creation_code(artifact: &Artifact, arguments: &Arguments) -> Result<Bytes, Error> {
    let values = match arguments {
        Arguments::None => return Ok(artifact.bytecode.clone()),
        Arguments::Positional(values) => values,
    };
    let constructor = artifact
        .abi
        .constructor()
        .ok_or_else(|| Error::ConstructorArguments("the ABI declares no constructor".into()))?;
    if constructor.inputs.len() != values.len() {
        return Err(Error::ConstructorArguments(format!(
            "constructor takes {} arguments but {} were configured",
            constructor.inputs.len(),
            values.len()
        )));
    }
    let tokens = constructor
        .inputs
        .iter()
        .zip(values)
        .map(|(param, value)| coerce(param, value))
        .collect::<Result<Vec<_>, _>>()?;
    let encoded = constructor
        .abi_encode_input(&tokens)
        .map_err(|err| Error::ConstructorArguments(err.to_string()))?;

    Ok(artifact
        .bytecode
        .iter()
        .copied()
        .chain(encoded)
        .collect())
}

/// Interprets a configured JSON value as the constructor parameter's
/// Solidity type. Strings are taken literally, everything else in its JSON
/// notation (`[1, 2]`, `true`, `42`).
fn coerce(param: &Param, value: &Value) -> Result<DynSolValue, Error> {
    let ty = param
        .resolve()
        .map_err(|err| Error::ConstructorArguments(format!("{}: {err}", param.name)))?;
    let literal = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ty.coerce_str(&literal).map_err(|err| {
        Error::ConstructorArguments(format!("{} ({}): {err}", param.name, param.ty))
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::infra::blockchain::MockChain,
        alloy::{
            json_abi::JsonAbi,
            primitives::{U256, address},
        },
        serde_json::json,
        std::str::FromStr,
    };

    fn artifact(abi: &str) -> Artifact {
        Artifact {
            abi: serde_json::from_str::<JsonAbi>(abi).unwrap(),
            bytecode: Bytes::from_str("0x6001600c60003960016000f300").unwrap(),
        }
    }

    const CONSTRUCTOR: &str = r#"[{
        "type": "constructor",
        "stateMutability": "nonpayable",
        "inputs": [
            { "name": "supply", "type": "uint256" },
            { "name": "owner", "type": "address" },
            { "name": "symbol", "type": "string" }
        ]
    }]"#;

    #[test]
    fn bare_deployment_uses_bytecode() {
        let artifact = artifact(CONSTRUCTOR);
        assert_eq!(
            creation_code(&artifact, &Arguments::None).unwrap(),
            artifact.bytecode
        );
    }

    #[test]
    fn appends_encoded_arguments() {
        let artifact = artifact(CONSTRUCTOR);
        let owner = address!("0x00000000000000000000000000000000000000aa");
        let code = creation_code(
            &artifact,
            &Arguments::Positional(vec![json!(1000), json!(owner.to_string()), json!("TKN")]),
        )
        .unwrap();

        let expected = artifact
            .abi
            .constructor()
            .unwrap()
            .abi_encode_input(&[
                DynSolValue::Uint(U256::from(1000), 256),
                DynSolValue::Address(owner),
                DynSolValue::String("TKN".into()),
            ])
            .unwrap();
        assert_eq!(&code[..artifact.bytecode.len()], &artifact.bytecode[..]);
        assert_eq!(&code[artifact.bytecode.len()..], &expected[..]);
    }

    #[test]
    fn rejects_mismatched_arguments() {
        let with_constructor = artifact(CONSTRUCTOR);
        let arity = creation_code(&with_constructor, &Arguments::Positional(vec![json!(1)]));
        assert_eq!(arity.unwrap_err().kind(), "ConstructorArguments");

        let wrong_type = creation_code(
            &with_constructor,
            &Arguments::Positional(vec![json!("many"), json!("0x00"), json!("TKN")]),
        );
        assert_eq!(wrong_type.unwrap_err().kind(), "ConstructorArguments");

        let without_constructor = artifact("[]");
        let missing = creation_code(&without_constructor, &Arguments::Positional(vec![json!(1)]));
        assert_eq!(missing.unwrap_err().kind(), "ConstructorArguments");
    }

    #[tokio::test]
    async fn submits_effective_params() {
        let artifact = artifact("[]");
        let from = address!("0x00000000000000000000000000000000000000aa");
        let deployed = address!("0x00000000000000000000000000000000000000cc");
        let expected = Creation {
            from: Some(from),
            gas: Some(500_000),
            value: None,
            code: artifact.bytecode.clone(),
        };

        let mut chain = MockChain::new();
        chain
            .expect_create()
            .withf(move |creation| *creation == expected)
            .times(1)
            .returning(move |_| Ok(deployed));

        let params = EffectiveParams {
            from: Some(from),
            gas: Some(500_000),
            value: None,
        };
        let engine = Engine::new(Arc::new(chain));
        let outcome = engine.deploy(&artifact, &params, &Arguments::None).await;
        assert_eq!(outcome.unwrap(), deployed);
    }

    #[tokio::test]
    async fn maps_chain_failures() {
        let mut chain = MockChain::new();
        chain
            .expect_create()
            .times(1)
            .returning(|_| Err(blockchain::Error::Timeout));

        let engine = Engine::new(Arc::new(chain));
        let outcome = engine
            .deploy(&artifact("[]"), &Default::default(), &Arguments::None)
            .await;
        assert!(matches!(outcome, Err(Error::DeploymentTimeout)));
    }
}
