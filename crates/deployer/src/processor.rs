//! Drives the contracts of one configuration file through their deployment
//! states and writes the outcome back.

use {
    crate::{
        domain::{ContractSpec, DeploymentConfig, Outcome, Resolved, params},
        engine::Engine,
        infra::{artifacts::Resolver, blockchain::Chain, observe, persistence},
    },
    alloy::primitives::{Address, U256},
    std::{collections::BTreeMap, ops::AddAssign, path::Path, sync::Arc, time::Instant},
};

/// What happened to the contracts of one configuration during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    /// Contracts an earlier run already deployed.
    pub skipped: usize,
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not load configuration: {0}")]
    Load(persistence::Error),
    #[error("could not store configuration: {0}")]
    Store(persistence::Error),
}

/// Processing of a single configuration file.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Process: Send + Sync {
    async fn process(&self, path: &Path) -> Result<Summary, Error>;
}

pub struct Processor {
    chain: Arc<dyn Chain>,
    artifacts: Resolver,
    engine: Engine,
}

impl Processor {
    pub fn new(chain: Arc<dyn Chain>, artifacts: Resolver) -> Self {
        Self {
            engine: Engine::new(chain.clone()),
            chain,
            artifacts,
        }
    }

    /// Attempts every contract that is not deployed yet, in file order, and
    /// records each outcome. A failing contract does not stop the ones after
    /// it.
    pub async fn deploy_pending(&self, config: &mut DeploymentConfig) -> Summary {
        let fallback = if needs_fallback_sender(config) {
            self.fallback_sender(&config.path).await
        } else {
            None
        };
        self.check_balances(config, fallback).await;

        let mut summary = Summary::default();
        for index in 0..config.contracts.len() {
            let contract = &config.contracts[index];
            if contract.is_deployed() {
                observe::skipped(contract);
                summary.skipped += 1;
                continue;
            }

            let outcome = self.attempt(config, contract, fallback).await;
            match &outcome {
                Ok(_) => summary.succeeded += 1,
                Err(err) => {
                    observe::deployment_failed(contract, err);
                    summary.failed += 1;
                }
            }
            config.contracts[index].record(&outcome);
        }
        summary
    }

    async fn attempt(
        &self,
        config: &DeploymentConfig,
        contract: &ContractSpec,
        fallback: Option<Address>,
    ) -> Outcome {
        let workplace = contract.workplace(&config.home);
        let Resolved { params, arguments } = params::resolve(config, contract, fallback)?;
        let artifact = self.artifacts.resolve(&workplace, &contract.name).await?;

        observe::deploying(contract, &workplace, &params);
        let start = Instant::now();
        let address = self.engine.deploy(&artifact, &params, &arguments).await?;
        observe::deployed(contract, address, start.elapsed());
        Ok(address)
    }

    /// The first account of the node, used for contracts that name no sender.
    async fn fallback_sender(&self, path: &Path) -> Option<Address> {
        match self.chain.accounts().await {
            Ok(accounts) => {
                let first = accounts.first().copied();
                if first.is_none() {
                    observe::no_fallback_sender(path, None);
                }
                first
            }
            Err(err) => {
                observe::no_fallback_sender(path, Some(&err));
                None
            }
        }
    }

    /// Logs the balance of every sender with pending contracts and warns if
    /// it does not cover the value its payable contracts transfer. The
    /// deployments are attempted either way.
    async fn check_balances(&self, config: &DeploymentConfig, fallback: Option<Address>) {
        let mut required = BTreeMap::<Address, U256>::new();
        for contract in config.pending() {
            // Invalid settings surface as a failed deployment later on.
            let Ok(Resolved { params, .. }) = params::resolve(config, contract, fallback) else {
                continue;
            };
            let Some(from) = params.from else {
                continue;
            };
            let total = required.entry(from).or_default();
            *total = total.saturating_add(params.value.unwrap_or_default());
        }

        for (sender, required) in required {
            match self.chain.balance(sender).await {
                Ok(balance) => observe::sender_balance(&config.path, sender, balance, required),
                Err(err) => tracing::debug!(%sender, ?err, "could not fetch sender balance"),
            }
        }
    }
}

#[async_trait::async_trait]
impl Process for Processor {
    /// Loads the configuration, deploys what is pending and writes the file
    /// back. The file is written even if every deployment failed.
    async fn process(&self, path: &Path) -> Result<Summary, Error> {
        let mut config = persistence::load(path).await.map_err(|err| {
            observe::malformed_config(path, &err);
            Error::Load(err)
        })?;
        observe::loaded_config(&config);

        let summary = self.deploy_pending(&mut config).await;

        persistence::store(&config).await.map_err(|err| {
            observe::persistence_failed(path, &err);
            Error::Store(err)
        })?;
        observe::persisted(path, &summary);
        Ok(summary)
    }
}

fn needs_fallback_sender(config: &DeploymentConfig) -> bool {
    config
        .pending()
        .any(|contract| contract.from.or(&config.from).is_none())
}
