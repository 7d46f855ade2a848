//! Observability of a deployment run. Each function represents an event that
//! is meaningful to the operator and logs it when it occurs.

use {
    crate::{
        domain::{ContractSpec, DeploymentConfig, EffectiveParams, Error},
        infra::{blockchain, persistence},
        processor::Summary,
        scheduler::Report,
    },
    alloy::primitives::{Address, U256},
    std::{path::Path, time::Duration},
};

/// Observe a configuration file that was read successfully.
pub fn loaded_config(config: &DeploymentConfig) {
    tracing::debug!(
        path = ?config.path,
        contracts = config.contracts.len(),
        pending = config.pending().count(),
        "loaded configuration"
    );
}

/// Observe a configuration file that could not be read or parsed. Only this
/// file is skipped.
pub fn malformed_config(path: &Path, err: &persistence::Error) {
    tracing::error!(?path, %err, "skipping configuration");
}

/// Observe that the node could not provide a default sender.
pub fn no_fallback_sender(path: &Path, err: Option<&blockchain::Error>) {
    tracing::warn!(?path, ?err, "node has no account to deploy from");
}

/// Observe the balance of the sender ahead of deploying a configuration.
pub fn sender_balance(path: &Path, sender: Address, balance: U256, required: U256) {
    if balance < required {
        tracing::warn!(
            ?path,
            %sender,
            %balance,
            %required,
            "sender balance does not cover the value of payable contracts"
        );
    } else {
        tracing::debug!(?path, %sender, %balance, %required, "sender balance");
    }
}

/// Observe that a contract is skipped because an earlier run deployed it.
pub fn skipped(contract: &ContractSpec) {
    tracing::debug!(
        name = %contract.name,
        address = ?contract.address,
        "already deployed"
    );
}

/// Observe that a deployment is about to be submitted.
pub fn deploying(contract: &ContractSpec, workplace: &Path, params: &EffectiveParams) {
    tracing::info!(
        name = %contract.name,
        ?workplace,
        from = ?params.from,
        gas = ?params.gas,
        value = ?params.value,
        "deploying contract"
    );
}

/// Observe a successful deployment.
pub fn deployed(contract: &ContractSpec, address: Address, elapsed: Duration) {
    tracing::info!(name = %contract.name, %address, ?elapsed, "deployed contract");
}

/// Observe a failed deployment. Only the first line of the diagnostic is
/// logged.
pub fn deployment_failed(contract: &ContractSpec, err: &Error) {
    tracing::warn!(
        name = %contract.name,
        kind = err.kind(),
        err = %err.condensed(),
        "deployment failed"
    );
}

/// Observe that a configuration was written back.
pub fn persisted(path: &Path, summary: &Summary) {
    tracing::info!(
        ?path,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "configuration updated"
    );
}

/// Observe that writing a configuration back failed. The outcome of its
/// deployments is lost and they will be attempted again on the next run.
pub fn persistence_failed(path: &Path, err: &persistence::Error) {
    tracing::error!(?path, %err, "failed to write configuration back");
}

/// Observe that processing a configuration panicked.
pub fn processing_panicked(path: &Path, err: &tokio::task::JoinError) {
    tracing::error!(?path, ?err, "configuration processing panicked");
}

/// Observe that a batch got scheduled.
pub fn batch_scheduled(index: usize, configs: usize, offset: Duration) {
    tracing::info!(batch = index, configs, ?offset, "scheduled batch");
}

/// Observe that a batch starts deploying.
pub fn batch_started(index: usize) {
    tracing::debug!(batch = index, "starting batch");
}

/// Observe the end of a run.
pub fn finished(report: &Report) {
    let total = report.total();
    tracing::info!(
        configs = report.summaries.len(),
        malformed = report.malformed.len(),
        unfinished = report.unfinished.len(),
        succeeded = total.succeeded,
        failed = total.failed,
        skipped = total.skipped,
        "deployment run finished"
    );
}
