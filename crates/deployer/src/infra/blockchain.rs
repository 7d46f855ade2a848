//! The capabilities the deployer needs from a blockchain node.

use {
    alloy::{
        network::{ReceiptResponse as _, TransactionBuilder},
        primitives::{Address, Bytes, U256},
        providers::{DynProvider, PendingTransactionError, Provider, ProviderBuilder, WatchTxError},
        rpc::{client::ClientBuilder, types::TransactionRequest},
        transports::{RpcError, TransportError},
    },
    std::time::Duration,
    url::Url,
};

/// A contract creation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creation {
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub value: Option<U256>,
    /// Bytecode followed by the ABI encoded constructor arguments.
    pub code: Bytes,
}

/// Abstracts the node so the orchestration can be tested without one.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Chain: Send + Sync {
    /// Accounts managed by the node.
    async fn accounts(&self) -> Result<Vec<Address>, Error>;

    async fn balance(&self, address: Address) -> Result<U256, Error>;

    /// Submits the creation transaction and waits until it is confirmed.
    /// Returns the address of the new contract.
    async fn create(&self, creation: Creation) -> Result<Address, Error>;
}

/// How long to wait for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub confirmations: u64,
    pub timeout: Duration,
}

/// A node reachable over JSON RPC.
///
/// The provider has no client side fillers: transactions are sent with
/// `eth_sendTransaction` and the node picks nonces for its managed accounts,
/// which keeps concurrent deployments from the same sender consistent.
#[derive(Debug, Clone)]
pub struct Node {
    provider: DynProvider,
    wait: WaitPolicy,
}

impl Node {
    pub fn new(url: &Url, wait: WaitPolicy) -> Self {
        let rpc = ClientBuilder::default().http(url.clone());
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc)
            .erased();
        Self { provider, wait }
    }
}

#[async_trait::async_trait]
impl Chain for Node {
    async fn accounts(&self) -> Result<Vec<Address>, Error> {
        self.provider.get_accounts().await.map_err(Error::from_rpc)
    }

    async fn balance(&self, address: Address) -> Result<U256, Error> {
        self.provider
            .get_balance(address)
            .await
            .map_err(Error::from_rpc)
    }

    async fn create(&self, creation: Creation) -> Result<Address, Error> {
        let mut tx = TransactionRequest::default().with_deploy_code(creation.code);
        if let Some(from) = creation.from {
            tx.set_from(from);
        }
        if let Some(gas) = creation.gas {
            tx.set_gas_limit(gas);
        }
        if let Some(value) = creation.value {
            tx.set_value(value);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(Error::from_rpc)?;
        tracing::debug!(tx = ?pending.tx_hash(), "submitted creation transaction");
        let receipt = pending
            .with_required_confirmations(self.wait.confirmations)
            .with_timeout(Some(self.wait.timeout))
            .get_receipt()
            .await
            .map_err(Error::from_pending)?;

        if !receipt.status() {
            return Err(Error::Reverted(format!(
                "creation transaction {} reverted",
                receipt.transaction_hash
            )));
        }
        receipt.contract_address.ok_or_else(|| {
            Error::Transport(format!(
                "receipt of {} has no contract address",
                receipt.transaction_hash
            ))
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Reverted(String),
    #[error("transaction was not confirmed in time")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

impl Error {
    fn from_rpc(err: TransportError) -> Self {
        match &err {
            // Nodes reject creations whose constructor reverts already while
            // estimating gas. Those responses carry revert data or at least
            // say so in the message.
            RpcError::ErrorResp(payload)
                if payload.as_revert_data().is_some() || payload.message.contains("revert") =>
            {
                Self::Reverted(err.to_string())
            }
            _ => Self::Transport(err.to_string()),
        }
    }

    fn from_pending(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => Self::Timeout,
            PendingTransactionError::TransportError(err) => Self::from_rpc(err),
            err => Self::Transport(err.to_string()),
        }
    }
}
