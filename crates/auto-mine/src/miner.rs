//! Mines on demand on a development node whose miner is otherwise stopped.

use {
    alloy::{
        primitives::Address,
        providers::{DynProvider, Provider, ProviderBuilder, ext::TxPoolApi},
        rpc::{client::ClientBuilder, types::txpool::TxpoolStatus},
    },
    anyhow::{Context, Result},
    std::time::Duration,
    url::Url,
};

/// How often the block number is checked while mining.
const BLOCK_POLL: Duration = Duration::from_secs(1);

pub struct Miner {
    provider: DynProvider,
    /// Blocks to mine once transactions are waiting.
    blocks: u64,
}

impl Miner {
    pub fn new(url: &Url, blocks: u64) -> Self {
        let rpc = ClientBuilder::default().http(url.clone());
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc)
            .erased();
        Self { provider, blocks }
    }

    /// Directs block rewards to `etherbase`.
    pub async fn set_etherbase(&self, etherbase: Address) -> Result<()> {
        self.provider
            .raw_request::<_, serde_json::Value>("miner_setEtherbase".into(), [etherbase])
            .await
            .context("miner_setEtherbase")?;
        tracing::info!(%etherbase, "set etherbase");
        Ok(())
    }

    /// Checks the transaction pool once and mines the configured number of
    /// blocks if anything is waiting. Returns whether it mined.
    pub async fn poll(&self) -> Result<bool> {
        let status = self
            .provider
            .txpool_status()
            .await
            .context("txpool_status")?;
        if !has_work(&status) {
            tracing::trace!("transaction pool is empty");
            return Ok(false);
        }

        tracing::info!(
            pending = status.pending,
            queued = status.queued,
            "transactions waiting, mining"
        );
        let start = self
            .provider
            .get_block_number()
            .await
            .context("eth_blockNumber")?;
        self.call("miner_start").await?;
        let mined = self.wait_for_blocks(start).await;
        // Stop even if waiting failed so the node does not keep mining.
        self.stop().await?;
        mined?;
        Ok(true)
    }

    pub async fn stop(&self) -> Result<()> {
        self.call("miner_stop").await
    }

    async fn wait_for_blocks(&self, start: u64) -> Result<()> {
        loop {
            let current = self
                .provider
                .get_block_number()
                .await
                .context("eth_blockNumber")?;
            if mined_enough(start, current, self.blocks) {
                tracing::debug!(start, current, "mined blocks");
                return Ok(());
            }
            tokio::time::sleep(BLOCK_POLL).await;
        }
    }

    async fn call(&self, method: &'static str) -> Result<()> {
        self.provider
            .raw_request::<_, serde_json::Value>(method.into(), [(); 0])
            .await
            .context(method)?;
        Ok(())
    }
}

fn has_work(status: &TxpoolStatus) -> bool {
    status.pending > 0 || status.queued > 0
}

fn mined_enough(start: u64, current: u64, blocks: u64) -> bool {
    current >= start.saturating_add(blocks)
}
