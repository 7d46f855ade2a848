//! `auto-mine` keeps a development node with a stopped miner moving: it
//! watches the transaction pool and mines a few blocks whenever transactions
//! are waiting, then stops the miner again.

mod miner;
mod shutdown;

use {
    alloy::primitives::Address,
    clap::Parser,
    miner::Miner,
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    tracing::Level,
    url::Url,
};

#[derive(Parser)]
#[command(version)]
struct Arguments {
    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    node_url: Url,

    /// Time between two checks of the transaction pool.
    #[clap(long, env, default_value = "6s", value_parser = humantime::parse_duration)]
    poll_interval: Duration,

    /// Number of blocks to mine once transactions are waiting.
    #[clap(long, env, default_value = "3")]
    blocks: u64,

    /// Account receiving the block rewards. The node's default is kept if
    /// unset.
    #[clap(long, env)]
    etherbase: Option<Address>,

    /// The log filter.
    #[clap(long, env, default_value = "warn,auto_mine=debug")]
    log_filter: String,

    /// Events at or above this level go to stderr instead of stdout.
    #[clap(long, env)]
    log_stderr_threshold: Option<Level>,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "node_url: {}", self.node_url)?;
        writeln!(f, "poll_interval: {:?}", self.poll_interval)?;
        writeln!(f, "blocks: {}", self.blocks)?;
        writeln!(f, "etherbase: {:?}", self.etherbase)?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "log_stderr_threshold: {:?}", self.log_stderr_threshold)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = Arguments::parse();
    observe::tracing::initialize(&observe::Config::new(
        &args.log_filter,
        args.log_stderr_threshold,
        false,
    ));
    observe::panic_hook::install();
    tracing::info!("running auto-mine with validated arguments:\n{}", args);

    if let Err(err) = run(args).await {
        tracing::error!(?err, "auto-mine failed");
        std::process::exit(1);
    }
}

async fn run(args: Arguments) -> anyhow::Result<()> {
    let miner = Miner::new(&args.node_url, args.blocks);
    if let Some(etherbase) = args.etherbase {
        miner.set_etherbase(etherbase).await?;
    }

    let shutdown = shutdown::signal_handler();
    tokio::pin!(shutdown);
    loop {
        let step = async {
            if let Err(err) = miner.poll().await {
                tracing::warn!(?err, "mining round failed");
            }
            tokio::time::sleep(args.poll_interval).await;
        };
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = step => {}
        }
    }

    // The signal may have interrupted a mining round.
    if let Err(err) = miner.stop().await {
        tracing::warn!(?err, "failed to stop miner");
    }
    Ok(())
}
