use {
    crate::scheduler::Dispatch,
    std::{
        fmt::{self, Display, Formatter},
        num::NonZeroUsize,
        path::PathBuf,
        time::Duration,
    },
    tracing::Level,
    url::Url,
};

/// Deploys the contracts listed in a directory of configuration files and
/// records the outcome in those files.
#[derive(clap::Parser)]
#[command(version)]
pub struct Arguments {
    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Directory holding the configuration files. Every regular file in it
    /// is treated as one configuration.
    #[clap(long, env)]
    pub config_path: PathBuf,

    /// Directory below a contract's workplace holding the bytecode files.
    #[clap(long, env, default_value = "bin")]
    pub bin_sub_dir: String,

    /// Appended to the contract name to form its bytecode file name.
    #[clap(long, env, default_value = ".bin")]
    pub bin_suffix: String,

    /// Directory below a contract's workplace holding the ABI files.
    #[clap(long, env, default_value = "abi")]
    pub abi_sub_dir: String,

    /// Appended to the contract name to form its ABI file name.
    #[clap(long, env, default_value = ".abi")]
    pub abi_suffix: String,

    /// How many configuration files make up one batch. Also the number of
    /// configurations processed at the same time.
    #[clap(long, env, default_value = "20")]
    pub batch_size: NonZeroUsize,

    /// Time between the start of two consecutive batches.
    #[clap(long, env, default_value = "30s", value_parser = humantime::parse_duration)]
    pub batch_interval: Duration,

    /// Whether batches start at fixed offsets or one after the other.
    #[clap(long, env, value_enum, default_value = "staggered")]
    pub dispatch: Dispatch,

    /// Number of blocks a creation transaction needs to be confirmed by.
    #[clap(long, env, default_value = "1")]
    pub confirmations: u64,

    /// How long to wait for a creation transaction to be confirmed before
    /// the deployment counts as failed.
    #[clap(long, env, default_value = "120s", value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Duration,

    /// The log filter.
    #[clap(long, env, default_value = "warn,deployer=debug")]
    pub log_filter: String,

    /// Events at or above this level go to stderr instead of stdout.
    #[clap(long, env)]
    pub log_stderr_threshold: Option<Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            node_url,
            config_path,
            bin_sub_dir,
            bin_suffix,
            abi_sub_dir,
            abi_suffix,
            batch_size,
            batch_interval,
            dispatch,
            confirmations,
            confirmation_timeout,
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "node_url: {node_url}")?;
        writeln!(f, "config_path: {}", config_path.display())?;
        writeln!(f, "bin_sub_dir: {bin_sub_dir}")?;
        writeln!(f, "bin_suffix: {bin_suffix}")?;
        writeln!(f, "abi_sub_dir: {abi_sub_dir}")?;
        writeln!(f, "abi_suffix: {abi_suffix}")?;
        writeln!(f, "batch_size: {batch_size}")?;
        writeln!(f, "batch_interval: {batch_interval:?}")?;
        writeln!(f, "dispatch: {dispatch}")?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold:?}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}
