use {
    crate::{
        arguments::Arguments,
        infra::{
            artifacts::{Layout, Resolver},
            blockchain::{Node, WaitPolicy},
        },
        processor::Processor,
        scheduler::{self, Report, Scheduler},
    },
    clap::Parser,
    std::sync::Arc,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = Arguments::parse_from(args);
    let obs_config = observe::Config::new(
        &args.log_filter,
        args.log_stderr_threshold,
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    observe::panic_hook::install();
    tracing::info!("running deployer with validated arguments:\n{}", args);

    if let Err(err) = run(args).await {
        tracing::error!(?err, "deployment run failed");
        std::process::exit(1);
    }
}

/// Deploys every configuration in the configured directory. Assumes tracing
/// has already been set up.
///
/// Failed deployments are recorded in their configuration files and do not
/// fail the run.
pub async fn run(args: Arguments) -> anyhow::Result<Report> {
    let node = Node::new(
        &args.node_url,
        WaitPolicy {
            confirmations: args.confirmations,
            timeout: args.confirmation_timeout,
        },
    );
    let artifacts = Resolver::new(Layout {
        bin_sub_dir: args.bin_sub_dir,
        bin_suffix: args.bin_suffix,
        abi_sub_dir: args.abi_sub_dir,
        abi_suffix: args.abi_suffix,
    });
    let processor = Processor::new(Arc::new(node), artifacts);
    let scheduler = Scheduler::new(
        Arc::new(processor),
        scheduler::Config {
            batch_size: args.batch_size,
            interval: args.batch_interval,
            dispatch: args.dispatch,
        },
    );
    scheduler.run(&args.config_path).await
}
