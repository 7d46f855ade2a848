use {
    crate::Config,
    std::{io::IsTerminal, sync::Once},
    time::macros::format_description,
    tracing::Level,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes tracing setup that is shared between the binaries.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(&Config::default().with_env_filter(env_filter));
    });
}

fn set_tracing_subscriber(config: &Config) {
    // Events are split between stdout and stderr at the configured threshold.
    let threshold = config.stderr_threshold.unwrap_or(Level::ERROR);
    let writer = std::io::stderr
        .with_max_level(threshold)
        .or_else(std::io::stdout);
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    // The two branches produce different layer types, so they are boxed to
    // share one registry.
    let fmt_layer = if config.use_json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(timer)
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_timer(timer)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();
    tracing::debug!(filter = %config.env_filter, "initialized tracing");
}
