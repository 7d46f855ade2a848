//! Module implementing the shutdown signal handling.

#[cfg(unix)]
pub async fn signal_handler() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    // equivalent to Ctrl+C
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM signal, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT signal, shutting down"),
    }
    Ok(())
}

// Best-effort implementation for non-unix systems
#[cfg(not(unix))]
pub async fn signal_handler() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("received CTRL+C signal, shutting down");
    Ok(())
}
