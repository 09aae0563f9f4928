use tokio::sync::watch;

use crate::state::SharedState;

/// Spawn the recurring queue sweep. Runs until the shutdown signal flips.
pub fn spawn(
    state: SharedState,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let interval = std::time::Duration::from_millis(state.config.sweep_interval_ms);
    tracing::info!("Queue sweeper started (interval {interval:?})");

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                state.scheduler.sweep(&state.pipeline).await;
            }
            _ = shutdown.changed() => {}
        }
    }

    tracing::info!("Queue sweeper stopped");
}
