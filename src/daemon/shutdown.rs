use tokio::select;
use tokio_util::sync::CancellationToken;

/// Turns Ctrl-C into a cancelation so modules can finish their current tick
/// and the sink gets a chance to clear the status bar item.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
