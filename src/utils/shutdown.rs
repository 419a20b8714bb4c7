use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancellation` once the process receives Ctrl-C. Network calls race this token, so an
/// interrupt aborts whatever request is in flight.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, cancelling");
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => {},
    };
}
