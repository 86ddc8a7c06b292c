use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. Also finishes when some other module cancelled the
/// token, so the daemon doesn't hang on a dead pipeline.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
