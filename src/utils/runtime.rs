use anyhow::Result;

/// The daemon only waits on a sensor and a file, one thread is plenty.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
