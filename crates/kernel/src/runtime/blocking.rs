use super::join_error_to_app_error;
use crate::AppResult;

/// Runs a synchronous job (file I/O, catalog parsing) off the event loop.
pub async fn run_blocking<T, F>(label: &'static str, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(error) => Err(join_error_to_app_error("blocking_task", label, &error)),
    }
}

#[cfg(test)]
#[path = "../../tests/runtime/blocking_tests.rs"]
mod tests;
