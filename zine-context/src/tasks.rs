use log::{debug, error};
use std::future::Future;
use tokio::task::JoinHandle;

use crate::Error;

/// Runs `task` in the background. Failures are logged since nobody awaits
/// the result; dropped loads only at debug level.
pub fn spawn_logged<F>(name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), Error>> + Send + 'static,
{
    tokio::spawn(async move {
        match task.await {
            Ok(()) => debug!("{} finished", name),
            Err(err) if err.is_discarded() => debug!("{} dropped: {}", name, err),
            Err(err) => error!("{} failed: {}", name, err),
        }
    })
}
