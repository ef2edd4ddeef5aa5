use std::time::Duration;

use crate::app::{task_outcome, WorkerTask};
use crate::error::AppResult;
use crate::state::Operation;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Runs `work` for `operation` off the main thread and hands the result to
/// `on_result` on the GLib main loop. A worker that dies early is delivered
/// as an error. Fails only when the thread cannot be spawned.
pub(super) fn spawn_worker_action<T, W, H>(
    operation: Operation,
    work: W,
    mut on_result: H,
) -> std::io::Result<()>
where
    T: Send + 'static,
    W: FnOnce() -> AppResult<T> + Send + 'static,
    H: FnMut(AppResult<T>) + 'static,
{
    let task = WorkerTask::spawn(operation, work)?;
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || {
        match task.try_finish() {
            Some(outcome) => {
                on_result(task_outcome(outcome));
                gtk4::glib::ControlFlow::Break
            }
            None => gtk4::glib::ControlFlow::Continue,
        }
    });
    Ok(())
}
