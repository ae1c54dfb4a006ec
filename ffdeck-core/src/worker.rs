// ============================================================================
// ffdeck-core/src/worker.rs
// ============================================================================
//
// BACKGROUND WORKER: Runs an operation off the foreground thread
//
// The foreground (the CLI's render loop) must stay responsive while ffmpeg
// runs, so each operation executes on its own named thread. Everything the
// controller reports is forwarded over a channel; the final message is
// always `Finished`, after which the worker thread exits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use log::debug;

use crate::controller::{ControllerEvent, OperationController, OperationOutcome, OperationRequest};
use crate::error::{CoreError, CoreResult};
use crate::external::ProcessRunner;

/// Message delivered from a worker to the foreground.
#[derive(Debug)]
pub enum WorkerMessage {
    Event(ControllerEvent),
    Finished(OperationOutcome),
}

/// Spawns operations on background threads.
pub struct OperationWorker;

impl OperationWorker {
    /// Starts `request` on a new thread and returns the handle used to
    /// receive its messages.
    pub fn spawn<R>(
        controller: Arc<OperationController<R>>,
        request: OperationRequest,
    ) -> CoreResult<OperationHandle>
    where
        R: ProcessRunner + 'static,
    {
        let (tx, rx) = unbounded();
        let kind = request.kind();
        let join = thread::Builder::new()
            .name(format!("ffdeck-{}", kind.label().to_lowercase().replace(' ', "-")))
            .spawn(move || {
                let events = tx.clone();
                let outcome = controller.execute(request, &mut |event| {
                    // A dropped receiver means nobody is listening any more;
                    // the operation still runs to completion.
                    let _ = events.send(WorkerMessage::Event(event));
                });
                debug!("{} worker done", kind);
                let _ = tx.send(WorkerMessage::Finished(outcome));
            })?;

        Ok(OperationHandle {
            receiver: rx,
            join: Some(join),
        })
    }
}

/// Foreground side of a running operation.
pub struct OperationHandle {
    receiver: Receiver<WorkerMessage>,
    join: Option<JoinHandle<()>>,
}

impl OperationHandle {
    /// Waits up to `timeout` for the next message. `Ok(None)` means the
    /// timeout elapsed; an error means the worker went away without
    /// finishing.
    pub fn next_message(&self, timeout: Duration) -> CoreResult<Option<WorkerMessage>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(worker_lost()),
        }
    }

    /// Blocks until the operation finishes, passing every event to
    /// `on_event`.
    pub fn wait(mut self, mut on_event: impl FnMut(ControllerEvent)) -> CoreResult<OperationOutcome> {
        loop {
            match self.receiver.recv() {
                Ok(WorkerMessage::Event(event)) => on_event(event),
                Ok(WorkerMessage::Finished(outcome)) => {
                    self.join_thread();
                    return Ok(outcome);
                }
                Err(_) => {
                    self.join_thread();
                    return Err(worker_lost());
                }
            }
        }
    }

    /// Joins the worker thread once its final message has been received.
    pub fn join_thread(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn worker_lost() -> CoreError {
    CoreError::InvalidState("Operation worker stopped without reporting a result".to_string())
}
