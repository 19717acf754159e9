use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::capture::domain::capture_sample::PreviewEvent;
use crate::pipeline::capture_flow::{CaptureFlow, FlowOutcome};
use crate::upload::domain::upload_payload::ServerAck;

/// Messages from the capture worker, in emission order.
pub enum WorkerMessage {
    Preview(PreviewEvent),
    /// Sent exactly once, last.
    Finished(FlowOutcome),
}

/// What the user should be told once a flow ends.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerSignal {
    Success(ServerAck),
    Failure(String),
    /// Nothing to show.
    Cancelled,
}

impl From<FlowOutcome> for ControllerSignal {
    fn from(outcome: FlowOutcome) -> Self {
        match outcome {
            FlowOutcome::Succeeded(ack) => ControllerSignal::Success(ack),
            FlowOutcome::Failed(e) => ControllerSignal::Failure(e.to_string()),
            FlowOutcome::Cancelled => ControllerSignal::Cancelled,
        }
    }
}

/// Displays preview events. Called on the controlling thread.
pub trait PreviewSink {
    fn show(&mut self, event: &PreviewEvent);
}

impl<F: FnMut(&PreviewEvent)> PreviewSink for F {
    fn show(&mut self, event: &PreviewEvent) {
        self(event)
    }
}

/// Runs one capture flow on a dedicated worker thread.
///
/// Dropping the controller cancels the flow and waits for the worker, so the
/// camera is released before the drop returns.
pub struct SessionController {
    events: Receiver<WorkerMessage>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SessionController {
    pub fn spawn(flow: Box<dyn CaptureFlow>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancelled = flow.cancel_token();

        let worker = std::thread::spawn(move || {
            let outcome = flow.execute(&mut |event: PreviewEvent| {
                // Receiver gone means nobody is watching; keep going until
                // the flow notices the cancel flag.
                let _ = tx.send(WorkerMessage::Preview(event));
            });
            let _ = tx.send(WorkerMessage::Finished(outcome));
        });

        Self {
            events: rx,
            cancelled,
            worker: Some(worker),
        }
    }

    /// Request cooperative cancellation. The flow ends at its next tick.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Forward previews to `sink` until the flow ends, then join the worker.
    pub fn drive(mut self, sink: &mut dyn PreviewSink) -> ControllerSignal {
        let signal = loop {
            match self.events.recv() {
                Ok(WorkerMessage::Preview(event)) => sink.show(&event),
                Ok(WorkerMessage::Finished(outcome)) => break ControllerSignal::from(outcome),
                Err(_) => {
                    log::warn!("Capture worker exited without a result");
                    break ControllerSignal::Failure(
                        "Capture stopped unexpectedly.".to_string(),
                    );
                }
            }
        };
        self.join();
        signal
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Capture worker panicked");
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cancel();
            self.join();
        }
    }
}
