//! Progress updates emitted by the pipelines.
//!
//! The orchestrator accepts an optional channel sender; updates are
//! fire-and-forget so a slow or dropped receiver never stalls a job.

use tokio::sync::mpsc::Sender;

/// Progress update sent to the caller while a pipeline runs.
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// Processing started.
    Started,
    /// The source audio is being standardized and transcribed.
    Transcribing,
    /// Synthesizing one segment/span out of the total.
    Synthesizing { current: usize, total: usize },
    /// Time-stretching a span to fit its source timing.
    Fitting { current: usize, total: usize },
    /// Concatenating the fitted segments.
    Merging,
    /// Writing/encoding the output artifacts.
    Encoding,
    /// Processing finished.
    Finished,
}

/// Sends a progress update if a sender is attached. When the receiver's
/// buffer is full or the receiver is gone, the update is dropped instead of
/// blocking the pipeline.
pub fn send_progress(sender: &Option<Sender<ProgressUpdate>>, update: ProgressUpdate) {
    if let Some(sender) = sender {
        let _ = sender.try_send(update);
    }
}
