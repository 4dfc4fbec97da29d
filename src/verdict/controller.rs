use super::error::VerdictError;
use super::state::VerdictState;
use crate::capture::CaptureSource;
use crate::classifier::{CapturedImage, ClassificationResult, Classifier, Label};
use tokio::sync::watch;

/// How a call to `capture_and_classify` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No capture source attached, nothing happened
    Skipped,
    Classified(Label),
    Failed(VerdictError),
}

/// Drives the capture -> upload -> classify -> present cycle
///
/// Every state change is published on a watch channel. A cycle publishes
/// twice: once on entry (loading set, error cleared) and once on exit.
pub struct VerdictController<S, K> {
    source: Option<S>,
    classifier: K,
    state: watch::Sender<VerdictState>,
}

impl<S, K> VerdictController<S, K>
where
    S: CaptureSource,
    K: Classifier,
{
    pub fn new(classifier: K) -> Self {
        let (state, _) = watch::channel(VerdictState::default());
        Self {
            source: None,
            classifier,
            state,
        }
    }

    /// Attach a capture source, returning the one it replaces
    pub fn attach_source(&mut self, source: S) -> Option<S> {
        self.source.replace(source)
    }

    pub fn detach_source(&mut self) -> Option<S> {
        self.source.take()
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> VerdictState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VerdictState> {
        self.state.subscribe()
    }

    /// Run one capture and classification cycle
    ///
    /// The cycle holds `&mut self` until it resolves, so a second cycle cannot
    /// start while one is in flight. `loading` is cleared on every exit path,
    /// including when the returned future is dropped before it completes.
    pub async fn capture_and_classify(&mut self) -> CycleOutcome {
        let Some(source) = self.source.as_mut() else {
            tracing::debug!("No capture source attached, ignoring trigger");
            return CycleOutcome::Skipped;
        };

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let mut settle = Settle::new(&self.state);

        let Some(frame) = source.request_frame() else {
            tracing::warn!("Capture source returned no frame");
            settle.fail(VerdictError::CaptureUnavailable);
            return CycleOutcome::Failed(VerdictError::CaptureUnavailable);
        };

        tracing::debug!(bytes = frame.bytes().len(), "Frame captured");
        let image = CapturedImage::from(frame);

        match self.classifier.classify(image).await {
            Ok(result) => {
                let label = result.label;
                tracing::info!(
                    label = %label,
                    confidence = %result.confidence,
                    "Verdict: {}",
                    result.verdict
                );
                settle.succeed(result);
                CycleOutcome::Classified(label)
            }
            Err(e) => {
                let err = VerdictError::from(&e);
                tracing::warn!(error = %e, "Classification failed");
                settle.fail(err);
                CycleOutcome::Failed(err)
            }
        }
    }
}

/// Publishes the end of a cycle when dropped
struct Settle<'a> {
    state: &'a watch::Sender<VerdictState>,
    outcome: Option<Result<ClassificationResult, VerdictError>>,
}

impl<'a> Settle<'a> {
    fn new(state: &'a watch::Sender<VerdictState>) -> Self {
        Self {
            state,
            outcome: None,
        }
    }

    fn succeed(&mut self, result: ClassificationResult) {
        self.outcome = Some(Ok(result));
    }

    fn fail(&mut self, err: VerdictError) {
        self.outcome = Some(Err(err));
    }
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.take();
        if outcome.is_none() {
            tracing::debug!("Cycle abandoned before completion");
        }

        self.state.send_modify(|state| {
            match outcome {
                Some(Ok(result)) => {
                    state.result = Some(result);
                    state.error = None;
                }
                Some(Err(err)) => state.error = Some(err.to_string()),
                None => {}
            }
            state.loading = false;
        });
    }
}
