use std::collections::VecDeque;

use super::{DrawPass, PassCompletion, PassResult, PassSignal, RenderBackend};

/// Backend that queues passes without executing them.
///
/// Passes stay pending, with their bound bitmaps referenced, until completed
/// explicitly. Useful for headless runs and for observing resource lifetimes
/// around in-flight work.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pending: VecDeque<(DrawPass, PassSignal)>,
    submitted: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total passes ever submitted.
    #[inline]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending passes in submission order.
    pub fn pending(&self) -> impl Iterator<Item = &DrawPass> {
        self.pending.iter().map(|(pass, _)| pass)
    }

    /// Completes the oldest pending pass with `result` and hands it back.
    pub fn complete_next(&mut self, result: PassResult) -> Option<DrawPass> {
        let (pass, signal) = self.pending.pop_front()?;
        signal.complete(result);
        Some(pass)
    }

    /// Completes every pending pass with `result`. Returns how many finished.
    pub fn complete_all(&mut self, result: PassResult) -> usize {
        let n = self.pending.len();
        for (_, signal) in self.pending.drain(..) {
            signal.complete(result.clone());
        }
        n
    }
}

impl RenderBackend for RecordingBackend {
    fn submit(&mut self, pass: DrawPass) -> PassCompletion {
        let (signal, completion) = PassCompletion::channel();
        log::debug!(
            "recording: queued {} into {:?} ({} pending)",
            pass.program.name(),
            pass.target.id(),
            self.pending.len() + 1
        );
        self.pending.push_back((pass, signal));
        self.submitted += 1;
        completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Graphics, PassError};
    use crate::scene::Node;
    use crate::texture::Bitmap;

    #[test]
    fn passes_resolve_only_when_completed() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 2, 2);
        let mut backend = RecordingBackend::new();

        let mut c = Graphics::new(&target).done(&mut backend);
        assert_eq!(c.try_result(), None);
        assert_eq!(backend.pending_len(), 1);

        assert!(backend.complete_next(Ok(())).is_some());
        assert_eq!(c.try_result(), Some(Ok(())));
        assert_eq!(backend.submitted(), 1);
    }

    #[test]
    fn dropping_backend_cancels_pending() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 2, 2);
        let mut backend = RecordingBackend::new();
        let c = Graphics::new(&target).done(&mut backend);
        drop(backend);
        assert_eq!(pollster::block_on(c), Err(PassError::Cancelled));
    }
}
