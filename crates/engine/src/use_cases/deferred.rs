//! Deferred operations - side effects queued during a request and run later.

use std::collections::VecDeque;
use std::fmt;

type DeferredFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

pub struct DeferredOp {
    label: String,
    op: DeferredFn,
}

impl DeferredOp {
    pub fn new<F>(label: impl Into<String>, op: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            op: Box::new(op),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run(self) -> anyhow::Result<()> {
        (self.op)()
    }
}

impl fmt::Debug for DeferredOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredOp").field("label", &self.label).finish()
    }
}

/// A deferred operation that returned an error.
#[derive(Debug)]
pub struct DeferredFailure {
    pub label: String,
    pub error: anyhow::Error,
}

/// FIFO queue of deferred operations.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    ops: VecDeque<DeferredOp>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DeferredOp) {
        self.ops.push_back(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.ops.iter().map(|op| op.label.clone()).collect()
    }

    /// Empty the queue, handing back everything that was in it.
    pub fn take(&mut self) -> VecDeque<DeferredOp> {
        std::mem::take(&mut self.ops)
    }

    /// Run a drained batch in order. Failures are collected; later operations still run.
    pub fn run_all(ops: VecDeque<DeferredOp>) -> Vec<DeferredFailure> {
        let mut failures = Vec::new();
        for op in ops {
            let label = op.label.clone();
            if let Err(error) = op.run() {
                tracing::warn!(label = %label, error = %error, "Deferred operation failed");
                failures.push(DeferredFailure { label, error });
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_in_fifo_order_and_collects_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut queue = DeferredQueue::new();

        for label in ["first", "second", "third"] {
            let seen = seen.clone();
            queue.push(DeferredOp::new(label, move || {
                seen.lock().unwrap().push(label);
                if label == "second" {
                    anyhow::bail!("mail server unreachable");
                }
                Ok(())
            }));
        }
        assert_eq!(queue.labels(), vec!["first", "second", "third"]);

        let failures = DeferredQueue::run_all(queue.take());
        assert!(queue.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].label, "second");
        assert_eq!(failures[0].error.to_string(), "mail server unreachable");
    }
}
