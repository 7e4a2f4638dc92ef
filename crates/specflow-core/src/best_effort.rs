//! Best-effort pipeline steps.
//!
//! A [`BestEffort`] result records whether a non-critical step succeeded
//! without carrying its error. Converting a `Result` into one logs the error
//! at warn level and drops it, so callers cannot propagate it by accident.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Outcome of a step whose failure must never fail the surrounding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum BestEffort<T> {
    Done(T),
    Skipped,
}

impl<T> BestEffort<T> {
    /// Log and swallow an error from `step`.
    pub fn from_result<E: Display>(step: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => BestEffort::Done(value),
            Err(e) => {
                warn!(event = "best_effort.skipped", step = %step, error = %e, "best-effort step failed");
                BestEffort::Skipped
            }
        }
    }

    /// Await `fut` and convert its result.
    pub async fn run<E, F>(step: &str, fut: F) -> Self
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        Self::from_result(step, fut.await)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            BestEffort::Done(v) => Some(v),
            BestEffort::Skipped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_done() {
        let r: BestEffort<u32> = BestEffort::from_result("step", Ok::<_, String>(3));
        assert!(r.is_done());
        assert_eq!(r.into_option(), Some(3));
    }

    #[tokio::test]
    async fn err_is_skipped() {
        let r: BestEffort<()> = BestEffort::run("labels", async { Err("boom") }).await;
        assert_eq!(r, BestEffort::Skipped);
        assert!(r.into_option().is_none());
    }
}
