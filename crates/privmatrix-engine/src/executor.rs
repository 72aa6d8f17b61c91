//! Sequential, bounded-batch submission of an update plan.

use tracing::{info, instrument};

use crate::error::EngineResult;
use crate::plan::UpdatePlan;
use crate::service::AccessControlService;

/// Submits update plans in bounded chunks with continue-on-error semantics.
///
/// Batches go out sequentially, in plan order, to preserve the plan's
/// role-major/entity-minor ordering and to avoid rate-limit amplification.
/// The executor never retries individual operations: grants and removals are
/// assumed idempotent on the service side (adding an already-present depth or
/// removing an absent privilege is a remote no-op), so re-running a partially
/// applied plan is the supported recovery path after a failure.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    max_batch_size: usize,
}

/// What one run submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Remote batch calls issued.
    pub batches_submitted: usize,
    /// Operations carried by those calls.
    pub operations_submitted: usize,
    /// (role, entity) pairs the plan touched.
    pub pairs_touched: usize,
}

impl BatchExecutor {
    /// Hard ceiling on operations per remote batch call.
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 200;

    /// Creates an executor with the default batch size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Overrides the maximum operations per batch call. Values below 1 are
    /// clamped to 1.
    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Configured batch-size ceiling.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Submits the plan's operations in order.
    ///
    /// A transport-level failure aborts the run immediately: remaining
    /// batches are not submitted, and batches already applied stay applied.
    /// A successful call that contained per-item failures is reported as
    /// success; this executor does not see inside the batch.
    #[instrument(skip_all, fields(operations = plan.operations.len()))]
    pub async fn execute(
        &self,
        service: &dyn AccessControlService,
        plan: &UpdatePlan,
    ) -> EngineResult<RunReport> {
        let mut report = RunReport {
            pairs_touched: plan.pairs_touched,
            ..RunReport::default()
        };

        for chunk in plan.operations.chunks(self.max_batch_size) {
            service.execute_batch(chunk, true).await?;
            report.batches_submitted += 1;
            report.operations_submitted += chunk.len();
        }

        info!(
            batches = report.batches_submitted,
            operations = report.operations_submitted,
            pairs = report.pairs_touched,
            "update run complete"
        );
        Ok(report)
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}
