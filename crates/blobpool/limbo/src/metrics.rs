use blobpool_metrics::CallMetrics;

/// Container for limbo metrics.
#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const CALLS: CallMetrics = CallMetrics {
        success: "blobpool_limbo_success_total",
        error: "blobpool_limbo_error_total",
        duration: "blobpool_limbo_duration_seconds",
    };

    pub(crate) const LIMBO_EVICTED_TOTAL: &'static str = "blobpool_limbo_evicted_total";
    pub(crate) const LIMBO_EVICTION_FAILURES_TOTAL: &'static str =
        "blobpool_limbo_eviction_failures_total";
    pub(crate) const LIMBO_TRACKED_ENTRIES: &'static str = "blobpool_limbo_tracked_entries";
    pub(crate) const LIMBO_TRACKED_BLOCKS: &'static str = "blobpool_limbo_tracked_blocks";

    pub(crate) const LIMBO_METHOD_PUSH: &'static str = "push";
    pub(crate) const LIMBO_METHOD_PULL: &'static str = "pull";
    pub(crate) const LIMBO_METHOD_UPDATE: &'static str = "update";

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        Self::CALLS.describe("blob limbo");
        metrics::describe_counter!(
            Self::LIMBO_EVICTED_TOTAL,
            metrics::Unit::Count,
            "Total number of limbo entries evicted by finality"
        );
        metrics::describe_counter!(
            Self::LIMBO_EVICTION_FAILURES_TOTAL,
            metrics::Unit::Count,
            "Total number of finalized limbo entries whose slot could not be deleted"
        );
        metrics::describe_gauge!(
            Self::LIMBO_TRACKED_ENTRIES,
            metrics::Unit::Count,
            "Number of blob transactions held by the limbo"
        );
        metrics::describe_gauge!(
            Self::LIMBO_TRACKED_BLOCKS,
            metrics::Unit::Count,
            "Number of distinct inclusion blocks held by the limbo"
        );
    }

    fn zero() {
        Self::CALLS.zero(Self::LIMBO_METHOD_PUSH);
        Self::CALLS.zero(Self::LIMBO_METHOD_PULL);
        Self::CALLS.zero(Self::LIMBO_METHOD_UPDATE);
        metrics::counter!(Self::LIMBO_EVICTED_TOTAL).increment(0);
        metrics::counter!(Self::LIMBO_EVICTION_FAILURES_TOTAL).increment(0);
    }
}
