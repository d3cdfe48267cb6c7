/// Defines a contract for types that can report metrics.
///
/// Counters are recorded as calls happen, gauges describing the current state of a component are
/// published through this trait. Callers decide how often to invoke it.
pub trait MetricsReporter {
    /// Reports the current gauges of the implementing type.
    fn report_metrics(&self);
}
