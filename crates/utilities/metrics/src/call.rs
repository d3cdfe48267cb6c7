use std::time::Instant;

/// Names of the metric series recording the outcome of a component's method calls.
///
/// Every series is labelled with the `method` that was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallMetrics {
    /// Counter incremented when a call succeeds.
    pub success: &'static str,
    /// Counter incremented when a call fails.
    pub error: &'static str,
    /// Histogram of call durations, in seconds.
    pub duration: &'static str,
}

impl CallMetrics {
    /// Registers descriptions for the series with the installed recorder.
    pub fn describe(&self, component: &'static str) {
        metrics::describe_counter!(
            self.success,
            metrics::Unit::Count,
            format!("Total number of successful {component} requests")
        );
        metrics::describe_counter!(
            self.error,
            metrics::Unit::Count,
            format!("Total number of failed {component} requests")
        );
        metrics::describe_histogram!(
            self.duration,
            metrics::Unit::Seconds,
            format!("Duration of {component} requests")
        );
    }

    /// Initializes the series of `method` to zero so they are exported before the first call.
    pub fn zero(&self, method: &'static str) {
        metrics::counter!(self.success, "method" => method).increment(0);
        metrics::counter!(self.error, "method" => method).increment(0);
        metrics::histogram!(self.duration, "method" => method).record(0.0);
    }

    /// Runs `f`, recording its outcome and duration under `method`.
    pub fn observe<T, E, F>(&self, method: &'static str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start_time = Instant::now();
        let result = f();
        let duration = start_time.elapsed().as_secs_f64();

        let name = if result.is_ok() { self.success } else { self.error };
        metrics::counter!(name, "method" => method).increment(1);
        metrics::histogram!(self.duration, "method" => method).record(duration);

        result
    }
}
