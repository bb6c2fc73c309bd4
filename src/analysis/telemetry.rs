use std::time::Duration;

/// What happened to one root of a database sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// Normalized absolute contributions, one per database row.
    Normalized(Vec<f64>),
    /// No contribution from this database's rows; its column stays zero.
    Zero,
    /// The solver failed for this root; its column stays zero.
    Failed(String),
    Cancelled,
}

/// Counters collected while filling a contribution matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepTelemetry {
    pub roots: usize,
    pub normalized: usize,
    pub zero_columns: usize,
    pub failed_roots: usize,
    pub elapsed: Duration,
}

impl SweepTelemetry {
    pub fn record(&mut self, outcome: &ColumnOutcome) {
        self.roots += 1;
        match outcome {
            ColumnOutcome::Normalized(_) => self.normalized += 1,
            ColumnOutcome::Zero => self.zero_columns += 1,
            ColumnOutcome::Failed(_) => self.failed_roots += 1,
            ColumnOutcome::Cancelled => {}
        }
    }

    /// Roots per second over the whole sweep.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.roots as f64 / secs } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_outcome() {
        let mut t = SweepTelemetry::default();
        t.record(&ColumnOutcome::Normalized(vec![1.0]));
        t.record(&ColumnOutcome::Zero);
        t.record(&ColumnOutcome::Failed("singular".into()));
        t.record(&ColumnOutcome::Zero);
        assert_eq!((t.roots, t.normalized, t.zero_columns, t.failed_roots), (4, 1, 2, 1));
        assert_eq!(t.throughput(), 0.0);
    }
}
