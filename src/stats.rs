use std::cell::Cell;
use std::time::Instant;

/// A snapshot of the solver-related counters of a context.
///
/// Times are wall-clock seconds measured with a monotonic clock.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Stats {
    /// Cumulative time spent inside the SAT solver.
    pub sat_time: f64,
    /// Cumulative time spent building CNF clauses.
    pub clauses_time: f64,
    /// Number of SAT solver invocations.
    pub num_sat_solutions: u64,
    /// Total number of CNF clauses emitted.
    pub num_clauses: u64,
}

/// Interior-mutable counters, so queries that only read the DAG can stay
/// `&self` while still accounting their work.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) sat_time: Cell<f64>,
    pub(crate) clauses_time: Cell<f64>,
    pub(crate) num_sat_solutions: Cell<u64>,
    pub(crate) num_clauses: Cell<u64>,
}

impl StatsCounters {
    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            sat_time: self.sat_time.get(),
            clauses_time: self.clauses_time.get(),
            num_sat_solutions: self.num_sat_solutions.get(),
            num_clauses: self.num_clauses.get(),
        }
    }
}

/// Scoped timer: adds the elapsed wall time of its lifetime to a counter on
/// drop, so the span is closed on every exit path.
pub(crate) struct Timer<'a> {
    total: &'a Cell<f64>,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub(crate) fn new(total: &'a Cell<f64>) -> Self {
        Self {
            total,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.total.set(self.total.get() + elapsed);
    }
}
