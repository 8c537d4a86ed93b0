// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Conversion of cumulative energy counters into per-cycle deltas.

mod deltas;
mod readings;

pub use deltas::{CounterRegression, Deltas};
pub use readings::Readings;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::TrackedPaths;

/// Keeps the last observed value of every tracked counter, and computes the
/// energy transferred since then.
///
/// For each tracked `(class, path)`, the delta of one instance is
/// `max(current - previous, 0)`.  Instances without a previous value
/// contribute zero, but their current value becomes the baseline for the
/// next cycle.  The deltas of all instances of a class are summed.
#[derive(Debug)]
pub struct DeltaTracker {
    tracked: TrackedPaths,
    snapshot: Readings,
}

impl DeltaTracker {
    /// Creates a tracker with an empty snapshot.
    pub fn new(tracked: TrackedPaths) -> Self {
        Self {
            tracked,
            snapshot: Readings::new(),
        }
    }

    pub fn tracked_paths(&self) -> &TrackedPaths {
        &self.tracked
    }

    /// Returns the baseline that the next deltas will be computed against.
    pub fn snapshot(&self) -> &Readings {
        &self.snapshot
    }

    /// Computes the deltas between the snapshot and `current`, without
    /// changing the snapshot.
    pub fn peek_deltas(&self, current: &Readings) -> Deltas {
        let mut deltas = Deltas::default();

        for (class, paths) in self.tracked.iter() {
            let totals = deltas.classes.entry(class).or_insert_with(|| {
                paths
                    .iter()
                    .map(|path| (path.clone(), 0.0))
                    .collect::<BTreeMap<_, _>>()
            });

            for (instance, readings) in current.instances_of(class) {
                for path in paths {
                    let Some(value) = readings.values.get(path).copied() else {
                        continue;
                    };
                    let delta = match self.snapshot.value(instance.service_name(), path.as_str())
                    {
                        Some(previous) if value < previous => {
                            debug!(
                                "Counter {instance}{path} went from {previous} to {value}, \
                                 clamping delta to 0."
                            );
                            deltas.regressions.push(CounterRegression {
                                instance: instance.clone(),
                                path: path.clone(),
                                previous,
                                current: value,
                            });
                            0.0
                        }
                        Some(previous) => value - previous,
                        None => 0.0,
                    };
                    deltas
                        .instances
                        .entry(instance.clone())
                        .or_default()
                        .insert(path.clone(), delta);
                    if let Some(total) = totals.get_mut(path) {
                        *total += delta;
                    }
                }
            }
        }

        deltas
    }

    /// Computes the deltas between the snapshot and `current`, and replaces
    /// the snapshot with `current`.
    ///
    /// Instances missing from `current` are dropped from the snapshot.
    pub fn compute_deltas(&mut self, current: Readings) -> Deltas {
        let deltas = self.peek_deltas(&current);
        self.snapshot = current;
        deltas
    }

    /// Drops the baseline of `instance`, so that if it comes back, it starts
    /// over from a fresh baseline.
    pub fn forget(&mut self, instance: &str) {
        if self.snapshot.remove(instance) {
            debug!("Dropped the counter baseline of {instance}.");
        }
    }
}
