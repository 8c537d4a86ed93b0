// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The periodic cycle that reads counters, decomposes them into flows and
//! publishes the result.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::{
    BusReader, Config, DeltaTracker, DeviceClass, DeviceEvent, Error, FlowDecomposer,
    FlowTotals, Readings, ResultSink, RoleDeltas, RoleRegistry,
};

/// Owns the state of the counter service, and drives its cycles.
///
/// A cycle reads the tracked counters from the bus, turns them into deltas,
/// groups those by role, decomposes them into [`FlowTotals`] and publishes
/// them.  Device events are applied between cycles, never during one.
pub struct Scheduler<B, S>
where
    B: BusReader,
    S: ResultSink,
{
    bus: B,
    sink: S,
    tracker: DeltaTracker,
    registry: RoleRegistry,
    decomposer: FlowDecomposer,
    period: Duration,
    last_published: Option<FlowTotals>,
}

impl<B, S> Scheduler<B, S>
where
    B: BusReader,
    S: ResultSink,
{
    /// Creates a new scheduler.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn try_new(config: &Config, bus: B, sink: S) -> Result<Self, Error> {
        let decomposer = FlowDecomposer::try_new(config)?;
        Ok(Self {
            bus,
            sink,
            tracker: DeltaTracker::new(config.tracked_paths.clone()),
            registry: RoleRegistry::new(),
            decomposer,
            period: config.cycle_period(),
            last_published: None,
        })
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &DeltaTracker {
        &self.tracker
    }

    /// Returns the totals of the last cycle that was published successfully.
    pub fn last_published(&self) -> Option<&FlowTotals> {
        self.last_published.as_ref()
    }

    /// Registers all devices that are already on the bus.
    pub fn discover(&mut self) -> Result<(), Error> {
        for class in DeviceClass::ALL {
            for instance in self.bus.instances(class)? {
                if self.registry.role_of(instance.service_name()).is_none() {
                    self.registry.device_appeared(&self.bus, instance, class);
                }
            }
        }
        Ok(())
    }

    /// Applies a device event to the role registry.
    ///
    /// A device that disappears also loses its counter baseline.
    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Appeared { instance, class } => {
                self.registry.device_appeared(&self.bus, instance, class);
            }
            DeviceEvent::Disappeared { instance } => {
                self.registry.device_disappeared(instance.service_name());
                self.tracker.forget(instance.service_name());
            }
        }
    }

    /// Runs a single cycle and returns the published totals.
    ///
    /// If reading the bus fails, the snapshot is left untouched.  If the
    /// decomposition or the publishing fails, nothing new is published and
    /// the previous totals stay in place.
    pub fn run_cycle(&mut self) -> Result<FlowTotals, Error> {
        let readings = Readings::collect(&self.bus, self.tracker.tracked_paths())?;
        let deltas = self.tracker.compute_deltas(readings);
        if !deltas.regressions().is_empty() {
            debug!("{} counter(s) went backwards.", deltas.regressions().len());
        }

        let grouped = RoleDeltas::group_for(&deltas, &self.registry, &self.tracker);
        let totals = self.decomposer.decompose(&grouped)?;

        self.sink.publish(&totals)?;
        debug!("Published {totals}");
        self.last_published = Some(totals);

        Ok(totals)
    }

    /// Runs cycles at the configured period, until `shutdown` completes.
    ///
    /// Events received on `events` are applied between cycles.  A failed
    /// cycle is logged, and the next cycle starts at the next period.
    pub async fn run<F>(&mut self, mut events: mpsc::UnboundedReceiver<DeviceEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        info!("Running a cycle every {:?}.", self.period);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested.");
                    break;
                }
                Some(event) = events.recv() => {
                    self.handle_event(event);
                }
                _ = interval.tick() => {
                    if let Err(err) = self.run_cycle() {
                        error!("Cycle aborted: {err}");
                    }
                }
            }
        }
    }
}
