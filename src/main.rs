// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

use kwh_counters::{Config, Error, FlowTotals, ResultSink, Scheduler, SimulatedBus};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs the totals of every cycle.
struct LogSink;

impl ResultSink for LogSink {
    fn publish(&mut self, totals: &FlowTotals) -> Result<(), Error> {
        for (name, value) in totals.iter() {
            info!(path = name.path(), value, "flow total");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg = match std::env::var("APP_CONFIG") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    info!(
        period_ms = cfg.cycle_period_ms,
        ac_in_1 = %cfg.ac_inputs.ac_in_1,
        ac_in_2 = %cfg.ac_inputs.ac_in_2,
        "loaded config"
    );

    let bus = SimulatedBus::stock()?;
    let mut scheduler = Scheduler::try_new(&cfg, bus.clone(), LogSink)?;
    scheduler.discover()?;

    let period = cfg.cycle_period();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            bus.advance();
        }
    });

    // The simulated bus has no device events; the sender is kept so that the
    // channel stays open.
    let (_events_tx, events_rx) = mpsc::unbounded_channel();
    scheduler
        .run(events_rx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
