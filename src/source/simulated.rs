use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

use super::{PositionEvent, PositionSource, SourceEvent, SubscriptionId, WatchOptions};
use crate::tracking::geodesy::destination;
use crate::tracking::{Coordinate, PositionSample};

/// Synthetic track used when no real receiver is attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Start point as "lat,lon".
    pub coordinates: String,
    #[serde(default = "default_speed")]
    pub speed_mps: f64,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default = "default_jitter")]
    pub jitter_m: f64,
}

fn default_speed() -> f64 {
    8.0
}

fn default_jitter() -> f64 {
    2.0
}

#[derive(Debug)]
struct WorkerHandle {
    id: SubscriptionId,
    stop_tx: oneshot::Sender<()>,
}

pub struct SimulatedSource {
    config: SimulationConfig,
    origin: Coordinate,
    events: mpsc::UnboundedSender<SourceEvent>,
    next_id: u64,
    worker: Option<WorkerHandle>,
}

impl SimulatedSource {
    pub fn new(config: SimulationConfig, events: mpsc::UnboundedSender<SourceEvent>) -> Self {
        let origin = Coordinate::from_str_pair(&config.coordinates).unwrap_or_else(|| {
            log::warn!(
                "Invalid simulation coordinates {:?}, starting at 0,0",
                config.coordinates
            );
            Coordinate::new(0.0, 0.0)
        });
        Self {
            config,
            origin,
            events,
            next_id: 0,
            worker: None,
        }
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
        }
    }
}

impl PositionSource for SimulatedSource {
    fn subscribe(&mut self, options: &WatchOptions) -> SubscriptionId {
        self.stop_worker();

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (stop_tx, stop_rx) = oneshot::channel();
        let interval = Duration::from_millis(options.interval_ms.max(10));

        tokio::spawn(run_simulation(
            id,
            self.origin,
            self.config.clone(),
            interval,
            self.events.clone(),
            stop_rx,
        ));

        log::info!("Simulated position source started ({:?})", id);
        self.worker = Some(WorkerHandle { id, stop_tx });
        id
    }

    fn cancel(&mut self, subscription: SubscriptionId) {
        if self.worker.as_ref().map(|w| w.id) == Some(subscription) {
            self.stop_worker();
            log::info!("Simulated position source cancelled ({:?})", subscription);
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

async fn run_simulation(
    id: SubscriptionId,
    origin: Coordinate,
    config: SimulationConfig,
    interval: Duration,
    events: mpsc::UnboundedSender<SourceEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut position = origin;
    let dt = interval.as_secs_f64();
    let mut tick: u64 = 0;

    loop {
        let should_stop = tokio::select! {
            _ = sleep(interval) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }

        tick += 1;
        let phase = tick as f64 / 10.0;
        let speed = (config.speed_mps * (1.0 + 0.3 * phase.sin())).max(0.0);
        let heading = config.heading_deg + 15.0 * (phase / 3.0).sin();
        position = destination(position, heading, speed * dt);

        let offset = config.jitter_m * (tick as f64 * 1.7).sin();
        let reported = destination(position, heading + 90.0, offset);

        let sample = PositionSample::new(Utc::now(), reported.latitude, reported.longitude)
            .with_speed(speed)
            .with_accuracy(3.0 + config.jitter_m.abs());

        let event = SourceEvent {
            subscription: id,
            event: PositionEvent::Sample(sample),
        };
        if events.send(event).is_err() {
            break;
        }
    }

    log::debug!("Simulation loop {:?} exited after {} ticks", id, tick);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn config() -> SimulationConfig {
        SimulationConfig {
            coordinates: "51.5074, -0.1278".to_string(),
            speed_mps: 10.0,
            heading_deg: 90.0,
            jitter_m: 1.0,
        }
    }

    fn fast_options() -> WatchOptions {
        WatchOptions {
            interval_ms: 10,
            ..WatchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_emits_tagged_samples() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = SimulatedSource::new(config(), tx);
        let id = source.subscribe(&fast_options());

        for _ in 0..3 {
            let event = timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event.subscription, id);
            match event.event {
                PositionEvent::Sample(sample) => {
                    assert!(sample.speed_mps.unwrap() > 0.0);
                    assert!((sample.latitude - 51.5074).abs() < 0.01);
                }
                PositionEvent::Error(e) => panic!("unexpected error {e}"),
            }
        }
        source.cancel(id);
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = SimulatedSource::new(config(), tx);
        let id = source.subscribe(&fast_options());

        timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        source.cancel(id);

        sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}
        sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_worker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = SimulatedSource::new(config(), tx);
        let first = source.subscribe(&fast_options());
        let second = source.subscribe(&fast_options());
        assert_ne!(first, second);

        sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}

        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.subscription, second);
        source.cancel(second);
    }
}
