// Simulated Crazyflie shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cfpilot::telemetry::{LogConfig, TelemetryFrame};
use cfpilot::{Commander, Error, Result, Setpoint, TelemetryStream, Vehicle};
use tokio::sync::watch;

pub const URI: &str = "radio://0/80/2M/E7E7E7E7E7";

pub const TOC: [&str; 8] = [
    "stateEstimate.roll",
    "stateEstimate.pitch",
    "stateEstimate.yaw",
    "stateEstimate.x",
    "stateEstimate.y",
    "stateEstimate.z",
    "baro.asl",
    "stabilizer.thrust",
];

/// Records every setpoint sent
#[derive(Default)]
pub struct RecordingCommander {
    pub sent: Mutex<Vec<Setpoint>>,
}

impl RecordingCommander {
    pub fn sent(&self) -> Vec<Setpoint> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Commander for RecordingCommander {
    async fn send(&self, setpoint: Setpoint) -> Result<()> {
        self.sent.lock().unwrap().push(setpoint);
        Ok(())
    }
}

struct Inner {
    sent: Mutex<Vec<Setpoint>>,
    frames_tx: flume::Sender<TelemetryFrame>,
    frames_rx: flume::Receiver<TelemetryFrame>,
    started: Mutex<Vec<LogConfig>>,
    stopped: AtomicUsize,
    disconnects: AtomicUsize,
    closed: watch::Sender<Option<String>>,
}

/// Simulated vehicle, clones share the same state
#[derive(Clone)]
pub struct MockVehicle {
    inner: Arc<Inner>,
}

impl MockVehicle {
    pub fn new() -> Self {
        let (frames_tx, frames_rx) = flume::unbounded();
        let (closed, _) = watch::channel(None);
        MockVehicle {
            inner: Arc::new(Inner {
                sent: Mutex::new(Vec::new()),
                frames_tx,
                frames_rx,
                started: Mutex::new(Vec::new()),
                stopped: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
                closed,
            }),
        }
    }

    /// Deliver a frame to the running log block
    pub fn push_frame(&self, frame: TelemetryFrame) {
        self.inner.frames_tx.send(frame).unwrap();
    }

    /// Close the link from the vehicle side
    pub fn lose_link(&self, reason: &str) {
        self.inner.closed.send_replace(Some(reason.to_owned()));
    }

    pub fn sent(&self) -> Vec<Setpoint> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<LogConfig> {
        self.inner.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> usize {
        self.inner.stopped.load(SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.inner.disconnects.load(SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.borrow().is_some()
    }
}

async fn wait_closed(closed: &mut watch::Receiver<Option<String>>) -> String {
    loop {
        let current = closed.borrow_and_update().clone();
        if let Some(reason) = current {
            return reason;
        }
        if closed.changed().await.is_err() {
            return "dropped".to_owned();
        }
    }
}

#[async_trait]
impl Commander for MockVehicle {
    async fn send(&self, setpoint: Setpoint) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Disconnected);
        }
        self.inner.sent.lock().unwrap().push(setpoint);
        Ok(())
    }
}

#[async_trait]
impl Vehicle for MockVehicle {
    fn uri(&self) -> &str {
        URI
    }

    async fn start_telemetry(&self, config: &LogConfig) -> Result<Box<dyn TelemetryStream>> {
        config.validate()?;
        if let Some(missing) = config.names().find(|name| !TOC.contains(name)) {
            return Err(Error::VariableNotFound(missing.to_owned()));
        }
        self.inner.started.lock().unwrap().push(config.clone());

        Ok(Box::new(MockStream {
            frames: self.inner.frames_rx.clone(),
            closed: self.inner.closed.subscribe(),
            inner: self.inner.clone(),
        }))
    }

    async fn disconnect(&self) {
        self.inner.disconnects.fetch_add(1, SeqCst);
        self.inner.closed.send_replace(Some("disconnect requested".to_owned()));
    }

    async fn wait_disconnect(&self) -> String {
        let mut closed = self.inner.closed.subscribe();
        wait_closed(&mut closed).await
    }
}

struct MockStream {
    frames: flume::Receiver<TelemetryFrame>,
    closed: watch::Receiver<Option<String>>,
    inner: Arc<Inner>,
}

#[async_trait]
impl TelemetryStream for MockStream {
    async fn next_frame(&mut self) -> Result<TelemetryFrame> {
        tokio::select! {
            frame = self.frames.recv_async() => frame.map_err(|_| Error::Disconnected),
            _ = wait_closed(&mut self.closed) => Err(Error::Disconnected),
        }
    }

    async fn stop(self: Box<Self>) -> Result<()> {
        self.inner.stopped.fetch_add(1, SeqCst);
        Ok(())
    }
}

/// Frame with the given values, in order
pub fn frame(timestamp: u32, values: &[(&str, f64)]) -> TelemetryFrame {
    TelemetryFrame::new(
        timestamp,
        values.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
    )
}

/// Frame of the default state estimate block
pub fn state_frame(
    timestamp: u32,
    roll: f64,
    pitch: f64,
    yaw: f64,
    z: f64,
    asl: f64,
) -> TelemetryFrame {
    frame(
        timestamp,
        &[
            ("stateEstimate.roll", roll),
            ("stateEstimate.pitch", pitch),
            ("stateEstimate.yaw", yaw),
            ("stateEstimate.z", z),
            ("baro.asl", asl),
        ],
    )
}

/// Poll `condition` every millisecond of (usually paused) tokio time
pub async fn until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
