//! # Flight session
//!
//! A [Pilot] drives one connected vehicle: it streams a telemetry block in the background, keeps the latest values
//! at hand and runs flights on request. It is meant to be driven from another task or from an interactive front-end:
//! all methods take `&self`, so the pilot can be shared behind an `Arc`.
//!
//! Flights requested with [Pilot::take_off()] are queued and dispatched by the telemetry task on the next frame
//! received from the Crazyflie, so a take-off only happens while telemetry is flowing. Only one flight runs at a
//! time: queued flights wait for the current one to end, and [Pilot::run_sequence()] fails with [Error::Busy]
//! while a flight is in progress.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::PilotConfig;
use crate::flight::{self, Direction, FlightRequest, RampProfile};
use crate::telemetry::{LatestValues, LogConfig, TelemetryFrame};
use crate::vehicle::{TelemetryStream, Vehicle};
use crate::{Error, Result};

/// Callback invoked with every telemetry frame
pub type FrameHook = Box<dyn Fn(&TelemetryFrame) + Send + Sync>;

/// Callback serving a display request with the latest values
pub type DisplayHook = Box<dyn Fn(&[f64]) + Send + Sync>;

/// How the link was closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnection {
    /// Reason reported by the link
    pub reason: String,
    /// The pilot asked for the disconnection, the link was not lost
    pub requested: bool,
}

struct Shared {
    latest: LatestValues,
    hooks: RwLock<Vec<FrameHook>>,
    displays: RwLock<Vec<DisplayHook>>,
    display_requested: AtomicBool,
    flying: AtomicBool,
    disconnect_requested: AtomicBool,
}

impl Shared {
    fn try_claim_flight(self: &Arc<Self>) -> Option<FlightClaim> {
        self.flying
            .compare_exchange(false, true, Acquire, Relaxed)
            .ok()
            .map(|_| FlightClaim(self.clone()))
    }

    fn publish(&self, frame: &TelemetryFrame) {
        self.latest.store(frame.rounded());

        if self.display_requested.swap(false, AcqRel) {
            let values = self.latest.snapshot();
            log::debug!("The list has been returned: {:?}", values);
            let displays = self.displays.read().unwrap_or_else(|e| e.into_inner());
            for display in displays.iter() {
                display(&values);
            }
        }

        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        for hook in hooks.iter() {
            hook(frame);
        }
    }
}

/// The flight flag, cleared when dropped
///
/// A flight future dropped before completion, by a timeout or an aborted task, still frees the vehicle.
struct FlightClaim(Arc<Shared>);

impl Drop for FlightClaim {
    fn drop(&mut self) {
        self.0.flying.store(false, Release);
    }
}

struct TelemetryTask {
    stop: flume::Sender<()>,
    handle: JoinHandle<()>,
}

type TelemetrySlot = Arc<Mutex<Option<TelemetryTask>>>;

async fn stop_telemetry(slot: &Mutex<Option<TelemetryTask>>) {
    let task = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(task) = task {
        let _ = task.stop.send_async(()).await;
        let _ = task.handle.await;
    }
}

/// # Flight session
///
/// See the [module documentation](crate::pilot) for the threading model.
///
/// Creating a pilot spawns a task watching the link, it must be done from within a tokio runtime.
pub struct Pilot<V: Vehicle + 'static> {
    vehicle: Arc<V>,
    config: PilotConfig,
    shared: Arc<Shared>,
    requests: flume::Sender<FlightRequest>,
    pending: flume::Receiver<FlightRequest>,
    telemetry: TelemetrySlot,
    disconnected: watch::Receiver<Option<Disconnection>>,
    watcher: JoinHandle<()>,
}

impl<V: Vehicle + 'static> Pilot<V> {
    pub fn new(vehicle: V, config: PilotConfig) -> Self {
        let vehicle = Arc::new(vehicle);
        let shared = Arc::new(Shared {
            latest: LatestValues::new(),
            hooks: RwLock::new(Vec::new()),
            displays: RwLock::new(Vec::new()),
            display_requested: AtomicBool::new(false),
            flying: AtomicBool::new(false),
            disconnect_requested: AtomicBool::new(false),
        });
        let (requests, pending) = flume::unbounded();
        let (disconnected_tx, disconnected) = watch::channel(None);

        let watcher_vehicle = vehicle.clone();
        let watcher_shared = shared.clone();
        let watcher = tokio::spawn(async move {
            let reason = watcher_vehicle.wait_disconnect().await;
            let uri = watcher_vehicle.uri();
            let requested = watcher_shared.disconnect_requested.load(Acquire);
            if !requested {
                log::warn!("Connection to {} lost: {}", uri, reason);
            }
            log::info!("Disconnected from {}", uri);
            disconnected_tx.send_replace(Some(Disconnection { reason, requested }));
        });

        Pilot {
            vehicle,
            config,
            shared,
            requests,
            pending,
            telemetry: Arc::new(Mutex::new(None)),
            disconnected,
            watcher,
        }
    }

    pub fn vehicle(&self) -> &Arc<V> {
        &self.vehicle
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    /// Start streaming `block` in the background
    ///
    /// Replaces the block currently streamed, if any. Errors in the block definition, like
    /// [Error::VariableNotFound] or [Error::InvalidLogConfig], are returned here; errors while streaming are logged
    /// and end the stream.
    pub async fn start_logging(&self, block: &LogConfig) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Disconnected);
        }

        let stream = self.vehicle.start_telemetry(block).await?;
        let (stop, stop_rx) = flume::bounded(1);

        let handle = tokio::spawn(telemetry_loop(
            stream,
            block.name.clone(),
            self.shared.clone(),
            self.vehicle.clone(),
            self.pending.clone(),
            self.config.ramp,
            stop_rx,
        ));

        let previous = self
            .telemetry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(TelemetryTask { stop, handle });
        if let Some(previous) = previous {
            let _ = previous.stop.send_async(()).await;
            let _ = previous.handle.await;
        }

        log::info!("Logging {} every {}ms", block.name, block.period_ms);
        Ok(())
    }

    /// Start streaming the configured telemetry block
    pub async fn start_default_logging(&self) -> Result<()> {
        let block = self.config.telemetry.clone();
        self.start_logging(&block).await
    }

    /// Stop the background stream and the log block on the Crazyflie
    pub async fn stop_logging(&self) {
        stop_telemetry(&self.telemetry).await;
    }

    /// Register a callback called with every telemetry frame, from the telemetry task
    pub fn on_frame(&self, hook: impl Fn(&TelemetryFrame) + Send + Sync + 'static) {
        self.shared
            .hooks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(hook));
    }

    /// Register a callback serving the display requests made with [Pilot::return_list()]
    pub fn on_display(&self, hook: impl Fn(&[f64]) + Send + Sync + 'static) {
        self.shared
            .displays
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(hook));
    }

    /// Latest telemetry values, rounded to two decimals, in block order
    ///
    /// Empty until the first frame is received.
    pub fn latest(&self) -> Vec<f64> {
        self.shared.latest.snapshot()
    }

    /// Shared handle to the latest values
    pub fn latest_values(&self) -> LatestValues {
        self.shared.latest.clone()
    }

    /// Return the latest values and display them again when the next frame arrives
    ///
    /// The request is served once, by the [display hooks](Pilot::on_display), then cleared.
    pub fn return_list(&self) -> Vec<f64> {
        self.shared.display_requested.store(true, Release);
        self.latest()
    }

    /// True while a display request waits for the next frame
    pub fn display_pending(&self) -> bool {
        self.shared.display_requested.load(Acquire)
    }

    /// Queue a thrust ramp flight
    ///
    /// The flight starts on the next telemetry frame once no other flight is running. Attitude and thrust apply to
    /// this flight only.
    pub fn take_off(&self, direction: Direction, thrust: u16) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Disconnected);
        }
        self.requests
            .send(FlightRequest::new(direction, thrust))
            .map_err(|_| Error::Disconnected)
    }

    /// Fly a thrust ramp now, without waiting for telemetry
    pub async fn fly(&self, request: FlightRequest) -> Result<Vec<u16>> {
        self.exclusive(flight::fly_thrust_ramp(
            &*self.vehicle,
            &request,
            &self.config.ramp,
        ))
        .await
    }

    /// Fly the configured waypoint sequence, then stop the motors
    pub async fn run_sequence(&self) -> Result<()> {
        self.exclusive(flight::fly_sequence(
            &*self.vehicle,
            &self.config.sequence,
            self.config.setpoints_per_waypoint,
            self.config.setpoint_period(),
        ))
        .await
    }

    /// Take off with a world frame velocity setpoint
    pub async fn climb(&self) -> Result<()> {
        self.exclusive(flight::climb(
            &*self.vehicle,
            self.config.climb_velocity,
            self.config.climb_duration(),
        ))
        .await
    }

    /// True while a flight is running
    pub fn is_flying(&self) -> bool {
        self.shared.flying.load(Acquire)
    }

    async fn exclusive<T>(
        &self,
        flight: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        if !self.is_connected() {
            return Err(Error::Disconnected);
        }
        let _claim = self.shared.try_claim_flight().ok_or(Error::Busy)?;
        flight.await
    }

    /// Disconnect now
    pub async fn disconnect(&self) {
        self.shared.disconnect_requested.store(true, Release);
        self.stop_logging().await;
        self.vehicle.disconnect().await;
        self.wait_disconnected().await;
    }

    /// Stop logging and disconnect after `delay`, without waiting
    pub fn disconnect_after(&self, delay: Duration) -> JoinHandle<()> {
        let vehicle = self.vehicle.clone();
        let shared = self.shared.clone();
        let telemetry = self.telemetry.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            shared.disconnect_requested.store(true, Release);
            stop_telemetry(&telemetry).await;
            vehicle.disconnect().await;
        })
    }

    /// Disconnect after the configured delay, without waiting
    pub fn schedule_disconnect(&self) -> JoinHandle<()> {
        self.disconnect_after(self.config.disconnect_delay())
    }

    pub fn is_connected(&self) -> bool {
        self.disconnected.borrow().is_none()
    }

    /// How the link was closed, `None` while connected
    pub fn disconnection(&self) -> Option<Disconnection> {
        self.disconnected.borrow().clone()
    }

    /// Wait until the link is closed, whatever the reason
    pub async fn wait_disconnected(&self) {
        let mut disconnected = self.disconnected.clone();
        let _ = disconnected.wait_for(|d| d.is_some()).await;
    }
}

impl<V: Vehicle + 'static> Drop for Pilot<V> {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

enum Event {
    Frame(Result<TelemetryFrame>),
    Stop,
}

async fn telemetry_loop<V: Vehicle + 'static>(
    mut stream: Box<dyn TelemetryStream>,
    block: String,
    shared: Arc<Shared>,
    vehicle: Arc<V>,
    pending: flume::Receiver<FlightRequest>,
    ramp: RampProfile,
    stop: flume::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            frame = stream.next_frame() => Event::Frame(frame),
            _ = stop.recv_async() => Event::Stop,
        };

        match event {
            Event::Frame(Ok(frame)) => {
                shared.publish(&frame);
                dispatch_flight(&shared, &vehicle, &pending, ramp);
            }
            Event::Frame(Err(e)) => {
                if shared.disconnect_requested.load(Acquire) {
                    log::debug!("Logging {} ended: {}", block, e);
                } else {
                    log::error!("Error when logging {}: {}", block, e);
                }
                return;
            }
            Event::Stop => {
                if let Err(e) = stream.stop().await {
                    log::warn!("Could not stop log block {}: {}", block, e);
                }
                return;
            }
        }
    }
}

fn dispatch_flight<V: Vehicle + 'static>(
    shared: &Arc<Shared>,
    vehicle: &Arc<V>,
    pending: &flume::Receiver<FlightRequest>,
    ramp: RampProfile,
) {
    if pending.is_empty() {
        return;
    }
    let claim = match shared.try_claim_flight() {
        Some(claim) => claim,
        None => return,
    };
    let request = match pending.try_recv() {
        Ok(request) => request,
        Err(_) => return,
    };

    let vehicle = vehicle.clone();
    tokio::spawn(async move {
        let _claim = claim;
        if let Err(e) = flight::fly_thrust_ramp(&*vehicle, &request, &ramp).await {
            log::error!("Flight {} aborted: {}", request.direction, e);
        }
    });
}

/// Read `count` frames of `block` synchronously
///
/// The block is started, read `count` times and stopped. `on_frame` is called with each frame as it arrives.
pub async fn read_frames<V>(
    vehicle: &V,
    block: &LogConfig,
    count: usize,
    mut on_frame: impl FnMut(&TelemetryFrame),
) -> Result<Vec<TelemetryFrame>>
where
    V: Vehicle + ?Sized,
{
    let mut stream = vehicle.start_telemetry(block).await?;
    let mut frames = Vec::with_capacity(count);

    for _ in 0..count {
        let frame = stream.next_frame().await?;
        on_frame(&frame);
        frames.push(frame);
    }

    stream.stop().await?;
    Ok(frames)
}
