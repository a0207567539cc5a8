//! Simulation engine - tick clock and control channel
//!
//! The engine owns the [`SimulationState`] outright and runs as one task:
//! periodic ticks and inbound control events are handled one at a time on
//! the same sequential context, so no lock guards the processes.
//!
//! Observers subscribe to a broadcast channel. Every observer has its own
//! bounded buffer; a slow observer lags and drops old readings instead of
//! stalling the clock or anyone else.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::core::config::{SimulatorConfig, MAX_BROADCAST_CAPACITY, MAX_TICK_MS};
use crate::core::error::{Result, SimError};
use crate::core::types::now_millis;
use crate::simulation::events::{ControlEvent, ServerMessage, StatusReport, TemperatureControl};
use crate::simulation::state::{ProcessReadings, SimulationState};

/// Whether the clock advances the processes on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

enum Command {
    Control(ControlEvent),
    Readings(oneshot::Sender<ProcessReadings>),
}

pub struct SimulationEngine<R = ChaCha8Rng> {
    state: SimulationState<R>,
    run_state: RunState,
    updates: broadcast::Sender<ServerMessage>,
    ticks: u64,
}

impl SimulationEngine<ChaCha8Rng> {
    pub fn from_config(config: SimulatorConfig) -> Self {
        let capacity = config.simulation.broadcast_capacity;
        Self::new(SimulationState::from_config(config), capacity)
    }
}

impl<R: Rng> SimulationEngine<R> {
    /// `capacity` is the per-observer buffer depth, in messages
    pub fn new(state: SimulationState<R>, capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.clamp(1, MAX_BROADCAST_CAPACITY));
        Self {
            state,
            run_state: RunState::Running,
            updates,
            ticks: 0,
        }
    }

    /// Register a new observer
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.updates.subscribe()
    }

    /// One clock period: advance unless paused, then publish all readings
    pub fn tick(&mut self) {
        self.ticks += 1;
        if self.run_state == RunState::Running {
            self.state.advance();
        }
        self.publish_readings();
        trace!(tick = self.ticks, paused = self.is_paused(), "Tick");
    }

    /// Apply a control event and publish the affected readings immediately
    pub fn apply(&mut self, event: ControlEvent) {
        debug!(event = event.event_name(), "Control event");
        let now = now_millis();

        match event {
            ControlEvent::Temperature(control) => {
                self.apply_temperature(control);
                let reading = self.state.temperature_reading(now);
                self.publish(ServerMessage::Temperature(reading));
            }
            ControlEvent::PressureRelease => {
                self.state.pressure.emergency_release();
                let reading = self.state.pressure_reading(now);
                self.publish(ServerMessage::Pressure(reading));
            }
            ControlEvent::ValveAdjust(position) => {
                self.state.flow.adjust_valve(position);
                let reading = self.state.flow_reading(now);
                self.publish(ServerMessage::Flow(reading));
            }
            ControlEvent::SetPaused(paused) => {
                self.run_state = if paused {
                    RunState::Paused
                } else {
                    RunState::Running
                };
                info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            ControlEvent::Reset => {
                self.state.reset();
                info!("Simulation reset");
                self.publish_readings();
            }
        }
    }

    fn apply_temperature(&mut self, control: TemperatureControl) {
        if let Some(threshold) = control.warning_threshold {
            self.state.temperature.set_warning_threshold(threshold);
        }
        if let Some(threshold) = control.critical_threshold {
            self.state.temperature.set_critical_threshold(threshold);
        }
        if let Some(enabled) = control.cooling {
            self.state.temperature.set_cooling(enabled);
        }
    }

    pub fn readings(&mut self) -> ProcessReadings {
        self.state.readings()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    /// Clock ticks handled so far, paused or not
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> &SimulationState<R> {
        &self.state
    }

    fn publish_readings(&mut self) {
        for message in self.state.readings().into_messages() {
            self.publish(message);
        }
    }

    fn publish(&self, message: ServerMessage) {
        // Only fails when nobody is subscribed
        if self.updates.send(message).is_err() {
            trace!("No observers connected");
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Control(event) => self.apply(event),
            Command::Readings(reply) => {
                let _ = reply.send(self.readings());
            }
        }
    }
}

impl<R: Rng + Send + 'static> SimulationEngine<R> {
    /// Start the clock on the current tokio runtime.
    ///
    /// The first tick fires one full period after spawning. Periods longer
    /// than [`MAX_TICK_MS`] are shortened to it.
    pub fn spawn(self, period: Duration) -> (SimulationHandle, JoinHandle<()>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = SimulationHandle {
            commands,
            updates: self.updates.clone(),
            shutdown: Arc::new(shutdown),
        };
        let task = tokio::spawn(self.run(period, command_rx, shutdown_rx));
        (handle, task)
    }

    async fn run(
        mut self,
        period: Duration,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = period.min(Duration::from_millis(MAX_TICK_MS));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_ms = period.as_millis() as u64, "Simulation clock started");

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => self.tick(),
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        info!(ticks = self.ticks, "Simulation clock stopped");
    }
}

/// Cloneable handle to a running engine
#[derive(Clone)]
pub struct SimulationHandle {
    commands: mpsc::UnboundedSender<Command>,
    updates: broadcast::Sender<ServerMessage>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SimulationHandle {
    /// Register a new observer
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.updates.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.updates.receiver_count()
    }

    /// Queue a control event; never waits on the engine
    pub fn send(&self, event: ControlEvent) -> Result<()> {
        self.commands
            .send(Command::Control(event))
            .map_err(|_| SimError::EngineStopped)
    }

    /// Current readings of all three processes
    pub async fn readings(&self) -> Result<ProcessReadings> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Readings(reply))
            .map_err(|_| SimError::EngineStopped)?;
        response.await.map_err(|_| SimError::EngineStopped)
    }

    /// Liveness check, answered without touching the engine
    pub fn status(&self) -> StatusReport {
        StatusReport::online()
    }

    /// Stop the clock. Calling this more than once is a no-op.
    pub fn stop(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Stopping simulation");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once [`stop`](Self::stop) has been called
    pub async fn stopped(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}
