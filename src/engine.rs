//! Host-facing control surface
//!
//! `Simulation` owns the game state and everything a tick needs, converts
//! wall-clock time into fixed ticks, buffers input between ticks and fans
//! the resulting events out to listeners.

use std::sync::mpsc;

use glam::Vec2;

use crate::consts::TICK_MS;
use crate::error::ConfigError;
use crate::settings::Settings;
use crate::sim::{
    EventBus, GameEvent, GamePhase, GameState, ListenerId, Snapshot, TickContext, TickInput, tick,
};
use crate::tuning::Tuning;
use crate::upgrades::{Modifiers, UpgradeLedger};

pub struct Simulation {
    state: GameState,
    settings: Settings,
    tuning: Tuning,
    ledger: Box<dyn UpgradeLedger>,
    bus: EventBus,
    /// Input waiting for the next tick
    input: TickInput,
    accumulator_ms: f32,
    /// Events of the most recent tick
    events: Vec<GameEvent>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("phase", &self.state.phase)
            .field("time_ticks", &self.state.time_ticks)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validate the configuration and build a fresh (not yet started) run
    pub fn new(
        settings: Settings,
        tuning: Tuning,
        ledger: impl UpgradeLedger + 'static,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        tuning.validate()?;
        let mods = Modifiers::from_ledger(&ledger);
        let state = GameState::new(&settings, &tuning, &mods);
        Ok(Self {
            state,
            settings,
            tuning,
            ledger: Box::new(ledger),
            bus: EventBus::new(),
            input: TickInput::default(),
            accumulator_ms: 0.0,
            events: Vec::new(),
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Direct read access to the live state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy of the current state for renderers
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.state)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn ledger(&self) -> &dyn UpgradeLedger {
        self.ledger.as_ref()
    }

    /// Events produced by the most recent tick
    pub fn last_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn start(&mut self) {
        if self.state.phase == GamePhase::Ready {
            log::info!("Run started (seed {})", self.state.seed);
            self.state.phase = GamePhase::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.state.phase == GamePhase::Running {
            log::info!("Paused at tick {}", self.state.time_ticks);
            self.state.phase = GamePhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == GamePhase::Paused {
            log::info!("Resumed at tick {}", self.state.time_ticks);
            self.state.phase = GamePhase::Running;
        }
    }

    /// Reinitialize everything for a new run (phase `Ready`)
    pub fn reset(&mut self) {
        let mods = Modifiers::from_ledger(self.ledger.as_ref());
        self.state = GameState::new(&self.settings, &self.tuning, &mods);
        self.input = TickInput::default();
        self.accumulator_ms = 0.0;
        self.events.clear();
        log::info!("Simulation reset");
    }

    /// Move the player to a pointer position at the next tick
    pub fn set_target_position(&mut self, x: f32, y: f32) {
        self.input.target = Some(Vec2::new(x, y));
    }

    /// Request a dash at the next tick
    pub fn dash(&mut self) {
        self.input.dash = true;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_channel(&mut self) -> (ListenerId, mpsc::Receiver<GameEvent>) {
        self.bus.subscribe_channel()
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Feed elapsed wall time and run every whole tick it covers.
    ///
    /// At most `max_substeps` ticks run per call; time beyond that is
    /// dropped. Returns the number of ticks run.
    pub fn advance(&mut self, dt_ms: f32) -> u32 {
        if self.state.phase != GamePhase::Running {
            return 0;
        }

        let max_steps = self.settings.max_substeps;
        self.accumulator_ms += dt_ms.clamp(0.0, TICK_MS * max_steps as f32);
        let due = ((self.accumulator_ms / TICK_MS).floor() as u32).min(max_steps);

        let mut substeps = 0;
        while substeps < due {
            self.run_tick();
            substeps += 1;

            if self.state.phase != GamePhase::Running {
                self.accumulator_ms = 0.0;
                return substeps;
            }
        }
        self.accumulator_ms = (self.accumulator_ms - due as f32 * TICK_MS).max(0.0);
        substeps
    }

    /// Run exactly one tick (if running). Returns the tick's events.
    pub fn step(&mut self) -> &[GameEvent] {
        if self.state.phase == GamePhase::Running {
            self.run_tick();
        } else {
            self.events.clear();
        }
        &self.events
    }

    fn run_tick(&mut self) {
        let mods = Modifiers::from_ledger(self.ledger.as_ref());
        self.events.clear();
        let input = std::mem::take(&mut self.input);
        let mut ctx = TickContext {
            tuning: &self.tuning,
            hit_policy: self.settings.hit_policy,
            mods,
            ledger: self.ledger.as_mut(),
            events: &mut self.events,
        };
        tick(&mut self.state, &input, &mut ctx);
        self.bus.dispatch(&self.events);
    }
}
