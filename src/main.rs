//! Swarm Survivor headless runner
//!
//! Plays one run with a simple autopilot and prints the result.
//!
//! Usage: `swarm-survivor [settings.json] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::Context;
    use glam::Vec2;

    use swarm_survivor::consts::TICK_MS;
    use swarm_survivor::sim::{GameEvent, GameState};
    use swarm_survivor::{MemoryLedger, Settings, Simulation, Tuning};

    /// Give up after this much simulated time
    const TIME_LIMIT_MS: u64 = 5 * 60 * 1000;
    /// Wall-clock frame the runner pretends to render at
    const FRAME_MS: f32 = 1000.0 / 30.0;

    pub fn run() -> anyhow::Result<()> {
        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => Settings::load(&path).with_context(|| format!("loading settings {path}"))?,
            None => Settings::default(),
        };
        let tuning = match args.next() {
            Some(path) => Tuning::load(&path).with_context(|| format!("loading tuning {path}"))?,
            None => Tuning::default(),
        };

        let ledger = Rc::new(RefCell::new(MemoryLedger::new()));
        let mut sim = Simulation::new(settings, tuning, Rc::clone(&ledger))?;

        let level_ups = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&level_ups);
        sim.subscribe(move |event| match event {
            GameEvent::LevelUp { level } => {
                *counter.borrow_mut() += 1;
                log::info!("Reached level {level}");
            }
            GameEvent::GameOver { .. } => {}
            other => log::trace!("{other:?}"),
        });

        sim.start();
        let mut frame = 0u64;
        while !sim.state().is_over() && sim.state().elapsed_ms() < TIME_LIMIT_MS {
            let target = autopilot(sim.state(), frame);
            sim.set_target_position(target.x, target.y);
            if should_dash(sim.state()) {
                sim.dash();
            }
            sim.advance(FRAME_MS);
            frame += 1;
        }

        let state = sim.state();
        println!("Seed:      {}", state.seed);
        println!("Survived:  {:.1}s", state.elapsed_ms() as f32 / 1000.0);
        println!("Score:     {}", state.score);
        println!("Kills:     {}", state.kills);
        println!("Level:     {} ({} level-ups)", state.player.stats.level, level_ups.borrow());
        println!("Combo:     {}", state.combo.best);
        println!("Shards:    {}", ledger.borrow().currency);
        log::debug!("Ran {frame} frames ({:.0} ms each, tick {TICK_MS:.2} ms)", FRAME_MS);
        Ok(())
    }

    /// Drift away from the nearest enemy, otherwise circle the playfield center
    fn autopilot(state: &GameState, frame: u64) -> Vec2 {
        let player = state.player.pos;
        let nearest = state
            .enemies
            .iter()
            .min_by(|a, b| a.pos.distance_squared(player).total_cmp(&b.pos.distance_squared(player)));

        match nearest {
            Some(enemy) if enemy.pos.distance(player) < 150.0 => {
                let away = (player - enemy.pos).try_normalize().unwrap_or(Vec2::Y);
                player + away * 4.0
            }
            _ => {
                let angle = frame as f32 * 0.02;
                state.bounds * 0.5 + Vec2::from_angle(angle) * (state.bounds.x * 0.25)
            }
        }
    }

    fn should_dash(state: &GameState) -> bool {
        let player = &state.player;
        state
            .enemies
            .iter()
            .any(|e| e.pos.distance(player.pos) < e.radius + player.radius + 10.0)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Swarm Survivor (headless) starting...");
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive `Simulation` directly on the web
}
