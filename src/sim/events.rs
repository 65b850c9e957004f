//! Outbound game events
//!
//! The tick appends events to a buffer; the engine hands the buffer to every
//! subscribed listener afterwards. Listeners cannot talk back to the
//! simulation, and having none is fine.

use std::sync::mpsc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Something the simulation damaged or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    Player,
    Enemy(u32),
}

/// What a collected pickup was
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Xp,
    Shard,
    PowerUp(String),
}

/// A notable occurrence within a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GameEvent {
    EntityDied {
        entity: EntityRef,
        archetype: String,
        pos: Vec2,
    },
    EntityHit {
        entity: EntityRef,
        damage: i32,
        remaining_health: i32,
    },
    PickupCollected {
        kind: PickupKind,
        id: u32,
        value: u32,
        pos: Vec2,
    },
    LevelUp {
        level: u32,
    },
    WeaponFired {
        projectile_id: u32,
        target_id: u32,
        origin: Vec2,
        direction: Vec2,
    },
    ExplosionCreated {
        id: u32,
        pos: Vec2,
    },
    GameOver {
        score: u64,
        survival_ms: u64,
        level: u32,
        kills: u32,
    },
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Fan-out dispatcher owned by the engine
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u32,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Forward every event into a channel. A dropped receiver is ignored.
    pub fn subscribe_channel(&mut self) -> (ListenerId, mpsc::Receiver<GameEvent>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Returns false if the listener was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn dispatch(&mut self, events: &[GameEvent]) {
        if self.listeners.is_empty() {
            return;
        }
        for event in events {
            log::trace!("event: {event:?}");
            for (_, listener) in &mut self.listeners {
                listener(event);
            }
        }
    }
}
