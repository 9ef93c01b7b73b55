#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Host-engine adapter boundary.
//!
//! The world never talks to a game engine directly; it emits events and
//! reads back an [`EntityStatusView`] built through the [`EntityProbe`]
//! trait. [`SimulatedEngine`] is the in-process implementation used by the
//! CLI harness and integration tests: it materializes entities from spawn
//! events, lets callers inflict damage, and destroys entities on removal
//! events, mimicking the lifecycle a real host would drive.

use std::collections::BTreeMap;

use holdout_core::{EntityId, EntityStatus, EntityStatusView, Event, WorldPoint};

/// Read access to live entity state owned by the host engine.
pub trait EntityProbe {
    /// Status of a single entity, if the engine knows the handle.
    fn status_of(&self, entity: EntityId) -> Option<EntityStatus>;

    /// Point-in-time view over every entity the engine tracks.
    fn status_view(&self) -> EntityStatusView;
}

/// What a simulated entity represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEntityKind {
    /// Hostile combatant.
    Enemy,
    /// Hostile vehicle shell.
    Vehicle,
    /// Neutral bystander.
    Civilian,
}

#[derive(Clone, Copy, Debug)]
struct SimEntity {
    kind: SimEntityKind,
    position: WorldPoint,
    health: u32,
    max_health: u32,
    valid: bool,
}

/// In-process stand-in for a host game engine.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    entities: BTreeMap<EntityId, SimEntity>,
}

impl SimulatedEngine {
    /// Creates an engine with no entities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a batch of world events to the simulated entity set.
    ///
    /// Spawn confirmations materialize entities; removal instructions and
    /// down reports destroy them. Unknown handles are ignored so replayed
    /// or duplicated events stay harmless.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemySpawned {
                    enemy,
                    position,
                    health,
                    ..
                } => self.materialize(*enemy, SimEntityKind::Enemy, *position, *health),
                Event::VehicleSpawned {
                    vehicle, position, ..
                } => self.materialize(*vehicle, SimEntityKind::Vehicle, *position, 1_000),
                Event::CivilianSpawned {
                    civilian, position, ..
                } => self.materialize(*civilian, SimEntityKind::Civilian, *position, 200),
                Event::EnemyDown { enemy, .. } => self.destroy(*enemy),
                Event::EnemyVanished { enemy, .. } => self.destroy(*enemy),
                Event::CivilianCasualty { civilian, .. } => self.destroy(*civilian),
                Event::EntityRemoved { entity, .. } => self.destroy(*entity),
                _ => {}
            }
        }
    }

    fn materialize(&mut self, entity: EntityId, kind: SimEntityKind, position: WorldPoint, health: u32) {
        let _ = self.entities.insert(
            entity,
            SimEntity {
                kind,
                position,
                health,
                max_health: health,
                valid: true,
            },
        );
    }

    /// Destroys an entity, dropping it from the tracked set.
    pub fn destroy(&mut self, entity: EntityId) {
        let _ = self.entities.remove(&entity);
    }

    /// Subtracts health from an entity, clamping at zero.
    pub fn damage(&mut self, entity: EntityId, amount: u32) {
        if let Some(sim) = self.entities.get_mut(&entity) {
            sim.health = sim.health.saturating_sub(amount);
        }
    }

    /// Drops an entity's health straight to zero.
    pub fn kill(&mut self, entity: EntityId) {
        if let Some(sim) = self.entities.get_mut(&entity) {
            sim.health = 0;
        }
    }

    /// Marks an entity invalid without removing it, as a despawned but
    /// not-yet-collected native object would appear.
    pub fn invalidate(&mut self, entity: EntityId) {
        if let Some(sim) = self.entities.get_mut(&entity) {
            sim.valid = false;
        }
    }

    /// Kind recorded for an entity, if tracked.
    #[must_use]
    pub fn kind_of(&self, entity: EntityId) -> Option<SimEntityKind> {
        self.entities.get(&entity).map(|sim| sim.kind)
    }

    /// Position recorded for an entity, if tracked.
    #[must_use]
    pub fn position_of(&self, entity: EntityId) -> Option<WorldPoint> {
        self.entities.get(&entity).map(|sim| sim.position)
    }

    /// Number of entities currently tracked.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Handles of every tracked entity of the given kind, in handle order.
    pub fn entities_of_kind(&self, kind: SimEntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(move |(_, sim)| sim.kind == kind)
            .map(|(entity, _)| *entity)
    }
}

impl EntityProbe for SimulatedEngine {
    fn status_of(&self, entity: EntityId) -> Option<EntityStatus> {
        self.entities.get(&entity).map(|sim| EntityStatus {
            entity,
            valid: sim.valid,
            max_health: sim.max_health,
            health: sim.health,
        })
    }

    fn status_view(&self) -> EntityStatusView {
        EntityStatusView::from_snapshots(
            self.entities
                .iter()
                .map(|(entity, sim)| EntityStatus {
                    entity: *entity,
                    valid: sim.valid,
                    max_health: sim.max_health,
                    health: sim.health,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityProbe, SimEntityKind, SimulatedEngine};
    use holdout_core::{EntityId, Event, PlayerId, WeaponId, WorldPoint};

    const PLAYER: PlayerId = PlayerId::new(1);

    fn spawn_event(entity: u32, health: u32) -> Event {
        Event::EnemySpawned {
            player: PLAYER,
            enemy: EntityId::new(entity),
            position: WorldPoint::new(10.0, 0.0, 0.0),
            health,
            armour: 10,
            weapon: WeaponId::new(0x1234),
        }
    }

    #[test]
    fn spawn_events_materialize_entities_at_full_health() {
        let mut engine = SimulatedEngine::new();
        engine.observe(&[spawn_event(1, 200)]);
        let status = engine.status_of(EntityId::new(1)).expect("status");
        assert!(status.valid);
        assert_eq!(status.max_health, 200);
        assert_eq!(status.health, 200);
        assert_eq!(engine.kind_of(EntityId::new(1)), Some(SimEntityKind::Enemy));
    }

    #[test]
    fn damage_clamps_at_zero_and_shows_in_the_view() {
        let mut engine = SimulatedEngine::new();
        engine.observe(&[spawn_event(1, 200)]);
        engine.damage(EntityId::new(1), 500);
        let view = engine.status_view();
        let status = view.status_of(EntityId::new(1)).expect("status");
        assert_eq!(status.health, 0);
        assert_eq!(status.max_health, 200);
    }

    #[test]
    fn removal_events_destroy_entities() {
        let mut engine = SimulatedEngine::new();
        engine.observe(&[spawn_event(1, 200), spawn_event(2, 200)]);
        engine.observe(&[Event::EntityRemoved {
            player: PLAYER,
            entity: EntityId::new(2),
        }]);
        assert_eq!(engine.entity_count(), 1);
        assert!(engine.status_of(EntityId::new(2)).is_none());
    }

    #[test]
    fn invalidated_entities_stay_visible_but_invalid() {
        let mut engine = SimulatedEngine::new();
        engine.observe(&[spawn_event(1, 200)]);
        engine.invalidate(EntityId::new(1));
        let status = engine.status_of(EntityId::new(1)).expect("status");
        assert!(!status.valid);
    }

    #[test]
    fn duplicate_destroy_observations_are_harmless() {
        let mut engine = SimulatedEngine::new();
        engine.observe(&[spawn_event(1, 200)]);
        let down = Event::EnemyDown {
            player: PLAYER,
            enemy: EntityId::new(1),
            xp_reward: 10,
            kills: 1,
            remaining: 0,
        };
        engine.observe(&[down.clone()]);
        engine.observe(&[down]);
        assert_eq!(engine.entity_count(), 0);
    }
}
