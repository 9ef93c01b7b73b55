#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session and progression state for the Holdout minigame.
//!
//! The world owns every per-player [`Session`], the persistent XP ledger,
//! and all scheduling: delayed spawns, the wave-advance delay, the spawn
//! settle window, and the liveness sweep cadence are countdowns advanced
//! exclusively by [`Command::Tick`]. Expired countdowns re-check that the
//! owning session is still active before emitting anything, so a timer can
//! never outlive its owner.

use std::collections::HashMap;
use std::time::Duration;

use holdout_core::{
    Command, EndReason, EntityId, Event, GameConfig, PlayerId, SessionSummary, StartError,
    TimingConfig, XpConfig,
};
use holdout_system_xp_curve as xp_curve;

/// Per-player record of an in-progress minigame run.
///
/// Exactly one session exists per player at a time; terminated sessions
/// are removed from the store, never retained.
#[derive(Debug)]
struct Session {
    player: PlayerId,
    wave: u32,
    kills: u32,
    active: bool,
    enemies: Vec<EntityId>,
    vehicles: Vec<EntityId>,
    civilians: Vec<EntityId>,
    elapsed: Duration,
    /// Set while a wave spawn is pending or settling; serializes the
    /// spawn phase against the liveness sweep.
    spawning_wave: bool,
    /// Set between wave completion and the next spawn; guarantees the
    /// advance fires at most once per emptying of `enemies`.
    next_wave_scheduled: bool,
    shield_active: bool,
    wave_spawn_in: Option<Duration>,
    settle_in: Option<Duration>,
    vehicle_in: Option<Duration>,
    civilian_in: Option<Duration>,
    sweep_accumulator: Duration,
}

impl Session {
    fn new(player: PlayerId, first_wave_delay: Duration) -> Self {
        Self {
            player,
            wave: 1,
            kills: 0,
            active: true,
            enemies: Vec::new(),
            vehicles: Vec::new(),
            civilians: Vec::new(),
            elapsed: Duration::ZERO,
            spawning_wave: false,
            next_wave_scheduled: false,
            shield_active: true,
            wave_spawn_in: Some(first_wave_delay),
            settle_in: None,
            vehicle_in: None,
            civilian_in: None,
            sweep_accumulator: Duration::ZERO,
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            wave_reached: self.wave,
            kills: self.kills,
            elapsed: self.elapsed,
        }
    }
}

/// Keyed collection of active sessions.
#[derive(Debug, Default)]
struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    fn create(
        &mut self,
        player: PlayerId,
        first_wave_delay: Duration,
    ) -> Result<&mut Session, StartError> {
        if self.index_of(player).is_some() {
            return Err(StartError::AlreadyActive);
        }
        self.sessions.push(Session::new(player, first_wave_delay));
        Ok(self.sessions.last_mut().expect("session just pushed"))
    }

    fn get_mut(&mut self, player: PlayerId) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|session| session.player == player)
    }

    /// Removes the player's session; safe to call when absent.
    fn remove(&mut self, player: PlayerId) -> Option<Session> {
        self.index_of(player)
            .map(|index| self.sessions.remove(index))
    }

    fn index_of(&self, player: PlayerId) -> Option<usize> {
        self.sessions
            .iter()
            .position(|session| session.player == player)
    }

    fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.iter_mut()
    }
}

/// Persisted XP record for a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct XpRecord {
    xp: u64,
    level: u32,
}

impl XpRecord {
    const fn fresh() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// Represents the authoritative Holdout world state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    sessions: SessionStore,
    ledger: HashMap<PlayerId, XpRecord>,
    next_entity: u32,
}

impl World {
    /// Creates a new world governed by the provided configuration.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            sessions: SessionStore::default(),
            ledger: HashMap::new(),
            next_entity: 0,
        }
    }

    fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn record(&mut self, player: PlayerId) -> XpRecord {
        *self.ledger.entry(player).or_insert_with(XpRecord::fresh)
    }

    fn award_xp(&mut self, player: PlayerId, delta: i64, out_events: &mut Vec<Event>) {
        let xp_config = self.config.xp;
        let previous = self.record(player);
        let new_xp = if delta >= 0 {
            previous.xp.saturating_add(delta as u64)
        } else {
            previous.xp.saturating_sub(delta.unsigned_abs())
        };
        let new_level = xp_curve::level_from_xp(&xp_config, new_xp);
        let _ = self.ledger.insert(
            player,
            XpRecord {
                xp: new_xp,
                level: new_level,
            },
        );
        out_events.push(Event::XpChanged {
            player,
            xp: new_xp,
            level: new_level,
        });
        if new_level > previous.level {
            out_events.push(Event::LeveledUp {
                player,
                level: new_level,
                previous: previous.level,
            });
        }
    }

    fn end_session(&mut self, player: PlayerId, reason: EndReason, out_events: &mut Vec<Event>) {
        let Some(mut session) = self.sessions.remove(player) else {
            return;
        };
        session.active = false;
        for entity in session
            .enemies
            .iter()
            .chain(session.vehicles.iter())
            .chain(session.civilians.iter())
        {
            out_events.push(Event::EntityRemoved {
                player,
                entity: *entity,
            });
        }
        out_events.push(Event::SessionEnded {
            player,
            reason,
            summary: session.summary(),
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlayerConnected { player } => {
            let record = world.record(player);
            out_events.push(Event::XpChanged {
                player,
                xp: record.xp,
                level: record.level,
            });
        }
        Command::StartSession { player } => {
            let record = world.record(player);
            let first_wave_delay = world.config.timing.first_wave_delay();
            match world.sessions.create(player, first_wave_delay) {
                Ok(_) => {
                    let loadout = world.config.loadout_for_level(record.level);
                    out_events.push(Event::SessionStarted {
                        player,
                        level: record.level,
                        loadout,
                    });
                }
                Err(reason) => out_events.push(Event::StartRejected { player, reason }),
            }
        }
        Command::StopSession { player } => {
            world.end_session(player, EndReason::Stopped, out_events);
        }
        Command::Tick { dt } => {
            let timing = world.config.timing;
            for session in world.sessions.iter_mut() {
                advance_session_clock(session, dt, &timing, out_events);
            }
        }
        Command::EnemyKilled { player, enemy } => {
            handle_enemy_down(world, player, enemy, true, out_events);
        }
        Command::EnemyDiscarded { player, enemy } => {
            handle_enemy_down(world, player, enemy, false, out_events);
        }
        Command::CivilianKilled { player, civilian } => {
            handle_civilian_down(world, player, civilian, out_events);
        }
        Command::PlayerDied { player } => {
            world.end_session(player, EndReason::PlayerDied, out_events);
        }
        Command::PlayerDisconnected { player } => {
            world.end_session(player, EndReason::Disconnected, out_events);
        }
        Command::GrantXp { player, amount } => {
            world.award_xp(player, amount, out_events);
        }
        Command::ResetProgress { player } => {
            let _ = world.ledger.insert(player, XpRecord::fresh());
            out_events.push(Event::XpChanged {
                player,
                xp: 0,
                level: 1,
            });
        }
        Command::SpawnEnemies { player, spawns } => {
            register_wave_spawns(world, player, spawns, out_events);
        }
        Command::SpawnVehicle {
            player,
            position,
            heading,
            occupants,
        } => {
            register_vehicle_spawn(world, player, position, heading, occupants, out_events);
        }
        Command::SpawnCivilians { player, spawns } => {
            register_civilian_spawns(world, player, spawns, out_events);
        }
    }
}

/// Advances one session's countdowns; expired countdowns re-check
/// `active` before emitting.
fn advance_session_clock(
    session: &mut Session,
    dt: Duration,
    timing: &TimingConfig,
    out_events: &mut Vec<Event>,
) {
    if !session.active {
        return;
    }
    session.elapsed = session.elapsed.saturating_add(dt);

    if countdown_expired(&mut session.wave_spawn_in, dt) {
        session.spawning_wave = true;
        session.next_wave_scheduled = false;
        out_events.push(Event::WaveSpawnDue {
            player: session.player,
            wave: session.wave,
        });
    }
    if countdown_expired(&mut session.settle_in, dt) {
        session.spawning_wave = false;
    }
    if countdown_expired(&mut session.vehicle_in, dt) {
        out_events.push(Event::VehicleSpawnDue {
            player: session.player,
            wave: session.wave,
        });
    }
    if countdown_expired(&mut session.civilian_in, dt) {
        out_events.push(Event::CivilianSpawnDue {
            player: session.player,
            wave: session.wave,
        });
    }

    session.sweep_accumulator = session.sweep_accumulator.saturating_add(dt);
    let interval = timing.sweep_interval();
    if !interval.is_zero() && session.sweep_accumulator >= interval {
        while session.sweep_accumulator >= interval {
            session.sweep_accumulator -= interval;
        }
        out_events.push(Event::SweepDue {
            player: session.player,
        });
    }
}

/// Decrements a one-shot countdown, reporting whether it expired this tick.
fn countdown_expired(slot: &mut Option<Duration>, dt: Duration) -> bool {
    match slot {
        Some(remaining) if *remaining <= dt => {
            *slot = None;
            true
        }
        Some(remaining) => {
            *remaining -= dt;
            false
        }
        None => false,
    }
}

fn register_wave_spawns(
    world: &mut World,
    player: PlayerId,
    spawns: Vec<holdout_core::EnemySpawn>,
    out_events: &mut Vec<Event>,
) {
    if world
        .sessions
        .get_mut(player)
        .map_or(true, |session| !session.active)
    {
        return;
    }

    let mut allocated = Vec::with_capacity(spawns.len());
    for spawn in &spawns {
        allocated.push((world.allocate_entity(), *spawn));
    }

    let timing = world.config.timing;
    let waves = world.config.waves;
    let Some(session) = world.sessions.get_mut(player) else {
        return;
    };
    let wave = session.wave;
    let enemy_count = allocated.len() as u32;

    // Track every handle before emitting any spawn notification so a
    // death check can never observe a spawned-but-untracked enemy.
    for (enemy, _) in &allocated {
        session.enemies.push(*enemy);
    }
    session.settle_in = Some(timing.spawn_settle_delay());
    if waves.vehicle_wave_interval > 0 && wave % waves.vehicle_wave_interval == 0 {
        session.vehicle_in = Some(timing.vehicle_stagger(enemy_count));
    }
    if wave >= waves.civilian_wave_start {
        session.civilian_in = Some(timing.civilian_stagger(enemy_count));
    }

    out_events.push(Event::WaveSpawned {
        player,
        wave,
        enemy_count,
    });
    for (enemy, spawn) in allocated {
        out_events.push(Event::EnemySpawned {
            player,
            enemy,
            position: spawn.position,
            health: spawn.health,
            armour: spawn.armour,
            weapon: spawn.weapon,
        });
    }
}

fn register_vehicle_spawn(
    world: &mut World,
    player: PlayerId,
    position: holdout_core::WorldPoint,
    heading: f32,
    occupants: Vec<holdout_core::EnemySpawn>,
    out_events: &mut Vec<Event>,
) {
    if world
        .sessions
        .get_mut(player)
        .map_or(true, |session| !session.active)
    {
        return;
    }

    let vehicle = world.allocate_entity();
    let mut seated = Vec::with_capacity(occupants.len());
    for occupant in &occupants {
        seated.push((world.allocate_entity(), *occupant));
    }

    let Some(session) = world.sessions.get_mut(player) else {
        return;
    };
    session.vehicles.push(vehicle);
    for (enemy, _) in &seated {
        session.enemies.push(*enemy);
    }

    let occupant_ids: Vec<EntityId> = seated.iter().map(|(enemy, _)| *enemy).collect();
    out_events.push(Event::VehicleSpawned {
        player,
        vehicle,
        position,
        heading,
        occupants: occupant_ids,
    });
    for (enemy, spawn) in seated {
        out_events.push(Event::EnemySpawned {
            player,
            enemy,
            position: spawn.position,
            health: spawn.health,
            armour: spawn.armour,
            weapon: spawn.weapon,
        });
    }
}

fn register_civilian_spawns(
    world: &mut World,
    player: PlayerId,
    spawns: Vec<holdout_core::CivilianSpawn>,
    out_events: &mut Vec<Event>,
) {
    if world
        .sessions
        .get_mut(player)
        .map_or(true, |session| !session.active)
    {
        return;
    }

    let mut allocated = Vec::with_capacity(spawns.len());
    for spawn in &spawns {
        allocated.push((world.allocate_entity(), *spawn));
    }

    let Some(session) = world.sessions.get_mut(player) else {
        return;
    };
    for (civilian, _) in &allocated {
        session.civilians.push(*civilian);
    }
    for (civilian, spawn) in allocated {
        out_events.push(Event::CivilianSpawned {
            player,
            civilian,
            position: spawn.position,
        });
    }
}

/// Shared bookkeeping for both kill-detection paths.
///
/// `credited` distinguishes a detected death (kill credit plus XP) from a
/// vanished handle (dropped silently). Unknown handles are no-ops, which
/// makes duplicate or late notifications harmless.
fn handle_enemy_down(
    world: &mut World,
    player: PlayerId,
    enemy: EntityId,
    credited: bool,
    out_events: &mut Vec<Event>,
) {
    let xp_config = world.config.xp;
    let timing = world.config.timing;

    let outcome = {
        let Some(session) = world.sessions.get_mut(player) else {
            return;
        };
        if !session.active {
            return;
        }
        let Some(index) = session.enemies.iter().position(|handle| *handle == enemy) else {
            return;
        };
        let _ = session.enemies.remove(index);

        if credited {
            session.kills += 1;
            if session.shield_active {
                session.shield_active = false;
                out_events.push(Event::ShieldExpired { player });
            }
            let reward = kill_reward(&xp_config, session.wave);
            out_events.push(Event::EnemyDown {
                player,
                enemy,
                xp_reward: reward,
                kills: session.kills,
                remaining: session.enemies.len() as u32,
            });
            Some(reward)
        } else {
            out_events.push(Event::EnemyVanished { player, enemy });
            None
        }
    };

    if let Some(reward) = outcome {
        world.award_xp(player, reward as i64, out_events);
    }

    if let Some(session) = world.sessions.get_mut(player) {
        if session.enemies.is_empty() {
            maybe_advance_wave(session, &timing, out_events);
        }
    }
}

/// XP reward for a kill on the provided wave.
fn kill_reward(config: &XpConfig, wave: u32) -> u64 {
    let multiplier = config.xp_multiplier_per_wave.powi(wave as i32 - 1);
    (f64::from(config.xp_per_kill) * multiplier) as u64
}

/// Schedules the next wave after the enemy collection empties.
///
/// `next_wave_scheduled` guarantees at most one advance per emptying
/// event, no matter how many detection paths observe it. Spawn batches
/// register atomically, so an empty collection here always means a
/// genuinely cleared wave, never a wave whose trackers are mid-fill.
fn maybe_advance_wave(session: &mut Session, timing: &TimingConfig, out_events: &mut Vec<Event>) {
    if !session.active || session.next_wave_scheduled {
        return;
    }
    session.next_wave_scheduled = true;
    let cleared = session.wave;
    session.wave += 1;
    let delay = timing.wave_advance_delay();
    session.wave_spawn_in = Some(delay);
    out_events.push(Event::WaveCleared {
        player: session.player,
        wave: cleared,
        next_wave_in: delay,
    });
}

fn handle_civilian_down(
    world: &mut World,
    player: PlayerId,
    civilian: EntityId,
    out_events: &mut Vec<Event>,
) {
    let xp_config = world.config.xp;

    {
        let Some(session) = world.sessions.get_mut(player) else {
            return;
        };
        if !session.active {
            return;
        }
        let Some(index) = session
            .civilians
            .iter()
            .position(|handle| *handle == civilian)
        else {
            return;
        };
        let _ = session.civilians.remove(index);
    }

    // Cap the penalty at the XP earned past the current level's floor so
    // a civilian kill can never lower the level the player already holds.
    let record = world.record(player);
    let floor = xp_curve::total_xp_for_level(&xp_config, record.level);
    let earned_past_floor = record.xp.saturating_sub(floor);
    let penalty = xp_config.xp_loss_per_civilian.min(earned_past_floor);

    out_events.push(Event::CivilianCasualty {
        player,
        civilian,
        xp_penalty: penalty,
    });
    if penalty > 0 {
        world.award_xp(player, -(penalty as i64), out_events);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use holdout_core::{GameConfig, PlayerId, SessionSnapshot};
    use holdout_system_xp_curve::{self as xp_curve, XpProgress};

    use super::World;

    /// Provides read-only access to the world's configuration.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Captures a snapshot of the player's session, if one is active.
    #[must_use]
    pub fn session_snapshot(world: &World, player: PlayerId) -> Option<SessionSnapshot> {
        world
            .sessions
            .iter()
            .find(|session| session.player == player)
            .map(snapshot_of)
    }

    /// Captures snapshots of every active session in creation order.
    #[must_use]
    pub fn session_snapshots(world: &World) -> Vec<SessionSnapshot> {
        world.sessions.iter().map(snapshot_of).collect()
    }

    /// Reports the player's XP progress; absent records read as fresh.
    #[must_use]
    pub fn xp_progress(world: &World, player: PlayerId) -> XpProgress {
        let xp = world
            .ledger
            .get(&player)
            .map_or(0, |record| record.xp);
        xp_curve::progress(&world.config.xp, xp)
    }

    fn snapshot_of(session: &super::Session) -> SessionSnapshot {
        SessionSnapshot {
            player: session.player,
            wave: session.wave,
            kills: session.kills,
            active: session.active,
            spawning_wave: session.spawning_wave,
            enemies: session.enemies.clone(),
            vehicles: session.vehicles.clone(),
            civilians: session.civilians.clone(),
        }
    }
}
