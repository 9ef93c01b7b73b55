#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Holdout minigame engine.
//!
//! This crate defines the message surface that connects the host-engine
//! adapter, the authoritative session world, and pure systems. The adapter
//! and systems submit [`Command`] values describing desired mutations, the
//! world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for systems and the adapter to react to
//! deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier assigned to a connected player by the host platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Handle referencing a spawned entity (enemy, vehicle, or civilian).
///
/// The world allocates these; the engine adapter owns the mapping from a
/// handle to the native object it shadows. The core never owns entity
/// memory, only handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque weapon identifier understood by the host engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(u32);

impl WeaponId {
    /// Creates a new weapon identifier with the provided hash value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hash of the weapon.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position in the host engine's world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// East-west coordinate.
    pub x: f32,
    /// North-south coordinate.
    pub y: f32,
    /// Elevation.
    pub z: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Announces that a player connected; initializes their XP record.
    PlayerConnected {
        /// Player whose record should exist after this command.
        player: PlayerId,
    },
    /// Requests a new minigame session for the player.
    StartSession {
        /// Player requesting the session.
        player: PlayerId,
    },
    /// Requests an explicit end to the player's session.
    StopSession {
        /// Player whose session should end.
        player: PlayerId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports that a tracked enemy died. Idempotent: unknown handles are
    /// ignored, so the explicit notification path and the liveness sweep
    /// may both report the same death safely.
    EnemyKilled {
        /// Player whose session tracked the enemy.
        player: PlayerId,
        /// Handle of the dead enemy.
        enemy: EntityId,
    },
    /// Reports that a tracked enemy handle became invalid in the host
    /// engine. The handle is dropped without kill credit but still counts
    /// toward wave completion.
    EnemyDiscarded {
        /// Player whose session tracked the enemy.
        player: PlayerId,
        /// Handle that is no longer valid.
        enemy: EntityId,
    },
    /// Reports that a tracked civilian was killed by the player.
    CivilianKilled {
        /// Player whose session tracked the civilian.
        player: PlayerId,
        /// Handle of the dead civilian.
        civilian: EntityId,
    },
    /// Reports that the player died; always terminates the session.
    PlayerDied {
        /// Player who died.
        player: PlayerId,
    },
    /// Reports that the player disconnected from the host.
    PlayerDisconnected {
        /// Player who disconnected.
        player: PlayerId,
    },
    /// Adjusts a player's XP by a signed amount (admin surface).
    GrantXp {
        /// Player receiving the adjustment.
        player: PlayerId,
        /// Signed XP delta.
        amount: i64,
    },
    /// Resets a player's XP record back to zero XP, level one.
    ResetProgress {
        /// Player whose record is reset.
        player: PlayerId,
    },
    /// Registers a batch of hostile spawns composed by the wave director.
    SpawnEnemies {
        /// Player whose session receives the enemies.
        player: PlayerId,
        /// Ordered spawn descriptions for the wave.
        spawns: Vec<EnemySpawn>,
    },
    /// Registers a hostile vehicle with its occupants.
    SpawnVehicle {
        /// Player whose session receives the vehicle.
        player: PlayerId,
        /// Spawn position of the vehicle.
        position: WorldPoint,
        /// Heading of the vehicle in radians.
        heading: f32,
        /// Hostile occupants seated in the vehicle.
        occupants: Vec<EnemySpawn>,
    },
    /// Registers a batch of neutral civilian spawns.
    SpawnCivilians {
        /// Player whose session receives the civilians.
        player: PlayerId,
        /// Spawn positions for the civilians.
        spawns: Vec<CivilianSpawn>,
    },
}

/// Description of a single hostile entity to spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    /// Position the enemy appears at.
    pub position: WorldPoint,
    /// Health and max-health assigned at spawn time.
    pub health: u32,
    /// Armour assigned at spawn time.
    pub armour: u32,
    /// Weapon placed in the enemy's hands.
    pub weapon: WeaponId,
}

/// Description of a single neutral entity to spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CivilianSpawn {
    /// Position the civilian appears at.
    pub position: WorldPoint,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a session was created for the player.
    SessionStarted {
        /// Player the session belongs to.
        player: PlayerId,
        /// Level held by the player when the session started.
        level: u32,
        /// Weapons unlocked at that level, in unlock order.
        loadout: Vec<WeaponUnlock>,
    },
    /// Reports that a start request was rejected without state change.
    StartRejected {
        /// Player whose request was rejected.
        player: PlayerId,
        /// Specific reason the request failed.
        reason: StartError,
    },
    /// Signals that the wave director should compose the next wave.
    WaveSpawnDue {
        /// Player whose session awaits the wave.
        player: PlayerId,
        /// Wave number to compose.
        wave: u32,
    },
    /// Confirms that a wave's enemies were registered with the session.
    WaveSpawned {
        /// Player whose session received the wave.
        player: PlayerId,
        /// Wave number that spawned.
        wave: u32,
        /// Number of enemies registered.
        enemy_count: u32,
    },
    /// Confirms that a single enemy was registered and should materialize.
    EnemySpawned {
        /// Player whose session tracks the enemy.
        player: PlayerId,
        /// Handle allocated to the enemy.
        enemy: EntityId,
        /// Position the enemy appears at.
        position: WorldPoint,
        /// Health assigned at spawn.
        health: u32,
        /// Armour assigned at spawn.
        armour: u32,
        /// Weapon carried by the enemy.
        weapon: WeaponId,
    },
    /// Signals that the wave director should compose a vehicle squad.
    VehicleSpawnDue {
        /// Player whose session awaits the vehicle.
        player: PlayerId,
        /// Wave the vehicle belongs to.
        wave: u32,
    },
    /// Signals that the wave director should compose civilian spawns.
    CivilianSpawnDue {
        /// Player whose session awaits the civilians.
        player: PlayerId,
        /// Wave the civilians accompany.
        wave: u32,
    },
    /// Confirms that a vehicle and its occupants were registered.
    VehicleSpawned {
        /// Player whose session tracks the vehicle.
        player: PlayerId,
        /// Handle allocated to the vehicle.
        vehicle: EntityId,
        /// Position the vehicle appears at.
        position: WorldPoint,
        /// Heading of the vehicle in radians.
        heading: f32,
        /// Handles allocated to the hostile occupants.
        occupants: Vec<EntityId>,
    },
    /// Confirms that a single civilian was registered.
    CivilianSpawned {
        /// Player whose session tracks the civilian.
        player: PlayerId,
        /// Handle allocated to the civilian.
        civilian: EntityId,
        /// Position the civilian appears at.
        position: WorldPoint,
    },
    /// Signals that the liveness sweep should reconcile the session's
    /// tracked enemies against the host engine.
    SweepDue {
        /// Player whose session is due for a sweep.
        player: PlayerId,
    },
    /// Confirms a credited kill with its XP reward.
    EnemyDown {
        /// Player credited with the kill.
        player: PlayerId,
        /// Handle of the enemy that died.
        enemy: EntityId,
        /// XP awarded for the kill.
        xp_reward: u64,
        /// Total kills recorded by the session.
        kills: u32,
        /// Enemies still alive in the current wave.
        remaining: u32,
    },
    /// Reports that an enemy handle was dropped without kill credit.
    EnemyVanished {
        /// Player whose session tracked the enemy.
        player: PlayerId,
        /// Handle that vanished.
        enemy: EntityId,
    },
    /// Reports a civilian casualty and the XP penalty applied.
    CivilianCasualty {
        /// Player penalized for the casualty.
        player: PlayerId,
        /// Handle of the civilian that died.
        civilian: EntityId,
        /// XP deducted; capped so the held level never drops.
        xp_penalty: u64,
    },
    /// Announces that the warmup shield dropped after the first kill.
    ShieldExpired {
        /// Player whose shield dropped.
        player: PlayerId,
    },
    /// Announces that a wave was cleared and the next one is scheduled.
    WaveCleared {
        /// Player whose session cleared the wave.
        player: PlayerId,
        /// Wave number that was cleared.
        wave: u32,
        /// Delay before the next wave spawns.
        next_wave_in: Duration,
    },
    /// Reports the player's XP record after a mutation.
    XpChanged {
        /// Player whose record changed.
        player: PlayerId,
        /// Accumulated XP after the mutation.
        xp: u64,
        /// Level derived from the accumulated XP.
        level: u32,
    },
    /// Announces that the player reached a new level.
    LeveledUp {
        /// Player who leveled up.
        player: PlayerId,
        /// Level now held.
        level: u32,
        /// Level held before the mutation.
        previous: u32,
    },
    /// Reports that a session ended, with its final statistics.
    SessionEnded {
        /// Player whose session ended.
        player: PlayerId,
        /// Why the session ended.
        reason: EndReason,
        /// Final statistics at the moment of termination.
        summary: SessionSummary,
    },
    /// Instructs the adapter to destroy an engine entity it shadows.
    EntityRemoved {
        /// Player whose session tracked the entity.
        player: PlayerId,
        /// Handle to destroy.
        entity: EntityId,
    },
}

/// Final statistics reported when a session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Wave the session was on when it ended.
    pub wave_reached: u32,
    /// Total kills credited to the session.
    pub kills: u32,
    /// Simulated time the session lasted.
    pub elapsed: Duration,
}

/// Why a session terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The player requested an explicit stop.
    Stopped,
    /// The player died; death always terminates, never pauses.
    PlayerDied,
    /// The player disconnected from the host.
    Disconnected,
}

/// Reasons a session start request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum StartError {
    /// The player already has an active session.
    #[error("a session is already active for this player")]
    AlreadyActive,
}

/// Observed state of a single engine entity, as reported by the adapter.
///
/// An entity is only eligible for death detection once `max_health` has
/// been assigned by the spawn step; a zero `max_health` means "not yet
/// constructed", never "already dead".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityStatus {
    /// Handle the status describes.
    pub entity: EntityId,
    /// Whether the native object still exists.
    pub valid: bool,
    /// Max health assigned at spawn; zero while uninitialized.
    pub max_health: u32,
    /// Current health.
    pub health: u32,
}

/// Read-only view over entity statuses captured from the engine adapter.
#[derive(Clone, Debug, Default)]
pub struct EntityStatusView {
    snapshots: Vec<EntityStatus>,
}

impl EntityStatusView {
    /// Creates a view from the provided snapshots, sorted for lookup.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntityStatus>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.entity);
        Self { snapshots }
    }

    /// Looks up the status recorded for the provided handle.
    #[must_use]
    pub fn status_of(&self, entity: EntityId) -> Option<&EntityStatus> {
        self.snapshots
            .binary_search_by_key(&entity, |snapshot| snapshot.entity)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Iterator over the captured statuses in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityStatus> {
        self.snapshots.iter()
    }
}

/// Immutable representation of a single session used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Player the session belongs to.
    pub player: PlayerId,
    /// Current wave number.
    pub wave: u32,
    /// Kills credited so far.
    pub kills: u32,
    /// Whether the session is still running.
    pub active: bool,
    /// Whether a wave spawn is currently settling; the sweep must skip
    /// the session while this is set.
    pub spawning_wave: bool,
    /// Handles of enemies still alive in the current wave.
    pub enemies: Vec<EntityId>,
    /// Handles of tracked vehicles.
    pub vehicles: Vec<EntityId>,
    /// Handles of tracked civilians.
    pub civilians: Vec<EntityId>,
}

/// Weapon unlocked once a player reaches a given level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponUnlock {
    /// Level at which the weapon unlocks.
    pub level: u32,
    /// Weapon granted.
    pub weapon: WeaponId,
    /// Ammunition granted alongside the weapon.
    pub ammo: u32,
}

/// Weapon pool used by hostile spawns up to a given wave.
///
/// Buckets are ordered; the director picks the first bucket whose
/// `max_wave` is at or past the current wave, falling back to the last
/// bucket when none match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponTier {
    /// Highest wave the bucket applies to.
    pub max_wave: u32,
    /// Weapons sampled for enemies within the bucket.
    pub weapons: Vec<WeaponId>,
}

/// XP curve and reward parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XpConfig {
    /// Base XP awarded per kill on wave one.
    pub xp_per_kill: u32,
    /// Multiplier applied to the kill reward per wave past the first.
    pub xp_multiplier_per_wave: f64,
    /// Configured XP penalty for killing a civilian.
    pub xp_loss_per_civilian: u64,
    /// XP required to go from level one to level two.
    pub xp_per_level: u64,
    /// Growth factor of the per-level XP requirement.
    pub xp_scaling_per_level: f64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            xp_per_kill: 10,
            xp_multiplier_per_wave: 1.2,
            xp_loss_per_civilian: 50,
            xp_per_level: 100,
            xp_scaling_per_level: 1.5,
        }
    }
}

/// Wave composition and scaling parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Enemy count on wave one.
    pub enemies_per_wave: u32,
    /// Growth factor of the enemy count per wave.
    pub enemy_scaling: f64,
    /// Growth factor of enemy health per wave.
    pub health_scaling: f64,
    /// A hostile vehicle spawns every this many waves.
    pub vehicle_wave_interval: u32,
    /// Wave from which civilians start appearing.
    pub civilian_wave_start: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            enemies_per_wave: 5,
            enemy_scaling: 1.2,
            health_scaling: 1.3,
            vehicle_wave_interval: 5,
            civilian_wave_start: 5,
        }
    }
}

/// Combat zone geometry used when composing spawn positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Center of the combat zone.
    pub center: WorldPoint,
    /// Positions candidate spawn points must keep clear of.
    pub blocked: Vec<WorldPoint>,
    /// Safety distance around each blocked position.
    pub blocked_radius: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            center: WorldPoint::new(120.0, -1930.0, 21.0),
            blocked: Vec::new(),
            blocked_radius: 5.0,
        }
    }
}

/// Scheduling delays, expressed in milliseconds for configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between session start and the first wave.
    pub first_wave_delay_ms: u64,
    /// Delay between clearing a wave and spawning the next.
    pub wave_advance_delay_ms: u64,
    /// Delay after a wave spawn before death detection resumes.
    pub spawn_settle_delay_ms: u64,
    /// Cadence of the liveness sweep.
    pub sweep_interval_ms: u64,
    /// Stagger added per spawned enemy before follow-on spawns.
    pub per_enemy_stagger_ms: u64,
    /// Base stagger before the wave's vehicle spawns.
    pub vehicle_stagger_ms: u64,
    /// Base stagger before the wave's civilians spawn.
    pub civilian_stagger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            first_wave_delay_ms: 2_000,
            wave_advance_delay_ms: 5_000,
            spawn_settle_delay_ms: 2_000,
            sweep_interval_ms: 1_000,
            per_enemy_stagger_ms: 500,
            vehicle_stagger_ms: 1_000,
            civilian_stagger_ms: 2_000,
        }
    }
}

impl TimingConfig {
    /// Delay between session start and the first wave.
    #[must_use]
    pub const fn first_wave_delay(&self) -> Duration {
        Duration::from_millis(self.first_wave_delay_ms)
    }

    /// Delay between clearing a wave and spawning the next.
    #[must_use]
    pub const fn wave_advance_delay(&self) -> Duration {
        Duration::from_millis(self.wave_advance_delay_ms)
    }

    /// Delay after a wave spawn before death detection resumes.
    #[must_use]
    pub const fn spawn_settle_delay(&self) -> Duration {
        Duration::from_millis(self.spawn_settle_delay_ms)
    }

    /// Cadence of the liveness sweep.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Stagger before the vehicle of a wave with `enemy_count` enemies.
    #[must_use]
    pub fn vehicle_stagger(&self, enemy_count: u32) -> Duration {
        Duration::from_millis(
            u64::from(enemy_count)
                .saturating_mul(self.per_enemy_stagger_ms)
                .saturating_add(self.vehicle_stagger_ms),
        )
    }

    /// Stagger before the civilians of a wave with `enemy_count` enemies.
    #[must_use]
    pub fn civilian_stagger(&self, enemy_count: u32) -> Duration {
        Duration::from_millis(
            u64::from(enemy_count)
                .saturating_mul(self.per_enemy_stagger_ms)
                .saturating_add(self.civilian_stagger_ms),
        )
    }
}

/// Aggregated configuration consumed by the world and the systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// XP curve and reward parameters.
    pub xp: XpConfig,
    /// Wave composition and scaling parameters.
    pub waves: WaveConfig,
    /// Combat zone geometry.
    pub zone: ZoneConfig,
    /// Scheduling delays.
    pub timing: TimingConfig,
    /// Ordered enemy weapon buckets per wave range.
    pub weapon_tiers: Vec<WeaponTier>,
    /// Ordered player weapon unlocks per level.
    pub weapon_unlocks: Vec<WeaponUnlock>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            xp: XpConfig::default(),
            waves: WaveConfig::default(),
            zone: ZoneConfig::default(),
            timing: TimingConfig::default(),
            weapon_tiers: vec![
                WeaponTier {
                    max_wave: 2,
                    weapons: vec![WeaponId::new(0x1B06_D571)],
                },
                WeaponTier {
                    max_wave: 5,
                    weapons: vec![WeaponId::new(0x1B06_D571), WeaponId::new(0x5EF9_FEC4)],
                },
                WeaponTier {
                    max_wave: 10,
                    weapons: vec![WeaponId::new(0x1353_2244), WeaponId::new(0x2BE6_766B)],
                },
                WeaponTier {
                    max_wave: 999,
                    weapons: vec![WeaponId::new(0xBFEF_FF6D), WeaponId::new(0x1353_2244)],
                },
            ],
            weapon_unlocks: vec![
                WeaponUnlock {
                    level: 1,
                    weapon: WeaponId::new(0x99AE_EB3B),
                    ammo: 200,
                },
                WeaponUnlock {
                    level: 3,
                    weapon: WeaponId::new(0x1D07_3A89),
                    ammo: 100,
                },
                WeaponUnlock {
                    level: 5,
                    weapon: WeaponId::new(0xBFEF_FF6D),
                    ammo: 300,
                },
                WeaponUnlock {
                    level: 7,
                    weapon: WeaponId::new(0x9D07_F764),
                    ammo: 50,
                },
                WeaponUnlock {
                    level: 10,
                    weapon: WeaponId::new(0xB1CA_77B1),
                    ammo: 400,
                },
            ],
        }
    }
}

impl GameConfig {
    /// Selects the weapon bucket for the provided wave.
    ///
    /// Picks the first bucket whose `max_wave` is at or past the wave,
    /// falling back to the last bucket when none match. Returns `None`
    /// only when no buckets are configured at all.
    #[must_use]
    pub fn weapon_tier_for_wave(&self, wave: u32) -> Option<&WeaponTier> {
        self.weapon_tiers
            .iter()
            .find(|tier| wave <= tier.max_wave)
            .or_else(|| self.weapon_tiers.last())
    }

    /// Collects the weapons unlocked at the provided level, in order.
    #[must_use]
    pub fn loadout_for_level(&self, level: u32) -> Vec<WeaponUnlock> {
        self.weapon_unlocks
            .iter()
            .copied()
            .filter(|unlock| level >= unlock.level)
            .collect()
    }
}
