#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave composition system.
//!
//! Consumes spawn-due events from the world and responds with fully
//! composed spawn command batches: enemy counts and health scaled to the
//! wave, weapons drawn from the wave's tier bucket, and positions sampled
//! on rings around the zone center while avoiding blocked areas. All
//! sampling is driven by ChaCha streams derived per `(global seed,
//! player, wave, purpose)`, so identical inputs replay identically.

use std::f32::consts::TAU;

use holdout_core::{
    CivilianSpawn, Command, EnemySpawn, Event, GameConfig, PlayerId, WeaponId, WorldPoint,
    ZoneConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const RNG_STREAM_WAVE: &str = "wave";
const RNG_STREAM_VEHICLE: &str = "vehicle";
const RNG_STREAM_CIVILIAN: &str = "civilian";

/// Base health every hostile carries before wave scaling.
const BASE_ENEMY_HEALTH: u32 = 100;
/// Armour granted per wave number.
const ARMOUR_PER_WAVE: u32 = 10;
/// Inner radius of the enemy spawn ring, in world units.
const ENEMY_RING_MIN: f32 = 20.0;
/// Width of the enemy spawn ring.
const ENEMY_RING_SPREAD: f32 = 30.0;
/// Angular jitter applied around each enemy's nominal ring slot.
const ENEMY_ANGLE_JITTER: f32 = 0.25;
/// Distance at which hostile vehicles appear.
const VEHICLE_RING: f32 = 50.0;
/// Hostiles seated in each spawned vehicle.
const VEHICLE_OCCUPANTS: u32 = 3;
/// Inner radius of the civilian spawn ring.
const CIVILIAN_RING_MIN: f32 = 15.0;
/// Width of the civilian spawn ring.
const CIVILIAN_RING_SPREAD: f32 = 25.0;
/// Minimum civilians per drift, plus up to two extra.
const CIVILIAN_MIN: u32 = 3;
const CIVILIAN_EXTRA: u32 = 3;
/// Candidate positions are re-rolled at most this many times before a
/// blocked-adjacent point is accepted anyway.
const MAX_SPAWN_ATTEMPTS: u32 = 10;

/// Pure system that composes spawn batches for due waves.
#[derive(Clone, Copy, Debug)]
pub struct WaveDirector {
    global_seed: u64,
}

impl WaveDirector {
    /// Creates a director whose sampling derives from the provided seed.
    #[must_use]
    pub const fn new(global_seed: u64) -> Self {
        Self { global_seed }
    }

    /// Consumes spawn-due events and emits spawn command batches.
    pub fn handle(&self, events: &[Event], config: &GameConfig, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::WaveSpawnDue { player, wave } => {
                    out.push(self.compose_wave(*player, *wave, config));
                }
                Event::VehicleSpawnDue { player, wave } => {
                    out.push(self.compose_vehicle(*player, *wave, config));
                }
                Event::CivilianSpawnDue { player, wave } => {
                    out.push(self.compose_civilians(*player, *wave, config));
                }
                _ => {}
            }
        }
    }

    fn compose_wave(&self, player: PlayerId, wave: u32, config: &GameConfig) -> Command {
        let mut rng = self.stream(player, wave, RNG_STREAM_WAVE);
        let count = enemy_count(config, wave);
        let health = enemy_health(config, wave);
        let armour = wave.saturating_mul(ARMOUR_PER_WAVE);

        let mut spawns = Vec::with_capacity(count as usize);
        for slot in 0..count {
            let position = ring_position(&mut rng, &config.zone, slot, count);
            let weapon = tier_weapon(&mut rng, config, wave);
            spawns.push(EnemySpawn {
                position,
                health,
                armour,
                weapon,
            });
        }
        Command::SpawnEnemies { player, spawns }
    }

    fn compose_vehicle(&self, player: PlayerId, wave: u32, config: &GameConfig) -> Command {
        let mut rng = self.stream(player, wave, RNG_STREAM_VEHICLE);
        let angle = rng.gen_range(0.0..TAU);
        let position = point_at(&config.zone.center, angle, VEHICLE_RING);
        let health = enemy_health(config, wave);

        let mut occupants = Vec::with_capacity(VEHICLE_OCCUPANTS as usize);
        for _ in 0..VEHICLE_OCCUPANTS {
            let weapon = tier_weapon(&mut rng, config, wave);
            occupants.push(EnemySpawn {
                position,
                health,
                armour: 0,
                weapon,
            });
        }
        Command::SpawnVehicle {
            player,
            position,
            heading: angle,
            occupants,
        }
    }

    fn compose_civilians(&self, player: PlayerId, wave: u32, config: &GameConfig) -> Command {
        let mut rng = self.stream(player, wave, RNG_STREAM_CIVILIAN);
        let count = CIVILIAN_MIN + rng.gen_range(0..CIVILIAN_EXTRA);

        let mut spawns = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let angle = rng.gen_range(0.0..TAU);
            let distance = CIVILIAN_RING_MIN + rng.gen_range(0.0..1.0) * CIVILIAN_RING_SPREAD;
            spawns.push(CivilianSpawn {
                position: point_at(&config.zone.center, angle, distance),
            });
        }
        Command::SpawnCivilians { player, spawns }
    }

    fn stream(&self, player: PlayerId, wave: u32, label: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(derive_stream_seed(self.global_seed, player, wave, label))
    }
}

/// Enemy count for a wave: `floor(base * scaling^(wave-1))`.
#[must_use]
pub fn enemy_count(config: &GameConfig, wave: u32) -> u32 {
    let scaled = f64::from(config.waves.enemies_per_wave)
        * config.waves.enemy_scaling.powi(wave as i32 - 1);
    scaled as u32
}

/// Enemy health for a wave: `100 + floor(100 * scaling^(wave-1))`.
#[must_use]
pub fn enemy_health(config: &GameConfig, wave: u32) -> u32 {
    let scaled =
        f64::from(BASE_ENEMY_HEALTH) * config.waves.health_scaling.powi(wave as i32 - 1);
    BASE_ENEMY_HEALTH + scaled as u32
}

fn tier_weapon(rng: &mut ChaCha8Rng, config: &GameConfig, wave: u32) -> WeaponId {
    config
        .weapon_tier_for_wave(wave)
        .filter(|tier| !tier.weapons.is_empty())
        .map_or(WeaponId::new(0), |tier| {
            tier.weapons[rng.gen_range(0..tier.weapons.len())]
        })
}

/// Samples a spawn point on the enemy ring for the given slot.
///
/// Candidates too close to a blocked position are re-rolled up to
/// [`MAX_SPAWN_ATTEMPTS`] times; the final candidate is accepted
/// regardless so a crowded zone can never stall a spawn.
fn ring_position(rng: &mut ChaCha8Rng, zone: &ZoneConfig, slot: u32, count: u32) -> WorldPoint {
    let base_angle = TAU * slot as f32 / count.max(1) as f32;
    let mut candidate = zone.center;
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let angle = base_angle + rng.gen_range(-ENEMY_ANGLE_JITTER..ENEMY_ANGLE_JITTER);
        let distance = ENEMY_RING_MIN + rng.gen_range(0.0..1.0) * ENEMY_RING_SPREAD;
        candidate = point_at(&zone.center, angle, distance);
        if !too_close_to_blocked(zone, candidate) {
            return candidate;
        }
    }
    candidate
}

fn too_close_to_blocked(zone: &ZoneConfig, candidate: WorldPoint) -> bool {
    zone.blocked
        .iter()
        .any(|blocked| candidate.distance(*blocked) < zone.blocked_radius)
}

fn point_at(center: &WorldPoint, angle: f32, distance: f32) -> WorldPoint {
    WorldPoint::new(
        center.x + angle.cos() * distance,
        center.y + angle.sin() * distance,
        center.z,
    )
}

fn derive_stream_seed(global_seed: u64, player: PlayerId, wave: u32, label: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(player.get().to_le_bytes());
    hasher.update(wave.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
