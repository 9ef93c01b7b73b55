//! Full-loop session tests: world, wave director, liveness sweep, and the
//! simulated engine wired together the way the CLI harness wires them.

use std::time::Duration;

use holdout_core::{Command, EndReason, Event, GameConfig, PlayerId};
use holdout_engine::{EntityProbe, SimEntityKind, SimulatedEngine};
use holdout_system_wave_director::WaveDirector;
use holdout_world::{apply, query, World};

const PLAYER: PlayerId = PlayerId::new(7);
const DT: Duration = Duration::from_millis(250);

struct Harness {
    world: World,
    director: WaveDirector,
    engine: SimulatedEngine,
    pending: Vec<Command>,
    log: Vec<Event>,
    autoplay: bool,
}

impl Harness {
    fn new(config: GameConfig) -> Self {
        Self {
            world: World::new(config),
            director: WaveDirector::new(0x5eed),
            engine: SimulatedEngine::new(),
            pending: vec![
                Command::PlayerConnected { player: PLAYER },
                Command::StartSession { player: PLAYER },
            ],
            log: Vec::new(),
            autoplay: false,
        }
    }

    fn with_defaults() -> Self {
        Self::new(GameConfig::default())
    }

    fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Runs one simulation step: queued commands, the clock tick, engine
    /// observation, then the systems that queue commands for the next step.
    fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for command in self.pending.drain(..) {
            apply(&mut self.world, command, &mut events);
        }
        apply(&mut self.world, Command::Tick { dt: DT }, &mut events);

        self.engine.observe(&events);
        let snapshots = query::session_snapshots(&self.world);
        self.director
            .handle(&events, query::config(&self.world), &mut self.pending);
        holdout_system_liveness::handle(
            &events,
            &snapshots,
            &self.engine.status_view(),
            &mut self.pending,
        );
        if self.autoplay {
            let target = self
                .engine
                .entities_of_kind(SimEntityKind::Enemy)
                .find(|enemy| {
                    self.engine
                        .status_of(*enemy)
                        .is_some_and(|status| status.health > 0)
                });
            if let Some(enemy) = target {
                self.engine.kill(enemy);
            }
        }
        self.log.extend(events.iter().cloned());
        events
    }

    fn run_until(&mut self, max_ticks: u32, pred: impl Fn(&Event) -> bool) -> Event {
        for _ in 0..max_ticks {
            if let Some(event) = self.tick().into_iter().find(&pred) {
                return event;
            }
        }
        panic!("condition not met within {max_ticks} ticks");
    }

    fn count_in_log(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.log.iter().filter(|event| pred(event)).count()
    }
}

#[test]
fn first_wave_spawns_after_the_opening_delay() {
    let mut harness = Harness::with_defaults();
    let spawned = harness.run_until(100, |event| matches!(event, Event::WaveSpawned { .. }));
    let Event::WaveSpawned {
        wave, enemy_count, ..
    } = spawned
    else {
        unreachable!();
    };
    assert_eq!(wave, 1);
    assert_eq!(enemy_count, 5);
    assert_eq!(harness.engine.entity_count(), 5);

    let snapshot = query::session_snapshot(&harness.world, PLAYER).expect("session");
    assert_eq!(snapshot.enemies.len(), 5);
    assert!(snapshot.spawning_wave, "settle window should be open");
}

#[test]
fn clearing_a_wave_advances_to_a_larger_one() {
    let mut harness = Harness::with_defaults();
    harness.autoplay = true;

    let cleared = harness.run_until(400, |event| matches!(event, Event::WaveCleared { .. }));
    assert!(matches!(cleared, Event::WaveCleared { wave: 1, .. }));
    assert_eq!(
        harness.count_in_log(|event| matches!(event, Event::EnemyDown { .. })),
        5,
    );
    assert_eq!(query::xp_progress(&harness.world, PLAYER).xp, 50);

    let next = harness.run_until(400, |event| matches!(event, Event::WaveSpawned { .. }));
    let Event::WaveSpawned {
        wave, enemy_count, ..
    } = next
    else {
        unreachable!();
    };
    assert_eq!(wave, 2);
    assert_eq!(enemy_count, 6);
}

#[test]
fn vanished_enemies_complete_the_wave_without_reward() {
    let mut harness = Harness::with_defaults();
    let _ = harness.run_until(100, |event| matches!(event, Event::WaveSpawned { .. }));

    let enemies: Vec<_> = harness.engine.entities_of_kind(SimEntityKind::Enemy).collect();
    for enemy in enemies {
        harness.engine.invalidate(enemy);
    }

    let cleared = harness.run_until(400, |event| matches!(event, Event::WaveCleared { .. }));
    assert!(matches!(cleared, Event::WaveCleared { wave: 1, .. }));
    assert_eq!(
        harness.count_in_log(|event| matches!(event, Event::EnemyVanished { .. })),
        5,
    );
    assert_eq!(
        harness.count_in_log(|event| matches!(event, Event::EnemyDown { .. })),
        0,
    );
    assert_eq!(query::xp_progress(&harness.world, PLAYER).xp, 0);
}

#[test]
fn civilian_casualty_penalty_never_drops_the_level() {
    let mut config = GameConfig::default();
    config.waves.civilian_wave_start = 1;
    let mut harness = Harness::new(config);
    harness.push(Command::GrantXp {
        player: PLAYER,
        amount: 120,
    });

    let spawned = harness.run_until(200, |event| matches!(event, Event::CivilianSpawned { .. }));
    let Event::CivilianSpawned { civilian, .. } = spawned else {
        unreachable!();
    };
    harness.push(Command::CivilianKilled {
        player: PLAYER,
        civilian,
    });

    let casualty =
        harness.run_until(10, |event| matches!(event, Event::CivilianCasualty { .. }));
    let Event::CivilianCasualty { xp_penalty, .. } = casualty else {
        unreachable!();
    };
    // 120 XP sits 20 past the level-two floor; the 50-point penalty caps there.
    assert_eq!(xp_penalty, 20);
    let progress = query::xp_progress(&harness.world, PLAYER);
    assert_eq!(progress.xp, 100);
    assert_eq!(progress.level, 2);
}

#[test]
fn player_death_ends_the_session_and_clears_the_field() {
    let mut harness = Harness::with_defaults();
    let _ = harness.run_until(100, |event| matches!(event, Event::WaveSpawned { .. }));
    harness.push(Command::PlayerDied { player: PLAYER });

    let ended = harness.run_until(10, |event| matches!(event, Event::SessionEnded { .. }));
    let Event::SessionEnded {
        reason, summary, ..
    } = ended
    else {
        unreachable!();
    };
    assert_eq!(reason, EndReason::PlayerDied);
    assert_eq!(summary.wave_reached, 1);
    assert_eq!(harness.engine.entity_count(), 0);
    assert!(query::session_snapshot(&harness.world, PLAYER).is_none());
}

#[test]
fn vehicle_and_civilians_join_their_designated_waves() {
    let mut config = GameConfig::default();
    config.waves.vehicle_wave_interval = 1;
    config.waves.civilian_wave_start = 1;
    let mut harness = Harness::new(config);

    let vehicle = harness.run_until(200, |event| matches!(event, Event::VehicleSpawned { .. }));
    let Event::VehicleSpawned { occupants, .. } = vehicle else {
        unreachable!();
    };
    assert_eq!(occupants.len(), 3);
    assert_eq!(
        harness.engine.entities_of_kind(SimEntityKind::Vehicle).count(),
        1,
    );

    let _ = harness.run_until(200, |event| matches!(event, Event::CivilianSpawned { .. }));
    let snapshot = query::session_snapshot(&harness.world, PLAYER).expect("session");
    assert_eq!(snapshot.enemies.len(), 8, "wave plus vehicle occupants");
    assert!(!snapshot.civilians.is_empty());
}

#[test]
fn explicit_kill_reports_agree_with_the_sweep() {
    let mut harness = Harness::with_defaults();
    let spawned = harness.run_until(100, |event| matches!(event, Event::EnemySpawned { .. }));
    let Event::EnemySpawned { enemy, .. } = spawned else {
        unreachable!();
    };

    harness.engine.kill(enemy);
    harness.push(Command::EnemyKilled {
        player: PLAYER,
        enemy,
    });
    let _ = harness.run_until(20, |event| matches!(event, Event::EnemyDown { .. }));
    for _ in 0..20 {
        let _ = harness.tick();
    }
    assert_eq!(
        harness.count_in_log(
            |event| matches!(event, Event::EnemyDown { enemy: down, .. } if *down == enemy),
        ),
        1,
        "sweep and explicit report must not double-credit",
    );
}
