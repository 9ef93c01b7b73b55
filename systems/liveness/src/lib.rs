#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Liveness sweep system.
//!
//! The authoritative kill-detection path: on every sweep tick it compares
//! the world's tracked enemy handles against engine-reported statuses and
//! emits kill or discard commands for handles that are dead or gone. The
//! world treats these idempotently, so a sweep racing an explicit kill
//! report is harmless.

use holdout_core::{Command, EntityStatusView, Event, SessionSnapshot};

/// Runs the sweep for every session with a due sweep event.
///
/// Sessions mid-spawn are skipped entirely: freshly requested entities may
/// not have engine statuses yet and must not be discarded as missing.
pub fn handle(
    events: &[Event],
    sessions: &[SessionSnapshot],
    statuses: &EntityStatusView,
    out: &mut Vec<Command>,
) {
    for event in events {
        let Event::SweepDue { player } = event else {
            continue;
        };
        let Some(session) = sessions.iter().find(|session| session.player == *player) else {
            continue;
        };
        if !session.active || session.spawning_wave {
            continue;
        }
        sweep_session(session, statuses, out);
    }
}

fn sweep_session(session: &SessionSnapshot, statuses: &EntityStatusView, out: &mut Vec<Command>) {
    for enemy in &session.enemies {
        match statuses.status_of(*enemy) {
            None => out.push(Command::EnemyDiscarded {
                player: session.player,
                enemy: *enemy,
            }),
            Some(status) if !status.valid => out.push(Command::EnemyDiscarded {
                player: session.player,
                enemy: *enemy,
            }),
            Some(status) => {
                // max_health of zero means the engine has not finished
                // initializing the entity; leave it for a later sweep.
                if status.max_health > 0 && status.health == 0 {
                    out.push(Command::EnemyKilled {
                        player: session.player,
                        enemy: *enemy,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::handle;
    use holdout_core::{
        Command, EntityId, EntityStatus, EntityStatusView, Event, PlayerId, SessionSnapshot,
    };

    const PLAYER: PlayerId = PlayerId::new(1);

    fn session(enemies: Vec<EntityId>) -> SessionSnapshot {
        SessionSnapshot {
            player: PLAYER,
            wave: 1,
            kills: 0,
            active: true,
            spawning_wave: false,
            enemies,
            vehicles: Vec::new(),
            civilians: Vec::new(),
        }
    }

    fn status(entity: u32, valid: bool, max_health: u32, health: u32) -> EntityStatus {
        EntityStatus {
            entity: EntityId::new(entity),
            valid,
            max_health,
            health,
        }
    }

    fn sweep(sessions: &[SessionSnapshot], statuses: Vec<EntityStatus>) -> Vec<Command> {
        let view = EntityStatusView::from_snapshots(statuses);
        let mut out = Vec::new();
        handle(&[Event::SweepDue { player: PLAYER }], sessions, &view, &mut out);
        out
    }

    #[test]
    fn dead_enemies_are_reported_as_kills() {
        let sessions = [session(vec![EntityId::new(1), EntityId::new(2)])];
        let out = sweep(
            &sessions,
            vec![status(1, true, 200, 0), status(2, true, 200, 120)],
        );
        assert_eq!(
            out,
            vec![Command::EnemyKilled {
                player: PLAYER,
                enemy: EntityId::new(1),
            }],
        );
    }

    #[test]
    fn missing_and_invalid_handles_are_discarded() {
        let sessions = [session(vec![EntityId::new(1), EntityId::new(2)])];
        let out = sweep(&sessions, vec![status(2, false, 200, 50)]);
        assert_eq!(
            out,
            vec![
                Command::EnemyDiscarded {
                    player: PLAYER,
                    enemy: EntityId::new(1),
                },
                Command::EnemyDiscarded {
                    player: PLAYER,
                    enemy: EntityId::new(2),
                },
            ],
        );
    }

    #[test]
    fn uninitialized_entities_are_left_alone() {
        let sessions = [session(vec![EntityId::new(1)])];
        let out = sweep(&sessions, vec![status(1, true, 0, 0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn spawning_sessions_are_skipped() {
        let mut snapshot = session(vec![EntityId::new(1)]);
        snapshot.spawning_wave = true;
        let out = sweep(&[snapshot], Vec::new());
        assert!(out.is_empty());
    }

    #[test]
    fn sweeps_for_unknown_players_do_nothing() {
        let view = EntityStatusView::from_snapshots(Vec::new());
        let mut out = Vec::new();
        handle(
            &[Event::SweepDue {
                player: PlayerId::new(99),
            }],
            &[session(vec![EntityId::new(1)])],
            &view,
            &mut out,
        );
        assert!(out.is_empty());
    }
}
