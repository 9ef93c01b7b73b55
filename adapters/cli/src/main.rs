#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the holdout minigame.
//!
//! Wires the world, the wave director, the liveness sweep, and the
//! simulated engine into a tick loop, with an autoplayer that finishes
//! enemies so full sessions can be replayed from a seed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use holdout_core::{Command, Event, GameConfig, PlayerId};
use holdout_engine::{EntityProbe, SimEntityKind, SimulatedEngine};
use holdout_system_wave_director::WaveDirector;
use holdout_world::{query, World};

/// Deterministic wave-holdout session harness.
#[derive(Parser)]
#[command(name = "holdout", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Replays a full session from a seed until a target wave is cleared.
    Simulate {
        /// Seed driving wave composition.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Stop once this wave has been cleared.
        #[arg(long, default_value_t = 3)]
        waves: u32,
        /// Simulated milliseconds advanced per tick.
        #[arg(long, default_value_t = 250)]
        tick_ms: u64,
        /// Optional TOML configuration overriding the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print every event instead of just the headline ones.
        #[arg(long)]
        verbose: bool,
    },
    /// Prints the XP cost table for the configured curve.
    XpTable {
        /// Highest level to include.
        #[arg(long, default_value_t = 20)]
        levels: u32,
        /// Optional TOML configuration overriding the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reports level and progress for an accumulated XP amount.
    Progress {
        /// Accumulated XP to inspect.
        xp: u64,
        /// Optional TOML configuration overriding the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        CliCommand::Simulate {
            seed,
            waves,
            tick_ms,
            config,
            verbose,
        } => simulate(seed, waves, tick_ms, config.as_deref(), verbose),
        CliCommand::XpTable { levels, config } => xp_table(levels, config.as_deref()),
        CliCommand::Progress { xp, config } => progress(xp, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing configuration in {}", path.display()))
}

fn simulate(
    seed: u64,
    target_wave: u32,
    tick_ms: u64,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if tick_ms == 0 {
        bail!("tick duration must be at least one millisecond");
    }
    let config = load_config(config_path)?;
    let player = PlayerId::new(1);
    let mut world = World::new(config.clone());
    let director = WaveDirector::new(seed);
    let mut engine = SimulatedEngine::new();

    let mut pending = vec![
        Command::PlayerConnected { player },
        Command::StartSession { player },
    ];
    let dt = Duration::from_millis(tick_ms);
    // Generous upper bound; a stalled session is a bug worth surfacing.
    let max_ticks = u64::from(target_wave.max(1)) * 10_000;

    println!("simulating seed {seed} until wave {target_wave} clears");
    for _ in 0..max_ticks {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            holdout_world::apply(&mut world, command, &mut events);
        }
        holdout_world::apply(&mut world, Command::Tick { dt }, &mut events);

        engine.observe(&events);
        report(&events, verbose);

        if let Some(summary_line) = session_end_line(&events) {
            println!("{summary_line}");
            return Ok(());
        }
        if events.iter().any(|event| {
            matches!(event, Event::WaveCleared { wave, .. } if *wave >= target_wave)
        }) {
            pending.push(Command::StopSession { player });
            continue;
        }

        let snapshots = query::session_snapshots(&world);
        director.handle(&events, query::config(&world), &mut pending);
        holdout_system_liveness::handle(&events, &snapshots, &engine.status_view(), &mut pending);
        autoplay(&mut engine);
    }
    bail!("session did not finish within {max_ticks} ticks")
}

/// Finishes one hostile per tick so waves progress without player input.
fn autoplay(engine: &mut SimulatedEngine) {
    let target = engine.entities_of_kind(SimEntityKind::Enemy).find(|enemy| {
        engine
            .status_of(*enemy)
            .is_some_and(|status| status.health > 0)
    });
    if let Some(enemy) = target {
        engine.kill(enemy);
    }
}

fn report(events: &[Event], verbose: bool) {
    for event in events {
        match event {
            Event::SessionStarted { player, level, .. } => {
                println!("session started for player {} at level {level}", player.get());
            }
            Event::WaveSpawned {
                wave, enemy_count, ..
            } => println!("wave {wave}: {enemy_count} hostiles inbound"),
            Event::VehicleSpawned { occupants, .. } => {
                println!("hostile vehicle arrived with {} occupants", occupants.len());
            }
            Event::EnemyDown {
                xp_reward,
                kills,
                remaining,
                ..
            } => {
                if verbose {
                    println!("kill #{kills} (+{xp_reward} xp, {remaining} left)");
                }
            }
            Event::WaveCleared {
                wave, next_wave_in, ..
            } => println!(
                "wave {wave} cleared; next in {:.1}s",
                next_wave_in.as_secs_f64(),
            ),
            Event::LeveledUp {
                level, previous, ..
            } => println!("leveled up: {previous} -> {level}"),
            _ => {
                if verbose {
                    println!("{event:?}");
                }
            }
        }
    }
}

fn session_end_line(events: &[Event]) -> Option<String> {
    events.iter().find_map(|event| {
        let Event::SessionEnded {
            reason, summary, ..
        } = event
        else {
            return None;
        };
        Some(format!(
            "session over ({reason:?}): reached wave {}, {} kills in {:.1}s",
            summary.wave_reached,
            summary.kills,
            summary.elapsed.as_secs_f64(),
        ))
    })
}

fn xp_table(levels: u32, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{:>5} {:>12} {:>12}", "level", "step cost", "total xp");
    for level in 1..=levels.max(1) {
        println!(
            "{level:>5} {:>12} {:>12}",
            holdout_system_xp_curve::xp_required_for_level(&config.xp, level),
            holdout_system_xp_curve::total_xp_for_level(&config.xp, level),
        );
    }
    Ok(())
}

fn progress(xp: u64, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let report = holdout_system_xp_curve::progress(&config.xp, xp);
    println!("level {} with {} xp", report.level, report.xp);
    println!(
        "{} / {} into the next level ({:.1}%)",
        report.into_level, report.next_level_cost, report.percent,
    );
    for unlock in config.loadout_for_level(report.level) {
        println!(
            "unlocked weapon {:#010x} with {} rounds at level {}",
            unlock.weapon.get(),
            unlock.ammo,
            unlock.level,
        );
    }
    Ok(())
}
