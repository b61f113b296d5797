//! Headless skirmish runner
//!
//! Builds a small two-player scenario, plays it for a number of rounds with
//! a simple close-and-shoot script, and prints the report log.

use std::path::PathBuf;

use clap::Parser;
use hexfire::board::{Board, BoardView, Building, Facing, HexCoord, Terrain};
use hexfire::combat::report::render_plain;
use hexfire::combat::{AttackDeclaration, GameLog, Limb, TargetRef};
use hexfire::core::{PlayerId, RngService, RulesConfig, SeededDice, UnitId, WeaponId};
use hexfire::turn::Contender;
use hexfire::units::{Movement, MovementMode, Unit, UnitClass, Weapon};
use hexfire::{CombatEngine, Phase};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless skirmish - seeded, scripted hex combat
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run a scripted two-player skirmish and print the combat log")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum rounds to play
    #[arg(long, default_value_t = 6)]
    rounds: u32,

    /// Rules file (TOML); built-in defaults when omitted
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Debug-level logging of every modifier chain and roll
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct SurvivorSummary {
    id: UnitId,
    name: String,
    owner: PlayerId,
    destroyed: bool,
}

#[derive(Serialize)]
struct SkirmishResult<'a> {
    seed: u64,
    rounds_played: u32,
    rolls_made: u64,
    units: Vec<SurvivorSummary>,
    log: &'a GameLog,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "hexfire=debug" } else { "hexfire=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("skirmish failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = match &args.rules {
        Some(path) => RulesConfig::load(path)?,
        None => RulesConfig::default(),
    };

    let mut engine = CombatEngine::new(build_battlefield()?, config, SeededDice::new(seed))?;
    tracing::info!(seed, "skirmish starting");

    let mut rounds_played = 0;
    for _ in 0..args.rounds {
        if forces_remaining(&engine) < 2 {
            break;
        }
        play_round(&mut engine)?;
        rounds_played += 1;
    }

    match args.format.as_str() {
        "json" => {
            let units = engine
                .field()
                .units
                .iter()
                .map(|u| SurvivorSummary {
                    id: u.id,
                    name: u.name.clone(),
                    owner: u.owner,
                    destroyed: u.destroyed,
                })
                .collect();
            let result = SkirmishResult {
                seed,
                rounds_played,
                rolls_made: engine.rng().rolls_made(),
                units,
                log: engine.log(),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("=== SKIRMISH (seed {seed}) ===");
            for logged in &engine.log().entries {
                println!("[round {}] {}", logged.round, render_plain(&logged.entry).trim_end());
            }
            println!();
            for unit in engine.field().units.iter() {
                let status = if unit.destroyed { "destroyed" } else { "operational" };
                println!("{} ({}): {status}", unit.name, unit.id);
            }
        }
    }
    Ok(())
}

fn build_battlefield() -> hexfire::core::Result<hexfire::combat::Battlefield> {
    let mut board = Board::new(16, 12);
    board.set_terrain(HexCoord::new(6, 4), Terrain::LightWoods);
    board.set_terrain(HexCoord::new(7, 4), Terrain::LightWoods);
    board.set_terrain(HexCoord::new(8, 6), Terrain::HeavyWoods);
    board.place_building(HexCoord::new(9, 3), Building::new("Depot", 40, 2));

    let mut field = hexfire::combat::Battlefield::new(board);

    field.units.add(
        Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50)
            .named("Hunchback")
            .at(HexCoord::new(3, 5), Facing::East)
            .with_weapon(Weapon::medium_laser(WeaponId(1)))
            .with_weapon(Weapon::lrm10(WeaponId(2)))
            .with_searchlight(),
    )?;
    field.units.add(
        Unit::new(UnitId(2), PlayerId(1), UnitClass::Vehicle, 60)
            .named("Arrow Carrier")
            .at(HexCoord::new(1, 6), Facing::East)
            .with_weapon(Weapon::arrow_iv(WeaponId(1))),
    )?;
    field.units.add(
        Unit::new(UnitId(3), PlayerId(2), UnitClass::Mech, 55)
            .named("Wolverine")
            .at(HexCoord::new(12, 5), Facing::West)
            .with_weapon(Weapon::medium_laser(WeaponId(1)))
            .with_weapon(Weapon::taser(WeaponId(2))),
    )?;
    field.units.add(
        Unit::new(UnitId(4), PlayerId(2), UnitClass::ProtoMech, 7)
            .named("Minotaur")
            .at(HexCoord::new(12, 3), Facing::West)
            .with_weapon(Weapon::medium_laser(WeaponId(1))),
    )?;
    field.units.add(
        Unit::new(UnitId(5), PlayerId(2), UnitClass::Infantry, 3)
            .named("Foot Platoon")
            .at(HexCoord::new(11, 7), Facing::West),
    )?;
    Ok(field)
}

fn forces_remaining<R: RngService>(engine: &CombatEngine<R>) -> usize {
    let mut owners: Vec<PlayerId> = engine
        .field()
        .units
        .iter()
        .filter(|u| !u.destroyed)
        .map(|u| u.owner)
        .collect();
    owners.sort();
    owners.dedup();
    owners.len()
}

/// Nearest live enemy of `unit`, by hex distance then id
fn nearest_enemy(units: &[(UnitId, PlayerId, HexCoord)], unit: &Unit) -> Option<(UnitId, HexCoord)> {
    units
        .iter()
        .filter(|(_, owner, _)| *owner != unit.owner)
        .min_by_key(|(id, _, pos)| (unit.position.distance(pos), *id))
        .map(|(id, _, pos)| (*id, *pos))
}

fn live_units<R: RngService>(engine: &CombatEngine<R>) -> Vec<(UnitId, PlayerId, HexCoord)> {
    engine
        .field()
        .units
        .iter()
        .filter(|u| !u.destroyed)
        .map(|u| (u.id, u.owner, u.position))
        .collect()
}

fn play_round<R: RngService>(engine: &mut CombatEngine<R>) -> hexfire::core::Result<()> {
    // Initiative: infantry moves after everything else
    engine.begin_phase(Phase::Initiative);
    let mut contenders: Vec<Contender> = Vec::new();
    for unit in engine.field().units.iter().filter(|u| !u.destroyed) {
        let index = match contenders.iter().position(|c| c.player == unit.owner) {
            Some(i) => i,
            None => {
                contenders.push(Contender::new(unit.owner, 0, 0));
                contenders.len() - 1
            }
        };
        if unit.class == UnitClass::Infantry {
            contenders[index].deferred += 1;
        } else {
            contenders[index].normal += 1;
        }
    }
    let mut order = engine.roll_initiative(&contenders)?;

    engine.begin_phase(Phase::Movement);
    let mut moved: Vec<UnitId> = Vec::new();
    while order.has_next() {
        let marker = order.next()?;
        move_next_unit(engine, marker.player, false, &mut moved)?;
    }
    while order.has_next_deferred() {
        let marker = order.next_deferred()?;
        move_next_unit(engine, marker.player, true, &mut moved)?;
    }

    engine.begin_phase(Phase::WeaponDeclaration);
    let live = live_units(engine);
    let mut declarations = Vec::new();
    for unit in engine.field().units.iter().filter(|u| !u.destroyed) {
        let Some((target, _)) = nearest_enemy(&live, unit) else {
            continue;
        };
        for weapon in unit.weapons.iter().filter(|w| !w.destroyed) {
            declarations.push(AttackDeclaration::weapon_fire(unit.id, TargetRef::Unit(target), weapon.id));
        }
    }

    engine.begin_phase(Phase::PhysicalDeclaration);
    for unit in engine.field().units.iter().filter(|u| !u.destroyed && u.class == UnitClass::Mech) {
        if let Some((target, pos)) = nearest_enemy(&live, unit) {
            if unit.position.is_adjacent(&pos) {
                declarations.push(AttackDeclaration::punch(unit.id, TargetRef::Unit(target), Limb::Right));
            }
        }
    }
    for declaration in declarations {
        engine.declare(declaration)?;
    }

    engine.begin_phase(Phase::Resolution);
    engine.resolve_all()?;

    engine.end_round();
    Ok(())
}

/// Step the next unmoved unit of `player` one hex toward its nearest enemy
fn move_next_unit<R: RngService>(
    engine: &mut CombatEngine<R>,
    player: PlayerId,
    deferred: bool,
    moved: &mut Vec<UnitId>,
) -> hexfire::core::Result<()> {
    let live = live_units(engine);
    let field = engine.field_mut();
    let Some(unit) = field.units.iter().find(|u| {
        u.owner == player && !u.destroyed && !moved.contains(&u.id) && (u.class == UnitClass::Infantry) == deferred
    }) else {
        return Ok(());
    };
    let id = unit.id;
    moved.push(id);

    let Some((_, goal)) = nearest_enemy(&live, unit) else {
        return Ok(());
    };
    let from = unit.position;
    let step = Facing::all()
        .into_iter()
        .map(|facing| (facing, from.neighbor(facing)))
        .filter(|(_, hex)| field.board.contains(*hex) && field.units.units_at(*hex).is_empty())
        .min_by_key(|(_, hex)| hex.distance(&goal));

    let unit = field.units.get_mut(id)?;
    match step {
        Some((facing, hex)) if from.distance(&goal) > 1 && hex.distance(&goal) < from.distance(&goal) => {
            unit.position = hex;
            unit.facing = facing;
            unit.movement = Movement::new(MovementMode::Walked, 1);
        }
        _ => {
            unit.movement = Movement::new(MovementMode::Stationary, 0);
        }
    }
    Ok(())
}
