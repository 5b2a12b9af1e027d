use std::time::Duration;

use crypt_crawler_core::{
    tile_center, Command, Direction, EntityKind, Event, LevelLayout, LevelStatus, Placement,
    PursuerId, TileCode, TileCoord,
};
use crypt_crawler_system_pursuit::Pursuit;
use crypt_crawler_world::{self as world, query, World};

const TICK: Duration = Duration::from_millis(50);

fn level(rows: &[&str]) -> LevelLayout {
    let mut tiles = Vec::new();
    let mut placements = Vec::new();
    for (row, line) in rows.iter().enumerate() {
        for (column, symbol) in line.chars().enumerate() {
            let cell = TileCoord::new(column as u32, row as u32);
            tiles.push(TileCode::new(if symbol == '#' { 1 } else { 12 }));
            let kind = match symbol {
                'P' => EntityKind::Player,
                'S' => EntityKind::Skull,
                'D' => EntityKind::Door,
                'K' => EntityKind::Key,
                _ => continue,
            };
            placements.push(Placement {
                kind,
                position: tile_center(cell, 1.0),
            });
        }
    }

    LevelLayout {
        columns: rows[0].len() as u32,
        rows: rows.len() as u32,
        tile_length: 1.0,
        tiles,
        placements,
    }
}

fn world_with(rows: &[&str]) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadLevel {
            layout: level(rows),
        },
        &mut events,
    );
    world
}

fn alert_all(world: &mut World) {
    let ids: Vec<PursuerId> = query::pursuer_view(world)
        .iter()
        .map(|pursuer| pursuer.id)
        .collect();
    let mut events = Vec::new();
    for pursuer in ids {
        world::apply(world, Command::AlertPursuer { pursuer }, &mut events);
    }
}

fn run_ticks(world: &mut World, pursuit: &mut Pursuit, ticks: usize) -> Vec<Event> {
    let mut log = Vec::new();
    let mut commands = Vec::new();
    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt: TICK }, &mut events);

        commands.clear();
        pursuit.handle(
            &events,
            &query::pursuer_view(world),
            query::player_cell(world),
            query::tile_view(world),
            query::occupancy_view(world),
            &mut commands,
        );
        for command in commands.drain(..) {
            world::apply(world, command, &mut events);
        }
        log.extend(events);
    }
    log
}

#[test]
fn chasing_pursuer_closes_in_and_catches_the_player() {
    let mut world = world_with(&["#######", "#P...S#", "#######"]);
    alert_all(&mut world);
    let mut pursuit = Pursuit::new(1);

    let log = run_ticks(&mut world, &mut pursuit, 40);

    let advances: Vec<TileCoord> = log
        .iter()
        .filter_map(|event| match event {
            Event::PursuerAdvanced { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        advances,
        vec![
            TileCoord::new(4, 1),
            TileCoord::new(3, 1),
            TileCoord::new(2, 1)
        ]
    );
    assert!(log.contains(&Event::PlayerCaught {
        pursuer: PursuerId::new(0),
        cell: TileCoord::new(1, 1),
    }));
    assert_eq!(query::status(&world), LevelStatus::Lost);
}

#[test]
fn chasing_pursuer_crosses_a_key_in_the_corridor() {
    let mut world = world_with(&["#######", "#S.K.P#", "#######"]);
    alert_all(&mut world);
    let mut pursuit = Pursuit::new(9);

    let log = run_ticks(&mut world, &mut pursuit, 40);

    let advances: Vec<TileCoord> = log
        .iter()
        .filter_map(|event| match event {
            Event::PursuerAdvanced { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        advances,
        vec![
            TileCoord::new(2, 1),
            TileCoord::new(3, 1),
            TileCoord::new(4, 1)
        ]
    );
    assert_eq!(query::status(&world), LevelStatus::Lost);
    assert_eq!(query::keys(&world), &[TileCoord::new(3, 1)]);
    assert_eq!(
        query::occupied_tiles(&world),
        query::occupying_entities(&world)
    );
}

#[test]
fn chase_without_a_path_falls_back_to_wandering() {
    let mut world = world_with(&["#######", "#PD.S.#", "#######"]);
    alert_all(&mut world);
    let mut pursuit = Pursuit::new(3);
    let mut commands = Vec::new();

    for _ in 0..4 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: TICK }, &mut events);
        commands.clear();
        pursuit.handle(
            &events,
            &query::pursuer_view(&world),
            query::player_cell(&world),
            query::tile_view(&world),
            query::occupancy_view(&world),
            &mut commands,
        );
    }

    assert_eq!(commands.len(), 1);
    assert!(matches!(
        commands[0],
        Command::StepPursuer {
            direction: Direction::East | Direction::West,
            ..
        }
    ));
}

#[test]
fn pursuers_wait_for_their_step_delay() {
    let mut world = world_with(&["#######", "#P...S#", "#######"]);
    alert_all(&mut world);
    let mut pursuit = Pursuit::new(5);

    let log = run_ticks(&mut world, &mut pursuit, 3);

    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::PursuerAdvanced { .. })));
}

#[test]
fn deterministic_replay_with_the_same_seed() {
    let rows = [
        "##########",
        "#P.......#",
        "#........#",
        "#....S...#",
        "#..S.....#",
        "#......S.#",
        "##########",
    ];

    let replay = |seed: u64| {
        let mut world = world_with(&rows);
        let mut pursuit = Pursuit::new(seed);
        run_ticks(&mut world, &mut pursuit, 80)
    };

    let first = replay(42);
    let second = replay(42);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::PursuerAdvanced { .. })));
}
