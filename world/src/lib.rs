#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Crypt Crawler.
//!
//! The world owns the tile grid, the occupancy grid and every entity
//! collection of the active level. All mutation flows through [`apply`];
//! read access goes through the [`query`] module. Entity moves always vacate
//! the source tile, update the entity, then occupy the destination tile, so
//! the occupancy grid never holds a stale or duplicate tag.

mod entities;
mod grid;

use std::time::Duration;

use crypt_crawler_core::{
    Command, Direction, EntityKind, Event, LevelLayout, LevelStatus, Occupant, Placement,
    PursuerId, PursuerState, TileCoord, ANIMATION_FRAME_COUNT, WELCOME_BANNER,
};
use crypt_crawler_system_blocking as blocking;
use tracing::{debug, info, warn};

use entities::{AnimationClock, Player, Pursuer};
pub use entities::{Prop, PropKind};
use grid::OccupancyGrid;
pub use grid::TileGrid;

const DEFAULT_TILE_LENGTH: f32 = 0.1;
const DEFAULT_PLAYER_MOVE_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_PURSUER_STEP_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_ANIMATION_FRAME: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
struct Timing {
    player_move_delay: Duration,
    pursuer_step_delay: Duration,
    animation_frame_duration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            player_move_delay: DEFAULT_PLAYER_MOVE_DELAY,
            pursuer_step_delay: DEFAULT_PURSUER_STEP_DELAY,
            animation_frame_duration: DEFAULT_ANIMATION_FRAME,
        }
    }
}

/// Represents the authoritative Crypt Crawler world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tile_grid: TileGrid,
    occupancy: OccupancyGrid,
    player: Option<Player>,
    pursuers: Vec<Pursuer>,
    props: Vec<Prop>,
    keys: Vec<TileCoord>,
    doors: Vec<TileCoord>,
    exit: Option<TileCoord>,
    timing: Timing,
    animation: AnimationClock,
    status: LevelStatus,
    tick_index: u64,
}

impl World {
    /// Creates an empty world awaiting its first level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            tile_grid: TileGrid::empty(DEFAULT_TILE_LENGTH),
            occupancy: OccupancyGrid::new(0, 0),
            player: None,
            pursuers: Vec::new(),
            props: Vec::new(),
            keys: Vec::new(),
            doors: Vec::new(),
            exit: None,
            timing: Timing::default(),
            animation: AnimationClock::default(),
            status: LevelStatus::InProgress,
            tick_index: 0,
        }
    }

    fn load_level(&mut self, layout: LevelLayout, out_events: &mut Vec<Event>) {
        let Some(tile_grid) = TileGrid::from_layout(&layout) else {
            warn!(
                columns = layout.columns,
                rows = layout.rows,
                tiles = layout.tiles.len(),
                "rejected level layout with inconsistent dimensions"
            );
            return;
        };

        self.occupancy = OccupancyGrid::new(tile_grid.columns(), tile_grid.rows());
        self.tile_grid = tile_grid;
        self.player = None;
        self.pursuers.clear();
        self.props.clear();
        self.keys.clear();
        self.doors.clear();
        self.exit = None;
        self.animation = AnimationClock::default();
        self.status = LevelStatus::InProgress;
        self.tick_index = 0;

        for placement in &layout.placements {
            self.place(placement);
        }
        self.refresh_blocked();

        let pursuers = u32::try_from(self.pursuers.len()).unwrap_or(u32::MAX);
        info!(
            columns = self.tile_grid.columns(),
            rows = self.tile_grid.rows(),
            pursuers,
            has_player = self.player.is_some(),
            "level loaded"
        );
        out_events.push(Event::LevelLoaded {
            columns: self.tile_grid.columns(),
            rows: self.tile_grid.rows(),
            pursuers,
        });
    }

    fn place(&mut self, placement: &Placement) {
        let Some(cell) = self.tile_grid.world_to_tile(placement.position) else {
            warn!(
                kind = placement.kind.label(),
                x = placement.position.x,
                y = placement.position.y,
                "skipped placement outside the grid"
            );
            return;
        };

        match placement.kind {
            EntityKind::Torch => self.props.push(Prop::new(PropKind::Torch, cell)),
            EntityKind::SideTorch => self.props.push(Prop::new(PropKind::SideTorch, cell)),
            EntityKind::Exit => self.exit = Some(cell),
            EntityKind::Player => {
                if self.player.is_some() {
                    warn!(?cell, "skipped duplicate player placement");
                } else if self.claim(cell, Occupant::Player, placement.kind) {
                    self.player = Some(Player::at(cell));
                }
            }
            EntityKind::Skull => {
                if self.claim(cell, Occupant::Pursuer, placement.kind) {
                    let id = PursuerId::new(u32::try_from(self.pursuers.len()).unwrap_or(u32::MAX));
                    self.pursuers.push(Pursuer::at(id, cell));
                }
            }
            EntityKind::Key => {
                if self.claim(cell, Occupant::Key, placement.kind) {
                    self.keys.push(cell);
                }
            }
            EntityKind::Door => {
                if self.claim(cell, Occupant::Door, placement.kind) {
                    self.doors.push(cell);
                }
            }
        }
    }

    fn claim(&mut self, cell: TileCoord, occupant: Occupant, kind: EntityKind) -> bool {
        if !self.occupancy.is_vacant(cell) {
            warn!(
                kind = kind.label(),
                ?cell,
                "skipped placement on an occupied tile"
            );
            return false;
        }

        self.occupancy.occupy(cell, occupant);
        true
    }

    fn refresh_blocked(&mut self) {
        let tiles = self.tile_grid.view();
        let occupancy = self.occupancy.view();
        if let Some(player) = self.player.as_mut() {
            player.blocked = blocking::resolve(player.cell, tiles, occupancy);
        }
        for pursuer in &mut self.pursuers {
            pursuer.blocked = blocking::resolve(pursuer.cell, tiles, occupancy);
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            dt,
            tick: self.tick_index,
        });

        if let Some(frame) = self.animation.advance(
            dt,
            self.timing.animation_frame_duration,
            ANIMATION_FRAME_COUNT,
        ) {
            out_events.push(Event::AnimationAdvanced { frame });
        }

        if let Some(player) = self.player.as_mut() {
            player.cooldown = player.cooldown.saturating_sub(dt);
        }

        if self.status == LevelStatus::InProgress {
            let step_delay = self.timing.pursuer_step_delay;
            for pursuer in &mut self.pursuers {
                pursuer.accumulator = pursuer.accumulator.saturating_add(dt).min(step_delay);
            }
        }

        self.refresh_blocked();
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.status != LevelStatus::InProgress {
            return;
        }

        let delay = self.timing.player_move_delay;
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if !player.cooldown.is_zero() {
            return;
        }
        player.cooldown = delay;
        player.face(direction);
        let from = player.cell;

        let tiles = self.tile_grid.view();
        let occupancy = self.occupancy.view();
        let target = from.neighbor(direction);
        if blocking::is_blocked(from, direction, tiles, occupancy) {
            let obstacle = target.and_then(|cell| self.occupancy.occupant(cell).map(|o| (cell, o)));
            self.resolve_blocked_move(direction, obstacle, out_events);
        } else if let Some(target) = target {
            self.advance_player(from, target, out_events);
        }

        if let Some(player) = self.player.as_mut() {
            player.blocked =
                blocking::resolve(player.cell, self.tile_grid.view(), self.occupancy.view());
        }
    }

    fn resolve_blocked_move(
        &mut self,
        direction: Direction,
        obstacle: Option<(TileCoord, Occupant)>,
        out_events: &mut Vec<Event>,
    ) {
        let keys_held = self.player.as_ref().map_or(0, |player| player.keys_held);
        match obstacle {
            Some((cell, Occupant::Pursuer)) => self.slay_pursuer(cell, out_events),
            Some((cell, Occupant::Door)) if keys_held > 0 => self.unlock_door(cell, out_events),
            _ => out_events.push(Event::PlayerBlocked { direction }),
        }
    }

    fn slay_pursuer(&mut self, cell: TileCoord, out_events: &mut Vec<Event>) {
        let Some(index) = self.pursuers.iter().position(|pursuer| pursuer.cell == cell) else {
            return;
        };

        let pursuer = self.pursuers.remove(index);
        self.release(cell);
        debug!(pursuer = pursuer.id.get(), ?cell, "pursuer slain");
        out_events.push(Event::PursuerSlain {
            pursuer: pursuer.id,
            cell,
        });
    }

    fn unlock_door(&mut self, cell: TileCoord, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.as_mut() else {
            return;
        };

        player.keys_held -= 1;
        self.doors.retain(|door| *door != cell);
        self.occupancy.vacate(cell);
        debug!(?cell, keys_held = player.keys_held, "door unlocked");
        out_events.push(Event::DoorUnlocked { cell });
    }

    fn advance_player(&mut self, from: TileCoord, to: TileCoord, out_events: &mut Vec<Event>) {
        if self.occupancy.occupant(to) == Some(Occupant::Key) {
            self.occupancy.vacate(to);
            self.keys.retain(|key| *key != to);
            if let Some(player) = self.player.as_mut() {
                player.keys_held = player.keys_held.saturating_add(1);
                out_events.push(Event::KeyCollected {
                    cell: to,
                    keys_held: player.keys_held,
                });
            }
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };
        self.occupancy.vacate(from);
        player.cell = to;
        self.occupancy.occupy(to, Occupant::Player);
        out_events.push(Event::PlayerMoved { from, to });

        if self.exit == Some(to) {
            self.set_status(LevelStatus::Cleared, out_events);
        }
    }

    fn alert_pursuer(&mut self, id: PursuerId, out_events: &mut Vec<Event>) {
        let Some(pursuer) = self.pursuers.iter_mut().find(|pursuer| pursuer.id == id) else {
            return;
        };

        if pursuer.state == PursuerState::Idle {
            pursuer.state = PursuerState::Chase;
            debug!(pursuer = id.get(), cell = ?pursuer.cell, "pursuer alerted");
            out_events.push(Event::PursuerAlerted { pursuer: id });
        }
    }

    fn step_pursuer(&mut self, id: PursuerId, direction: Direction, out_events: &mut Vec<Event>) {
        if self.status != LevelStatus::InProgress {
            return;
        }

        let step_delay = self.timing.pursuer_step_delay;
        let Some(index) = self.pursuers.iter().position(|pursuer| pursuer.id == id) else {
            return;
        };
        let from = self.pursuers[index].cell;
        if self.pursuers[index].accumulator < step_delay {
            return;
        }

        let Some(target) = from.neighbor(direction) else {
            return;
        };
        if self.tile_grid.is_solid(target) {
            return;
        }

        match self.occupancy.occupant(target) {
            None | Some(Occupant::Key) => {
                self.release(from);
                let pursuer = &mut self.pursuers[index];
                pursuer.cell = target;
                pursuer.face(direction);
                pursuer.accumulator -= step_delay;
                self.occupancy.occupy(target, Occupant::Pursuer);
                out_events.push(Event::PursuerAdvanced {
                    pursuer: id,
                    from,
                    to: target,
                });
            }
            Some(Occupant::Player) => {
                let pursuer = &mut self.pursuers[index];
                pursuer.face(direction);
                pursuer.accumulator -= step_delay;
                info!(pursuer = id.get(), cell = ?target, "player caught");
                out_events.push(Event::PlayerCaught {
                    pursuer: id,
                    cell: target,
                });
                self.set_status(LevelStatus::Lost, out_events);
            }
            Some(Occupant::Pursuer | Occupant::Door) => return,
        }

        let tiles = self.tile_grid.view();
        let occupancy = self.occupancy.view();
        let pursuer = &mut self.pursuers[index];
        pursuer.blocked = blocking::resolve(pursuer.cell, tiles, occupancy);
    }

    /// Clears a tile left by a pursuer, restoring the tag of a key it covered.
    fn release(&mut self, cell: TileCoord) {
        self.occupancy.vacate(cell);
        if self.keys.contains(&cell) {
            self.occupancy.occupy(cell, Occupant::Key);
        }
    }

    fn set_status(&mut self, status: LevelStatus, out_events: &mut Vec<Event>) {
        if self.status == status {
            return;
        }

        self.status = status;
        info!(?status, tick = self.tick_index, "level status changed");
        out_events.push(Event::LevelStatusChanged { status });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureTiming {
            player_move_delay,
            pursuer_step_delay,
            animation_frame_duration,
        } => {
            world.timing = Timing {
                player_move_delay,
                pursuer_step_delay,
                animation_frame_duration,
            };
        }
        Command::LoadLevel { layout } => world.load_level(layout, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::AlertPursuer { pursuer } => world.alert_pursuer(pursuer, out_events),
        Command::StepPursuer { pursuer, direction } => {
            world.step_pursuer(pursuer, direction, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use crypt_crawler_core::{
        LevelStatus, OccupancyView, PlayerSnapshot, PursuerView, TileCoord, TileView,
    };

    use super::{Prop, TileGrid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the active level's tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tile_grid
    }

    /// Borrows the tile layout as a system-facing view.
    #[must_use]
    pub fn tile_view(world: &World) -> TileView<'_> {
        world.tile_grid.view()
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.occupancy.view()
    }

    /// Number of tiles currently holding an occupant tag.
    #[must_use]
    pub fn occupied_tiles(world: &World) -> usize {
        world.occupancy.occupied_count()
    }

    /// Number of tracked entities that hold an occupancy tag.
    ///
    /// A key covered by a pursuer holds no tag until the pursuer moves on.
    #[must_use]
    pub fn occupying_entities(world: &World) -> usize {
        let exposed_keys = world
            .keys
            .iter()
            .filter(|key| !world.pursuers.iter().any(|pursuer| pursuer.cell == **key))
            .count();
        usize::from(world.player.is_some()) + world.pursuers.len() + exposed_keys + world.doors.len()
    }

    /// Captures the player's state, if the level placed one.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        world.player.as_ref().map(super::Player::snapshot)
    }

    /// Tile occupied by the player, if any.
    #[must_use]
    pub fn player_cell(world: &World) -> Option<TileCoord> {
        world.player.as_ref().map(|player| player.cell)
    }

    /// Captures a read-only view of the pursuers inhabiting the level.
    #[must_use]
    pub fn pursuer_view(world: &World) -> PursuerView {
        let step_delay = world.timing.pursuer_step_delay;
        PursuerView::from_snapshots(
            world
                .pursuers
                .iter()
                .map(|pursuer| pursuer.snapshot(step_delay))
                .collect(),
        )
    }

    /// Decorative props placed by the level.
    #[must_use]
    pub fn props(world: &World) -> &[Prop] {
        &world.props
    }

    /// Tiles holding keys that have not been collected.
    #[must_use]
    pub fn keys(world: &World) -> &[TileCoord] {
        &world.keys
    }

    /// Tiles holding doors that remain locked.
    #[must_use]
    pub fn doors(world: &World) -> &[TileCoord] {
        &world.doors
    }

    /// Tile holding the exit ladder, if the level has one.
    #[must_use]
    pub fn exit(world: &World) -> Option<TileCoord> {
        world.exit
    }

    /// Current progress of the level.
    #[must_use]
    pub fn status(world: &World) -> LevelStatus {
        world.status
    }

    /// Frame index of the shared animation cycle.
    #[must_use]
    pub fn animation_frame(world: &World) -> u8 {
        world.animation.frame()
    }

    /// Number of ticks processed since the level loaded.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypt_crawler_core::{tile_center, TileCode};

    const FLOOR: TileCode = TileCode::new(12);
    const WALL: TileCode = TileCode::new(1);
    const TICK: Duration = Duration::from_millis(50);

    fn layout(rows: &[&str]) -> LevelLayout {
        let tile_length = 1.0;
        let mut tiles = Vec::new();
        let mut placements = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            for (column, symbol) in line.chars().enumerate() {
                let cell = TileCoord::new(column as u32, row as u32);
                tiles.push(if symbol == '#' { WALL } else { FLOOR });
                let kind = match symbol {
                    'P' => EntityKind::Player,
                    'S' => EntityKind::Skull,
                    'K' => EntityKind::Key,
                    'D' => EntityKind::Door,
                    'E' => EntityKind::Exit,
                    'T' => EntityKind::Torch,
                    _ => continue,
                };
                placements.push(Placement {
                    kind,
                    position: tile_center(cell, tile_length),
                });
            }
        }

        LevelLayout {
            columns: rows[0].len() as u32,
            rows: rows.len() as u32,
            tile_length,
            tiles,
            placements,
        }
    }

    fn loaded(rows: &[&str]) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadLevel {
                layout: layout(rows),
            },
            &mut events,
        );
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    fn move_player(world: &mut World, direction: Direction) -> Vec<Event> {
        let events = run(world, Command::MovePlayer { direction });
        for _ in 0..4 {
            let _ = run(world, Command::Tick { dt: TICK });
        }
        events
    }

    fn assert_occupancy_consistent(world: &World) {
        assert_eq!(
            query::occupied_tiles(world),
            query::occupying_entities(world)
        );
    }

    #[test]
    fn load_level_places_entities_and_occupancy() {
        let world = loaded(&["#####", "#PKS#", "#DTE#", "#####"]);

        assert_eq!(query::player_cell(&world), Some(TileCoord::new(1, 1)));
        assert_eq!(query::pursuer_view(&world).len(), 1);
        assert_eq!(query::keys(&world), &[TileCoord::new(2, 1)]);
        assert_eq!(query::doors(&world), &[TileCoord::new(1, 2)]);
        assert_eq!(query::exit(&world), Some(TileCoord::new(3, 2)));
        assert_eq!(query::props(&world).len(), 1);
        assert_eq!(query::occupied_tiles(&world), 4);
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn load_level_rejects_inconsistent_layout_without_committing() {
        let mut world = loaded(&["#####", "#P..#", "#####"]);
        let mut broken = layout(&["###", "#P#", "###"]);
        let _ = broken.tiles.pop();

        let events = run(&mut world, Command::LoadLevel { layout: broken });

        assert!(events.is_empty());
        assert_eq!(query::tile_grid(&world).columns(), 5);
        assert_eq!(query::player_cell(&world), Some(TileCoord::new(1, 1)));
    }

    #[test]
    fn load_level_replaces_previous_collections() {
        let mut world = loaded(&["#####", "#PSS#", "#####"]);
        let events = run(
            &mut world,
            Command::LoadLevel {
                layout: layout(&["####", "#P.#", "####"]),
            },
        );

        assert_eq!(
            events,
            vec![Event::LevelLoaded {
                columns: 4,
                rows: 3,
                pursuers: 0
            }]
        );
        assert!(query::pursuer_view(&world).is_empty());
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn player_moves_into_open_floor() {
        let mut world = loaded(&["#####", "#P..#", "#####"]);

        let events = move_player(&mut world, Direction::East);

        assert!(events.contains(&Event::PlayerMoved {
            from: TileCoord::new(1, 1),
            to: TileCoord::new(2, 1),
        }));
        let occupancy = query::occupancy_view(&world);
        assert_eq!(occupancy.occupant(TileCoord::new(1, 1)), None);
        assert_eq!(
            occupancy.occupant(TileCoord::new(2, 1)),
            Some(Occupant::Player)
        );
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn player_move_waits_for_delay() {
        let mut world = loaded(&["######", "#P...#", "######"]);

        let first = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::East,
            },
        );
        let second = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::East,
            },
        );

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(query::player_cell(&world), Some(TileCoord::new(2, 1)));
        assert!(!query::player(&world).expect("player").ready_to_move);
    }

    #[test]
    fn walking_into_a_wall_reports_blocked_and_updates_facing() {
        let mut world = loaded(&["###", "#P#", "###"]);

        let events = move_player(&mut world, Direction::West);

        assert!(events.contains(&Event::PlayerBlocked {
            direction: Direction::West
        }));
        let player = query::player(&world).expect("player");
        assert!(!player.facing_right);
        assert_eq!(player.cell, TileCoord::new(1, 1));
    }

    #[test]
    fn key_is_collected_and_spent_on_door() {
        let mut world = loaded(&["######", "#PKDE#", "######"]);

        let pickup = move_player(&mut world, Direction::East);
        assert!(pickup.contains(&Event::KeyCollected {
            cell: TileCoord::new(2, 1),
            keys_held: 1,
        }));
        assert_occupancy_consistent(&world);

        let unlock = move_player(&mut world, Direction::East);
        assert_eq!(
            unlock,
            vec![Event::DoorUnlocked {
                cell: TileCoord::new(3, 1)
            }]
        );
        assert_eq!(query::player_cell(&world), Some(TileCoord::new(2, 1)));
        assert!(query::doors(&world).is_empty());
        assert_occupancy_consistent(&world);

        let _ = move_player(&mut world, Direction::East);
        let exit = move_player(&mut world, Direction::East);
        assert!(exit.contains(&Event::LevelStatusChanged {
            status: LevelStatus::Cleared
        }));
        assert_eq!(query::status(&world), LevelStatus::Cleared);
    }

    #[test]
    fn door_without_key_blocks() {
        let mut world = loaded(&["#####", "#PD.#", "#####"]);

        let events = move_player(&mut world, Direction::East);

        assert!(events.contains(&Event::PlayerBlocked {
            direction: Direction::East
        }));
        assert_eq!(query::doors(&world).len(), 1);
    }

    #[test]
    fn moving_into_a_pursuer_attacks_it() {
        let mut world = loaded(&["#####", "#PS.#", "#####"]);

        let events = move_player(&mut world, Direction::East);

        assert!(events.contains(&Event::PursuerSlain {
            pursuer: PursuerId::new(0),
            cell: TileCoord::new(2, 1),
        }));
        assert!(query::pursuer_view(&world).is_empty());
        assert_eq!(query::player_cell(&world), Some(TileCoord::new(1, 1)));
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn pursuer_steps_only_after_accumulating_step_delay() {
        let mut world = loaded(&["######", "#P..S#", "######"]);
        let pursuer = PursuerId::new(0);
        let step = Command::StepPursuer {
            pursuer,
            direction: Direction::West,
        };

        assert!(run(&mut world, step.clone()).is_empty());

        for _ in 0..4 {
            let _ = run(&mut world, Command::Tick { dt: TICK });
        }
        let events = run(&mut world, step.clone());

        assert_eq!(
            events,
            vec![Event::PursuerAdvanced {
                pursuer,
                from: TileCoord::new(4, 1),
                to: TileCoord::new(3, 1),
            }]
        );
        assert!(run(&mut world, step).is_empty());
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn pursuer_reaching_player_ends_level() {
        let mut world = loaded(&["#####", "#PS.#", "#####"]);
        for _ in 0..4 {
            let _ = run(&mut world, Command::Tick { dt: TICK });
        }

        let events = run(
            &mut world,
            Command::StepPursuer {
                pursuer: PursuerId::new(0),
                direction: Direction::West,
            },
        );

        assert!(events.contains(&Event::PlayerCaught {
            pursuer: PursuerId::new(0),
            cell: TileCoord::new(1, 1),
        }));
        assert_eq!(query::status(&world), LevelStatus::Lost);
        assert_occupancy_consistent(&world);

        let ignored = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::South,
            },
        );
        assert!(ignored.is_empty());
    }

    #[test]
    fn pursuer_cannot_enter_pursuers_or_doors() {
        let mut world = loaded(&["######", "#PSSD#", "######"]);
        for _ in 0..4 {
            let _ = run(&mut world, Command::Tick { dt: TICK });
        }

        let into_pursuer = run(
            &mut world,
            Command::StepPursuer {
                pursuer: PursuerId::new(1),
                direction: Direction::West,
            },
        );
        let into_door = run(
            &mut world,
            Command::StepPursuer {
                pursuer: PursuerId::new(1),
                direction: Direction::East,
            },
        );

        assert!(into_pursuer.is_empty());
        assert!(into_door.is_empty());
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn pursuer_walks_over_keys_and_leaves_them_behind() {
        let mut world = loaded(&["######", "#P.KS#", "######"]);
        let pursuer = PursuerId::new(0);
        let key = TileCoord::new(3, 1);
        let step_west = |world: &mut World| {
            for _ in 0..4 {
                let _ = run(world, Command::Tick { dt: TICK });
            }
            run(
                world,
                Command::StepPursuer {
                    pursuer,
                    direction: Direction::West,
                },
            )
        };

        let onto_key = step_west(&mut world);
        assert_eq!(
            onto_key,
            vec![Event::PursuerAdvanced {
                pursuer,
                from: TileCoord::new(4, 1),
                to: key,
            }]
        );
        assert_eq!(
            query::occupancy_view(&world).occupant(key),
            Some(Occupant::Pursuer)
        );
        assert_eq!(query::keys(&world), &[key]);
        assert_occupancy_consistent(&world);

        let _ = step_west(&mut world);
        assert_eq!(
            query::occupancy_view(&world).occupant(key),
            Some(Occupant::Key)
        );
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn slaying_a_pursuer_on_a_key_uncovers_it() {
        let mut world = loaded(&["######", "#P.KS#", "######"]);
        let key = TileCoord::new(3, 1);
        for _ in 0..4 {
            let _ = run(&mut world, Command::Tick { dt: TICK });
        }
        let _ = run(
            &mut world,
            Command::StepPursuer {
                pursuer: PursuerId::new(0),
                direction: Direction::West,
            },
        );
        let _ = move_player(&mut world, Direction::East);

        let events = move_player(&mut world, Direction::East);

        assert!(events.contains(&Event::PursuerSlain {
            pursuer: PursuerId::new(0),
            cell: key,
        }));
        assert_eq!(
            query::occupancy_view(&world).occupant(key),
            Some(Occupant::Key)
        );
        assert_occupancy_consistent(&world);
    }

    #[test]
    fn alerted_pursuer_stays_in_chase() {
        let mut world = loaded(&["#####", "#P.S#", "#####"]);
        let pursuer = PursuerId::new(0);

        let first = run(&mut world, Command::AlertPursuer { pursuer });
        let second = run(&mut world, Command::AlertPursuer { pursuer });
        for _ in 0..100 {
            let _ = run(&mut world, Command::Tick { dt: TICK });
        }

        assert_eq!(first, vec![Event::PursuerAlerted { pursuer }]);
        assert!(second.is_empty());
        let snapshot = query::pursuer_view(&world).into_vec()[0];
        assert_eq!(snapshot.state, PursuerState::Chase);
    }

    #[test]
    fn loaded_level_resolves_blocked_directions() {
        let world = loaded(&["#####", "#PS.#", "#####"]);
        let player = query::player(&world).expect("player");

        assert!(player.blocked.is_blocked(Direction::East));
        assert!(player.blocked.is_blocked(Direction::North));
        assert!(player.blocked.is_blocked(Direction::West));

        let pursuer = query::pursuer_view(&world).into_vec()[0];
        assert!(!pursuer.blocked.is_blocked(Direction::East));
        assert!(!pursuer.blocked.is_blocked(Direction::West));
    }

    #[test]
    fn tick_advances_animation_cycle() {
        let mut world = loaded(&["###", "#P#", "###"]);
        let mut frames = Vec::new();
        for _ in 0..10 {
            for event in run(&mut world, Command::Tick { dt: TICK }) {
                if let Event::AnimationAdvanced { frame } = event {
                    frames.push(frame);
                }
            }
        }

        assert_eq!(frames, vec![1, 2]);
        assert_eq!(query::animation_frame(&world), 2);
        assert_eq!(query::tick_index(&world), 10);
    }

    #[test]
    fn occupancy_stays_consistent_across_move_sequences() {
        let mut world = loaded(&[
            "#######", "#P..K.#", "#.##..#", "#..S.D#", "#######",
        ]);
        let script = [
            Direction::East,
            Direction::East,
            Direction::East,
            Direction::South,
            Direction::South,
            Direction::West,
            Direction::West,
            Direction::North,
        ];

        for direction in script {
            let _ = move_player(&mut world, direction);
            let _ = run(
                &mut world,
                Command::StepPursuer {
                    pursuer: PursuerId::new(0),
                    direction: Direction::West,
                },
            );
            assert_occupancy_consistent(&world);
        }
    }

    #[test]
    fn overlapping_placements_keep_first_occupant() {
        let mut layout = layout(&["####", "#P.#", "####"]);
        let player_position = layout.placements[0].position;
        layout.placements.push(Placement {
            kind: EntityKind::Skull,
            position: player_position,
        });
        let mut world = World::new();

        let _ = run(&mut world, Command::LoadLevel { layout });

        assert!(query::pursuer_view(&world).is_empty());
        assert_occupancy_consistent(&world);
    }
}
