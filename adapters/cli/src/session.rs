//! Drives a single level through the fixed-step tick pipeline.

use std::{collections::VecDeque, time::Duration};

use anyhow::{bail, Result};
use crypt_crawler_core::{Command, Direction, Event, LevelLayout, LevelStatus};
use crypt_crawler_system_clock::SimulationClock;
use crypt_crawler_system_pursuit::Pursuit;
use crypt_crawler_system_visibility::Visibility;
use crypt_crawler_world::{self as world, query, World};
use tracing::{debug, info};

use crate::config::SimulationConfig;

/// One scripted player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Intent {
    Move(Direction),
    /// Stands still for one player move delay.
    Wait,
}

/// Scripted player intents consumed whenever the player is ready to move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MoveScript {
    intents: VecDeque<Intent>,
}

impl MoveScript {
    /// Parses a string over `U D L R .`; whitespace is ignored.
    pub(crate) fn parse(script: &str) -> Result<Self> {
        let mut intents = VecDeque::new();
        for symbol in script.chars().filter(|symbol| !symbol.is_whitespace()) {
            let intent = match symbol.to_ascii_uppercase() {
                'U' => Intent::Move(Direction::North),
                'D' => Intent::Move(Direction::South),
                'L' => Intent::Move(Direction::West),
                'R' => Intent::Move(Direction::East),
                '.' => Intent::Wait,
                other => bail!("unknown move `{other}`; expected one of U, D, L, R or ."),
            };
            intents.push_back(intent);
        }

        Ok(Self { intents })
    }

    fn next_intent(&mut self) -> Option<Intent> {
        self.intents.pop_front()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.intents.len()
    }
}

/// How a level session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Cleared,
    Lost,
    OutOfFrames,
}

/// Owns the world and systems for one level.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    clock: SimulationClock,
    visibility: Visibility,
    pursuit: Pursuit,
    events: Vec<Event>,
    commands: Vec<Command>,
    move_delay: Duration,
    wait: Duration,
    ticks: u64,
}

impl Session {
    pub(crate) fn new(config: &SimulationConfig, layout: LevelLayout) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(&mut world, config.timing_command(), &mut events);
        world::apply(&mut world, Command::LoadLevel { layout }, &mut events);

        Self {
            world,
            clock: config.clock(),
            visibility: Visibility::new(),
            pursuit: Pursuit::new(config.rng_seed),
            events,
            commands: Vec::new(),
            move_delay: config.player_move_delay(),
            wait: Duration::ZERO,
            ticks: 0,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs frames of `frame_dt` until the level ends or `max_frames` elapse.
    pub(crate) fn play(
        &mut self,
        script: &mut MoveScript,
        frame_dt: Duration,
        max_frames: u64,
    ) -> Outcome {
        for _ in 0..max_frames {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            self.run_frame(script, frame_dt);
        }

        self.outcome().unwrap_or(Outcome::OutOfFrames)
    }

    fn outcome(&self) -> Option<Outcome> {
        match query::status(&self.world) {
            LevelStatus::InProgress => None,
            LevelStatus::Cleared => Some(Outcome::Cleared),
            LevelStatus::Lost => Some(Outcome::Lost),
        }
    }

    fn run_frame(&mut self, script: &mut MoveScript, frame_dt: Duration) {
        let plan = self.clock.advance(frame_dt);
        for _ in 0..plan.ticks {
            self.tick(script);
        }
    }

    fn tick(&mut self, script: &mut MoveScript) {
        self.events.clear();
        self.ticks += 1;
        let dt = self.clock.tick_duration();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        self.commands.clear();
        self.visibility.handle(
            &self.events,
            &query::pursuer_view(&self.world),
            query::tile_view(&self.world),
            query::occupancy_view(&self.world),
            &mut self.commands,
        );
        self.flush_commands();

        self.pursuit.handle(
            &self.events,
            &query::pursuer_view(&self.world),
            query::player_cell(&self.world),
            query::tile_view(&self.world),
            query::occupancy_view(&self.world),
            &mut self.commands,
        );
        self.flush_commands();

        self.wait = self.wait.saturating_sub(dt);
        let ready = self.wait.is_zero()
            && query::player(&self.world).is_some_and(|player| player.ready_to_move);
        if ready && query::status(&self.world) == LevelStatus::InProgress {
            match script.next_intent() {
                Some(Intent::Move(direction)) => {
                    self.commands.push(Command::MovePlayer { direction });
                    self.flush_commands();
                }
                Some(Intent::Wait) => self.wait = self.move_delay,
                None => {}
            }
        }

        for event in &self.events {
            match event {
                Event::TimeAdvanced { .. } | Event::AnimationAdvanced { .. } => {}
                Event::LevelStatusChanged { status } => {
                    info!(?status, tick = self.ticks, "level finished");
                }
                other => debug!(tick = self.ticks, event = ?other, "world event"),
            }
        }
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypt_crawler_core::TileCoord;
    use crypt_crawler_level::parse_level;

    const FRAME: Duration = Duration::from_millis(16);

    fn map(rows: &[&str]) -> String {
        let mut text = format!(
            "[header]\nwidth={}\nheight={}\n\n[layer]\ndata=\n",
            rows[0].len(),
            rows.len()
        );
        let mut entities = String::new();
        for (row, line) in rows.iter().enumerate() {
            let codes: Vec<&str> = line
                .chars()
                .map(|symbol| if symbol == '#' { "2" } else { "13" })
                .collect();
            text.push_str(&codes.join(","));
            text.push('\n');

            for (column, symbol) in line.chars().enumerate() {
                let label = match symbol {
                    'P' => "Player",
                    'S' => "Skull",
                    'K' => "Key",
                    'D' => "Door",
                    'E' => "Exit",
                    _ => continue,
                };
                entities.push_str(&format!(
                    "[Entity]\ntype={label}\nlocation={column},{row},1,1\n\n"
                ));
            }
        }
        text.push('\n');
        text.push_str(&entities);
        text
    }

    fn session(rows: &[&str], config: &SimulationConfig) -> Session {
        let layout = parse_level(&map(rows), config.tile_length).expect("test map parses");
        Session::new(config, layout)
    }

    #[test]
    fn scripted_player_reaches_the_exit() {
        let config = SimulationConfig::default();
        let mut session = session(&["#######", "#PKDE.#", "#######"], &config);
        let mut script = MoveScript::parse("RRRR").expect("script parses");

        let outcome = session.play(&mut script, FRAME, 600);

        assert_eq!(outcome, Outcome::Cleared);
        assert_eq!(script.remaining(), 0);
        assert!(query::doors(session.world()).is_empty());
    }

    #[test]
    fn idle_player_next_to_a_skull_is_caught() {
        let config = SimulationConfig::default();
        let mut session = session(&["######", "#P..S#", "######"], &config);

        let outcome = session.play(&mut MoveScript::default(), FRAME, 600);

        assert_eq!(outcome, Outcome::Lost);
    }

    #[test]
    fn attacking_the_skull_first_keeps_the_player_alive() {
        let config = SimulationConfig {
            pursuer_step_delay_ms: 10_000,
            ..SimulationConfig::default()
        };
        let mut session = session(&["######", "#PS.E#", "######"], &config);
        let mut script = MoveScript::parse("RRRR").expect("script parses");

        let outcome = session.play(&mut script, FRAME, 600);

        assert_eq!(outcome, Outcome::Cleared);
        assert!(query::pursuer_view(session.world()).is_empty());
    }

    #[test]
    fn frame_budget_bounds_the_session() {
        let config = SimulationConfig::default();
        let mut session = session(&["#####", "#P.E#", "#####"], &config);

        let outcome = session.play(&mut MoveScript::default(), FRAME, 10);

        assert_eq!(outcome, Outcome::OutOfFrames);
        assert_eq!(session.ticks(), query::tick_index(session.world()));
    }

    #[test]
    fn stalled_frames_are_capped_by_the_clock() {
        let config = SimulationConfig::default();
        let mut session = session(&["#####", "#P.E#", "#####"], &config);

        let _ = session.play(&mut MoveScript::default(), Duration::from_secs(1), 2);

        assert_eq!(session.ticks(), 2 * u64::from(config.max_ticks_per_frame));
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let rows = [
            "###########",
            "#P........#",
            "#.........#",
            "#....S....#",
            "#..S....S.#",
            "#........E#",
            "###########",
        ];
        let config = SimulationConfig {
            rng_seed: 77,
            ..SimulationConfig::default()
        };
        let run = || {
            let mut session = session(&rows, &config);
            let mut script = MoveScript::parse("DDRR..RRDD").expect("script parses");
            let outcome = session.play(&mut script, FRAME, 400);
            (outcome, session.ticks(), query::pursuer_view(session.world()).into_vec())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn move_script_rejects_unknown_symbols() {
        assert!(MoveScript::parse("UDX").is_err());

        let mut script = MoveScript::parse("u . r").expect("script parses");
        assert_eq!(script.remaining(), 3);
        assert_eq!(script.next_intent(), Some(Intent::Move(Direction::North)));
        assert_eq!(script.next_intent(), Some(Intent::Wait));
        assert_eq!(script.next_intent(), Some(Intent::Move(Direction::East)));
        assert_eq!(script.next_intent(), None);
    }

    #[test]
    fn wait_holds_the_player_for_one_move_delay() {
        let config = SimulationConfig::default();
        let rows = ["########", "#P.....#", "########"];
        let mut waiting = session(&rows, &config);
        let mut direct = session(&rows, &config);
        let mut with_wait = MoveScript::parse(".R").expect("script parses");
        let mut without_wait = MoveScript::parse("R").expect("script parses");

        // 12 ticks at 60 Hz is 200 ms, one default move delay.
        for _ in 0..12 {
            waiting.tick(&mut with_wait);
            direct.tick(&mut without_wait);
        }

        assert_eq!(query::player_cell(direct.world()), Some(TileCoord::new(2, 1)));
        assert_eq!(query::player_cell(waiting.world()), Some(TileCoord::new(1, 1)));
        assert_eq!(with_wait.remaining(), 1);

        for _ in 0..2 {
            waiting.tick(&mut with_wait);
        }
        assert_eq!(query::player_cell(waiting.world()), Some(TileCoord::new(2, 1)));
    }
}
