use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::config::GameConfig;
use crate::snake::{Cell, Direction, Snake};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Over,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfCollision,
}

/// What a single tick did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// The round is over, nothing moved.
    Idle,
    Moved,
    /// The head landed on the food and the snake grew by one.
    Ate,
    Crashed(Collision),
    /// The snake filled every tile, no room left for food.
    Cleared,
}

/// Read-only view handed to the renderer.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub status: GameStatus,
    pub snake: &'a [Cell],
    pub food: Cell,
    pub score: usize,
}

pub struct Game {
    config: GameConfig,
    snake: Snake,
    food: Cell,
    status: GameStatus,
    rng: StdRng,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        ensure!(
            config.columns() * config.rows() >= 2,
            "board needs room for both the snake and its food"
        );

        let snake = Snake::new(config.center(), Direction::Right);
        let mut game = Game {
            food: snake.head(),
            snake,
            config,
            status: GameStatus::Running,
            rng,
        };
        game.food = game.spawn_food().unwrap();

        info!(food = ?game.food, "new game");
        Ok(game)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn direction(&self) -> Direction {
        self.snake.get_direction()
    }

    /// Food eaten this round.
    pub fn score(&self) -> usize {
        self.snake.len() - 1
    }

    /// Only perpendicular turns are taken, and only while running.
    pub fn handle_direction(&mut self, direction: Direction) -> bool {
        if self.status != GameStatus::Running {
            return false;
        }

        let accepted = self.snake.set_direction(direction);
        if !accepted {
            debug!(?direction, current = ?self.snake.get_direction(), "turn rejected");
        }
        accepted
    }

    pub fn tick(&mut self) -> Step {
        if self.status == GameStatus::Over {
            return Step::Idle;
        }

        let new_head = self.snake.next_head(self.config.tile_size);
        self.snake.push_head(new_head);

        let mut step = Step::Moved;
        if new_head == self.food {
            match self.spawn_food() {
                Some(food) => {
                    self.food = food;
                    step = Step::Ate;
                }
                None => step = Step::Cleared,
            }
        } else {
            self.snake.drop_tail();
        }

        if let Some(collision) = self.check_collision() {
            step = Step::Crashed(collision);
        }

        if matches!(step, Step::Crashed(_) | Step::Cleared) {
            self.status = GameStatus::Over;
            info!(outcome = ?step, score = self.score(), "game over");
        }

        trace!(head = ?new_head, ?step, "tick");
        step
    }

    /// Starts a fresh round; ignored unless the current one is over.
    pub fn restart(&mut self) -> bool {
        if self.status != GameStatus::Over {
            return false;
        }

        self.snake = Snake::new(self.config.center(), Direction::Right);
        // The board always has a free tile next to a single segment.
        self.food = self.spawn_food().unwrap();
        self.status = GameStatus::Running;

        info!(food = ?self.food, "restarted");
        true
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            status: self.status,
            snake: self.snake.body(),
            food: self.food,
            score: self.score(),
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn check_collision(&self) -> Option<Collision> {
        if self.snake.bites_itself() {
            Some(Collision::SelfCollision)
        } else if !self.config.contains(self.snake.head()) {
            Some(Collision::Wall)
        } else {
            None
        }
    }

    /// Uniform pick among the tiles not covered by the snake.
    fn spawn_food(&mut self) -> Option<Cell> {
        let tile = self.config.tile_size;
        let (columns, rows) = (self.config.columns(), self.config.rows());
        let body = self.snake.body();

        let choices: Vec<Cell> = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| Cell::new(col * tile, row * tile)))
            .filter(|cell| !body.contains(cell))
            .collect();

        choices.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;

    fn seeded(config: GameConfig) -> Game {
        Game::with_rng(config, StdRng::seed_from_u64(7)).unwrap()
    }

    fn small() -> GameConfig {
        GameConfig { board_width: 100, board_height: 100, ..GameConfig::default() }
    }

    /// Lays the snake out along `cells` (head first) heading `direction`.
    fn place_snake(game: &mut Game, cells: &[Cell], direction: Direction) {
        let mut snake = Snake::new(*cells.last().unwrap(), direction);
        for cell in cells.iter().rev().skip(1) {
            snake.push_head(*cell);
        }
        game.snake = snake;
    }

    fn park_food(game: &mut Game, cell: Cell) {
        game.food = cell;
    }

    #[test]
    fn test_initial_state() {
        let game = seeded(GameConfig::default());
        let snap = game.snapshot();

        assert_eq!(snap.status, GameStatus::Running);
        assert_eq!(snap.snake, &[Cell::new(300, 200)][..]);
        assert_eq!(game.direction(), Right);
        assert_ne!(snap.food, Cell::new(300, 200));
        assert!(game.config().contains(snap.food));
        assert_eq!(snap.food.x % 10, 0);
        assert_eq!(snap.food.y % 10, 0);
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn test_first_tick_moves_right() {
        let mut game = seeded(GameConfig::default());
        park_food(&mut game, Cell::new(0, 0));

        assert_eq!(game.tick(), Step::Moved);
        assert_eq!(game.snake.head(), Cell::new(310, 200));
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.status(), GameStatus::Running);
    }

    #[test]
    fn test_length_constant_without_food() {
        let mut game = seeded(GameConfig::default());
        place_snake(
            &mut game,
            &[Cell::new(300, 200), Cell::new(290, 200), Cell::new(280, 200)],
            Right,
        );
        park_food(&mut game, Cell::new(0, 0));

        for _ in 0..5 {
            assert_eq!(game.tick(), Step::Moved);
            assert_eq!(game.snake.len(), 3);
        }
        assert_eq!(game.snake.head(), Cell::new(350, 200));
        assert_eq!(game.snapshot().snake.last(), Some(&Cell::new(330, 200)));
    }

    #[test]
    fn test_eating_grows_and_moves_food() {
        let mut game = seeded(GameConfig::default());
        park_food(&mut game, Cell::new(310, 200));

        assert_eq!(game.tick(), Step::Ate);
        assert_eq!(game.snake.len(), 2);
        assert_eq!(game.score(), 1);
        assert_ne!(game.food, Cell::new(310, 200));
        assert!(!game.snake.body().contains(&game.food));
        assert_eq!(
            game.snapshot().snake,
            &[Cell::new(310, 200), Cell::new(300, 200)][..]
        );
    }

    #[test]
    fn test_turns_follow_axis_rule() {
        let mut game = seeded(GameConfig::default());

        assert!(!game.handle_direction(Left));
        assert!(!game.handle_direction(Right));
        assert_eq!(game.direction(), Right);

        assert!(game.handle_direction(Down));
        assert!(!game.handle_direction(Up));
        assert_eq!(game.direction(), Down);

        // Two perpendicular turns inside one tick reverse the heading.
        assert!(game.handle_direction(Left));
        assert_eq!(game.direction(), Left);
    }

    #[test]
    fn test_right_wall() {
        let mut game = seeded(GameConfig::default());
        place_snake(&mut game, &[Cell::new(590, 200)], Right);
        park_food(&mut game, Cell::new(0, 0));

        assert_eq!(game.tick(), Step::Crashed(Collision::Wall));
        assert_eq!(game.snake.head(), Cell::new(600, 200));
        assert_eq!(game.status(), GameStatus::Over);
    }

    #[test]
    fn test_every_wall_ends_the_round() {
        let cases = [
            (Cell::new(0, 50), Left),
            (Cell::new(50, 0), Up),
            (Cell::new(90, 50), Right),
            (Cell::new(50, 90), Down),
        ];

        for (start, direction) in cases.iter() {
            let mut game = seeded(small());
            place_snake(&mut game, &[*start], *direction);
            park_food(&mut game, Cell::new(50, 50));

            assert_eq!(game.tick(), Step::Crashed(Collision::Wall), "{:?}", direction);
            assert_eq!(game.status(), GameStatus::Over);
        }
    }

    #[test]
    fn test_self_collision() {
        let mut game = seeded(small());
        // Head at (20,20) moving down into a U shape whose tail end is still occupied.
        place_snake(
            &mut game,
            &[
                Cell::new(20, 10),
                Cell::new(30, 10),
                Cell::new(30, 20),
                Cell::new(20, 20),
                Cell::new(10, 20),
            ],
            Down,
        );
        park_food(&mut game, Cell::new(90, 90));

        assert_eq!(game.tick(), Step::Crashed(Collision::SelfCollision));
        assert_eq!(game.status(), GameStatus::Over);
    }

    #[test]
    fn test_over_ignores_ticks_and_turns() {
        let mut game = seeded(small());
        place_snake(&mut game, &[Cell::new(90, 50)], Right);
        park_food(&mut game, Cell::new(0, 0));
        game.tick();
        assert_eq!(game.status(), GameStatus::Over);

        let head = game.snake.head();
        assert_eq!(game.tick(), Step::Idle);
        assert!(!game.handle_direction(Up));
        assert_eq!(game.snake.head(), head);
        assert_eq!(game.direction(), Right);
    }

    #[test]
    fn test_restart() {
        let mut game = seeded(GameConfig::default());
        assert!(!game.restart());

        place_snake(
            &mut game,
            &[Cell::new(590, 10), Cell::new(580, 10), Cell::new(570, 10)],
            Right,
        );
        park_food(&mut game, Cell::new(0, 0));
        game.tick();
        assert_eq!(game.status(), GameStatus::Over);

        assert!(game.restart());
        let snap = game.snapshot();
        assert_eq!(snap.status, GameStatus::Running);
        assert_eq!(snap.snake, &[Cell::new(300, 200)][..]);
        assert_eq!(snap.score, 0);
        assert_ne!(snap.food, Cell::new(300, 200));
        assert_eq!(game.direction(), Right);
    }

    #[test]
    fn test_filling_the_board_ends_the_round() {
        let config = GameConfig { board_width: 20, board_height: 10, ..GameConfig::default() };
        let mut game = seeded(config);
        assert_eq!(game.snake.head(), Cell::new(10, 0));
        assert_eq!(game.food, Cell::new(0, 0));

        game.handle_direction(Up);
        game.handle_direction(Left);
        assert_eq!(game.tick(), Step::Cleared);
        assert_eq!(game.status(), GameStatus::Over);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn test_rejects_single_tile_board() {
        let config = GameConfig { board_width: 10, board_height: 10, ..GameConfig::default() };
        assert!(Game::new(config).is_err());
    }
}
