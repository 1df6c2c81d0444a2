use std::time::Instant;

use anyhow::Result;
use crossterm::event::KeyEvent;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::game::{Game, GameStatus};
use crate::input::{InputHandler, KeyAction};
use crate::term::TermManager;

/// Whether the loop keeps going after a key press.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Drives the game: input and ticks share this one loop, so the state is
/// only ever touched from here.
pub struct App {
    game: Game,
    term: TermManager,
    input: InputHandler,
}

impl App {
    pub fn new(config: GameConfig) -> Result<Self> {
        let term = TermManager::new(&config)?;
        let game = Game::new(config)?;
        Ok(App { game, term, input: InputHandler::new() })
    }

    /// Takes over the terminal, plays until a quit is requested and hands the
    /// terminal back even when the loop fails.
    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;

        let result = self.run_loop();
        let restored = self.term.restore();

        result.and(restored)
    }

    fn run_loop(&mut self) -> Result<()> {
        let interval = self.game.config().tick_interval;
        let mut next_tick = Instant::now() + interval;

        self.term.render(&self.game.snapshot())?;

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());

            for key_ev in self.term.poll_key_events(timeout)? {
                if handle_key(&mut self.game, &self.input, key_ev) == Flow::Quit {
                    info!(score = self.game.score(), "quit");
                    return Ok(());
                }
            }

            // Repaint right away so a restart does not wait for the next tick.
            if self.game.status() == GameStatus::Running && self.term.has_message() {
                self.term.render(&self.game.snapshot())?;
                next_tick = Instant::now() + interval;
            }

            if Instant::now() >= next_tick {
                self.game.tick();
                self.term.render(&self.game.snapshot())?;
                next_tick += interval;
            }
        }
    }
}

fn handle_key(game: &mut Game, input: &InputHandler, key_ev: KeyEvent) -> Flow {
    match input.handle_key_event(key_ev) {
        KeyAction::Turn(direction) => {
            game.handle_direction(direction);
        }
        KeyAction::Restart => {
            game.restart();
        }
        KeyAction::Quit if game.status() == GameStatus::Over => return Flow::Quit,
        KeyAction::Interrupt => return Flow::Quit,
        action => debug!(?action, status = ?game.status(), "key ignored"),
    }

    Flow::Continue
}
