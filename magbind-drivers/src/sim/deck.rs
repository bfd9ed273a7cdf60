//! Simulated deck controller
//!
//! Moves always succeed; the sequencer has already validated them against
//! its deck model. Waits return immediately and are accumulated so a run
//! reports its total hands-off time.

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use magbind_core::deck::{ContainerId, DeckLocation};
use magbind_core::traits::{DeckController, HandlerError};

use super::oplog::{Op, OpLog};

/// Deck controller that records instead of moving
#[derive(Debug, Clone, Default)]
pub struct SimDeck {
    log: OpLog,
    moves: Vec<(ContainerId, DeckLocation)>,
    waited: Duration,
    pauses: Vec<String>,
}

impl SimDeck {
    pub fn new(log: OpLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Moves in issue order
    pub fn moves(&self) -> &[(ContainerId, DeckLocation)] {
        &self.moves
    }

    /// Total simulated wait time
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Operator prompts in issue order
    pub fn pauses(&self) -> &[String] {
        &self.pauses
    }
}

impl DeckController for SimDeck {
    fn move_container(
        &mut self,
        container: ContainerId,
        to: DeckLocation,
    ) -> Result<(), HandlerError> {
        self.moves.push((container, to));
        self.log.record(Op::Move { container, to });
        Ok(())
    }

    fn delay(&mut self, duration: Duration) {
        self.waited += duration;
        self.log.record(Op::Delay(duration));
    }

    fn pause(&mut self, message: &str) {
        self.pauses.push(String::from(message));
        self.log.record(Op::Pause(String::from(message)));
    }
}
