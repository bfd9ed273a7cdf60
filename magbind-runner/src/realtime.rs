//! Wall-clock pacing for simulated runs

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use magbind_core::deck::{ContainerId, DeckLocation};
use magbind_core::traits::{DeckController, HandlerError};
use tracing::{info, warn};

/// Deck controller that optionally sleeps through waits
///
/// With a scale set, every wait sleeps for `duration * scale` and operator
/// pauses block on a line from stdin. Without one it only forwards.
pub struct Paced<D> {
    inner: D,
    scale: Option<f64>,
}

impl<D: DeckController> Paced<D> {
    pub fn new(inner: D, scale: Option<f64>) -> Self {
        Self {
            inner,
            scale: scale.filter(|s| s.is_finite() && *s > 0.0),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: DeckController> DeckController for Paced<D> {
    fn move_container(
        &mut self,
        container: ContainerId,
        to: DeckLocation,
    ) -> Result<(), HandlerError> {
        self.inner.move_container(container, to)
    }

    fn delay(&mut self, duration: Duration) {
        self.inner.delay(duration);
        if let Some(scale) = self.scale {
            let scaled = duration.mul_f64(scale);
            info!("Sleeping {:.1} s", scaled.as_secs_f64());
            thread::sleep(scaled);
        }
    }

    fn pause(&mut self, message: &str) {
        self.inner.pause(message);
        warn!("Operator action required: {}", message);
        if self.scale.is_some() {
            eprintln!("{message} Press Enter to resume.");
            let mut line = String::new();
            if let Err(e) = io::stdin().lock().read_line(&mut line) {
                warn!("Could not read stdin, resuming: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbind_drivers::sim::{OpLog, SimDeck};

    #[test]
    fn test_unscaled_waits_only_accumulate() {
        let mut deck = Paced::new(SimDeck::new(OpLog::new()), None);
        deck.delay(Duration::from_secs(600));
        deck.pause("Add binding beads.");
        assert_eq!(deck.inner().waited(), Duration::from_secs(600));
        assert_eq!(deck.inner().pauses().len(), 1);
    }

    #[test]
    fn test_rejects_nonsense_scale() {
        let deck = Paced::new(SimDeck::new(OpLog::new()), Some(-1.0));
        assert!(deck.scale.is_none());
    }

    #[test]
    fn test_scaled_wait_sleeps() {
        let mut deck = Paced::new(SimDeck::new(OpLog::new()), Some(0.001));
        let start = std::time::Instant::now();
        deck.delay(Duration::from_secs(2));
        assert!(start.elapsed() >= Duration::from_millis(2));
        assert_eq!(deck.inner().waited(), Duration::from_secs(2));
    }
}
