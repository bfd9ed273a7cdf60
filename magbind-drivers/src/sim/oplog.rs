//! Operation log shared by the simulated collaborators

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::time::Duration;

use magbind_core::deck::{ContainerId, DeckLocation, WellRef};
use magbind_core::plate::Volume;
use magbind_core::traits::{Location, Mount};

/// One issued operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    PickUpTip(Mount),
    DropTip(Mount),
    Aspirate {
        mount: Mount,
        at: Location,
        volume: Volume,
    },
    Dispense {
        mount: Mount,
        at: Location,
        volume: Volume,
    },
    Mix {
        mount: Mount,
        at: Location,
        repetitions: u16,
        volume: Volume,
    },
    Transfer {
        mount: Mount,
        volume: Volume,
        source: WellRef,
        dest: WellRef,
    },
    Move {
        container: ContainerId,
        to: DeckLocation,
    },
    Delay(Duration),
    Pause(String),
}

impl Op {
    /// Mount the operation runs on, if any
    pub fn mount(&self) -> Option<Mount> {
        match self {
            Op::PickUpTip(m) | Op::DropTip(m) => Some(*m),
            Op::Aspirate { mount, .. }
            | Op::Dispense { mount, .. }
            | Op::Mix { mount, .. }
            | Op::Transfer { mount, .. } => Some(*mount),
            Op::Move { .. } | Op::Delay(_) | Op::Pause(_) => None,
        }
    }
}

struct At(Location);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.well)?;
        if let Some(h) = self.0.height_x10 {
            let sign = if h < 0 { "-" } else { "" };
            let h = h.unsigned_abs();
            write!(f, " @ {}{}.{} mm", sign, h / 10, h % 10)?;
        }
        Ok(())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::PickUpTip(m) => write!(f, "[{:?}] pick up tip", m),
            Op::DropTip(m) => write!(f, "[{:?}] drop tip", m),
            Op::Aspirate { mount, at, volume } => {
                write!(f, "[{:?}] aspirate {} from {}", mount, volume, At(*at))
            }
            Op::Dispense { mount, at, volume } => {
                write!(f, "[{:?}] dispense {} into {}", mount, volume, At(*at))
            }
            Op::Mix {
                mount,
                at,
                repetitions,
                volume,
            } => write!(f, "[{:?}] mix {} x {} in {}", mount, repetitions, volume, At(*at)),
            Op::Transfer {
                mount,
                volume,
                source,
                dest,
            } => write!(f, "[{:?}] transfer {} {} -> {}", mount, volume, source, dest),
            Op::Move { container, to } => write!(f, "move {} to {}", container, to),
            Op::Delay(d) => write!(f, "delay {} s", d.as_secs()),
            Op::Pause(message) => write!(f, "pause: {}", message),
        }
    }
}

/// Append-only log shared between collaborators
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Rc<RefCell<Vec<Op>>>);

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, op: Op) {
        self.0.borrow_mut().push(op);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of every entry in issue order
    pub fn entries(&self) -> Vec<Op> {
        self.0.borrow().clone()
    }

    /// Number of entries matching a predicate
    pub fn count(&self, mut predicate: impl FnMut(&Op) -> bool) -> usize {
        self.0.borrow().iter().filter(|op| predicate(op)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use magbind_core::plate::Position;

    #[test]
    fn test_shared_handles() {
        let log = OpLog::new();
        let other = log.clone();
        other.record(Op::PickUpTip(Mount::Single));
        log.record(Op::Delay(Duration::from_secs(60)));

        assert_eq!(log.len(), 2);
        assert_eq!(other.entries()[1], Op::Delay(Duration::from_secs(60)));
        assert_eq!(log.count(|op| op.mount() == Some(Mount::Single)), 1);
    }

    #[test]
    fn test_display_heights() {
        let mut deck = magbind_core::deck::DeckState::new();
        let plate = deck
            .register(
                "plate",
                magbind_core::deck::ContainerRole::Labware,
                DeckLocation::Slot(1),
            )
            .unwrap();
        let well = WellRef::new(plate, Position::A1);
        let op = Op::Aspirate {
            mount: Mount::Multi,
            at: Location::bottom(well, -10),
            volume: Volume::from_ul(250),
        };
        assert_eq!(op.to_string(), "[Multi] aspirate 250.00 µL from #0:A1 @ -1.0 mm");
    }
}
