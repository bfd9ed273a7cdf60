//! Error taxonomy
//!
//! Every error aborts the remaining sequence. Nothing here is retried:
//! liquid-handling steps are not idempotent, so recovery means fixing the
//! input and starting a fresh run.

use core::fmt;

use crate::deck::{ContainerId, WellRef};
use crate::grid::GridError;
use crate::plate::{Position, Volume};
use crate::traits::{HandlerError, Mount};

/// Static input that cannot be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Malformed selection or volume grid
    Grid(GridError),
    /// Source group size is zero, above 12, or does not divide 12
    SourceGroupSize(usize),
    /// Batch index has no device column to map onto
    BatchOutOfRange(usize),
    /// Channel count outside 1..=8
    InvalidChannelCount(usize),
    /// Container was never registered on the deck
    UnknownContainer(ContainerId),
    /// Deck slot outside 1..=11
    InvalidSlot(u8),
    /// Target slot holds a different container
    SlotOccupied { slot: u8, occupant: ContainerId },
    /// Step needs an instrument that is not mounted
    MissingInstrument(Mount),
    /// Deck model is full
    TooManyContainers,
    /// Container label exceeds the label capacity
    LabelTooLong,
    /// Volume grid has no entry for a position that needs one
    MissingVolume(Position),
    /// Volume outside the accepted range for a parameter
    VolumeOutOfRange(Volume),
}

/// Volume exceeds a tip or container limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapacityError {
    /// Single aspiration larger than the instrument's tips hold
    Tip {
        mount: Mount,
        requested: Volume,
        max: Volume,
    },
    /// Dispense would overflow a well
    Well {
        well: WellRef,
        requested: Volume,
        capacity: Volume,
    },
}

/// Operation attempted in the wrong physical state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhysicalStateError {
    /// Supernatant removal from a container not seated on the separation device
    NotOnSeparationDevice(ContainerId),
    /// Cycle started with the sample container off the deck
    NotOnDeck(ContainerId),
    /// Container is seated but the beads were not separated since the last mix
    NotSeparated(ContainerId),
}

/// Any failure while planning or executing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    Config(ConfigError),
    Capacity(CapacityError),
    PhysicalState(PhysicalStateError),
    /// Collaborator reported a failure
    Hardware(HandlerError),
    /// A previous step failed; the sequence does not continue
    Aborted,
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        ConfigError::Grid(e)
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

impl From<GridError> for RunError {
    fn from(e: GridError) -> Self {
        RunError::Config(ConfigError::Grid(e))
    }
}

impl From<CapacityError> for RunError {
    fn from(e: CapacityError) -> Self {
        RunError::Capacity(e)
    }
}

impl From<PhysicalStateError> for RunError {
    fn from(e: PhysicalStateError) -> Self {
        RunError::PhysicalState(e)
    }
}

impl From<HandlerError> for RunError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Capacity(c) => RunError::Capacity(c),
            other => RunError::Hardware(other),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Grid(e) => write!(f, "grid: {}", e),
            ConfigError::SourceGroupSize(n) => {
                write!(f, "source group of {} does not divide 12 columns", n)
            }
            ConfigError::BatchOutOfRange(i) => write!(f, "batch {} has no device column", i),
            ConfigError::InvalidChannelCount(n) => write!(f, "invalid channel count {}", n),
            ConfigError::UnknownContainer(id) => write!(f, "unknown container {}", id),
            ConfigError::InvalidSlot(slot) => write!(f, "invalid deck slot {}", slot),
            ConfigError::SlotOccupied { slot, occupant } => {
                write!(f, "slot {} already holds container {}", slot, occupant)
            }
            ConfigError::MissingInstrument(mount) => write!(f, "no {:?} instrument mounted", mount),
            ConfigError::TooManyContainers => write!(f, "too many containers on deck"),
            ConfigError::LabelTooLong => write!(f, "container label too long"),
            ConfigError::MissingVolume(position) => write!(f, "no volume given for {}", position),
            ConfigError::VolumeOutOfRange(volume) => write!(f, "volume {} out of range", volume),
        }
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityError::Tip {
                mount,
                requested,
                max,
            } => write!(f, "{} exceeds {:?} tip capacity {}", requested, mount, max),
            CapacityError::Well {
                well,
                requested,
                capacity,
            } => write!(f, "{} overflows {} (capacity {})", requested, well, capacity),
        }
    }
}

impl fmt::Display for PhysicalStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalStateError::NotOnSeparationDevice(id) => {
                write!(f, "container {} is not on the separation device", id)
            }
            PhysicalStateError::NotOnDeck(id) => write!(f, "container {} is not on the deck", id),
            PhysicalStateError::NotSeparated(id) => {
                write!(f, "beads in container {} have not separated", id)
            }
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "configuration error: {}", e),
            RunError::Capacity(e) => write!(f, "capacity error: {}", e),
            RunError::PhysicalState(e) => write!(f, "physical state error: {}", e),
            RunError::Hardware(e) => write!(f, "hardware error: {}", e),
            RunError::Aborted => write!(f, "run aborted after an earlier failure"),
        }
    }
}
