//! Liquid handler trait
//!
//! Abstracts over the pipetting instruments. A multi-channel operation is
//! addressed by the head well of a column (row A); the implementation
//! applies it to every channel.

use core::fmt;

use crate::deck::WellRef;
use crate::error::CapacityError;
use crate::plate::Volume;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Instrument mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Mount {
    /// Single-channel pipette, addresses one well
    Single,
    /// Multi-channel pipette, addresses one full column
    Multi,
}

/// A well plus an optional tip height above the well bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    pub well: WellRef,
    /// Height above the bottom in 0.1 mm (negative = pressed into the bottom).
    /// `None` leaves the instrument's default.
    pub height_x10: Option<i16>,
}

impl Location {
    /// Default height in a well
    pub const fn at(well: WellRef) -> Self {
        Self {
            well,
            height_x10: None,
        }
    }

    /// Explicit height above the well bottom (0.1 mm units)
    pub const fn bottom(well: WellRef, height_x10: i16) -> Self {
        Self {
            well,
            height_x10: Some(height_x10),
        }
    }
}

/// Tip handling for a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TipPolicy {
    /// Fresh tip for the transfer, dropped afterwards
    #[default]
    Always,
    /// Reuse the tip already attached; caller manages pick-up and drop
    Never,
}

/// Where to blow out after dispensing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BlowOut {
    #[default]
    None,
    Destination,
}

/// Options for a [`LiquidHandler::transfer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferOptions {
    pub tips: TipPolicy,
    pub blow_out: BlowOut,
    /// Mix in the destination after dispensing: (repetitions, volume)
    pub mix_after: Option<(u16, Volume)>,
}

/// Errors reported by a liquid handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerError {
    /// Operation needs a tip but none is attached
    NoTip(Mount),
    /// Pick-up requested while a tip is still attached
    TipAlreadyAttached(Mount),
    /// Well does not exist on the addressed container
    UnknownWell(WellRef),
    /// Volume limit exceeded
    Capacity(CapacityError),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::NoTip(mount) => write!(f, "{:?} mount has no tip", mount),
            HandlerError::TipAlreadyAttached(mount) => {
                write!(f, "{:?} mount already carries a tip", mount)
            }
            HandlerError::UnknownWell(well) => write!(f, "unknown well {}", well),
            HandlerError::Capacity(e) => write!(f, "{}", e),
        }
    }
}

/// Trait for liquid-handling instruments
///
/// Every call is blocking and completes the physical action before
/// returning. Implementations must not retry failed operations.
pub trait LiquidHandler {
    /// Attach a fresh tip to the mount
    fn pick_up_tip(&mut self, mount: Mount) -> Result<(), HandlerError>;

    /// Discard the attached tip
    fn drop_tip(&mut self, mount: Mount) -> Result<(), HandlerError>;

    /// Draw liquid into the attached tip
    fn aspirate(&mut self, mount: Mount, at: Location, volume: Volume)
        -> Result<(), HandlerError>;

    /// Expel liquid from the attached tip
    fn dispense(&mut self, mount: Mount, at: Location, volume: Volume)
        -> Result<(), HandlerError>;

    /// Repeatedly aspirate and dispense in place
    fn mix(
        &mut self,
        mount: Mount,
        at: Location,
        repetitions: u16,
        volume: Volume,
    ) -> Result<(), HandlerError>;

    /// Move `volume` from `source` to `dest`
    ///
    /// Volumes larger than the tip are split into several trips by the
    /// implementation.
    fn transfer(
        &mut self,
        mount: Mount,
        volume: Volume,
        source: Location,
        dest: Location,
        options: &TransferOptions,
    ) -> Result<(), HandlerError>;
}
