//! Capacity guard implementation

use crate::config::{InstrumentSpec, Instruments};
use crate::error::{CapacityError, ConfigError, RunError};
use crate::plate::Volume;
use crate::traits::Mount;

/// Outcome of checking a transfer volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VolumeCheck {
    /// Issue the operation
    Proceed,
    /// Nothing to move; skip the operation
    Skip,
}

/// Volume limits for the mounted instruments
#[derive(Debug, Clone, Copy)]
pub struct CapacityGuard {
    instruments: Instruments,
}

impl CapacityGuard {
    pub fn new(instruments: Instruments) -> Self {
        Self { instruments }
    }

    /// Spec of a mounted instrument
    pub fn instrument(&self, mount: Mount) -> Result<InstrumentSpec, ConfigError> {
        self.instruments
            .spec(mount)
            .ok_or(ConfigError::MissingInstrument(mount))
    }

    /// Check a single aspiration or mix volume against the tip
    pub fn check_tip(&self, mount: Mount, volume: Volume) -> Result<(), RunError> {
        let max = self.instrument(mount)?.max_volume;
        if volume > max {
            warn!("{} exceeds tip capacity on {:?}", volume, mount);
            return Err(CapacityError::Tip {
                mount,
                requested: volume,
                max,
            }
            .into());
        }
        Ok(())
    }

    /// Check a transfer volume
    ///
    /// Transfers may exceed the tip (the handler splits them into trips),
    /// but the instrument must be mounted. Zero volumes are skipped.
    pub fn check_transfer(&self, mount: Mount, volume: Volume) -> Result<VolumeCheck, RunError> {
        self.instrument(mount)?;
        if volume.is_zero() {
            debug!("Skipping zero-volume transfer on {:?}", mount);
            return Ok(VolumeCheck::Skip);
        }
        Ok(VolumeCheck::Proceed)
    }
}
