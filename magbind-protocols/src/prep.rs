//! Starting deck contents
//!
//! A protocol assumes reagents and samples are loaded before it starts. The
//! layout describes that starting state so a simulator can be primed with it.

use alloc::vec::Vec;

use magbind_core::deck::{ContainerId, WellRef};
use magbind_core::plate::Volume;

/// Liquid loaded before the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Every well of a container
    Container(ContainerId, Volume),
    /// One well
    Well(WellRef, Volume),
    /// The selected wells of a container
    Selection(ContainerId, Volume),
}

/// Everything the deck holds at the start of a protocol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preparation {
    pub fills: Vec<Fill>,
    /// Separation containers and the sample container whose liquid they hold
    pub shared: Vec<(ContainerId, ContainerId)>,
    /// Reservoirs with one well instead of one per column
    pub single_well: Vec<ContainerId>,
}

impl Preparation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.fills.push(fill);
        self
    }

    pub fn share(mut self, separation: ContainerId, sample: ContainerId) -> Self {
        self.shared.push((separation, sample));
        self
    }

    pub fn single_well(mut self, reservoir: ContainerId) -> Self {
        self.single_well.push(reservoir);
        self
    }
}

#[cfg(feature = "sim")]
mod sim {
    use super::*;
    use magbind_core::batch::BatchPlan;
    use magbind_core::traits::HandlerError;
    use magbind_drivers::sim::{Geometry, SimHandler, BULK_CAPACITY};

    impl Preparation {
        /// Prime a simulator whose deck is already registered
        pub fn apply(&self, sim: &mut SimHandler, plan: &BatchPlan) -> Result<(), HandlerError> {
            for id in &self.single_well {
                sim.add_container(*id, Geometry::Single, BULK_CAPACITY);
            }
            for (separation, sample) in &self.shared {
                sim.share_liquid(*separation, *sample)?;
            }
            for fill in &self.fills {
                match *fill {
                    Fill::Container(id, volume) => sim.fill_container(id, volume)?,
                    Fill::Well(well, volume) => sim.fill(well, volume)?,
                    Fill::Selection(id, volume) => {
                        for position in plan.positions() {
                            sim.fill(WellRef::new(id, position), volume)?;
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
