//! Dispatch selection
//!
//! A full batch that covers one column is handled by a single multi-channel
//! operation at the column head. Everything else, including a full batch
//! when no multi-channel instrument is mounted, falls back to one
//! single-channel operation per member.

use heapless::Vec;

use crate::batch::partition::{Batch, BatchPlan};
use crate::config::Instruments;
use crate::error::ConfigError;
use crate::plate::{Position, WELL_COUNT};
use crate::traits::Mount;

/// How one batch is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch<'a> {
    /// One operation addressing the column head
    MultiChannel { column: u8, head: Position },
    /// One operation per position, in selection order
    SingleChannel(&'a [Position]),
}

/// One addressed operation slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Target {
    /// Index of the batch this target belongs to
    pub batch: usize,
    /// Instrument issuing the operation
    pub mount: Mount,
    /// Addressed well (column head for multi-channel targets)
    pub position: Position,
}

/// Targets for a whole plan
pub type TargetList = Vec<Target, WELL_COUNT>;

/// Choose the dispatch path for a batch
pub fn select<'a>(batch: &'a Batch, instruments: &Instruments) -> Result<Dispatch<'a>, ConfigError> {
    if instruments.has(Mount::Multi) {
        if let Some(column) = batch.column_aligned() {
            let head = batch.members()[0];
            return Ok(Dispatch::MultiChannel { column, head });
        }
    }

    if !instruments.has(Mount::Single) {
        return Err(ConfigError::MissingInstrument(Mount::Single));
    }
    Ok(Dispatch::SingleChannel(batch.members()))
}

/// Expand a plan into targets, batch by batch
///
/// Every batch is dispatched before any target is returned, so a missing
/// instrument is reported before the first operation.
pub fn plan_targets(plan: &BatchPlan, instruments: &Instruments) -> Result<TargetList, ConfigError> {
    let mut targets = TargetList::new();
    for batch in plan.iter() {
        let index = batch.index();
        match select(batch, instruments)? {
            Dispatch::MultiChannel { column, head } => {
                trace!("Batch {} -> multi-channel column {}", index, column + 1);
                push(&mut targets, index, Mount::Multi, head)?;
            }
            Dispatch::SingleChannel(members) => {
                trace!("Batch {} -> {} single-channel ops", index, members.len());
                for &p in members {
                    push(&mut targets, index, Mount::Single, p)?;
                }
            }
        }
    }
    Ok(targets)
}

fn push(
    targets: &mut TargetList,
    batch: usize,
    mount: Mount,
    position: Position,
) -> Result<(), ConfigError> {
    targets
        .push(Target {
            batch,
            mount,
            position,
        })
        .map_err(|_| ConfigError::BatchOutOfRange(batch))
}

/// Run `f` for every target in batch order, then member order
///
/// This is the one place the full/partial bifurcation happens; every
/// batch-touching step goes through it.
pub fn for_each_target<E, F>(plan: &BatchPlan, instruments: &Instruments, mut f: F) -> Result<(), E>
where
    E: From<ConfigError>,
    F: FnMut(Target) -> Result<(), E>,
{
    for target in plan_targets(plan, instruments)? {
        f(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::partition::{partition, CHANNEL_COUNT};
    use crate::config::InstrumentSpec;

    extern crate std;
    use std::vec::Vec as StdVec;

    fn make_plan(n: usize) -> BatchPlan {
        let selection: StdVec<Position> = Position::all().take(n).collect();
        partition(&selection, CHANNEL_COUNT).unwrap()
    }

    fn multi_only() -> Instruments {
        Instruments {
            single: None,
            multi: Some(InstrumentSpec::p300_multi()),
        }
    }

    #[test]
    fn test_twenty_positions_dispatch() {
        let plan = make_plan(20);
        let instruments = Instruments::default();

        assert_eq!(
            select(plan.get(0).unwrap(), &instruments),
            Ok(Dispatch::MultiChannel {
                column: 0,
                head: Position::A1,
            })
        );
        assert!(matches!(
            select(plan.get(1).unwrap(), &instruments),
            Ok(Dispatch::MultiChannel { column: 1, .. })
        ));
        match select(plan.get(2).unwrap(), &instruments) {
            Ok(Dispatch::SingleChannel(members)) => assert_eq!(members.len(), 4),
            other => panic!("unexpected dispatch {:?}", other),
        }

        let targets = plan_targets(&plan, &instruments).unwrap();
        assert_eq!(targets.len(), 6);
        let mounts: StdVec<Mount> = targets.iter().map(|t| t.mount).collect();
        assert_eq!(
            mounts,
            [Mount::Multi, Mount::Multi, Mount::Single, Mount::Single, Mount::Single, Mount::Single]
        );
        assert_eq!(targets[1].position, Position::parse("A2").unwrap());
        assert_eq!(targets[5].position, Position::parse("D3").unwrap());
    }

    #[test]
    fn test_full_batch_without_multi_degrades() {
        let plan = make_plan(8);
        let targets = plan_targets(&plan, &Instruments::single_only()).unwrap();
        assert_eq!(targets.len(), 8);
        assert!(targets.iter().all(|t| t.mount == Mount::Single && t.batch == 0));
    }

    #[test]
    fn test_partial_batch_without_single_fails_up_front() {
        let plan = make_plan(12);
        assert_eq!(
            plan_targets(&plan, &multi_only()),
            Err(ConfigError::MissingInstrument(Mount::Single))
        );

        // The callback never runs when planning fails
        let mut calls = 0;
        let result: Result<(), ConfigError> = for_each_target(&plan, &multi_only(), |_| {
            calls += 1;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_full_plate_multi_only() {
        let plan = make_plan(96);
        let targets = plan_targets(&plan, &multi_only()).unwrap();
        assert_eq!(targets.len(), 12);
        for (i, t) in targets.iter().enumerate() {
            assert_eq!(t.batch, i);
            assert_eq!(t.position, Position::column_head(i as u8).unwrap());
        }
    }

    #[test]
    fn test_for_each_target_order() {
        let plan = make_plan(10);
        let mut seen = StdVec::new();
        let result: Result<(), ConfigError> =
            for_each_target(&plan, &Instruments::default(), |t| {
                seen.push((t.batch, t.mount, t.position));
                Ok(())
            });
        result.unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (0, Mount::Multi, Position::A1));
        assert_eq!(seen[1], (1, Mount::Single, Position::parse("A2").unwrap()));
        assert_eq!(seen[2], (1, Mount::Single, Position::parse("B2").unwrap()));
    }
}
