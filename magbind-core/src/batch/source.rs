//! Source rotation
//!
//! A few reagent wells feed up to twelve device columns. Each source owns a
//! contiguous span of `12 / k` columns, so with two reservoirs the first
//! serves columns 1-6 and the second columns 7-12, whether or not those
//! columns hold samples.

use heapless::Vec;

use crate::deck::{ContainerId, DeckState, WellRef};
use crate::error::ConfigError;
use crate::plate::{Position, COLUMNS};

/// Largest source group
pub const MAX_SOURCES: usize = COLUMNS;

/// Reagent wells rotated across batches
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceGroup {
    wells: Vec<WellRef, MAX_SOURCES>,
}

impl SourceGroup {
    /// Build a group; the size must divide 12
    pub fn new(wells: &[WellRef]) -> Result<Self, ConfigError> {
        let k = wells.len();
        if k == 0 || k > MAX_SOURCES || COLUMNS % k != 0 {
            return Err(ConfigError::SourceGroupSize(k));
        }
        let wells = Vec::from_slice(wells).map_err(|_| ConfigError::SourceGroupSize(k))?;
        Ok(Self { wells })
    }

    /// Group with a single source
    pub fn single(well: WellRef) -> Self {
        let mut wells = Vec::new();
        // Capacity is at least one
        let _ = wells.push(well);
        Self { wells }
    }

    /// Column heads `A1..` of a container, one per source
    pub fn columns(container: ContainerId, count: usize) -> Result<Self, ConfigError> {
        Self::span(container, 0, count)
    }

    /// `count` consecutive column heads starting at column `first` (0-based)
    pub fn span(container: ContainerId, first: u8, count: usize) -> Result<Self, ConfigError> {
        if count == 0 || count > MAX_SOURCES {
            return Err(ConfigError::SourceGroupSize(count));
        }
        let mut wells: Vec<WellRef, MAX_SOURCES> = Vec::new();
        for column in first..first.saturating_add(count as u8) {
            let head = Position::column_head(column).ok_or(ConfigError::SourceGroupSize(count))?;
            wells
                .push(WellRef::new(container, head))
                .map_err(|_| ConfigError::SourceGroupSize(count))?;
        }
        Self::new(&wells)
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn wells(&self) -> &[WellRef] {
        &self.wells
    }

    /// Source slot serving a batch: `batch_index / (12 / k)`
    pub fn source_index(&self, batch_index: usize) -> Result<usize, ConfigError> {
        if batch_index >= COLUMNS {
            return Err(ConfigError::BatchOutOfRange(batch_index));
        }
        Ok(batch_index / (COLUMNS / self.wells.len()))
    }

    /// Source well serving a batch
    pub fn source_for(&self, batch_index: usize) -> Result<WellRef, ConfigError> {
        let index = self.source_index(batch_index)?;
        self.wells
            .get(index)
            .copied()
            .ok_or(ConfigError::BatchOutOfRange(batch_index))
    }
}

/// Where a reagent addition draws from
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Supply {
    /// Rotated across batches
    Group(SourceGroup),
    /// Same-addressed well of another container
    Matching(ContainerId),
}

impl Supply {
    /// Source well for one target
    pub fn source_for(
        &self,
        deck: &DeckState,
        batch_index: usize,
        position: Position,
    ) -> Result<WellRef, ConfigError> {
        match self {
            Supply::Group(group) => group.source_for(batch_index),
            Supply::Matching(container) => deck.well(*container, position),
        }
    }
}

impl From<SourceGroup> for Supply {
    fn from(group: SourceGroup) -> Self {
        Supply::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{ContainerRole, DeckLocation};

    use proptest::prelude::*;

    fn make_wells(n: usize) -> Vec<WellRef, 16> {
        let mut deck = DeckState::new();
        let reservoir = deck
            .register("reservoir", ContainerRole::Labware, DeckLocation::Slot(2))
            .unwrap();
        (0..n)
            .map(|i| WellRef::new(reservoir, Position::from_index(i).unwrap()))
            .collect()
    }

    #[test]
    fn test_two_sources_split_columns_in_half() {
        let group = SourceGroup::new(&make_wells(2)).unwrap();
        for batch in 0..6 {
            assert_eq!(group.source_index(batch), Ok(0));
        }
        for batch in 6..12 {
            assert_eq!(group.source_index(batch), Ok(1));
        }
    }

    #[test]
    fn test_span_ignores_batch_count() {
        // Three batches with two sources still all draw from the first
        let group = SourceGroup::new(&make_wells(2)).unwrap();
        let wells = make_wells(2);
        for batch in 0..3 {
            assert_eq!(group.source_for(batch), Ok(wells[0]));
        }
    }

    #[test]
    fn test_group_size_must_divide_columns() {
        assert_eq!(SourceGroup::new(&[]), Err(ConfigError::SourceGroupSize(0)));
        assert_eq!(
            SourceGroup::new(&make_wells(5)),
            Err(ConfigError::SourceGroupSize(5))
        );
        assert_eq!(
            SourceGroup::new(&make_wells(13)),
            Err(ConfigError::SourceGroupSize(13))
        );
        for k in [1, 2, 3, 4, 6, 12] {
            assert!(SourceGroup::new(&make_wells(k)).is_ok());
        }
    }

    #[test]
    fn test_batch_beyond_device_columns() {
        let group = SourceGroup::new(&make_wells(4)).unwrap();
        assert_eq!(group.source_index(12), Err(ConfigError::BatchOutOfRange(12)));
    }

    #[test]
    fn test_column_heads() {
        let wells = make_wells(1);
        let group = SourceGroup::columns(wells[0].container, 3).unwrap();
        let heads: Vec<Position, 3> = group.wells().iter().map(|w| w.position).collect();
        assert_eq!(
            heads.as_slice(),
            &[
                Position::parse("A1").unwrap(),
                Position::parse("A2").unwrap(),
                Position::parse("A3").unwrap(),
            ]
        );
    }

    #[test]
    fn test_column_span() {
        let container = make_wells(1)[0].container;
        let group = SourceGroup::span(container, 4, 4).unwrap();
        assert_eq!(group.wells()[0].position, Position::parse("A5").unwrap());
        assert_eq!(group.wells()[3].position, Position::parse("A8").unwrap());

        // Runs off the last column
        assert_eq!(
            SourceGroup::span(container, 10, 4),
            Err(ConfigError::SourceGroupSize(4))
        );
    }

    #[test]
    fn test_matching_supply_mirrors_position() {
        let mut deck = DeckState::new();
        let beads = deck
            .register("beads", ContainerRole::Labware, DeckLocation::Slot(3))
            .unwrap();
        let supply = Supply::Matching(beads);
        let c4 = Position::parse("C4").unwrap();
        assert_eq!(supply.source_for(&deck, 3, c4), Ok(WellRef::new(beads, c4)));
    }

    proptest! {
        #[test]
        fn prop_source_index_monotonic_and_covering(k in prop::sample::select(&[1usize, 2, 3, 4, 6, 12][..])) {
            let group = SourceGroup::new(&make_wells(k)).unwrap();
            let mut previous = 0;
            let mut seen = [false; MAX_SOURCES];
            for batch in 0..COLUMNS {
                let index = group.source_index(batch).unwrap();
                prop_assert!(index >= previous);
                prop_assert!(index < k);
                seen[index] = true;
                previous = index;
            }
            prop_assert!(seen[..k].iter().all(|&s| s));
        }
    }
}
