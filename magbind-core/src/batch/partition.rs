//! Batch partitioner

use heapless::Vec;

use crate::error::ConfigError;
use crate::plate::{Position, ROWS, WELL_COUNT};

/// Channels on the multi-channel instrument
pub const CHANNEL_COUNT: usize = 8;

/// Upper bound on batches (single-channel partitioning of a full plate)
pub const MAX_BATCHES: usize = WELL_COUNT;

/// Consecutive positions processed together
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Batch {
    index: usize,
    members: Vec<Position, CHANNEL_COUNT>,
}

impl Batch {
    /// Zero-based batch index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Member positions in selection order
    pub fn members(&self) -> &[Position] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Batch fills every channel of the multi-channel instrument
    pub fn is_full(&self) -> bool {
        self.members.len() == CHANNEL_COUNT
    }

    /// Column whose rows A..H this batch covers in order
    ///
    /// Returns `None` for partial batches and for full batches that span
    /// columns (possible with sparse selections).
    pub fn column_aligned(&self) -> Option<u8> {
        if self.members.len() != ROWS {
            return None;
        }
        let column = self.members[0].column();
        let aligned = self
            .members
            .iter()
            .enumerate()
            .all(|(row, p)| p.column() == column && p.row() as usize == row);
        aligned.then_some(column)
    }
}

/// Ordered batches for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    channels: usize,
    batches: Vec<Batch, MAX_BATCHES>,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self::empty()
    }
}

impl BatchPlan {
    /// Plan with no batches
    pub const fn empty() -> Self {
        Self {
            channels: CHANNEL_COUNT,
            batches: Vec::new(),
        }
    }

    /// Batch size used for partitioning
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Batch> {
        self.batches.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// All positions in batch order; equals the partitioned selection
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.batches.iter().flat_map(|b| b.members.iter().copied())
    }

    /// Number of positions across all batches
    pub fn position_count(&self) -> usize {
        self.batches.iter().map(|b| b.len()).sum()
    }

    /// The irregular last batch, if the selection does not divide evenly
    pub fn tail(&self) -> Option<&Batch> {
        self.batches.last().filter(|b| b.len() < self.channels)
    }
}

/// Split a selection into batches of `channels` positions
///
/// Batch `i` holds `selection[channels * i..]`, truncated to `channels`.
/// Only the last batch may be short. An empty selection yields an empty
/// plan.
pub fn partition(selection: &[Position], channels: usize) -> Result<BatchPlan, ConfigError> {
    if channels == 0 || channels > CHANNEL_COUNT {
        return Err(ConfigError::InvalidChannelCount(channels));
    }

    let mut batches = Vec::new();
    for (index, chunk) in selection.chunks(channels).enumerate() {
        let mut members = Vec::new();
        for &p in chunk {
            members
                .push(p)
                .map_err(|_| ConfigError::InvalidChannelCount(channels))?;
        }
        batches
            .push(Batch { index, members })
            .map_err(|_| ConfigError::InvalidChannelCount(channels))?;
    }

    debug!(
        "Partitioned {} positions into {} batches of {}",
        selection.len(),
        batches.len(),
        channels
    );

    Ok(BatchPlan { channels, batches })
}
