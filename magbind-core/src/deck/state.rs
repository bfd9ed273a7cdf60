//! Container locations and slot occupancy

use core::fmt;

use heapless::{String, Vec};

use crate::error::ConfigError;
use crate::plate::Position;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of deck slots (1..=11)
pub const DECK_SLOTS: u8 = 11;

/// Maximum containers tracked per run
pub const MAX_CONTAINERS: usize = 16;

/// Maximum container label length
pub const MAX_LABEL_LEN: usize = 24;

/// Handle for a registered container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerId(u8);

impl ContainerId {
    /// Registration order index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a container currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeckLocation {
    /// Numbered deck slot
    Slot(u8),
    /// Held off the deck
    OffDeck,
}

impl DeckLocation {
    pub fn is_on_deck(self) -> bool {
        matches!(self, DeckLocation::Slot(_))
    }
}

impl fmt::Display for DeckLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckLocation::Slot(n) => write!(f, "slot {}", n),
            DeckLocation::OffDeck => write!(f, "off-deck"),
        }
    }
}

/// What a container is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContainerRole {
    /// Plates and tube racks; every position is its own well
    #[default]
    Labware,
    /// Multi-column trough; all rows of a column share the row A well
    Reservoir,
    /// Plate seated on the magnetic separation device
    Separation,
    /// Single-well liquid waste; every well address resolves to A1
    Waste,
}

/// A well on a specific container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WellRef {
    pub container: ContainerId,
    pub position: Position,
}

impl WellRef {
    pub const fn new(container: ContainerId, position: Position) -> Self {
        Self {
            container,
            position,
        }
    }
}

impl fmt::Display for WellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.position)
    }
}

/// A registered container
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Container {
    /// Display label
    pub label: String<MAX_LABEL_LEN>,
    /// Usage
    pub role: ContainerRole,
    /// Current location
    pub location: DeckLocation,
}

/// Deck occupancy model
///
/// Invariant: at most one container per slot. Containers are never
/// removed; off-deck is a location like any other.
#[derive(Debug, Clone, Default)]
pub struct DeckState {
    containers: Vec<Container, MAX_CONTAINERS>,
}

impl DeckState {
    /// Create an empty deck
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
        }
    }

    /// Place a new container
    pub fn register(
        &mut self,
        label: &str,
        role: ContainerRole,
        location: DeckLocation,
    ) -> Result<ContainerId, ConfigError> {
        let id = ContainerId(self.containers.len() as u8);
        self.check_target(id, location)?;

        let mut name = String::new();
        name.push_str(label).map_err(|_| ConfigError::LabelTooLong)?;

        self.containers
            .push(Container {
                label: name,
                role,
                location,
            })
            .map_err(|_| ConfigError::TooManyContainers)?;

        debug!("Registered container {} at {:?}", id, location);
        Ok(id)
    }

    /// Look up a container
    pub fn container(&self, id: ContainerId) -> Result<&Container, ConfigError> {
        self.containers
            .get(id.index())
            .ok_or(ConfigError::UnknownContainer(id))
    }

    /// Current location of a container
    pub fn location(&self, id: ContainerId) -> Result<DeckLocation, ConfigError> {
        self.container(id).map(|c| c.location)
    }

    /// Role of a container
    pub fn role(&self, id: ContainerId) -> Result<ContainerRole, ConfigError> {
        self.container(id).map(|c| c.role)
    }

    /// Container occupying a slot, if any
    pub fn occupant(&self, slot: u8) -> Option<ContainerId> {
        self.containers
            .iter()
            .position(|c| c.location == DeckLocation::Slot(slot))
            .map(|i| ContainerId(i as u8))
    }

    /// All containers in registration order
    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &Container)> {
        self.containers
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId(i as u8), c))
    }

    /// Whether a container is seated on the separation device
    pub fn is_on_separation_device(&self, id: ContainerId) -> Result<bool, ConfigError> {
        let c = self.container(id)?;
        Ok(c.role == ContainerRole::Separation && c.location.is_on_deck())
    }

    /// Resolve a well address on a container
    ///
    /// Waste containers have a single well, so every position maps to A1.
    /// Reservoir positions map to the head of their column.
    pub fn well(&self, id: ContainerId, position: Position) -> Result<WellRef, ConfigError> {
        let position = match self.role(id)? {
            ContainerRole::Waste => Position::A1,
            ContainerRole::Reservoir => Position::column_head(position.column()).unwrap_or(position),
            _ => position,
        };
        Ok(WellRef::new(id, position))
    }

    /// Validate a move without applying it
    pub fn check_relocate(&self, id: ContainerId, to: DeckLocation) -> Result<(), ConfigError> {
        self.container(id)?;
        self.check_target(id, to)
    }

    /// Move a container, returning its previous location
    ///
    /// The update is atomic: on error nothing changes.
    pub fn relocate(
        &mut self,
        id: ContainerId,
        to: DeckLocation,
    ) -> Result<DeckLocation, ConfigError> {
        self.check_relocate(id, to)?;
        let container = self
            .containers
            .get_mut(id.index())
            .ok_or(ConfigError::UnknownContainer(id))?;
        let previous = container.location;
        container.location = to;
        Ok(previous)
    }

    fn check_target(&self, id: ContainerId, to: DeckLocation) -> Result<(), ConfigError> {
        if let DeckLocation::Slot(slot) = to {
            if slot == 0 || slot > DECK_SLOTS {
                return Err(ConfigError::InvalidSlot(slot));
            }
            if let Some(occupant) = self.occupant(slot) {
                if occupant != id {
                    return Err(ConfigError::SlotOccupied { slot, occupant });
                }
            }
        }
        Ok(())
    }
}
