//! Simulated liquid handler
//!
//! Tracks tip state per mount and liquid volume per well. A multi-channel
//! operation on a plate covers eight consecutive rows starting at the
//! addressed well, so from a column head it reaches the whole column; on a
//! trough or single-well container all channels share one well.
//! Aspirations are clamped to the liquid available, so aspirating a nearly
//! dry well is not an error. A failed operation leaves volumes and tips as
//! they were.
//!
//! # Usage
//!
//! ```ignore
//! let log = OpLog::new();
//! let mut sim = SimHandler::new(Instruments::default(), log.clone());
//! sim.add_deck(&deck);
//! sim.share_liquid(magnet, sample_plate);
//! sim.fill_container(reservoir, Volume::from_ul(15_000))?;
//! ```

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use magbind_core::config::{InstrumentSpec, Instruments};
use magbind_core::deck::{ContainerId, ContainerRole, DeckState, WellRef};
use magbind_core::error::CapacityError;
use magbind_core::plate::{Position, Volume, COLUMNS};
use magbind_core::traits::{
    HandlerError, LiquidHandler, Location, Mount, TipPolicy, TransferOptions,
};

use super::oplog::{Op, OpLog};

/// Deep-well plate and tube capacity
pub const PLATE_WELL_CAPACITY: Volume = Volume::from_ul(2_000);

/// Trough capacity per column
pub const RESERVOIR_WELL_CAPACITY: Volume = Volume::from_ul(15_000);

/// Single-well reservoir and waste capacity
pub const BULK_CAPACITY: Volume = Volume::from_ul(195_000);

/// How positions map onto physical wells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Every position is its own well
    Plate,
    /// One well per column
    Trough,
    /// One well for the whole container
    Single,
}

impl Geometry {
    /// Geometry and default per-well capacity for a deck role
    pub fn for_role(role: ContainerRole) -> (Self, Volume) {
        match role {
            ContainerRole::Labware | ContainerRole::Separation => {
                (Geometry::Plate, PLATE_WELL_CAPACITY)
            }
            ContainerRole::Reservoir => (Geometry::Trough, RESERVOIR_WELL_CAPACITY),
            ContainerRole::Waste => (Geometry::Single, BULK_CAPACITY),
        }
    }

    fn wells(self) -> Vec<Position> {
        match self {
            Geometry::Plate => Position::all().collect(),
            Geometry::Trough => (0..COLUMNS as u8)
                .filter_map(Position::column_head)
                .collect(),
            Geometry::Single => vec![Position::A1],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ContainerModel {
    geometry: Geometry,
    capacity: Volume,
    /// Container whose wells actually hold the liquid
    shares: Option<ContainerId>,
}

type WellKey = (ContainerId, Position);

/// Liquid handler that tracks volumes instead of moving liquid
#[derive(Debug, Clone)]
pub struct SimHandler {
    instruments: Instruments,
    containers: BTreeMap<ContainerId, ContainerModel>,
    volumes: BTreeMap<WellKey, Volume>,
    /// Attached tips with the volume held by each channel
    tips: BTreeMap<Mount, Vec<Volume>>,
    tips_used: BTreeMap<Mount, usize>,
    log: OpLog,
}

impl SimHandler {
    pub fn new(instruments: Instruments, log: OpLog) -> Self {
        Self {
            instruments,
            containers: BTreeMap::new(),
            volumes: BTreeMap::new(),
            tips: BTreeMap::new(),
            tips_used: BTreeMap::new(),
            log,
        }
    }

    /// Register a container with an explicit geometry
    pub fn add_container(&mut self, id: ContainerId, geometry: Geometry, capacity: Volume) {
        self.containers.insert(
            id,
            ContainerModel {
                geometry,
                capacity,
                shares: None,
            },
        );
    }

    /// Register every container on a deck using role defaults
    pub fn add_deck(&mut self, deck: &DeckState) {
        for (id, container) in deck.containers() {
            let (geometry, capacity) = Geometry::for_role(container.role);
            self.add_container(id, geometry, capacity);
        }
    }

    /// Make `container` address the liquid held in `with`
    ///
    /// Used for a separation plate that physically holds the sample plate's
    /// contents.
    pub fn share_liquid(&mut self, container: ContainerId, with: ContainerId) -> Result<(), HandlerError> {
        if !self.containers.contains_key(&with) {
            return Err(HandlerError::UnknownWell(WellRef::new(with, Position::A1)));
        }
        let model = self
            .containers
            .get_mut(&container)
            .ok_or(HandlerError::UnknownWell(WellRef::new(container, Position::A1)))?;
        model.shares = Some(with);
        Ok(())
    }

    /// Set the volume of one well
    pub fn fill(&mut self, well: WellRef, volume: Volume) -> Result<(), HandlerError> {
        let key = self.well_key(well)?;
        self.volumes.insert(key, volume);
        Ok(())
    }

    /// Set the volume of every well of a container
    pub fn fill_container(&mut self, id: ContainerId, volume: Volume) -> Result<(), HandlerError> {
        let (storage, model) = self.storage(WellRef::new(id, Position::A1))?;
        for position in model.geometry.wells() {
            self.volumes.insert((storage, position), volume);
        }
        Ok(())
    }

    /// Liquid in a well
    pub fn volume(&self, well: WellRef) -> Result<Volume, HandlerError> {
        let key = self.well_key(well)?;
        Ok(self.volumes.get(&key).copied().unwrap_or(Volume::ZERO))
    }

    /// Liquid across all wells of a container
    pub fn total_volume(&self, id: ContainerId) -> Result<Volume, HandlerError> {
        let (storage, _) = self.storage(WellRef::new(id, Position::A1))?;
        Ok(self
            .volumes
            .iter()
            .filter(|((c, _), _)| *c == storage)
            .fold(Volume::ZERO, |acc, (_, v)| acc + *v))
    }

    /// Tips picked up on a mount so far
    pub fn tips_used(&self, mount: Mount) -> usize {
        self.tips_used.get(&mount).copied().unwrap_or(0)
    }

    pub fn has_tip(&self, mount: Mount) -> bool {
        self.tips.contains_key(&mount)
    }

    pub fn log(&self) -> &OpLog {
        &self.log
    }

    fn spec(&self, mount: Mount) -> InstrumentSpec {
        self.instruments.spec(mount).unwrap_or(match mount {
            Mount::Single => InstrumentSpec::p300_single(),
            Mount::Multi => InstrumentSpec::p300_multi(),
        })
    }

    fn storage(&self, well: WellRef) -> Result<(ContainerId, ContainerModel), HandlerError> {
        let model = self
            .containers
            .get(&well.container)
            .ok_or(HandlerError::UnknownWell(well))?;
        match model.shares {
            Some(target) => {
                let shared = self
                    .containers
                    .get(&target)
                    .ok_or(HandlerError::UnknownWell(well))?;
                Ok((target, *shared))
            }
            None => Ok((well.container, *model)),
        }
    }

    fn well_key(&self, well: WellRef) -> Result<WellKey, HandlerError> {
        self.channel_keys(Mount::Single, well)?
            .first()
            .copied()
            .flatten()
            .ok_or(HandlerError::UnknownWell(well))
    }

    /// Physical wells touched by each channel of a mount
    ///
    /// Channels that hang past the last row touch nothing.
    fn channel_keys(
        &self,
        mount: Mount,
        well: WellRef,
    ) -> Result<Vec<Option<WellKey>>, HandlerError> {
        let (storage, model) = self.storage(well)?;
        let channels = match mount {
            Mount::Single => 1,
            Mount::Multi => self.spec(mount).channels,
        };

        let mut keys = Vec::with_capacity(channels as usize);
        for channel in 0..channels {
            let position = match model.geometry {
                Geometry::Plate => {
                    Position::new(well.position.row() + channel, well.position.column())
                }
                Geometry::Trough => Position::column_head(well.position.column()),
                Geometry::Single => Some(Position::A1),
            };
            keys.push(position.map(|p| (storage, p)));
        }
        Ok(keys)
    }

    fn attach(&mut self, mount: Mount) -> Result<(), HandlerError> {
        if self.tips.contains_key(&mount) {
            return Err(HandlerError::TipAlreadyAttached(mount));
        }
        let channels = match mount {
            Mount::Single => 1,
            Mount::Multi => self.spec(mount).channels as usize,
        };
        self.tips.insert(mount, vec![Volume::ZERO; channels]);
        *self.tips_used.entry(mount).or_insert(0) += 1;
        Ok(())
    }

    fn detach(&mut self, mount: Mount) -> Result<(), HandlerError> {
        self.tips
            .remove(&mount)
            .map(|_| ())
            .ok_or(HandlerError::NoTip(mount))
    }

    fn check_tip_volume(&self, mount: Mount, volume: Volume) -> Result<(), HandlerError> {
        let max = self.spec(mount).max_volume;
        if volume > max {
            return Err(HandlerError::Capacity(CapacityError::Tip {
                mount,
                requested: volume,
                max,
            }));
        }
        Ok(())
    }

    /// Draw up to `volume` per channel into the attached tip
    fn draw(&mut self, mount: Mount, well: WellRef, volume: Volume) -> Result<(), HandlerError> {
        let keys = self.channel_keys(mount, well)?;
        let max = self.spec(mount).max_volume;
        let held = self.tips.get_mut(&mount).ok_or(HandlerError::NoTip(mount))?;

        if held.iter().any(|h| *h + volume > max) {
            return Err(HandlerError::Capacity(CapacityError::Tip {
                mount,
                requested: volume,
                max,
            }));
        }

        for (channel, key) in keys.iter().enumerate() {
            let Some(key) = key else {
                continue;
            };
            let available = self.volumes.get(key).copied().unwrap_or(Volume::ZERO);
            let taken = volume.min(available);
            self.volumes.insert(*key, available.saturating_sub(taken));
            if let Some(h) = held.get_mut(channel) {
                *h += taken;
            }
        }
        Ok(())
    }

    /// Expel up to `volume` per channel from the attached tip
    ///
    /// Every destination well is checked before any liquid moves.
    fn expel(&mut self, mount: Mount, well: WellRef, volume: Volume) -> Result<(), HandlerError> {
        let keys = self.channel_keys(mount, well)?;
        let held = self.tips.get(&mount).ok_or(HandlerError::NoTip(mount))?;

        let mut amounts = Vec::with_capacity(keys.len());
        let mut incoming: BTreeMap<WellKey, Volume> = BTreeMap::new();
        for (key, h) in keys.iter().zip(held.iter()) {
            let Some(key) = key else {
                amounts.push(Volume::ZERO);
                continue;
            };
            let amount = volume.min(*h);
            amounts.push(amount);
            *incoming.entry(*key).or_insert(Volume::ZERO) += amount;
        }

        for (key, amount) in &incoming {
            let current = self.volumes.get(key).copied().unwrap_or(Volume::ZERO);
            let capacity = self
                .containers
                .get(&key.0)
                .map(|m| m.capacity)
                .ok_or(HandlerError::UnknownWell(well))?;
            if current + *amount > capacity {
                return Err(HandlerError::Capacity(CapacityError::Well {
                    well: WellRef::new(key.0, key.1),
                    requested: *amount,
                    capacity,
                }));
            }
        }

        for (key, amount) in incoming {
            let current = self.volumes.get(&key).copied().unwrap_or(Volume::ZERO);
            self.volumes.insert(key, current + amount);
        }
        if let Some(held) = self.tips.get_mut(&mount) {
            for (h, amount) in held.iter_mut().zip(amounts) {
                *h = h.saturating_sub(amount);
            }
        }
        Ok(())
    }

    /// Run `f`, restoring volumes and tips if it fails
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, HandlerError>,
    ) -> Result<T, HandlerError> {
        let volumes = self.volumes.clone();
        let tips = self.tips.clone();
        let tips_used = self.tips_used.clone();
        let result = f(self);
        if result.is_err() {
            self.volumes = volumes;
            self.tips = tips;
            self.tips_used = tips_used;
        }
        result
    }
}

impl LiquidHandler for SimHandler {
    fn pick_up_tip(&mut self, mount: Mount) -> Result<(), HandlerError> {
        self.attach(mount)?;
        self.log.record(Op::PickUpTip(mount));
        Ok(())
    }

    fn drop_tip(&mut self, mount: Mount) -> Result<(), HandlerError> {
        self.detach(mount)?;
        self.log.record(Op::DropTip(mount));
        Ok(())
    }

    fn aspirate(&mut self, mount: Mount, at: Location, volume: Volume) -> Result<(), HandlerError> {
        self.draw(mount, at.well, volume)?;
        self.log.record(Op::Aspirate { mount, at, volume });
        Ok(())
    }

    fn dispense(&mut self, mount: Mount, at: Location, volume: Volume) -> Result<(), HandlerError> {
        self.expel(mount, at.well, volume)?;
        self.log.record(Op::Dispense { mount, at, volume });
        Ok(())
    }

    fn mix(
        &mut self,
        mount: Mount,
        at: Location,
        repetitions: u16,
        volume: Volume,
    ) -> Result<(), HandlerError> {
        if !self.has_tip(mount) {
            return Err(HandlerError::NoTip(mount));
        }
        self.check_tip_volume(mount, volume)?;
        self.channel_keys(mount, at.well)?;
        self.log.record(Op::Mix {
            mount,
            at,
            repetitions,
            volume,
        });
        Ok(())
    }

    fn transfer(
        &mut self,
        mount: Mount,
        volume: Volume,
        source: Location,
        dest: Location,
        options: &TransferOptions,
    ) -> Result<(), HandlerError> {
        if let Some((_, mix_volume)) = options.mix_after {
            self.check_tip_volume(mount, mix_volume)?;
        }
        if options.tips == TipPolicy::Never && !self.has_tip(mount) {
            return Err(HandlerError::NoTip(mount));
        }

        self.atomically(|sim| {
            if options.tips == TipPolicy::Always {
                sim.attach(mount)?;
            }

            // Larger volumes take several trips
            let max = sim.spec(mount).max_volume;
            let mut remaining = volume;
            while !remaining.is_zero() {
                let trip = remaining.min(max);
                sim.draw(mount, source.well, trip)?;
                sim.expel(mount, dest.well, trip)?;
                remaining = remaining.saturating_sub(trip);
            }

            if options.tips == TipPolicy::Always {
                sim.detach(mount)?;
            }
            Ok(())
        })?;

        self.log.record(Op::Transfer {
            mount,
            volume,
            source: source.well,
            dest: dest.well,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use magbind_core::deck::DeckLocation;
    use magbind_core::plate::WELL_COUNT;

    use proptest::prelude::*;

    struct Fixture {
        sim: SimHandler,
        plate: ContainerId,
        reservoir: ContainerId,
        waste: ContainerId,
        magnet: ContainerId,
    }

    fn make_fixture() -> Fixture {
        let mut deck = DeckState::new();
        let plate = deck
            .register("plate", ContainerRole::Labware, DeckLocation::Slot(6))
            .unwrap();
        let reservoir = deck
            .register("reservoir", ContainerRole::Reservoir, DeckLocation::Slot(2))
            .unwrap();
        let waste = deck
            .register("waste", ContainerRole::Waste, DeckLocation::Slot(9))
            .unwrap();
        let magnet = deck
            .register("magnet", ContainerRole::Separation, DeckLocation::OffDeck)
            .unwrap();

        let mut sim = SimHandler::new(Instruments::default(), OpLog::new());
        sim.add_deck(&deck);
        sim.share_liquid(magnet, plate).unwrap();
        Fixture {
            sim,
            plate,
            reservoir,
            waste,
            magnet,
        }
    }

    fn pos(s: &str) -> Position {
        Position::parse(s).unwrap()
    }

    #[test]
    fn test_multi_channel_draws_from_trough() {
        let mut f = make_fixture();
        let trough = WellRef::new(f.reservoir, Position::A1);
        f.sim.fill(trough, Volume::from_ul(10_000)).unwrap();

        f.sim.pick_up_tip(Mount::Multi).unwrap();
        f.sim
            .aspirate(Mount::Multi, Location::at(trough), Volume::from_ul(100))
            .unwrap();
        f.sim
            .dispense(
                Mount::Multi,
                Location::at(WellRef::new(f.plate, Position::A1)),
                Volume::from_ul(100),
            )
            .unwrap();
        f.sim.drop_tip(Mount::Multi).unwrap();

        // Eight channels share the one trough well
        assert_eq!(f.sim.volume(trough), Ok(Volume::from_ul(9_200)));
        assert_eq!(
            f.sim.volume(WellRef::new(f.plate, pos("H1"))),
            Ok(Volume::from_ul(100))
        );
        assert_eq!(
            f.sim.volume(WellRef::new(f.plate, pos("A2"))),
            Ok(Volume::ZERO)
        );
        assert_eq!(f.sim.total_volume(f.plate), Ok(Volume::from_ul(800)));
    }

    #[test]
    fn test_aspiration_clamped_to_available() {
        let mut f = make_fixture();
        let well = WellRef::new(f.plate, pos("C4"));
        f.sim.fill(well, Volume::from_ul(120)).unwrap();

        f.sim.pick_up_tip(Mount::Single).unwrap();
        f.sim
            .aspirate(Mount::Single, Location::bottom(well, -10), Volume::from_ul(250))
            .unwrap();
        f.sim
            .dispense(
                Mount::Single,
                Location::at(WellRef::new(f.waste, pos("C4"))),
                Volume::from_ul(250),
            )
            .unwrap();

        assert_eq!(f.sim.volume(well), Ok(Volume::ZERO));
        assert_eq!(
            f.sim.volume(WellRef::new(f.waste, Position::A1)),
            Ok(Volume::from_ul(120))
        );
    }

    #[test]
    fn test_shared_liquid() {
        let mut f = make_fixture();
        let sample = WellRef::new(f.plate, pos("B2"));
        f.sim.fill(sample, Volume::from_ul(600)).unwrap();

        let on_magnet = WellRef::new(f.magnet, pos("B2"));
        assert_eq!(f.sim.volume(on_magnet), Ok(Volume::from_ul(600)));

        f.sim.pick_up_tip(Mount::Single).unwrap();
        f.sim
            .aspirate(Mount::Single, Location::at(on_magnet), Volume::from_ul(250))
            .unwrap();
        assert_eq!(f.sim.volume(sample), Ok(Volume::from_ul(350)));
    }

    #[test]
    fn test_tip_state_errors() {
        let mut f = make_fixture();
        let well = Location::at(WellRef::new(f.plate, Position::A1));

        assert_eq!(
            f.sim.aspirate(Mount::Single, well, Volume::from_ul(10)),
            Err(HandlerError::NoTip(Mount::Single))
        );
        assert_eq!(f.sim.drop_tip(Mount::Multi), Err(HandlerError::NoTip(Mount::Multi)));

        f.sim.pick_up_tip(Mount::Single).unwrap();
        assert_eq!(
            f.sim.pick_up_tip(Mount::Single),
            Err(HandlerError::TipAlreadyAttached(Mount::Single))
        );
        assert_eq!(f.sim.tips_used(Mount::Single), 1);
    }

    #[test]
    fn test_tip_capacity() {
        let mut f = make_fixture();
        let well = Location::at(WellRef::new(f.plate, Position::A1));
        f.sim.pick_up_tip(Mount::Single).unwrap();
        assert!(matches!(
            f.sim.mix(Mount::Single, well, 10, Volume::from_ul(350)),
            Err(HandlerError::Capacity(CapacityError::Tip { .. }))
        ));
    }

    #[test]
    fn test_well_overflow() {
        let mut f = make_fixture();
        let trough = WellRef::new(f.reservoir, Position::A1);
        let target = WellRef::new(f.plate, Position::A1);
        f.sim.fill(trough, Volume::from_ul(10_000)).unwrap();
        f.sim.fill(target, Volume::from_ul(1_900)).unwrap();

        let result = f.sim.transfer(
            Mount::Single,
            Volume::from_ul(200),
            Location::at(trough),
            Location::at(target),
            &TransferOptions::default(),
        );
        assert_eq!(
            result,
            Err(HandlerError::Capacity(CapacityError::Well {
                well: target,
                requested: Volume::from_ul(200),
                capacity: PLATE_WELL_CAPACITY,
            }))
        );
    }

    #[test]
    fn test_failed_transfer_changes_nothing() {
        let mut f = make_fixture();
        let trough = WellRef::new(f.reservoir, Position::A1);
        let target = WellRef::new(f.plate, Position::A1);
        f.sim.fill(trough, Volume::from_ul(10_000)).unwrap();
        f.sim.fill(target, Volume::from_ul(1_900)).unwrap();

        // First trip already overflows the target
        let result = f.sim.transfer(
            Mount::Single,
            Volume::from_ul(400),
            Location::at(trough),
            Location::at(target),
            &TransferOptions::default(),
        );
        assert!(matches!(
            result,
            Err(HandlerError::Capacity(CapacityError::Well { .. }))
        ));
        assert_eq!(f.sim.volume(trough), Ok(Volume::from_ul(10_000)));
        assert_eq!(f.sim.volume(target), Ok(Volume::from_ul(1_900)));
        assert!(!f.sim.has_tip(Mount::Single));
        assert_eq!(f.sim.tips_used(Mount::Single), 0);
        assert!(f.sim.log().is_empty());
    }

    #[test]
    fn test_overflowing_channel_blocks_whole_dispense() {
        let mut f = make_fixture();
        let trough = WellRef::new(f.reservoir, Position::A1);
        let head = WellRef::new(f.plate, Position::A1);
        let h1 = WellRef::new(f.plate, pos("H1"));
        f.sim.fill(trough, Volume::from_ul(10_000)).unwrap();
        f.sim.fill(h1, Volume::from_ul(1_950)).unwrap();

        f.sim.pick_up_tip(Mount::Multi).unwrap();
        f.sim
            .aspirate(Mount::Multi, Location::at(trough), Volume::from_ul(100))
            .unwrap();
        assert_eq!(
            f.sim.dispense(Mount::Multi, Location::at(head), Volume::from_ul(100)),
            Err(HandlerError::Capacity(CapacityError::Well {
                well: h1,
                requested: Volume::from_ul(100),
                capacity: PLATE_WELL_CAPACITY,
            }))
        );

        // No channel dispensed and the tip still holds its liquid
        assert_eq!(f.sim.volume(head), Ok(Volume::ZERO));
        assert_eq!(f.sim.volume(h1), Ok(Volume::from_ul(1_950)));
        let waste = Location::at(WellRef::new(f.waste, Position::A1));
        f.sim
            .dispense(Mount::Multi, waste, Volume::from_ul(100))
            .unwrap();
        assert_eq!(
            f.sim.volume(WellRef::new(f.waste, Position::A1)),
            Ok(Volume::from_ul(800))
        );
    }

    #[test]
    fn test_transfer_splits_into_trips() {
        let mut f = make_fixture();
        let trough = WellRef::new(f.reservoir, pos("A2"));
        let target = WellRef::new(f.plate, Position::A1);
        f.sim.fill(trough, Volume::from_ul(5_000)).unwrap();

        f.sim
            .transfer(
                Mount::Single,
                Volume::from_ul(500),
                Location::at(trough),
                Location::at(target),
                &TransferOptions::default(),
            )
            .unwrap();

        assert_eq!(f.sim.volume(target), Ok(Volume::from_ul(500)));
        assert_eq!(f.sim.volume(trough), Ok(Volume::from_ul(4_500)));
        assert!(!f.sim.has_tip(Mount::Single));
        assert_eq!(f.sim.tips_used(Mount::Single), 1);
        // One logged transfer regardless of trips
        assert_eq!(f.sim.log().len(), 1);
    }

    #[test]
    fn test_transfer_reusing_tip() {
        let mut f = make_fixture();
        let options = TransferOptions {
            tips: TipPolicy::Never,
            ..Default::default()
        };
        let source = Location::at(WellRef::new(f.reservoir, Position::A1));
        let dest = Location::at(WellRef::new(f.plate, Position::A1));

        assert_eq!(
            f.sim
                .transfer(Mount::Single, Volume::from_ul(10), source, dest, &options),
            Err(HandlerError::NoTip(Mount::Single))
        );

        f.sim.pick_up_tip(Mount::Single).unwrap();
        for _ in 0..3 {
            f.sim
                .transfer(Mount::Single, Volume::from_ul(10), source, dest, &options)
                .unwrap();
        }
        assert!(f.sim.has_tip(Mount::Single));
        assert_eq!(f.sim.tips_used(Mount::Single), 1);
    }

    #[test]
    fn test_unknown_container() {
        let mut deck = DeckState::new();
        let stray = deck
            .register("stray", ContainerRole::Labware, DeckLocation::Slot(1))
            .unwrap();
        let mut sim = SimHandler::new(Instruments::default(), OpLog::new());
        let well = WellRef::new(stray, Position::A1);

        assert_eq!(sim.volume(well), Err(HandlerError::UnknownWell(well)));
        sim.pick_up_tip(Mount::Single).unwrap();
        assert_eq!(
            sim.aspirate(Mount::Single, Location::at(well), Volume::from_ul(10)),
            Err(HandlerError::UnknownWell(well))
        );
    }

    #[test]
    fn test_multi_channel_past_last_row() {
        let mut f = make_fixture();
        f.sim
            .fill_container(f.plate, Volume::from_ul(100))
            .unwrap();
        f.sim.pick_up_tip(Mount::Multi).unwrap();
        f.sim
            .aspirate(
                Mount::Multi,
                Location::at(WellRef::new(f.plate, pos("D6"))),
                Volume::from_ul(50),
            )
            .unwrap();

        // Rows D..H only; the other three channels hang off the plate
        assert_eq!(f.sim.volume(WellRef::new(f.plate, pos("C6"))), Ok(Volume::from_ul(100)));
        assert_eq!(f.sim.volume(WellRef::new(f.plate, pos("D6"))), Ok(Volume::from_ul(50)));
        assert_eq!(f.sim.volume(WellRef::new(f.plate, pos("H6"))), Ok(Volume::from_ul(50)));
        assert_eq!(f.sim.total_volume(f.plate), Ok(Volume::from_ul(9_350)));
    }

    proptest! {
        #[test]
        fn prop_transfers_conserve_liquid(
            moves in proptest::collection::vec((0usize..WELL_COUNT, 0usize..WELL_COUNT, 1u32..=600), 1..40)
        ) {
            let mut f = make_fixture();
            f.sim.fill_container(f.plate, Volume::from_ul(1_000)).unwrap();
            let start = f.sim.total_volume(f.plate).unwrap();

            for (from, to, ul) in moves {
                let source = WellRef::new(f.plate, Position::from_index(from).unwrap());
                let dest = WellRef::new(f.plate, Position::from_index(to).unwrap());
                // Overflowing transfers fail without moving anything
                let _ = f.sim.transfer(
                    Mount::Single,
                    Volume::from_ul(ul),
                    Location::at(source),
                    Location::at(dest),
                    &TransferOptions::default(),
                );
                prop_assert!(!f.sim.has_tip(Mount::Single));
            }

            prop_assert_eq!(f.sim.total_volume(f.plate).unwrap(), start);
            for position in Position::all() {
                let v = f.sim.volume(WellRef::new(f.plate, position)).unwrap();
                prop_assert!(v <= PLATE_WELL_CAPACITY);
            }
        }
    }
}
