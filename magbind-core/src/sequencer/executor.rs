//! Step sequencer
//!
//! Drives the purification cycle over a batch plan. Every batch-touching
//! step expands the plan into targets through the dispatch selector, so the
//! multi/single-channel split is decided in one place. Operations are
//! issued strictly in program order; a failed step faults the sequencer and
//! every later step returns [`RunError::Aborted`].

use core::time::Duration;

use crate::batch::{for_each_target, plan_targets, BatchPlan, SourceGroup, Supply, Target, TargetList};
use crate::config::{CycleSettings, Instruments};
use crate::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use crate::error::{PhysicalStateError, RunError};
use crate::plate::{Position, Volume};
use crate::safety::{CapacityGuard, VolumeCheck};
use crate::state::{CycleEvent, CyclePhase};
use crate::traits::{DeckController, LiquidHandler, Location, Mount, TipPolicy, TransferOptions};

use super::steps::{CycleStep, Mix, MixPattern, ReagentAddition};

/// Purification step sequencer
///
/// Owns the collaborators and the deck model for the duration of a run.
pub struct Sequencer<H, D> {
    handler: H,
    controller: D,
    deck: DeckState,
    plan: BatchPlan,
    instruments: Instruments,
    guard: CapacityGuard,
    settings: CycleSettings,
    phase: CyclePhase,
}

impl<H: LiquidHandler, D: DeckController> Sequencer<H, D> {
    /// Create a sequencer with default cycle settings and an empty plan
    pub fn new(handler: H, controller: D, deck: DeckState, instruments: Instruments) -> Self {
        Self {
            handler,
            controller,
            deck,
            plan: BatchPlan::empty(),
            instruments,
            guard: CapacityGuard::new(instruments),
            settings: CycleSettings::default(),
            phase: CyclePhase::Ready,
        }
    }

    /// Use a batch plan for every batch-touching step
    pub fn with_plan(mut self, plan: BatchPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Override the cycle settings
    pub fn with_settings(mut self, settings: CycleSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Get current cycle phase
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn deck(&self) -> &DeckState {
        &self.deck
    }

    pub fn plan(&self) -> &BatchPlan {
        &self.plan
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn controller(&self) -> &D {
        &self.controller
    }

    /// Targets the current plan expands to
    pub fn targets(&self) -> Result<TargetList, RunError> {
        Ok(plan_targets(&self.plan, &self.instruments)?)
    }

    /// Add `volume` from the rotated source to every target and mix
    pub fn dispense_and_mix(
        &mut self,
        volume: Volume,
        source: &SourceGroup,
        destination: ContainerId,
        mix_volume: Volume,
    ) -> Result<(), RunError> {
        let addition = ReagentAddition::new(volume, Supply::Group(source.clone()), destination)
            .with_mix(Mix::new(self.settings.mix_repetitions, mix_volume));
        self.guarded(|s| s.add(&addition))
    }

    /// Add a reagent to every target
    pub fn add_reagent(&mut self, addition: &ReagentAddition) -> Result<(), RunError> {
        self.guarded(|s| s.add(addition))
    }

    /// Mix every target in place with a fresh tip
    pub fn mix_each(&mut self, destination: ContainerId, mix: Mix) -> Result<(), RunError> {
        self.guarded(|s| s.mix_targets(destination, mix))
    }

    /// Move a container, validated against the deck model first
    pub fn relocate(&mut self, container: ContainerId, to: DeckLocation) -> Result<(), RunError> {
        self.guarded(|s| s.move_container(container, to))
    }

    /// Wait for the beads to aggregate
    pub fn settle(&mut self, duration: Duration) -> Result<(), RunError> {
        self.guarded(|s| {
            s.settle_for(duration);
            Ok(())
        })
    }

    /// Wait for drying or incubation
    pub fn wait(&mut self, duration: Duration) -> Result<(), RunError> {
        self.guarded(|s| {
            info!("Waiting {} s", duration.as_secs());
            s.controller.delay(duration);
            Ok(())
        })
    }

    /// Block until the operator resumes
    pub fn pause(&mut self, message: &str) -> Result<(), RunError> {
        self.guarded(|s| {
            info!("Paused for operator: {}", message);
            s.controller.pause(message);
            Ok(())
        })
    }

    /// Aspirate the supernatant from every target into `destination`
    ///
    /// `source` must sit on the separation device. Each target uses one tip
    /// for all `aspirations`.
    pub fn remove_supernatant(
        &mut self,
        aspirations: u8,
        source: ContainerId,
        destination: ContainerId,
    ) -> Result<(), RunError> {
        self.guarded(|s| s.aspirate_supernatant(aspirations, source, destination))
    }

    /// Move `volume` from each target well of `source` to the same well of
    /// `destination`
    pub fn transfer_each(
        &mut self,
        volume: Volume,
        source: ContainerId,
        destination: ContainerId,
    ) -> Result<(), RunError> {
        self.guarded(|s| s.transfer_targets(volume, source, destination))
    }

    /// Run one add, mix, separate and aspirate cycle
    pub fn cycle(&mut self, step: &CycleStep) -> Result<(), RunError> {
        self.guarded(|s| s.run_cycle(step))
    }

    /// Attach a tip outside the batched steps
    pub fn pick_up_tip(&mut self, mount: Mount) -> Result<(), RunError> {
        self.guarded(|s| {
            s.guard.instrument(mount)?;
            s.handler.pick_up_tip(mount)?;
            Ok(())
        })
    }

    /// Drop the attached tip
    pub fn drop_tip(&mut self, mount: Mount) -> Result<(), RunError> {
        self.guarded(|s| {
            s.guard.instrument(mount)?;
            s.handler.drop_tip(mount)?;
            Ok(())
        })
    }

    /// Single transfer with an explicit mount
    pub fn transfer(
        &mut self,
        mount: Mount,
        volume: Volume,
        source: Location,
        dest: Location,
        options: &TransferOptions,
    ) -> Result<(), RunError> {
        self.guarded(|s| {
            if s.guard.check_transfer(mount, volume)? == VolumeCheck::Skip {
                return Ok(());
            }
            trace!("Transfer {} {} -> {}", volume, source.well, dest.well);
            s.handler.transfer(mount, volume, source, dest, options)?;
            Ok(())
        })
    }

    /// Resolve a well address through the deck model
    pub fn well(
        &self,
        container: ContainerId,
        position: Position,
    ) -> Result<WellRef, RunError> {
        Ok(self.deck.well(container, position)?)
    }

    /// Mark the run complete
    pub fn finish(&mut self) -> Result<(), RunError> {
        self.guarded(|s| {
            s.event(CycleEvent::RunFinished);
            info!("Run complete");
            Ok(())
        })
    }

    /// Release the collaborators and the final deck model
    pub fn into_parts(self) -> (H, D, DeckState) {
        (self.handler, self.controller, self.deck)
    }

    /// Run a step unless the sequence already stopped; fault on error
    fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RunError>,
    ) -> Result<T, RunError> {
        if self.phase.is_terminal() {
            return Err(RunError::Aborted);
        }
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Step failed: {}", e);
                self.event(CycleEvent::Fault);
                Err(e)
            }
        }
    }

    fn event(&mut self, event: CycleEvent) {
        let next = self.phase.transition(event);
        if next != self.phase {
            debug!("Phase {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
    }

    fn add(&mut self, addition: &ReagentAddition) -> Result<(), RunError> {
        self.deck.container(addition.destination)?;
        if addition.volume.is_zero() || self.plan.is_empty() {
            debug!("Nothing to add");
            return Ok(());
        }

        info!(
            "Adding {} to {} wells of {}",
            addition.volume,
            self.plan.position_count(),
            addition.destination
        );

        let mixing = addition.mix.is_some();
        if mixing {
            self.event(CycleEvent::BeginMix);
        }

        let Self {
            handler,
            deck,
            plan,
            instruments,
            guard,
            settings,
            ..
        } = self;
        for_each_target(plan, instruments, |target: Target| -> Result<(), RunError> {
            let source = addition
                .supply
                .source_for(deck, target.batch, target.position)?;
            let dest = deck.well(addition.destination, target.position)?;

            if addition.is_stepwise() {
                return add_stepwise(handler, guard, target.mount, source, dest, addition);
            }

            let options = TransferOptions {
                tips: TipPolicy::Always,
                blow_out: settings.blow_out,
                mix_after: addition.mix.map(|m| (m.repetitions, m.volume)),
            };
            if let Some(m) = addition.mix {
                guard.check_tip(target.mount, m.volume)?;
            }
            guard.check_transfer(target.mount, addition.volume)?;
            handler.transfer(
                target.mount,
                addition.volume,
                Location::at(source),
                Location::at(dest),
                &options,
            )?;
            Ok(())
        })?;

        if mixing {
            self.event(CycleEvent::MixComplete);
        }
        Ok(())
    }

    fn mix_targets(&mut self, destination: ContainerId, mix: Mix) -> Result<(), RunError> {
        self.deck.container(destination)?;
        if self.plan.is_empty() {
            return Ok(());
        }

        self.event(CycleEvent::BeginMix);
        let Self {
            handler,
            deck,
            plan,
            instruments,
            guard,
            ..
        } = self;
        for_each_target(plan, instruments, |target: Target| -> Result<(), RunError> {
            let well = deck.well(destination, target.position)?;
            guard.check_tip(target.mount, mix.volume)?;
            handler.pick_up_tip(target.mount)?;
            handler.mix(target.mount, Location::at(well), mix.repetitions, mix.volume)?;
            handler.drop_tip(target.mount)?;
            Ok(())
        })?;
        self.event(CycleEvent::MixComplete);
        Ok(())
    }

    fn move_container(&mut self, container: ContainerId, to: DeckLocation) -> Result<(), RunError> {
        let from = self.deck.location(container)?;
        if from == to {
            trace!("{} already at {}", container, to);
            return Ok(());
        }

        self.deck.check_relocate(container, to)?;
        self.controller.move_container(container, to)?;
        self.deck.relocate(container, to)?;
        info!("Moved {} from {} to {}", container, from, to);

        if self.deck.role(container)? == ContainerRole::Separation {
            if to.is_on_deck() {
                self.event(CycleEvent::PlacedOnSeparator);
            } else {
                self.event(CycleEvent::RemovedFromSeparator);
            }
        }
        Ok(())
    }

    fn settle_for(&mut self, duration: Duration) {
        info!("Settling for {} s", duration.as_secs());
        self.controller.delay(duration);
        self.event(CycleEvent::SettleElapsed);
    }

    fn aspirate_supernatant(
        &mut self,
        aspirations: u8,
        source: ContainerId,
        destination: ContainerId,
    ) -> Result<(), RunError> {
        if !self.deck.is_on_separation_device(source)? {
            return Err(PhysicalStateError::NotOnSeparationDevice(source).into());
        }
        if !self.phase.aspiration_allowed() {
            return Err(PhysicalStateError::NotSeparated(source).into());
        }
        self.deck.container(destination)?;

        let volume = self.settings.supernatant_volume;
        info!(
            "Removing supernatant: {} x {} from {} wells",
            aspirations,
            volume,
            self.plan.position_count()
        );

        let Self {
            handler,
            deck,
            plan,
            instruments,
            guard,
            settings,
            ..
        } = self;
        for_each_target(plan, instruments, |target: Target| -> Result<(), RunError> {
            let mount = target.mount;
            let from = Location::bottom(
                deck.well(source, target.position)?,
                settings.aspirate_height_x10,
            );
            let to = Location::bottom(
                deck.well(destination, target.position)?,
                settings.dispense_height_x10,
            );

            guard.check_tip(mount, volume)?;
            handler.pick_up_tip(mount)?;
            for _ in 0..aspirations {
                handler.aspirate(mount, from, volume)?;
                handler.dispense(mount, to, volume)?;
            }
            handler.drop_tip(mount)?;
            Ok(())
        })?;

        self.event(CycleEvent::SupernatantRemoved);
        Ok(())
    }

    fn transfer_targets(
        &mut self,
        volume: Volume,
        source: ContainerId,
        destination: ContainerId,
    ) -> Result<(), RunError> {
        self.deck.container(source)?;
        self.deck.container(destination)?;
        info!(
            "Transferring {} from {} to {} for {} wells",
            volume,
            source,
            destination,
            self.plan.position_count()
        );

        let Self {
            handler,
            deck,
            plan,
            instruments,
            guard,
            ..
        } = self;
        for_each_target(plan, instruments, |target: Target| -> Result<(), RunError> {
            if guard.check_transfer(target.mount, volume)? == VolumeCheck::Skip {
                return Ok(());
            }
            let from = deck.well(source, target.position)?;
            let to = deck.well(destination, target.position)?;
            handler.transfer(
                target.mount,
                volume,
                Location::at(from),
                Location::at(to),
                &TransferOptions::default(),
            )?;
            Ok(())
        })
    }

    fn run_cycle(&mut self, step: &CycleStep) -> Result<(), RunError> {
        let DeckLocation::Slot(slot) = self.deck.location(step.sample)? else {
            return Err(PhysicalStateError::NotOnDeck(step.sample).into());
        };
        let separation_home = self.deck.location(step.separation)?;

        let addition = ReagentAddition::new(step.volume, Supply::Group(step.source.clone()), step.sample)
            .with_mix(Mix::new(self.settings.mix_repetitions, step.mix_volume));
        self.add(&addition)?;

        self.move_container(step.sample, DeckLocation::OffDeck)?;
        self.move_container(step.separation, DeckLocation::Slot(slot))?;
        self.settle_for(self.settings.settle());
        self.aspirate_supernatant(step.aspirations, step.separation, step.waste)?;

        if !step.keep_on_separation {
            self.move_container(step.separation, separation_home)?;
            self.move_container(step.sample, DeckLocation::Slot(slot))?;
        }
        Ok(())
    }
}


/// Explicit pick-up, optional premix, aspirate, dispense, mix, drop
fn add_stepwise<H: LiquidHandler>(
    handler: &mut H,
    guard: &CapacityGuard,
    mount: Mount,
    source: WellRef,
    dest: WellRef,
    addition: &ReagentAddition,
) -> Result<(), RunError> {
    guard.check_tip(mount, addition.volume)?;
    if let Some(premix) = addition.premix {
        guard.check_tip(mount, premix.volume)?;
    }
    if let Some(mix) = addition.mix {
        guard.check_tip(mount, mix.volume)?;
    }

    handler.pick_up_tip(mount)?;
    if let Some(premix) = addition.premix {
        handler.mix(mount, Location::at(source), premix.repetitions, premix.volume)?;
    }
    handler.aspirate(mount, Location::at(source), addition.volume)?;
    handler.dispense(mount, Location::at(dest), addition.volume)?;

    if let Some(mix) = addition.mix {
        match addition.pattern {
            MixPattern::InPlace => {
                handler.mix(mount, Location::at(dest), mix.repetitions, mix.volume)?;
            }
            MixPattern::Ascending { step_x10 } => {
                let mut height: i16 = 0;
                for _ in 0..mix.repetitions {
                    let at = Location::bottom(dest, height);
                    handler.aspirate(mount, at, mix.volume)?;
                    handler.dispense(mount, at, mix.volume)?;
                    height = height.saturating_add(step_x10);
                }
            }
        }
    }

    handler.drop_tip(mount)?;
    Ok(())
}
