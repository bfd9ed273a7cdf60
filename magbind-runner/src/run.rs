//! Protocol execution against the simulator
//!
//! Builds the deck, batch plan and primed simulator for the configured
//! protocol, runs it to completion or first failure and reports what was
//! issued.

use std::fmt;
use std::time::Duration;

use eyre::{bail, eyre, Report, Result};
use tracing::{debug, info};

use magbind_core::batch::{partition, BatchPlan};
use magbind_core::config::GridConfig;
use magbind_core::deck::DeckState;
use magbind_core::grid::VolumeMap;
use magbind_core::plate::Volume;
use magbind_core::sequencer::Sequencer;
use magbind_core::state::CyclePhase;
use magbind_core::traits::Mount;
use magbind_core::RunError;
use magbind_drivers::sim::{Op, OpLog, SimDeck, SimHandler};
use magbind_protocols::handling::{dilution, normalization, pooling};
use magbind_protocols::purification::{dna_rna, extraction, total_rna};
use magbind_protocols::{Preparation, Protocol};

use crate::config::RunConfig;
use crate::realtime::Paced;

type SimSequencer = Sequencer<SimHandler, Paced<SimDeck>>;

/// What a run issued and where it stopped
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<(), RunError>,
    pub phase: CyclePhase,
    pub ops: Vec<Op>,
    pub waited: Duration,
    pub pauses: usize,
    pub tips_single: usize,
    pub tips_multi: usize,
}

fn fail(e: impl fmt::Display) -> Report {
    eyre!("{e}")
}

fn needs_grid(protocol: Protocol) -> bool {
    protocol.is_purification() || protocol == Protocol::Pooling
}

/// Parse the selection grid and partition it
pub fn plan(config: &RunConfig) -> Result<BatchPlan> {
    let Some(grid) = config.selection_grid() else {
        if needs_grid(config.protocol) {
            bail!("{} needs a selection grid", config.protocol);
        }
        return Ok(BatchPlan::empty());
    };

    let selection = grid
        .selection()
        .map_err(|e| eyre!("selection grid: {e}"))?;
    let plan = partition(&selection, config.protocol.channels()).map_err(fail)?;
    info!(
        "{} positions in {} batches",
        plan.position_count(),
        plan.len()
    );
    Ok(plan)
}

fn volume_grid(name: &str, table: Option<&str>) -> Result<VolumeMap> {
    let table = table.ok_or_else(|| eyre!("normalization needs a {name} grid"))?;
    let grid = GridConfig::sparse(table)
        .load()
        .map_err(|e| eyre!("{name} grid: {e}"))?;
    Ok(grid.volumes())
}

/// Validate everything that can be checked before a run
pub fn check(config: &RunConfig) -> Result<()> {
    plan(config)?;
    match config.protocol {
        Protocol::Normalization => {
            let water = volume_grid("water", config.water_grid.as_deref())?;
            let dna = volume_grid("DNA", config.dna_grid.as_deref())?;
            normalization::pairs(&water, &dna).map_err(fail)?;
        }
        Protocol::Dilution => {
            config
                .dilution
                .unwrap_or_default()
                .validate()
                .map_err(fail)?;
        }
        _ => {}
    }
    Ok(())
}

/// Prime the simulator and build a sequencer over it
fn start(
    config: &RunConfig,
    deck: DeckState,
    plan: BatchPlan,
    prep: &Preparation,
    log: &OpLog,
    scale: Option<f64>,
) -> Result<SimSequencer> {
    let instruments = config.instruments();
    let mut handler = SimHandler::new(instruments, log.clone());
    handler.add_deck(&deck);
    prep.apply(&mut handler, &plan).map_err(fail)?;
    debug!("Primed {} fills", prep.fills.len());

    let controller = Paced::new(SimDeck::new(log.clone()), scale);
    Ok(Sequencer::new(handler, controller, deck, instruments)
        .with_plan(plan)
        .with_settings(config.settings()))
}

fn outcome(seq: SimSequencer, result: Result<(), RunError>) -> Outcome {
    let phase = seq.phase();
    let (handler, controller, _) = seq.into_parts();
    Outcome {
        result,
        phase,
        ops: handler.log().entries(),
        waited: controller.inner().waited(),
        pauses: controller.inner().pauses().len(),
        tips_single: handler.tips_used(Mount::Single),
        tips_multi: handler.tips_used(Mount::Multi),
    }
}

/// Run the configured protocol on the simulator
///
/// Configuration problems found before the first operation are returned as
/// errors; failures during the run are reported in [`Outcome::result`].
pub fn execute(config: &RunConfig, scale: Option<f64>) -> Result<Outcome> {
    let plan = plan(config)?;
    let log = OpLog::new();
    let mut deck = DeckState::new();
    info!("Running {}", config.protocol);

    let (seq, result) = match config.protocol {
        Protocol::DnaRnaPurification => {
            let layout = dna_rna::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(), &log, scale)?;
            let result = dna_rna::run(&mut seq, &layout);
            (seq, result)
        }
        Protocol::DnaExtraction => {
            let layout = extraction::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(), &log, scale)?;
            let result = extraction::run(&mut seq, &layout);
            (seq, result)
        }
        Protocol::TotalRna => {
            let layout = total_rna::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(), &log, scale)?;
            let result = total_rna::run(&mut seq, &layout);
            (seq, result)
        }
        Protocol::Normalization => {
            let water = volume_grid("water", config.water_grid.as_deref())?;
            let dna = volume_grid("DNA", config.dna_grid.as_deref())?;
            let stock = dna.iter().map(|(_, v)| *v).max().unwrap_or(Volume::ZERO);
            let layout = normalization::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(stock), &log, scale)?;
            let result = normalization::run(&mut seq, &layout, &water, &dna);
            (seq, result)
        }
        Protocol::Pooling => {
            let layout = pooling::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(), &log, scale)?;
            let result = pooling::run(&mut seq, &layout);
            (seq, result)
        }
        Protocol::Dilution => {
            let volumes = config.dilution.unwrap_or_default();
            let layout = dilution::Layout::register(&mut deck).map_err(fail)?;
            let mut seq = start(config, deck, plan, &layout.preparation(), &log, scale)?;
            let result = dilution::run(&mut seq, &layout, &volumes);
            (seq, result)
        }
    };

    Ok(outcome(seq, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::decode;

    const SAMPLE: &str = include_str!("../run.toml");

    const THREE_WELLS: &str = "\
,1,2,3,4,5,6,7,8,9,10,11,12
A,TRUE,,,,,,,,,,,
B,,,TRUE,,,,,,,,,
C,,,,,,,,,,,,TRUE
";

    #[test]
    fn test_sample_runs_to_completion() {
        let config = decode(SAMPLE.as_bytes()).unwrap();
        let outcome = execute(&config, None).unwrap();
        assert_eq!(outcome.result, Ok(()));
        assert_eq!(outcome.phase, CyclePhase::Complete);
        assert!(outcome.tips_multi > 0);
        assert_eq!(outcome.tips_single, 0);
        assert!(outcome.waited >= Duration::from_secs(25 * 60));
    }

    #[test]
    fn test_pooling_needs_grid() {
        let config = RunConfig::new(Protocol::Pooling);
        let err = execute(&config, None).unwrap_err();
        assert!(err.to_string().contains("pooling needs a selection grid"));
    }

    #[test]
    fn test_purification_rejects_sparse_grid() {
        let mut config = RunConfig::new(Protocol::DnaExtraction);
        config.grid = Some(THREE_WELLS.into());
        assert!(check(&config).is_err());

        config.protocol = Protocol::Pooling;
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_pooling_outcome() {
        let mut config = RunConfig::new(Protocol::Pooling);
        config.grid = Some(THREE_WELLS.into());
        let outcome = execute(&config, None).unwrap();
        assert_eq!(outcome.result, Ok(()));
        assert_eq!(outcome.tips_single, 4);
        let transfers = outcome
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Transfer { .. }))
            .count();
        assert_eq!(transfers, 4);
    }

    #[test]
    fn test_normalization_needs_both_grids() {
        let mut config = RunConfig::new(Protocol::Normalization);
        config.water_grid = Some(",1\nA,10\n".into());
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("DNA grid"));
    }

    #[test]
    fn test_dilution_range_checked_up_front() {
        let mut config = RunConfig::new(Protocol::Dilution);
        let mut volumes = dilution::DilutionVolumes::default();
        volumes.sample = Volume::from_ul(40);
        config.dilution = Some(volumes);
        assert!(check(&config).is_err());
    }
}
