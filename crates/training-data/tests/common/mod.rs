//! Shared construction of assemblers over the synthetic Arctic scenario.

#![allow(dead_code)]

use std::sync::Arc;

use grid_processor::ResamplerCache;
use ingestion::{
    ConcentrationAdapter, ConcentrationProduct, IceMotionAdapter, ReanalysisAdapter, SourceConfig,
};
use projection::ProjectionRegistry;
use test_utils::ArcticScenario;
use training_data::{AssemblyConfig, DatasetAssembler};

/// Scenario year; the synthetic axis starts on 2020-01-01.
pub const YEAR: i32 = 2020;

pub fn assembler(scenario: &ArcticScenario, config: AssemblyConfig) -> DatasetAssembler {
    let cache = Arc::new(ResamplerCache::new(4));
    DatasetAssembler::new(
        IceMotionAdapter::new(scenario.motion.clone(), SourceConfig::default(), YEAR),
        scenario.reanalysis.clone(),
        ReanalysisAdapter::new(ProjectionRegistry::standard(), cache),
        config,
    )
}

/// Assembler reading concentration from an 80% swath product with the
/// days in `missing` absent.
pub fn swath_assembler(
    scenario: &ArcticScenario,
    config: AssemblyConfig,
    missing: &[usize],
) -> DatasetAssembler {
    let source = test_utils::swath_concentration(&scenario.days, missing, 80.0);
    let adapter = ConcentrationAdapter::new(
        ConcentrationProduct::Swath,
        Arc::new(source),
        ProjectionRegistry::standard(),
        Arc::new(ResamplerCache::new(4)),
    );
    assembler(scenario, config).with_concentration(adapter)
}

/// Whether `(row, col)` lies in the ice-free south-west quarter of a
/// `size`×`size` scenario mesh.
pub fn ice_free(size: usize, row: usize, col: usize) -> bool {
    row < size / 2 && col < size / 2
}
