//! Integration test: assemble the synthetic Arctic scenario in every layout.
//!
//! The scenario drifts uniformly at u = 10, v = -10 cm/s (8.64 km/day per
//! component), holds 260 K air
//! and calm wind, and leaves the south-west quarter of the mesh ice-free.

mod common;

use approx::assert_abs_diff_eq;
use ingestion::ConcentrationProduct;
use seaice_common::PrepError;
use test_utils::{arctic_scenario, fixtures::values};
use training_data::{
    input_channels, output_channels, AssemblyConfig, ConcentrationOrigin, Layout,
};

use common::{assembler, ice_free, swath_assembler};

const EPS: f32 = 1e-5;

fn drift() -> f32 {
    (values::DRIFT_KM_PER_DAY / 50.0) as f32
}

fn config(layout: Layout) -> AssemblyConfig {
    AssemblyConfig {
        layout,
        window: 1,
        ..AssemblyConfig::default()
    }
}

#[test]
fn test_entire_layout_masks_ice_free_quarter() {
    let scenario = arctic_scenario(4, 3);
    let dataset = assembler(&scenario, config(Layout::Entire))
        .assemble(&[0, 1])
        .unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.grid_shape, (4, 4));
    assert_eq!(dataset.time_indices, vec![0, 1]);
    assert!(dataset.skipped.is_empty());
    assert_eq!(dataset.xx.len(), 16);
    assert_eq!(dataset.yy.len(), 16);

    let (input, output) = dataset.grid_samples().unwrap();
    assert_eq!(input.shape(), &[2, 4, 4, input_channels::COUNT]);
    assert_eq!(output.shape(), &[2, 4, 4, output_channels::COUNT]);

    for k in 0..2 {
        for r in 0..4 {
            for c in 0..4 {
                if ice_free(4, r, c) {
                    for ch in 0..input_channels::COUNT {
                        assert_eq!(input[[k, r, c, ch]], 0.0, "input ({r}, {c}, {ch})");
                    }
                    for ch in 0..output_channels::COUNT {
                        assert_eq!(output[[k, r, c, ch]], 0.0, "output ({r}, {c}, {ch})");
                    }
                    continue;
                }
                assert_abs_diff_eq!(input[[k, r, c, input_channels::U]], drift(), epsilon = EPS);
                assert_abs_diff_eq!(input[[k, r, c, input_channels::V]], -drift(), epsilon = EPS);
                assert_abs_diff_eq!(input[[k, r, c, input_channels::SIC]], 1.0, epsilon = EPS);
                assert_abs_diff_eq!(input[[k, r, c, input_channels::T2M]], 0.25, epsilon = EPS);
                assert_abs_diff_eq!(input[[k, r, c, input_channels::U10]], 0.0, epsilon = EPS);
                assert_abs_diff_eq!(input[[k, r, c, input_channels::V10]], 0.0, epsilon = EPS);
                assert_abs_diff_eq!(output[[k, r, c, output_channels::U]], drift(), epsilon = EPS);
                assert_abs_diff_eq!(output[[k, r, c, output_channels::V]], -drift(), epsilon = EPS);
                assert_abs_diff_eq!(output[[k, r, c, output_channels::SIC]], 1.0, epsilon = EPS);
            }
        }
    }
}

#[test]
fn test_cell_layout_keeps_covered_interior_centres() {
    let scenario = arctic_scenario(4, 2);
    let dataset = assembler(&scenario, config(Layout::Cell))
        .assemble(&[0])
        .unwrap();

    // Interior centres are (1,1), (1,2), (2,1), (2,2); (1,1) is ice-free
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.time_indices, vec![0, 0, 0]);
    let (input, output) = dataset.grid_samples().unwrap();
    assert_eq!(input.shape(), &[3, 3, 3, input_channels::COUNT]);
    assert_eq!(output.shape(), &[3, 3, 3, output_channels::COUNT]);

    let x = scenario.grid.x();
    let y = scenario.grid.y();
    for (k, (m, n)) in [(1, 2), (2, 1), (2, 2)].into_iter().enumerate() {
        assert_eq!(dataset.xx[k], x[[m, n]]);
        assert_eq!(dataset.yy[k], y[[m, n]]);
        // Window centre is the sample cell itself
        assert_abs_diff_eq!(input[[k, 1, 1, input_channels::U]], drift(), epsilon = EPS);
    }

    // The window of centre (1,2) reaches the ice-free cell (0,1), which
    // keeps its raw motion: cell samples are not masked
    assert_abs_diff_eq!(input[[0, 0, 0, input_channels::U]], drift(), epsilon = EPS);
    assert_eq!(input[[0, 0, 0, input_channels::SIC]], 0.0);
}

#[test]
fn test_table_layout_on_small_mesh_is_empty() {
    let scenario = arctic_scenario(4, 2);
    let dataset = assembler(&scenario, config(Layout::Table))
        .assemble(&[0])
        .unwrap();

    // Every 3x3 window of the 4x4 mesh touches the ice-free quarter
    assert!(dataset.is_empty());
    let (input, output) = dataset.table_samples().unwrap();
    assert_eq!(input.dim(), (0, 9 * input_channels::COUNT));
    assert_eq!(output.dim(), (0, 9 * output_channels::COUNT));
}

#[test]
fn test_table_layout_requires_fully_covered_window() {
    let scenario = arctic_scenario(6, 2);
    let dataset = assembler(&scenario, config(Layout::Table))
        .assemble(&[0])
        .unwrap();

    let expected = [(1, 4), (2, 4), (3, 4), (4, 1), (4, 2), (4, 3), (4, 4)];
    assert_eq!(dataset.len(), expected.len());
    let x = scenario.grid.x();
    let y = scenario.grid.y();
    for (k, &(m, n)) in expected.iter().enumerate() {
        assert_eq!(dataset.xx[k], x[[m, n]], "sample {k}");
        assert_eq!(dataset.yy[k], y[[m, n]], "sample {k}");
    }

    let (input, output) = dataset.table_samples().unwrap();
    assert_eq!(input.dim(), (7, 54));
    assert_eq!(output.dim(), (7, 27));
    // Features run row, column, channel: feature 2 is the first cell's sic
    for k in 0..7 {
        assert_abs_diff_eq!(input[[k, input_channels::U]], drift(), epsilon = EPS);
        assert_abs_diff_eq!(input[[k, input_channels::SIC]], 1.0, epsilon = EPS);
        assert_abs_diff_eq!(input[[k, input_channels::T2M]], 0.25, epsilon = EPS);
        assert_abs_diff_eq!(output[[k, output_channels::SIC]], 1.0, epsilon = EPS);
    }
}

#[test]
fn test_parallel_matches_serial() {
    let scenario = arctic_scenario(4, 5);
    let indices = [3, 0, 2, 1, 4];
    let serial = assembler(&scenario, config(Layout::Cell))
        .assemble(&indices)
        .unwrap();
    let parallel = assembler(
        &scenario,
        AssemblyConfig {
            parallel: true,
            ..config(Layout::Cell)
        },
    )
    .assemble(&indices)
    .unwrap();

    assert_eq!(serial, parallel);
    assert_eq!(serial.time_indices, vec![3, 3, 3, 0, 0, 0, 2, 2, 2, 1, 1, 1]);
    assert_eq!(serial.skipped.len(), 1);
    assert_eq!(serial.skipped[0].index, 4);
}

#[test]
fn test_motion_store_opened_per_read_and_closed() {
    let scenario = arctic_scenario(4, 3);
    assembler(&scenario, config(Layout::Entire))
        .assemble(&[0, 1])
        .unwrap();
    assert!(scenario.motion.opens() > 0);
    assert_eq!(scenario.motion.open_handles(), 0);
}

#[test]
fn test_satellite_concentration_replaces_reanalysis_cover() {
    let scenario = arctic_scenario(4, 3);
    let config = AssemblyConfig {
        concentration: ConcentrationOrigin::Satellite(ConcentrationProduct::Swath),
        ..config(Layout::Entire)
    };
    let dataset = swath_assembler(&scenario, config, &[]).assemble(&[0]).unwrap();

    let (input, output) = dataset.grid_samples().unwrap();
    // 80% everywhere, so nothing is masked
    for r in 0..4 {
        for c in 0..4 {
            assert_abs_diff_eq!(input[[0, r, c, input_channels::SIC]], 0.8, epsilon = EPS);
            assert_abs_diff_eq!(output[[0, r, c, output_channels::SIC]], 0.8, epsilon = EPS);
            assert_abs_diff_eq!(input[[0, r, c, input_channels::U]], drift(), epsilon = EPS);
        }
    }
}

#[test]
fn test_missing_satellite_day_skipped_unless_strict() {
    let scenario = arctic_scenario(4, 3);
    let satellite = AssemblyConfig {
        concentration: ConcentrationOrigin::Satellite(ConcentrationProduct::Swath),
        ..config(Layout::Entire)
    };

    // Day 2 is the target of index 1
    let dataset = swath_assembler(&scenario, satellite.clone(), &[2])
        .assemble(&[0, 1])
        .unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.time_indices, vec![0]);
    assert_eq!(dataset.skipped.len(), 1);
    assert_eq!(dataset.skipped[0].index, 1);
    assert_eq!(dataset.skipped[0].kind, "missing_source_file");

    let strict = AssemblyConfig {
        strict: true,
        ..satellite
    };
    let result = swath_assembler(&scenario, strict, &[2]).assemble(&[0, 1]);
    assert!(matches!(result, Err(PrepError::MissingSourceFile { .. })));
}

#[test]
fn test_zero_window_gives_single_cell_samples() {
    let scenario = arctic_scenario(4, 2);
    let single = |layout| AssemblyConfig {
        window: 0,
        ..config(layout)
    };

    // Every cell is interior; the 4 ice-free cells are dropped
    let cells = assembler(&scenario, single(Layout::Cell))
        .assemble(&[0])
        .unwrap();
    let (input, output) = cells.grid_samples().unwrap();
    assert_eq!(input.shape(), &[12, 1, 1, input_channels::COUNT]);
    assert_eq!(output.shape(), &[12, 1, 1, output_channels::COUNT]);
    assert_eq!(cells.xx[0], scenario.grid.x()[[0, 2]]);

    let table = assembler(&scenario, single(Layout::Table))
        .assemble(&[0])
        .unwrap();
    let (input, output) = table.table_samples().unwrap();
    assert_eq!(input.dim(), (12, input_channels::COUNT));
    assert_eq!(output.dim(), (12, output_channels::COUNT));
    assert_abs_diff_eq!(input[[0, input_channels::SIC]], 1.0, epsilon = EPS);
}
