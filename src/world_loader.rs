//! Input parsing: board file text into parameters and a populated world.
//!
//! The format is whitespace-separated integers followed by placement
//! records:
//!
//! ```text
//! Gr Gf Ff N R C P
//! KIND row col        (P records, KIND in ROCK | RABBIT | FOX)
//! ```
//!
//! Coordinates are zero-based. When two records name the same cell the
//! last one wins.

use std::io::BufRead;
use std::str::FromStr;

use tracing::{debug, info};

use crate::entities::{FoxState, RabbitState};
use crate::errors::{EcosimError, Result};
use crate::simulation::SimulationParams;
use crate::world::{CellContent, World};

/// Parse result: run parameters plus the populated grid with its
/// reachability cache frozen.
#[derive(Debug)]
pub struct LoadedWorld {
    pub params: SimulationParams,
    pub world: World,
}

fn next_token<'a>(tokens: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str> {
    tokens
        .next()
        .ok_or_else(|| EcosimError::parse(format!("unexpected end of input, expected {}", what)))
}

fn next_number<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<T> {
    let token = next_token(tokens, what)?;
    token
        .parse()
        .map_err(|_| EcosimError::parse(format!("invalid {}: {:?}", what, token)))
}

/// Load a board from text.
pub fn load_world(mut reader: impl BufRead) -> Result<LoadedWorld> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    load_world_str(&text)
}

/// Load a board from an in-memory string.
pub fn load_world_str(text: &str) -> Result<LoadedWorld> {
    let mut tokens = text.split_whitespace();

    let params = SimulationParams {
        rabbit_breeding_age: next_number(&mut tokens, "rabbit breeding age")?,
        fox_breeding_age: next_number(&mut tokens, "fox breeding age")?,
        fox_starvation_limit: next_number(&mut tokens, "fox starvation limit")?,
        generations: next_number(&mut tokens, "generation count")?,
        rows: next_number(&mut tokens, "row count")?,
        cols: next_number(&mut tokens, "column count")?,
        initial_population: next_number(&mut tokens, "population count")?,
    };

    if params.rows == 0 || params.cols == 0 {
        return Err(EcosimError::config(format!(
            "grid dimensions must be positive, got {}x{}",
            params.rows, params.cols
        )));
    }

    let mut world = World::new(params.rows, params.cols);

    for _ in 0..params.initial_population {
        let kind = next_token(&mut tokens, "placement kind")?;
        let row: usize = next_number(&mut tokens, "placement row")?;
        let col: usize = next_number(&mut tokens, "placement column")?;

        if row >= params.rows || col >= params.cols {
            return Err(EcosimError::world_loading(format!(
                "{} placement ({}, {}) is outside the {}x{} grid",
                kind, row, col, params.rows, params.cols
            )));
        }

        let content = match kind {
            "ROCK" => CellContent::Rock,
            "RABBIT" => CellContent::Rabbit(RabbitState::newborn(0)),
            "FOX" => CellContent::Fox(FoxState::newborn(0)),
            other => {
                return Err(EcosimError::parse(format!(
                    "unknown placement kind {:?}",
                    other
                )))
            }
        };

        if !matches!(world.cell(row, col), CellContent::Empty) {
            debug!("duplicate placement at ({}, {}), keeping the last record", row, col);
        }
        world.set(row, col, content);
    }

    world.freeze_reachability();

    info!(
        "loaded {}x{} world: {} placements, {} rocks",
        params.rows,
        params.cols,
        params.initial_population,
        world.rock_count()
    );

    Ok(LoadedWorld { params, world })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_board() {
        let loaded = load_world_str("5 7 9 100 3 4 3\nROCK 0 0\nRABBIT 1 2\nFOX 2 3\n").unwrap();
        assert_eq!(loaded.params.rabbit_breeding_age, 5);
        assert_eq!(loaded.params.fox_breeding_age, 7);
        assert_eq!(loaded.params.fox_starvation_limit, 9);
        assert_eq!(loaded.params.generations, 100);
        assert_eq!(loaded.params.rows, 3);
        assert_eq!(loaded.params.cols, 4);
        assert_eq!(loaded.world.rock_count(), 1);
        assert!(matches!(loaded.world.cell(0, 0), CellContent::Rock));
        assert!(matches!(loaded.world.cell(1, 2), CellContent::Rabbit(_)));
        assert!(matches!(loaded.world.cell(2, 3), CellContent::Fox(_)));
    }

    #[test]
    fn test_whitespace_layout_is_free_form() {
        let loaded = load_world_str("1 1 1 0 2 2 1 RABBIT 0 1").unwrap();
        assert!(matches!(loaded.world.cell(0, 1), CellContent::Rabbit(_)));
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let err = load_world_str("5 7 9 100 3 4 2\nROCK 0 0\n").unwrap_err();
        assert!(matches!(err, EcosimError::Parse(_)));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let err = load_world_str("1 1 1 1 2 2 1\nWOLF 0 0\n").unwrap_err();
        assert!(matches!(err, EcosimError::Parse(_)));
    }

    #[test]
    fn test_out_of_bounds_placement_is_an_error() {
        let err = load_world_str("1 1 1 1 2 2 1\nROCK 5 0\n").unwrap_err();
        assert!(matches!(err, EcosimError::WorldLoading(_)));
    }

    #[test]
    fn test_duplicate_placement_keeps_last() {
        let loaded = load_world_str("1 1 1 0 2 2 2\nROCK 0 0\nFOX 0 0\n").unwrap();
        assert!(matches!(loaded.world.cell(0, 0), CellContent::Fox(_)));
        assert_eq!(loaded.world.rock_count(), 0);
    }

    #[test]
    fn test_reachability_is_frozen_after_load() {
        let loaded = load_world_str("1 1 1 0 1 3 1\nROCK 0 2\n").unwrap();
        // (0, 1) can only step west: east is a rock, north/south are out
        // of bounds.
        assert_eq!(loaded.world.reachable(0, 1).len(), 1);
    }
}
