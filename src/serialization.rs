//! Final board listing.
//!
//! The output mirrors the input format: a parameter header (with the
//! generation slot pinned to the literal `0` for compatibility) followed
//! by one record per populated cell in row-major order.

use std::io::Write;

use crate::errors::Result;
use crate::simulation::SimulationParams;
use crate::world::World;

/// Write the end-of-run board listing.
pub fn write_results(mut out: impl Write, params: &SimulationParams, world: &World) -> Result<()> {
    writeln!(
        out,
        "{} {} {} 0 {} {} {}",
        params.rabbit_breeding_age,
        params.fox_breeding_age,
        params.fox_starvation_limit,
        params.rows,
        params.cols,
        world.populated_count()
    )?;

    for (row, col, content) in world.iter_populated() {
        if let Some(kind) = content.kind_name() {
            writeln!(out, "{} {} {}", kind, row, col)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Render the listing to a string; handy for tests and comparisons.
pub fn results_to_string(params: &SimulationParams, world: &World) -> Result<String> {
    let mut buffer = Vec::new();
    write_results(&mut buffer, params, world)?;
    // The writer only produces ASCII.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_loader::load_world_str;

    #[test]
    fn test_listing_is_row_major_with_pinned_header() {
        let loaded =
            load_world_str("5 7 9 42 3 3 3\nFOX 2 0\nROCK 0 1\nRABBIT 1 2\n").unwrap();
        let text = results_to_string(&loaded.params, &loaded.world).unwrap();
        // The generation slot is the literal zero, not the input's 42.
        assert_eq!(
            text,
            "5 7 9 0 3 3 3\nROCK 0 1\nRABBIT 1 2\nFOX 2 0\n"
        );
    }

    #[test]
    fn test_empty_world_emits_header_only() {
        let loaded = load_world_str("1 2 3 4 2 2 0\n").unwrap();
        let text = results_to_string(&loaded.params, &loaded.world).unwrap();
        assert_eq!(text, "1 2 3 0 2 2 0\n");
    }
}
