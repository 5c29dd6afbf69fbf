//! Ladder structure: seeded bridge generation and path tracing
//!
//! Only the seed travels over the wire. Every client rebuilds the same
//! matrix from it, so generation must stay byte-for-byte deterministic.

use crate::rng::Mulberry32;

/// Number of rows in every ladder round
pub const LADDER_STEPS: usize = 20;

const BRIDGE_THRESHOLD: f64 = 0.5;

/// `rows[step][col]` is true when lanes `col` and `col + 1` are joined at `step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMatrix {
    lanes: usize,
    rows: Vec<Vec<bool>>,
}

impl BridgeMatrix {
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn has_bridge(&self, step: usize, col: usize) -> bool {
        self.rows
            .get(step)
            .and_then(|row| row.get(col))
            .copied()
            .unwrap_or(false)
    }
}

/// Build the bridge matrix for `lanes` participants.
///
/// One PRNG draw per cell, row-major, left to right. A cell gets a bridge
/// when its draw exceeds 0.5 and the cell to its left has none.
pub fn generate(seed: i32, lanes: usize, steps: usize) -> BridgeMatrix {
    let mut rng = Mulberry32::from_seed(seed);
    let cols = lanes.saturating_sub(1);

    let rows = (0..steps)
        .map(|_| {
            let mut row: Vec<bool> = Vec::with_capacity(cols);
            for col in 0..cols {
                // Draw first: the sequence must advance even next to a bridge.
                let draw = rng.next_f64();
                let left_taken = col > 0 && row[col - 1];
                row.push(draw > BRIDGE_THRESHOLD && !left_taken);
            }
            row
        })
        .collect();

    BridgeMatrix { lanes, rows }
}

/// Trace `start` from top to bottom and return the lane it ends in.
pub fn resolve(matrix: &BridgeMatrix, start: usize) -> usize {
    let mut current = start;
    for step in 0..matrix.rows.len() {
        if matrix.has_bridge(step, current) {
            current += 1;
        } else if current > 0 && matrix.has_bridge(step, current - 1) {
            current -= 1;
        }
    }
    current
}
