//! CPU-side geometry uploaded by the frame renderer.

use thiserror::Error;

/// Corners of a 2x2x2 cube centered on the origin, front face (+Z) first.
pub const CUBE_POSITIONS: [[f32; 3]; 8] = [
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
];

/// One index per corner.
pub const CUBE_INDICES: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("geometry has no vertex positions")]
    NoPositions,

    #[error("geometry has no indices")]
    NoIndices,

    #[error("index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Positions plus the indices that select them for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn cube() -> Self {
        Self::new(CUBE_POSITIONS.to_vec(), CUBE_INDICES.to_vec())
    }

    /// Checks that every index selects an existing vertex.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.is_empty() {
            return Err(GeometryError::NoPositions);
        }
        if self.indices.is_empty() {
            return Err(GeometryError::NoIndices);
        }

        let vertex_count = self.positions.len();
        match self
            .indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= vertex_count)
        {
            Some((slot, &index)) => Err(GeometryError::IndexOutOfRange {
                slot,
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Positions flattened to `x, y, z, x, y, z, ...`.
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flatten().copied().collect()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::cube()
    }
}
