//! CPU-side mesh representation used by loaders.

use thiserror::Error;

/// Mesh invariant violations detected by [`MeshData::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("position array length {0} is not a multiple of 3")]
    RaggedPositions(usize),
    #[error("texcoord array holds {found} floats, expected 0 or {expected}")]
    TexcoordCount { found: usize, expected: usize },
    #[error("normal array holds {found} floats, expected 0 or {expected}")]
    NormalCount { found: usize, expected: usize },
    #[error("index {index} at position {at} is out of range (vertex count {vertex_count})")]
    IndexOutOfRange {
        index: u32,
        at: usize,
        vertex_count: usize,
    },
}

/// Indexed mesh stored as flat attribute streams sharing one index buffer.
///
/// `texcoords` and `normals` are either empty or describe exactly
/// [`vertex_count`](Self::vertex_count) vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// xyz triplets.
    pub positions: Vec<f32>,
    /// uv pairs.
    pub texcoords: Vec<f32>,
    /// xyz triplets.
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(
        positions: Vec<f32>,
        texcoords: Vec<f32>,
        normals: Vec<f32>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            positions,
            texcoords,
            normals,
            indices,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Check stream lengths and index bounds.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.positions.len() % 3 != 0 {
            return Err(MeshError::RaggedPositions(self.positions.len()));
        }
        let vertex_count = self.vertex_count();

        if self.has_texcoords() && self.texcoords.len() != vertex_count * 2 {
            return Err(MeshError::TexcoordCount {
                found: self.texcoords.len(),
                expected: vertex_count * 2,
            });
        }
        if self.has_normals() && self.normals.len() != vertex_count * 3 {
            return Err(MeshError::NormalCount {
                found: self.normals.len(),
                expected: vertex_count * 3,
            });
        }

        if let Some((at, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                at,
                vertex_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
            Vec::new(),
            vec![0, 1, 2],
        )
    }

    #[test]
    fn mesh_data_validity() {
        let data = triangle();
        assert!(data.validate().is_ok());
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.index_count(), 3);
        assert!(!data.has_texcoords());
        assert!(!data.has_normals());
    }

    #[test]
    fn empty_mesh_has_nothing_to_draw() {
        let data = MeshData::default();
        assert!(data.validate().is_ok());
        assert_eq!(data.vertex_count(), 0);
        assert_eq!(data.index_count(), 0);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut data = triangle();
        data.indices.push(3);
        assert_eq!(
            data.validate(),
            Err(MeshError::IndexOutOfRange {
                index: 3,
                at: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn mismatched_optional_streams_are_rejected() {
        let mut data = triangle();
        data.texcoords = vec![0.0; 4];
        assert!(matches!(
            data.validate(),
            Err(MeshError::TexcoordCount {
                found: 4,
                expected: 6
            })
        ));

        let mut data = triangle();
        data.normals = vec![0.0, 0.0, 1.0];
        assert!(matches!(data.validate(), Err(MeshError::NormalCount { .. })));
    }

    #[test]
    fn ragged_positions_are_rejected() {
        let mut data = triangle();
        data.positions.pop();
        assert_eq!(data.validate(), Err(MeshError::RaggedPositions(8)));
    }
}
