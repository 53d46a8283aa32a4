//! Mesh stream → shader input location wiring.

use asset::MeshData;
use wgpu::{VertexAttribute, VertexFormat};

/// One per-vertex stream a mesh may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshStream {
    Position,
    Texcoord,
    Normal,
}

impl MeshStream {
    pub const ALL: [MeshStream; 3] = [Self::Position, Self::Texcoord, Self::Normal];

    /// Float components per vertex.
    pub const fn components(self) -> u32 {
        match self {
            Self::Position | Self::Normal => 3,
            Self::Texcoord => 2,
        }
    }

    pub const fn format(self) -> VertexFormat {
        match self {
            Self::Position | Self::Normal => VertexFormat::Float32x3,
            Self::Texcoord => VertexFormat::Float32x2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Texcoord => "texcoord",
            Self::Normal => "normal",
        }
    }

    fn data(self, mesh: &MeshData) -> &[f32] {
        match self {
            Self::Position => &mesh.positions,
            Self::Texcoord => &mesh.texcoords,
            Self::Normal => &mesh.normals,
        }
    }
}

/// Shader input location of each mesh stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeBindings {
    pub position: u32,
    pub texcoord: u32,
    pub normal: u32,
}

impl Default for AttributeBindings {
    fn default() -> Self {
        Self {
            position: 0,
            texcoord: 1,
            normal: 2,
        }
    }
}

impl AttributeBindings {
    pub fn location(&self, stream: MeshStream) -> u32 {
        match stream {
            MeshStream::Position => self.position,
            MeshStream::Texcoord => self.texcoord,
            MeshStream::Normal => self.normal,
        }
    }
}

/// An enabled attribute: the stream, its shader location and its data.
#[derive(Clone, Copy, Debug)]
pub struct EnabledAttribute<'a> {
    pub stream: MeshStream,
    pub attribute: VertexAttribute,
    pub data: &'a [f32],
}

impl EnabledAttribute<'_> {
    /// Bytes between consecutive vertices in the stream's own buffer.
    pub fn stride(&self) -> u64 {
        u64::from(self.stream.components()) * std::mem::size_of::<f32>() as u64
    }
}

/// Which attributes a mesh enables. Position is always enabled; texcoord
/// and normal only when their arrays are non-empty.
#[derive(Clone, Debug)]
pub struct AttributeLayout<'a> {
    enabled: Vec<EnabledAttribute<'a>>,
}

impl<'a> AttributeLayout<'a> {
    pub fn for_mesh(mesh: &'a MeshData, bindings: &AttributeBindings) -> Self {
        let enabled = MeshStream::ALL
            .into_iter()
            .filter(|&stream| stream == MeshStream::Position || !stream.data(mesh).is_empty())
            .map(|stream| EnabledAttribute {
                stream,
                attribute: VertexAttribute {
                    format: stream.format(),
                    offset: 0,
                    shader_location: bindings.location(stream),
                },
                data: stream.data(mesh),
            })
            .collect();
        Self { enabled }
    }

    pub fn is_enabled(&self, stream: MeshStream) -> bool {
        self.enabled.iter().any(|a| a.stream == stream)
    }

    /// Enabled shader locations, in buffer slot order.
    pub fn locations(&self) -> Vec<u32> {
        self.enabled
            .iter()
            .map(|a| a.attribute.shader_location)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnabledAttribute<'a>> {
        self.enabled.iter()
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_positions_only() -> MeshData {
        let positions = (0..8)
            .flat_map(|i| {
                [
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                ]
            })
            .collect();
        let indices = (0..36).map(|i| i % 8).collect();
        MeshData::new(positions, Vec::new(), Vec::new(), indices)
    }

    #[test]
    fn positions_only_mesh_enables_slot_zero() {
        let mesh = cube_positions_only();
        let layout = AttributeLayout::for_mesh(&mesh, &AttributeBindings::default());
        assert!(layout.is_enabled(MeshStream::Position));
        assert!(!layout.is_enabled(MeshStream::Texcoord));
        assert!(!layout.is_enabled(MeshStream::Normal));
        assert_eq!(layout.locations(), vec![0]);
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn full_mesh_enables_all_streams() {
        let mesh = MeshData::new(
            vec![0.0; 9],
            vec![0.0; 6],
            vec![0.0; 9],
            vec![0, 1, 2],
        );
        let layout = AttributeLayout::for_mesh(&mesh, &AttributeBindings::default());
        assert_eq!(layout.locations(), vec![0, 1, 2]);

        let tex = layout
            .iter()
            .find(|a| a.stream == MeshStream::Texcoord)
            .unwrap();
        assert_eq!(tex.attribute.format, VertexFormat::Float32x2);
        assert_eq!(tex.stride(), 8);
        assert_eq!(tex.data.len(), 6);
    }

    #[test]
    fn loaded_cube_enables_only_positions() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/cube.obj");
        let mesh = asset::obj::load_first_shape_from_path(path).unwrap();
        assert_eq!(mesh.index_count(), 36);

        let layout = AttributeLayout::for_mesh(&mesh, &AttributeBindings::default());
        assert!(layout.is_enabled(MeshStream::Position));
        assert!(!layout.is_enabled(MeshStream::Texcoord));
        assert!(!layout.is_enabled(MeshStream::Normal));
        let position = layout.iter().next().unwrap();
        assert_eq!(position.data.len(), 24);
        assert_eq!(position.stride(), 12);
    }

    #[test]
    fn custom_bindings_move_locations() {
        let mesh = MeshData::new(vec![0.0; 9], Vec::new(), vec![0.0; 9], vec![0, 1, 2]);
        let bindings = AttributeBindings {
            position: 3,
            texcoord: 4,
            normal: 5,
        };
        let layout = AttributeLayout::for_mesh(&mesh, &bindings);
        assert_eq!(layout.locations(), vec![3, 5]);
    }
}
