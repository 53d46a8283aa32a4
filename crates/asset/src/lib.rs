//! Asset loading (meshes, shader sources).
//! OBJ meshes are parsed with `tobj` into flat single-indexed streams.

pub mod mesh;
pub mod obj;
pub mod shader;

pub use mesh::{MeshData, MeshError};
pub use shader::ShaderSources;
