//! OBJ loading on top of `tobj`, one single-indexed mesh per shape.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::mesh::MeshData;

/// A named object/group from an OBJ file.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjShape {
    pub name: String,
    pub mesh: MeshData,
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load every shape with faces from an OBJ file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<Vec<ObjShape>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load OBJ file: {}", path.display()))
}

/// Load every shape with faces from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(mut reader: R) -> Result<Vec<ObjShape>> {
    // Materials are not used; `mtllib` lines resolve to an empty library.
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .context("Failed to parse OBJ")?;

    let mut shapes = Vec::with_capacity(models.len());
    for model in models {
        if model.mesh.indices.is_empty() {
            log::debug!("Skipping OBJ shape '{}' without faces", model.name);
            continue;
        }
        let tobj::Mesh {
            positions,
            texcoords,
            normals,
            indices,
            ..
        } = model.mesh;
        let mut mesh = MeshData::new(positions, texcoords, normals, indices);
        drop_partial_streams(&model.name, &mut mesh);
        mesh.validate()
            .with_context(|| format!("OBJ shape '{}' is inconsistent", model.name))?;
        shapes.push(ObjShape {
            name: model.name,
            mesh,
        });
    }
    Ok(shapes)
}

// Faces that mix with/without `vt` or `vn` leave a stream covering only some
// vertices. Such a stream is discarded so the shape still draws from positions.
fn drop_partial_streams(name: &str, mesh: &mut MeshData) {
    let vertex_count = mesh.vertex_count();
    if mesh.has_texcoords() && mesh.texcoords.len() != vertex_count * 2 {
        log::warn!(
            "OBJ shape '{}': texcoords cover only some vertices ({} floats for {} vertices); ignoring them",
            name,
            mesh.texcoords.len(),
            vertex_count
        );
        mesh.texcoords.clear();
    }
    if mesh.has_normals() && mesh.normals.len() != vertex_count * 3 {
        log::warn!(
            "OBJ shape '{}': normals cover only some vertices ({} floats for {} vertices); ignoring them",
            name,
            mesh.normals.len(),
            vertex_count
        );
        mesh.normals.clear();
    }
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<Vec<ObjShape>> {
    load_obj_from_reader(io::Cursor::new(contents))
}

/// Pick the first shape; later shapes are ignored.
pub fn first_shape(shapes: Vec<ObjShape>) -> Result<MeshData> {
    let total = shapes.len();
    let first = shapes
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("OBJ contained no shapes with faces"))?;
    if total > 1 {
        log::warn!(
            "OBJ has {} shapes; only the first ('{}') is used",
            total,
            first.name
        );
    }
    log::info!(
        "Loaded shape '{}': {} vertices, {} indices, texcoords={}, normals={}",
        first.name,
        first.mesh.vertex_count(),
        first.mesh.index_count(),
        first.mesh.has_texcoords(),
        first.mesh.has_normals()
    );
    Ok(first.mesh)
}

/// Load the first shape of an OBJ file.
pub fn load_first_shape_from_path(path: impl AsRef<Path>) -> Result<MeshData> {
    first_shape(load_obj_from_path(path)?)
}
