//! Shader source files read from disk.

use std::{fs, path::Path};

use anyhow::{Context, Result};

/// Default vertex shader file, relative to the working directory.
pub const DEFAULT_VERTEX_SHADER: &str = "vs.txt";
/// Default fragment shader file, relative to the working directory.
pub const DEFAULT_FRAGMENT_SHADER: &str = "fs.txt";

/// Vertex and fragment source text of one program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both stages. A missing file is an error.
    pub fn from_files(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self> {
        let vertex = read_source(vertex.as_ref())?;
        let fragment = read_source(fragment.as_ref())?;
        Ok(Self { vertex, fragment })
    }
}

fn read_source(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read shader file: {}", path.display()))?;
    log::debug!("Read shader {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
