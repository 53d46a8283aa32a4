//! Shader builder: compiles a WGSL vertex/fragment pair with naga and links
//! them into a [`ShaderProgram`].
//!
//! Compilation is per stage (parse + validate). Linking checks what a GL
//! linker would: both stages present, fragment inputs fed by vertex outputs,
//! shared uniforms bound consistently. The GPU pipeline is created later by
//! [`crate::program::GpuProgram`], which reports its own failures as link
//! errors too.

use std::fmt;

use asset::ShaderSources;
use naga::{Binding, Handle, Module, Type, TypeInner};
use thiserror::Error;

use crate::uniforms::{UniformTable, UnsupportedBinding};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            Self::Vertex => "@vertex",
            Self::Fragment => "@fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "Vertex",
            Self::Fragment => "Fragment",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("{stage} Shader Error: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("Link Error: {log}")]
    Link { log: String },
}

impl ShaderError {
    pub(crate) fn link(log: impl Into<String>) -> Self {
        Self::Link { log: log.into() }
    }
}

/// One parsed and validated stage.
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    source: String,
    module: Module,
    uniforms: UniformTable,
    unsupported: Vec<UnsupportedBinding>,
}

impl CompiledShader {
    pub fn source(&self) -> &str {
        &self.source
    }

    fn entry_point(&self) -> Option<&naga::EntryPoint> {
        let stage = self.stage.naga();
        self.module.entry_points.iter().find(|ep| ep.stage == stage)
    }
}

/// Parse and validate one stage.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            stage,
            log: e.emit_to_string(source),
        })?;

    let (uniforms, unsupported) = UniformTable::reflect(&module);
    log::debug!(
        "{} shader compiled: {} entry point(s), {} uniform block(s)",
        stage,
        module.entry_points.len(),
        uniforms.blocks().len()
    );

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        module,
        uniforms,
        unsupported,
    })
}

/// A linked vertex + fragment pair.
#[derive(Debug)]
pub struct ShaderProgram {
    vertex: CompiledShader,
    fragment: CompiledShader,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: UniformTable,
}

impl ShaderProgram {
    pub fn vertex(&self) -> &CompiledShader {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledShader {
        &self.fragment
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Uniforms of both stages.
    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Input locations the vertex entry point reads.
    pub fn vertex_input_locations(&self) -> Vec<u32> {
        let module = &self.vertex.module;
        self.vertex
            .entry_point()
            .map(|ep| {
                ep.function
                    .arguments
                    .iter()
                    .flat_map(|arg| locations(module, arg.binding.as_ref(), arg.ty))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn locations(module: &Module, binding: Option<&Binding>, ty: Handle<Type>) -> Vec<u32> {
    match binding {
        Some(&Binding::Location { location, .. }) => vec![location],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match module.types[ty].inner {
            TypeInner::Struct { ref members, .. } => members
                .iter()
                .filter_map(|m| match m.binding {
                    Some(Binding::Location { location, .. }) => Some(location),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

/// Link two compiled stages.
pub fn link(vertex: CompiledShader, fragment: CompiledShader) -> Result<ShaderProgram, ShaderError> {
    for (shader, expected) in [
        (&vertex, ShaderStage::Vertex),
        (&fragment, ShaderStage::Fragment),
    ] {
        if shader.stage != expected {
            return Err(ShaderError::link(format!(
                "expected a {} shader, got a {} shader",
                expected, shader.stage
            )));
        }
    }

    let vs_entry = vertex.entry_point().ok_or_else(|| {
        ShaderError::link(format!(
            "vertex shader has no {} entry point",
            ShaderStage::Vertex.attribute()
        ))
    })?;
    let fs_entry = fragment.entry_point().ok_or_else(|| {
        ShaderError::link(format!(
            "fragment shader has no {} entry point",
            ShaderStage::Fragment.attribute()
        ))
    })?;

    let written: Vec<u32> = vs_entry
        .function
        .result
        .as_ref()
        .map(|r| locations(&vertex.module, r.binding.as_ref(), r.ty))
        .unwrap_or_default();
    for arg in &fs_entry.function.arguments {
        for location in locations(&fragment.module, arg.binding.as_ref(), arg.ty) {
            if !written.contains(&location) {
                return Err(ShaderError::link(format!(
                    "fragment input @location({location}) is not written by the vertex shader"
                )));
            }
        }
    }

    if let Some(res) = vertex
        .unsupported
        .iter()
        .chain(fragment.unsupported.iter())
        .next()
    {
        return Err(ShaderError::link(format!(
            "resource '{}' at @group({}) @binding({}) is not a uniform buffer; only uniform buffers can be bound",
            res.name, res.group, res.binding
        )));
    }

    let mut uniforms = vertex.uniforms.clone();
    uniforms.merge(&fragment.uniforms).map_err(ShaderError::link)?;

    let vertex_entry = vs_entry.name.clone();
    let fragment_entry = fs_entry.name.clone();
    log::info!(
        "Shader program linked: {}() + {}(), uniforms: [{}]",
        vertex_entry,
        fragment_entry,
        uniforms
            .slots()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(ShaderProgram {
        vertex,
        fragment,
        vertex_entry,
        fragment_entry,
        uniforms,
    })
}

/// Compile both stages and link them.
pub fn build_program(sources: &ShaderSources) -> Result<ShaderProgram, ShaderError> {
    let vertex = compile(ShaderStage::Vertex, &sources.vertex)?;
    let fragment = compile(ShaderStage::Fragment, &sources.fragment)?;
    link(vertex, fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformKind;

    const VS: &str = include_str!("../../../assets/vs.txt");
    const FS: &str = include_str!("../../../assets/fs.txt");

    const FLAT_FS: &str = r#"
        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 1.0, 1.0, 1.0);
        }
    "#;

    #[test]
    fn bundled_shaders_link() {
        let program = build_program(&ShaderSources::new(VS, FS)).unwrap();
        assert_eq!(program.vertex_entry(), "vs_main");
        assert_eq!(program.fragment_entry(), "fs_main");
        assert_eq!(program.vertex_input_locations(), vec![0]);
        assert_eq!(program.uniforms().lookup("model").unwrap().kind, UniformKind::Mat4);
        assert_eq!(program.uniforms().lookup("mvp").unwrap().binding, 1);
    }

    #[test]
    fn vertex_compile_error_names_stage() {
        let err = build_program(&ShaderSources::new("fn vs_main( {", FS)).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        let msg = err.to_string();
        assert!(msg.starts_with("Vertex Shader Error: "));
        assert!(msg.len() > "Vertex Shader Error: ".len());
    }

    #[test]
    fn fragment_compile_error_names_stage() {
        let bad = "@fragment fn fs_main() -> @location(0) vec4<f32> { return undefined_name; }";
        let err = build_program(&ShaderSources::new(VS, bad)).unwrap_err();
        assert!(err.to_string().starts_with("Fragment Shader Error: "));
    }

    #[test]
    fn validation_errors_are_compile_errors() {
        // Parses, but returns the wrong type.
        let bad = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec3<f32>(1.0); }";
        let err = compile(ShaderStage::Fragment, bad).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }

    #[test]
    fn missing_entry_point_is_link_error() {
        let vertex = compile(ShaderStage::Vertex, FLAT_FS).unwrap();
        let fragment = compile(ShaderStage::Fragment, FLAT_FS).unwrap();
        let err = link(vertex, fragment).unwrap_err();
        assert!(err.to_string().starts_with("Link Error: "));
        assert!(err.to_string().contains("@vertex"));
    }

    #[test]
    fn unfed_fragment_input_is_link_error() {
        let fs = r#"
            @fragment
            fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
        "#;
        let err = build_program(&ShaderSources::new(VS, fs)).unwrap_err();
        assert_eq!(
            err,
            ShaderError::Link {
                log: "fragment input @location(3) is not written by the vertex shader".into()
            }
        );
    }

    #[test]
    fn texture_bindings_are_rejected_at_link() {
        let fs = r#"
            @group(1) @binding(0) var tex: texture_2d<f32>;
            @fragment
            fn fs_main(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
                return textureLoad(tex, vec2<i32>(p.xy), 0);
            }
        "#;
        let err = build_program(&ShaderSources::new(VS, fs)).unwrap_err();
        assert!(err.to_string().contains("'tex'"));
    }

    #[test]
    fn shader_without_uniforms_links() {
        let vs = r#"
            @vertex
            fn main_v(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, 1.0);
            }
        "#;
        let program = build_program(&ShaderSources::new(vs, FLAT_FS)).unwrap();
        assert_eq!(program.vertex_entry(), "main_v");
        assert!(program.uniforms().blocks().is_empty());
        assert!(program.uniforms().lookup("mvp").is_none());
    }
}
