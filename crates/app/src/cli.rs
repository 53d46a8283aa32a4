//! Command line: one positional OBJ path plus optional `--flag=value` options.
//! Parsing does no file I/O.

use std::{ffi::OsString, path::PathBuf};

use asset::shader::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliArgs {
    pub obj_path: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub backends: wgpu::Backends,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("expected exactly one OBJ path, got {0}")]
    PositionalCount(usize),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' is not valid Unicode")]
    NonUnicodeOption(String),
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--vs=<path>] [--fs=<path>] [--gpu-backend=auto|vulkan|dx12|metal|gl] <obj>"
    )
}

fn parse_backend(val: &str) -> wgpu::Backends {
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

/// Parse arguments, program name excluded. Paths need not be valid Unicode;
/// options must be.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut vertex_shader = PathBuf::from(DEFAULT_VERTEX_SHADER);
    let mut fragment_shader = PathBuf::from(DEFAULT_FRAGMENT_SHADER);
    let mut backends = wgpu::Backends::all(); // default = auto

    for arg in args {
        let arg = match arg.into().into_string() {
            Ok(arg) => arg,
            Err(raw) if raw.as_encoded_bytes().starts_with(b"--") => {
                return Err(CliError::NonUnicodeOption(
                    raw.to_string_lossy().into_owned(),
                ));
            }
            Err(raw) => {
                positional.push(PathBuf::from(raw));
                continue;
            }
        };
        if let Some(val) = arg.strip_prefix("--vs=") {
            vertex_shader = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--fs=") {
            fragment_shader = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = parse_backend(val);
        } else if arg.starts_with("--") {
            return Err(CliError::UnknownOption(arg));
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    if positional.len() != 1 {
        return Err(CliError::PositionalCount(positional.len()));
    }
    let obj_path = positional.remove(0);

    Ok(CliArgs {
        obj_path,
        vertex_shader,
        fragment_shader,
        backends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_path_uses_default_shaders() {
        let cli = parse_args(["cube.obj"]).unwrap();
        assert_eq!(cli.obj_path, PathBuf::from("cube.obj"));
        assert_eq!(cli.vertex_shader, PathBuf::from("vs.txt"));
        assert_eq!(cli.fragment_shader, PathBuf::from("fs.txt"));
        assert_eq!(cli.backends, wgpu::Backends::all());
    }

    #[test]
    fn no_arguments_is_usage_error() {
        assert_eq!(
            parse_args(Vec::<String>::new()),
            Err(CliError::PositionalCount(0))
        );
    }

    #[test]
    fn two_paths_is_usage_error() {
        // Neither path exists; parsing must not touch the filesystem.
        assert_eq!(
            parse_args(["missing_a.obj", "missing_b.obj"]),
            Err(CliError::PositionalCount(2))
        );
    }

    #[test]
    fn options_do_not_count_as_positionals() {
        let cli = parse_args([
            "--vs=shaders/v.wgsl",
            "model.obj",
            "--fs=shaders/f.wgsl",
            "--gpu-backend=vk",
        ])
        .unwrap();
        assert_eq!(cli.obj_path, PathBuf::from("model.obj"));
        assert_eq!(cli.vertex_shader, PathBuf::from("shaders/v.wgsl"));
        assert_eq!(cli.fragment_shader, PathBuf::from("shaders/f.wgsl"));
        assert_eq!(cli.backends, wgpu::Backends::VULKAN);
    }

    #[test]
    fn unknown_backend_falls_back_to_auto() {
        let cli = parse_args(["--gpu-backend=glide", "a.obj"]).unwrap();
        assert_eq!(cli.backends, wgpu::Backends::all());
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert_eq!(
            parse_args(["--size=800x600", "a.obj"]),
            Err(CliError::UnknownOption("--size=800x600".into()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_obj_path_is_kept_verbatim() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'm', 0xff, b'.', b'o', b'b', b'j']);
        let cli = parse_args([raw.clone()]).unwrap();
        assert_eq!(cli.obj_path.as_os_str(), raw.as_os_str());
        assert_eq!(cli.vertex_shader, PathBuf::from("vs.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_option_is_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"--vs=\xffv.wgsl".to_vec());
        let err = parse_args([raw, OsString::from("a.obj")]).unwrap_err();
        assert!(matches!(err, CliError::NonUnicodeOption(ref s) if s.starts_with("--vs=")));
    }

    #[test]
    fn usage_names_the_program() {
        assert!(usage("meshview").starts_with("Usage: meshview "));
    }
}
