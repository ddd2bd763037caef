use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NdArray,
    Wgpu,
}

/// Backend selection plus optional TOML run config, shared by every binary.
#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Backend to use (ndarray, or wgpu when built with backend-wgpu).
    #[arg(long, value_enum, default_value_t = default_backend())]
    pub backend: BackendKind,
    /// Optional TOML file with run settings; flags given on the command line win.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// The accelerator when it was compiled in, otherwise the CPU backend.
pub fn default_backend() -> BackendKind {
    if cfg!(feature = "backend-wgpu") {
        BackendKind::Wgpu
    } else {
        BackendKind::NdArray
    }
}

pub fn validate_backend_choice(kind: BackendKind) -> anyhow::Result<()> {
    let built_wgpu = cfg!(feature = "backend-wgpu");
    match (kind, built_wgpu) {
        (BackendKind::Wgpu, false) => {
            anyhow::bail!("backend-wgpu feature not enabled; rebuild with --features backend-wgpu or choose ndarray backend")
        }
        (BackendKind::NdArray, true) => {
            tracing::warn!("built with backend-wgpu; tensors will still use the WGPU backend despite --backend nd-array");
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_always_valid() {
        assert!(validate_backend_choice(default_backend()).is_ok());
    }

    #[cfg(not(feature = "backend-wgpu"))]
    #[test]
    fn wgpu_requires_feature() {
        assert!(validate_backend_choice(BackendKind::Wgpu).is_err());
    }
}
