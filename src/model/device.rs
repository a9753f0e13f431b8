use std::fmt;
use std::str::FromStr;

use candle_core::Device;
use tracing::{debug, info, warn};

use super::error::DeviceError;

/// Requested compute backend.
///
/// `Auto` takes the first GPU backend that initializes and otherwise runs on
/// the CPU. Naming a GPU backend makes its failure fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Auto,
    Cpu,
    Metal,
    Cuda,
}

impl Backend {
    /// GPU backends built into this binary, in probing order.
    pub fn compiled_gpus() -> &'static [Backend] {
        &[
            #[cfg(feature = "metal")]
            Backend::Metal,
            #[cfg(feature = "cuda")]
            Backend::Cuda,
        ]
    }

    fn is_compiled(self) -> bool {
        match self {
            Backend::Auto | Backend::Cpu => true,
            gpu => Self::compiled_gpus().contains(&gpu),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Auto => "auto",
            Backend::Cpu => "cpu",
            Backend::Metal => "metal",
            Backend::Cuda => "cuda",
        })
    }
}

impl FromStr for Backend {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Backend::Auto),
            "cpu" => Ok(Backend::Cpu),
            "metal" => Ok(Backend::Metal),
            "cuda" => Ok(Backend::Cuda),
            other => Err(DeviceError::UnknownBackend {
                name: other.to_string(),
            }),
        }
    }
}

/// Opens the device for `backend`.
pub fn select_device(backend: Backend) -> Result<Device, DeviceError> {
    if !backend.is_compiled() {
        return Err(DeviceError::NotCompiled { backend });
    }

    match backend {
        Backend::Cpu => {
            debug!("Scoring on CPU");
            Ok(Device::Cpu)
        }
        Backend::Metal | Backend::Cuda => open_gpu(backend),
        Backend::Auto => {
            let mut failures = Vec::new();
            for &gpu in Backend::compiled_gpus() {
                match open_gpu(gpu) {
                    Ok(device) => return Ok(device),
                    Err(e) => {
                        warn!(backend = %gpu, error = %e, "GPU backend unavailable");
                        failures.push(e.to_string());
                    }
                }
            }
            if failures.is_empty() {
                debug!("No GPU backends compiled in, scoring on CPU");
            } else {
                warn!(reason = %failures.join("; "), "Falling back to CPU device");
            }
            Ok(Device::Cpu)
        }
    }
}

fn open_gpu(backend: Backend) -> Result<Device, DeviceError> {
    let opened = match backend {
        Backend::Metal => Device::new_metal(0),
        Backend::Cuda => Device::new_cuda(0),
        Backend::Auto | Backend::Cpu => return Ok(Device::Cpu),
    };
    let device = opened.map_err(|source| DeviceError::Unavailable { backend, source })?;
    info!(backend = %backend, "Scoring on GPU");
    Ok(device)
}
