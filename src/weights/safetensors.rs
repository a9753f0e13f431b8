use std::collections::{HashMap, VecDeque};
use std::path::Path;

use candle_core::{Device, Tensor};
use tracing::debug;

use super::error::{WeightError, WeightResult};
use super::record::{TensorRecord, TensorStream};
use super::schema::PARAMETER_NAMES;

/// Named records read from a `.safetensors` file.
///
/// Records come out in parameter order, followed by any names the schema does
/// not know (sorted) so the binder can reject them.
#[derive(Debug)]
pub struct SafetensorsStream {
    pending: VecDeque<(String, Tensor)>,
}

impl SafetensorsStream {
    pub fn open<P: AsRef<Path>>(path: P) -> WeightResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WeightError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
        debug!(path = %path.display(), tensors = tensors.len(), "Read safetensors file");
        Ok(Self::from_tensors(tensors))
    }

    pub fn from_tensors(mut tensors: HashMap<String, Tensor>) -> Self {
        let mut pending = VecDeque::with_capacity(tensors.len());
        for name in PARAMETER_NAMES {
            if let Some(tensor) = tensors.remove(name) {
                pending.push_back((name.to_string(), tensor));
            }
        }

        let mut rest: Vec<_> = tensors.into_iter().collect();
        rest.sort_by(|a, b| a.0.cmp(&b.0));
        pending.extend(rest);

        Self { pending }
    }
}

impl TensorStream for SafetensorsStream {
    fn next_record(&mut self) -> WeightResult<Option<TensorRecord>> {
        match self.pending.pop_front() {
            Some((name, tensor)) => Ok(Some(TensorRecord::from_tensor(Some(name), &tensor)?)),
            None => Ok(None),
        }
    }
}
