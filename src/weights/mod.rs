//! Weight tensors: record streams, containers, and the validated parameter set.
//!
//! - [`record`] defines [`TensorRecord`], the [`TensorStream`] trait, and the
//!   binary record stream reader/writer.
//! - [`safetensors`] adapts named `.safetensors` files to the same trait.
//! - [`schema`] binds records to the eight network parameters and checks shapes.

pub mod error;
pub mod record;
pub mod safetensors;
pub mod schema;


pub use error::{WeightError, WeightResult};
pub use record::{MemoryStream, RecordReader, RecordWriter, TensorRecord, TensorStream};
pub use safetensors::SafetensorsStream;
pub use schema::{PARAMETER_NAMES, Parameter, ParameterSet};
