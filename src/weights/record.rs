//! Tensor records and the binary record stream.
//!
//! # Stream Layout
//!
//! ```text
//! "CNNW" | u32 version
//! repeated:
//!   u32 rank | rank x u64 dims | u64 count | count x f32
//! ```
//!
//! All integers and floats are little-endian. A clean end of input at a record
//! boundary ends the stream; anything shorter is a [`WeightError::Format`].

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use candle_core::{Device, Tensor};

use super::error::{WeightError, WeightResult};

pub const STREAM_MAGIC: &[u8; 4] = b"CNNW";
pub const STREAM_VERSION: u32 = 1;
pub const MAX_RANK: usize = 3;

/// One weight tensor as it appears in a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorRecord {
    /// Name carried by the container, if it has one.
    pub name: Option<String>,
    /// Dimension sizes; `dims.len()` is the rank.
    pub dims: Vec<usize>,
    /// Row-major payload.
    pub weights: Vec<f32>,
}

impl TensorRecord {
    pub fn new(dims: Vec<usize>, weights: Vec<f32>) -> Self {
        Self {
            name: None,
            dims,
            weights,
        }
    }

    pub fn named(name: impl Into<String>, dims: Vec<usize>, weights: Vec<f32>) -> Self {
        Self {
            name: Some(name.into()),
            dims,
            weights,
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements implied by `dims`, or `None` if it overflows `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        element_count(&self.dims)
    }

    /// Checks rank bounds and that the payload matches the declared dims.
    pub fn validate(&self) -> WeightResult<()> {
        let label = self.name.as_deref().unwrap_or("<unnamed>");

        if self.rank() == 0 || self.rank() > MAX_RANK {
            return Err(WeightError::schema(format!(
                "record {label} has rank {}, expected 1..={MAX_RANK}",
                self.rank()
            )));
        }

        let expected = self.expected_len().ok_or_else(|| {
            WeightError::schema(format!(
                "record {label} dims {:?} overflow the element count",
                self.dims
            ))
        })?;
        if self.weights.len() != expected {
            return Err(WeightError::schema(format!(
                "record {label} declares dims {:?} ({expected} values) but carries {}",
                self.dims,
                self.weights.len()
            )));
        }

        Ok(())
    }

    /// Slice `i` of a rank-3 record, flattened row-major (`dim1 * dim2` values).
    pub fn matrix(&self, i: usize) -> Option<&[f32]> {
        if self.rank() != 3 || i >= self.dims[0] {
            return None;
        }
        let size = self.dims[1].checked_mul(self.dims[2])?;
        let start = i.checked_mul(size)?;
        self.weights.get(start..start.checked_add(size)?)
    }

    pub fn to_tensor(&self, device: &Device) -> WeightResult<Tensor> {
        self.validate()?;
        Ok(Tensor::from_vec(
            self.weights.clone(),
            self.dims.clone(),
            device,
        )?)
    }

    /// Builds a record from a tensor of any float dtype.
    pub fn from_tensor(name: Option<String>, tensor: &Tensor) -> WeightResult<Self> {
        let dims = tensor.dims().to_vec();
        let weights = tensor
            .to_dtype(candle_core::DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        Ok(Self {
            name,
            dims,
            weights,
        })
    }
}

/// Ordered source of tensor records.
///
/// `Ok(None)` is the end of the stream.
pub trait TensorStream {
    fn next_record(&mut self) -> WeightResult<Option<TensorRecord>>;
}

/// In-memory stream, mostly for tests and programmatic weights.
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    records: VecDeque<TensorRecord>,
}

impl MemoryStream {
    pub fn new(records: impl IntoIterator<Item = TensorRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }
}

impl TensorStream for MemoryStream {
    fn next_record(&mut self) -> WeightResult<Option<TensorRecord>> {
        Ok(self.records.pop_front())
    }
}

/// Reads the binary record stream.
pub struct RecordReader<R> {
    inner: R,
    records_read: usize,
}

impl<R: Read> RecordReader<R> {
    /// Consumes and checks the stream header.
    pub fn new(mut inner: R) -> WeightResult<Self> {
        let mut magic = [0u8; 4];
        inner
            .read_exact(&mut magic)
            .map_err(|e| WeightError::format(format!("missing stream header: {e}")))?;
        if &magic != STREAM_MAGIC {
            return Err(WeightError::format(format!(
                "bad stream magic {magic:?}, expected {STREAM_MAGIC:?}"
            )));
        }

        let version = read_u32(&mut inner)?;
        if version != STREAM_VERSION {
            return Err(WeightError::format(format!(
                "unsupported stream version {version}, expected {STREAM_VERSION}"
            )));
        }

        Ok(Self {
            inner,
            records_read: 0,
        })
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Fills `buf`, returning `false` on a clean end of input before the first byte.
    fn fill_or_eof(&mut self, buf: &mut [u8]) -> WeightResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(WeightError::format(format!(
                        "record {} truncated in header",
                        self.records_read
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> TensorStream for RecordReader<R> {
    fn next_record(&mut self) -> WeightResult<Option<TensorRecord>> {
        let mut rank_bytes = [0u8; 4];
        if !self.fill_or_eof(&mut rank_bytes)? {
            return Ok(None);
        }
        let index = self.records_read;
        let rank = u32::from_le_bytes(rank_bytes) as usize;
        if rank == 0 || rank > MAX_RANK {
            return Err(WeightError::schema(format!(
                "record {index} has rank {rank}, expected 1..={MAX_RANK}"
            )));
        }

        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(read_len(&mut self.inner, index)?);
        }

        let count = read_len(&mut self.inner, index)?;
        let expected = element_count(&dims).ok_or_else(|| {
            WeightError::format(format!(
                "record {index} dims {dims:?} overflow the element count"
            ))
        })?;
        if count != expected {
            return Err(WeightError::schema(format!(
                "record {index} declares dims {dims:?} ({expected} values) but carries {count}"
            )));
        }

        let byte_len = count
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or_else(|| {
                WeightError::format(format!("record {index} payload of {count} values is too large"))
            })?;
        let mut payload = Vec::new();
        (&mut self.inner)
            .take(byte_len as u64)
            .read_to_end(&mut payload)?;
        if payload.len() != byte_len {
            return Err(WeightError::format(format!(
                "record {index} payload truncated: expected {byte_len} bytes, got {}",
                payload.len()
            )));
        }

        let weights = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        self.records_read += 1;
        Ok(Some(TensorRecord::new(dims, weights)))
    }
}

/// Writes the binary record stream (header on construction).
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(mut inner: W) -> WeightResult<Self> {
        inner.write_all(STREAM_MAGIC)?;
        inner.write_all(&STREAM_VERSION.to_le_bytes())?;
        Ok(Self { inner })
    }

    pub fn write_record(&mut self, record: &TensorRecord) -> WeightResult<()> {
        record.validate()?;
        self.inner
            .write_all(&(record.rank() as u32).to_le_bytes())?;
        for &dim in &record.dims {
            self.inner.write_all(&(dim as u64).to_le_bytes())?;
        }
        self.inner
            .write_all(&(record.weights.len() as u64).to_le_bytes())?;
        for value in &record.weights {
            self.inner.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> WeightResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Product of `dims`, checked.
fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn read_len<R: Read>(reader: &mut R, index: usize) -> WeightResult<usize> {
    let value = read_u64(reader)?;
    usize::try_from(value).map_err(|_| {
        WeightError::format(format!("record {index} length {value} does not fit in memory"))
    })
}

fn read_u32<R: Read>(reader: &mut R) -> WeightResult<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| WeightError::format(format!("unexpected end of stream: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> WeightResult<u64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| WeightError::format(format!("unexpected end of stream: {e}")))?;
    Ok(u64::from_le_bytes(buf))
}
