use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::constants::UNKNOWN_WORD_RANGE;

use super::error::EmbeddingError;

/// Immutable word → vector mapping with a shared unknown-word vector.
///
/// All vectors are `dim` wide. Files with narrower vectors are zero-extended.
pub struct EmbeddingTable {
    dim: usize,
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
    unknown: Vec<f32>,
}

impl std::fmt::Debug for EmbeddingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingTable")
            .field("dim", &self.dim)
            .field("vocab", &self.index.len())
            .finish()
    }
}

impl EmbeddingTable {
    /// Memory-maps and parses an embedding file.
    pub fn open<P: AsRef<Path>>(path: P, dim: usize, seed: u64) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbeddingError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(EmbeddingError::MalformedHeader {
                reason: "file is empty".to_string(),
            });
        }

        // SAFETY: read-only mapping; the file must not be modified while loading.
        let mmap = unsafe { Mmap::map(&file)? };

        debug!(path = %path.display(), bytes = mmap.len(), "Mapped embedding file");
        Self::from_bytes(&mmap, dim, seed)
    }

    /// Parses `<vocab> <dim>` followed by `<token><sep><dim x f32>` entries.
    pub fn from_bytes(bytes: &[u8], dim: usize, seed: u64) -> Result<Self, EmbeddingError> {
        let start = Instant::now();
        let mut cursor = ByteCursor::new(bytes);

        let vocab = cursor.header_int("vocabulary size")?;
        let declared = cursor.header_int("vector dimension")?;
        if declared > dim {
            return Err(EmbeddingError::DimensionExceeded {
                declared,
                max: dim,
            });
        }

        info!(dim, vocab, declared, "Loading embeddings");

        let float_bytes = declared
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or_else(|| EmbeddingError::MalformedHeader {
                reason: format!("vector dimension {declared} is too large"),
            })?;

        // Every entry needs at least a one-byte word, a separator and its floats.
        let min_entry_bytes = float_bytes.saturating_add(2);
        let capacity = vocab.min(cursor.remaining() / min_entry_bytes);

        let mut table = Self::empty(dim, seed, capacity);
        let truncated = |entry| EmbeddingError::Truncated { entry, vocab };

        for entry in 0..vocab {
            let word = cursor.token().ok_or_else(|| truncated(entry))?;
            cursor.take(1).ok_or_else(|| truncated(entry))?;
            let raw = cursor.take(float_bytes).ok_or_else(|| truncated(entry))?;

            let slot = table.slot_for(&String::from_utf8_lossy(word));
            for (dst, chunk) in slot.iter_mut().zip(raw.chunks_exact(4)) {
                *dst = bytemuck::pod_read_unaligned::<f32>(chunk);
            }
        }

        info!(
            terms = table.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Embeddings loaded"
        );

        Ok(table)
    }

    /// Builds a table from in-memory `(word, vector)` pairs.
    pub fn from_entries<I, S>(entries: I, dim: usize, seed: u64) -> Result<Self, EmbeddingError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: AsRef<str>,
    {
        let mut table = Self::empty(dim, seed, 0);
        for (word, vector) in entries {
            if vector.len() > dim {
                return Err(EmbeddingError::DimensionExceeded {
                    declared: vector.len(),
                    max: dim,
                });
            }
            let slot = table.slot_for(word.as_ref());
            slot[..vector.len()].copy_from_slice(&vector);
        }
        Ok(table)
    }

    fn empty(dim: usize, seed: u64, capacity: usize) -> Self {
        Self {
            dim,
            index: HashMap::with_capacity(capacity),
            vectors: Vec::with_capacity(capacity.checked_mul(dim).unwrap_or(0)),
            unknown: draw_unknown_vector(dim, seed),
        }
    }

    /// Zeroed row for `word`; a repeated word reuses (and overwrites) its row.
    fn slot_for(&mut self, word: &str) -> &mut [f32] {
        let dim = self.dim;
        let row = match self.index.get(word) {
            Some(&row) => row,
            None => {
                let row = self.index.len();
                self.index.insert(word.to_string(), row);
                self.vectors.resize((row + 1) * dim, 0.0);
                row
            }
        };
        let slot = &mut self.vectors[row * dim..(row + 1) * dim];
        slot.fill(0.0);
        slot
    }

    /// Vector for `word`, or the shared unknown vector.
    pub fn lookup(&self, word: &str) -> &[f32] {
        self.get(word).unwrap_or(self.unknown.as_slice())
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.index
            .get(word)
            .map(|&row| &self.vectors[row * self.dim..(row + 1) * self.dim])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn unknown_vector(&self) -> &[f32] {
        &self.unknown
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn draw_unknown_vector(dim: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dist = Uniform::new_inclusive(-UNKNOWN_WORD_RANGE, UNKNOWN_WORD_RANGE);
    (0..dim).map(|_| dist.sample(&mut rng)).collect()
}

/// ASCII whitespace plus vertical tab, the C locale `isspace` set.
fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0B
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Next whitespace-delimited token, skipping leading whitespace.
    fn token(&mut self) -> Option<&'a [u8]> {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| is_space(b))
        {
            self.pos += 1;
        }
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| !is_space(b))
        {
            self.pos += 1;
        }
        let (bytes, end) = (self.bytes, self.pos);
        (end > start).then(|| &bytes[start..end])
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let bytes: &'a [u8] = self.bytes;
        let end = self.pos.checked_add(n)?;
        let slice = bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn header_int(&mut self, field: &str) -> Result<usize, EmbeddingError> {
        let token = self
            .token()
            .ok_or_else(|| EmbeddingError::MalformedHeader {
                reason: format!("missing {field}"),
            })?;
        let text = String::from_utf8_lossy(token);
        text.parse().map_err(|e| EmbeddingError::MalformedHeader {
            reason: format!("invalid {field} '{text}': {e}"),
        })
    }
}
