//! Word embeddings.
//!
//! [`EmbeddingTable`] loads the hybrid text/binary word-vector format and owns
//! the shared fallback vector returned for out-of-vocabulary words.

mod error;
mod table;


pub use error::EmbeddingError;
pub use table::EmbeddingTable;
