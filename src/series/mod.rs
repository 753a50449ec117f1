//! Persisted chart history.
mod buffer;
mod store;


pub use buffer::{
    LATENCY_SERIES_KEY, SERIES_KEYS, SERIES_RETENTION, SeriesBuffer, THROUGHPUT_SERIES_KEY,
};
pub use store::{KvStore, MemoryStore, SqliteStore};
