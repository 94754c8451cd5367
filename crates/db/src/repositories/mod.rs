//! Repository implementations.

mod file;

pub use file::FileRecordRepository;
