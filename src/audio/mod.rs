//! Audio ingestion: decoding byte streams to mono PCM and resampling to the
//! canonical analysis rate.

pub mod decoder;
pub mod resample;

pub use decoder::decode_bytes;
pub use resample::linear_resample;
