pub mod analyser;
pub mod chain;
pub mod conversion;
pub mod dynamics;
pub mod ring_buffer;
pub mod wav_format;
