pub mod export;
pub mod wav_encoder;
