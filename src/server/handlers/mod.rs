pub mod ask;
pub mod health;
pub mod transcribe;
pub mod tts;
