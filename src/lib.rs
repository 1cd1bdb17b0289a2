pub mod context;
pub mod core;
pub mod llm;
pub mod server;
pub mod speech;
pub mod state;
pub mod streaming;
pub mod tokenizer;
