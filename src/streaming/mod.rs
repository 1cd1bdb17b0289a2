pub mod events;

pub use events::{EventType, StreamEvent, THINKING_MESSAGE};
