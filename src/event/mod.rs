// Per-room event streams for the chat transport
//
// Services emit a RoomEvent after every state change they commit. A transport
// subscribes to a room to deliver questions, feedback and results.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::RoomEvent;

// Internal modules
mod bus;
mod events;
