pub mod envelope;
pub mod order;

// Re-export core models for easy access
pub use envelope::Envelope;
pub use order::{
    OrderCancelled, OrderDetails, OrderEvent, OrderEventKind, OrderPlaced, OrderTask,
};
