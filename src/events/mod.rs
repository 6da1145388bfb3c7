pub mod codec;
pub mod types;

// Re-export key types for convenience
pub use codec::{CodecError, CodecResult, EventCodec, JsonEventCodec};
pub use types::{DomainEvent, EventKind};
