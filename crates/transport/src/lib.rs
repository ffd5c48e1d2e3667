pub mod broker;
pub mod error;
pub mod memory;
pub mod message;
pub mod producer;

pub use broker::{MessageBroker, MessageStream, validate_topic};
pub use error::{Result, TransportError};
pub use memory::InMemoryBroker;
pub use message::{Message, MessageId};
pub use producer::Producer;
