//! Herald Store - store/broker boundaries with HTTP and in-memory backends

pub mod broker;
pub mod http;
pub mod memory;
pub mod store;

pub use broker::{Broker, BrokerAck, HttpBroker};
pub use http::HttpEntityStore;
pub use memory::{MemoryBroker, MemoryStore, StoreFault};
pub use store::EntityStore;
