//! Document codec: serialization and deserialization of wire documents.

pub mod deserializer;
pub mod serializer;

pub use deserializer::deserialize;
pub use serializer::{serialize, ResourceOptions, SerializationOptions};
