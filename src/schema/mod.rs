pub mod definition;
pub mod fields;

pub use definition::{Builder, IdGenerator, Registry, RegistryBuilder, ResourceDefinition};
pub use fields::{
    attribute, attribute_with, belongs_to_many, belongs_to_one, to_many, to_one, Association,
    FieldDefinition, PrimitiveField, RelationalField, ValidatorRef,
};
