//! Field model: per-type declaration of primitive attributes vs. relationships.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Cardinality of a relationship, declared by the schema and authoritative:
/// incoming data shapes are validated against it, never the other way around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Association {
    One,
    Many,
}

/// Opaque validator reference for primitive fields. The core stores it for the
/// external validation collaborator and never invokes it itself.
pub type ValidatorRef = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PrimitiveField {
    pub description: Option<String>,
    pub validator: Option<ValidatorRef>,
}

impl fmt::Debug for PrimitiveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveField")
            .field("description", &self.description)
            .field("validator", &self.validator.as_ref().map(|_| "fn"))
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct RelationalField {
    /// Resource type on the other end of the relationship.
    pub target: String,
    pub association: Association,
    /// Foreign relations are reverse-computed at read time and never part of
    /// stored or forward data.
    pub foreign: bool,
    /// For foreign relations, the inverse field name on the target type.
    pub inverse: Option<String>,
    pub description: Option<String>,
}

impl RelationalField {
    /// Relationship meta advertised on the wire for this field.
    pub fn meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        if self.foreign {
            meta.insert("relation".into(), Value::String("foreign".into()));
            meta.insert("belongsTo".into(), Value::String(self.target.clone()));
            if let Some(inverse) = &self.inverse {
                meta.insert("as".into(), Value::String(inverse.clone()));
            }
            meta.insert(
                "many".into(),
                Value::Bool(self.association == Association::Many),
            );
            meta.insert("readOnly".into(), Value::Bool(true));
        } else {
            meta.insert("relation".into(), Value::String("primary".into()));
            meta.insert(
                "many".into(),
                Value::Bool(self.association == Association::Many),
            );
            meta.insert("readOnly".into(), Value::Bool(false));
        }
        meta
    }
}

/// A named field is exactly one of: primitive attribute or relationship.
#[derive(Clone, Debug)]
pub enum FieldDefinition {
    Primitive(PrimitiveField),
    Relation(RelationalField),
}

/// Primitive attribute field.
pub fn attribute() -> FieldDefinition {
    FieldDefinition::Primitive(PrimitiveField::default())
}

/// Primitive attribute field carrying a validator reference for the external
/// validation collaborator.
pub fn attribute_with(validator: ValidatorRef) -> FieldDefinition {
    FieldDefinition::Primitive(PrimitiveField {
        description: None,
        validator: Some(validator),
    })
}

/// Forward to-one relationship.
pub fn to_one(target: impl Into<String>) -> FieldDefinition {
    FieldDefinition::Relation(RelationalField {
        target: target.into(),
        association: Association::One,
        foreign: false,
        inverse: None,
        description: None,
    })
}

/// Forward to-many relationship.
pub fn to_many(target: impl Into<String>) -> FieldDefinition {
    FieldDefinition::Relation(RelationalField {
        target: target.into(),
        association: Association::Many,
        foreign: false,
        inverse: None,
        description: None,
    })
}

/// Foreign to-one relationship, computed by reverse lookup against the
/// `inverse` field on the target type.
pub fn belongs_to_one(target: impl Into<String>, inverse: impl Into<String>) -> FieldDefinition {
    FieldDefinition::Relation(RelationalField {
        target: target.into(),
        association: Association::One,
        foreign: true,
        inverse: Some(inverse.into()),
        description: None,
    })
}

/// Foreign to-many relationship.
pub fn belongs_to_many(target: impl Into<String>, inverse: impl Into<String>) -> FieldDefinition {
    FieldDefinition::Relation(RelationalField {
        target: target.into(),
        association: Association::Many,
        foreign: true,
        inverse: Some(inverse.into()),
        description: None,
    })
}

impl FieldDefinition {
    pub fn described(mut self, description: impl Into<String>) -> Self {
        let description = Some(description.into());
        match &mut self {
            FieldDefinition::Primitive(field) => field.description = description,
            FieldDefinition::Relation(field) => field.description = description,
        }
        self
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldDefinition::Primitive(_))
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldDefinition::Relation(_))
    }

    pub fn as_relation(&self) -> Option<&RelationalField> {
        match self {
            FieldDefinition::Relation(field) => Some(field),
            FieldDefinition::Primitive(_) => None,
        }
    }
}
