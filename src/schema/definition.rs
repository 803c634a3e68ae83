//! Resource definitions and the immutable registry shared by all requests.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;
use crate::schema::fields::{FieldDefinition, PrimitiveField, RelationalField};

pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Static description of one resource type: its field model, id generation,
/// paging defaults, and the single handler owning its data.
///
/// Constructed once at startup and shared read-only by every request.
pub struct ResourceDefinition {
    pub resource: String,
    pub description: Option<String>,
    /// Declared fields in declaration order.
    pub fields: IndexMap<String, FieldDefinition>,
    pub handler: Arc<dyn Handler>,
    pub default_page_size: u64,
    /// Whether create accepts a client-generated id.
    pub allows_id_on_create: bool,
    id_generator: IdGenerator,
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("resource", &self.resource)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("default_page_size", &self.default_page_size)
            .field("allows_id_on_create", &self.allows_id_on_create)
            .finish()
    }
}

impl ResourceDefinition {
    pub fn builder(resource: impl Into<String>, handler: Arc<dyn Handler>) -> Builder {
        Builder {
            resource: resource.into(),
            description: None,
            fields: IndexMap::new(),
            handler,
            default_page_size: 100,
            allows_id_on_create: false,
            id_generator: None,
        }
    }

    pub fn generate_id(&self) -> String {
        (self.id_generator)()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationalField> {
        self.fields.get(name).and_then(FieldDefinition::as_relation)
    }

    /// Visit every declared field, dispatching on its variant.
    pub fn for_each_field(
        &self,
        mut on_primitive: impl FnMut(&str, &PrimitiveField),
        mut on_relation: impl FnMut(&str, &RelationalField),
    ) {
        for (name, field) in &self.fields {
            match field {
                FieldDefinition::Primitive(primitive) => on_primitive(name, primitive),
                FieldDefinition::Relation(relation) => on_relation(name, relation),
            }
        }
    }
}

pub struct Builder {
    resource: String,
    description: Option<String>,
    fields: IndexMap<String, FieldDefinition>,
    handler: Arc<dyn Handler>,
    default_page_size: u64,
    allows_id_on_create: bool,
    id_generator: Option<IdGenerator>,
}

impl Builder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    pub fn default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn allows_id_on_create(mut self, allowed: bool) -> Self {
        self.allows_id_on_create = allowed;
        self
    }

    pub fn id_generator(mut self, generator: IdGenerator) -> Self {
        self.id_generator = Some(generator);
        self
    }

    pub fn build(self) -> ResourceDefinition {
        ResourceDefinition {
            resource: self.resource,
            description: self.description,
            fields: self.fields,
            handler: self.handler,
            default_page_size: self.default_page_size,
            allows_id_on_create: self.allows_id_on_create,
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(|| uuid::Uuid::new_v4().to_string())),
        }
    }
}

/// Immutable set of resource definitions keyed by type name, plus the link
/// prefix and top-level meta configured at startup. Safe for unsynchronized
/// concurrent reads.
#[derive(Debug, Default)]
pub struct Registry {
    base_url: String,
    meta: Option<Map<String, Value>>,
    definitions: HashMap<String, Arc<ResourceDefinition>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            base_url: String::new(),
            meta: None,
            definitions: HashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.meta.as_ref()
    }

    pub fn definition(&self, resource: &str) -> Option<&Arc<ResourceDefinition>> {
        self.definitions.get(resource)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ResourceDefinition>> {
        self.definitions.values()
    }
}

pub struct RegistryBuilder {
    base_url: String,
    meta: Option<Map<String, Value>>,
    definitions: HashMap<String, Arc<ResourceDefinition>>,
}

impl RegistryBuilder {
    /// Link prefix for generated URLs, e.g. `https://example.com/api`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Top-level meta merged into create responses.
    pub fn meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn definition(mut self, definition: ResourceDefinition) -> Self {
        self.definitions
            .insert(definition.resource.clone(), Arc::new(definition));
        self
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(Registry {
            base_url: self.base_url,
            meta: self.meta,
            definitions: self.definitions,
        })
    }
}
