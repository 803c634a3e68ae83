//! Typed view of the consumed query conventions: `include`, `fields[type]`,
//! `page[...]`, `sort`, `filter[...]`.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{ErrorObject, ErrorSource, JsonapiError};
use crate::schema::Registry;

// comma delimited tokens, some tokens possibly delimited by periods
const INCLUDE_SYNTAX: &str = r"^\w+(\.\w+)*(,\w+(\.\w+)*)*$";
// comma delimited tokens, some tokens having a desc (-) prefix
const SORT_SYNTAX: &str = r"^-?\w+(,-?\w+)*$";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Dotted include paths, e.g. `["comments.author", "tags"]`.
    pub include: Vec<String>,
    /// Sparse fieldsets: resource type -> allowed field names. `None` means no
    /// filtering was requested at all.
    pub fields: Option<BTreeMap<String, Vec<String>>>,
    /// Sort keys, descending marked with a `-` prefix. Passed through to the
    /// handler; the core never sorts.
    pub sort: Vec<String>,
    pub page: Page,
    /// Filter values, passed through to the handler.
    pub filter: BTreeMap<String, Value>,
}

impl Query {
    /// Parse a decoded query-string fragment, e.g.
    /// `include=comments.author&fields[articles]=title,tags`.
    pub fn parse(fragment: &str) -> Result<Self, JsonapiError> {
        let mut query = Query::default();
        let mut errors = Vec::new();

        for pair in fragment.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key, value),
                None => (pair, ""),
            };
            match key {
                "include" => {
                    if value.is_empty() {
                        continue;
                    }
                    if matches_syntax(INCLUDE_SYNTAX, value)? {
                        query.include = split_csv(value);
                    } else {
                        errors.push(invalid_parameter(
                            "include",
                            format!("Malformed include query '{}'.", value),
                        ));
                    }
                }
                "sort" => {
                    if value.is_empty() {
                        continue;
                    }
                    if matches_syntax(SORT_SYNTAX, value)? {
                        query.sort = split_csv(value);
                    } else {
                        errors.push(invalid_parameter(
                            "sort",
                            format!("Malformed sort query '{}'.", value),
                        ));
                    }
                }
                _ => match bracket_key(key) {
                    Some(("fields", resource)) => {
                        query
                            .fields
                            .get_or_insert_with(BTreeMap::new)
                            .insert(resource.to_string(), split_csv(value));
                    }
                    Some(("page", "limit")) => match value.parse() {
                        Ok(limit) => query.page.limit = Some(limit),
                        Err(_) => errors.push(invalid_parameter(
                            "page[limit]",
                            format!("Page limit '{}' is not a number.", value),
                        )),
                    },
                    Some(("page", "offset")) => match value.parse() {
                        Ok(offset) => query.page.offset = Some(offset),
                        Err(_) => errors.push(invalid_parameter(
                            "page[offset]",
                            format!("Page offset '{}' is not a number.", value),
                        )),
                    },
                    Some(("page", "cursor")) => {
                        query.page.cursor = Some(value.to_string());
                    }
                    Some(("filter", name)) => {
                        query
                            .filter
                            .insert(name.to_string(), Value::String(value.to_string()));
                    }
                    _ => {} // unrecognized members pass through unused
                },
            }
        }

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(JsonapiError::Validation(errors))
        }
    }

    /// Whether `path` lies on one of the requested include paths.
    pub fn includes_path(&self, path: &str) -> bool {
        self.include
            .iter()
            .any(|requested| requested == path || requested.starts_with(&format!("{}.", path)))
    }
}

fn matches_syntax(pattern: &str, value: &str) -> Result<bool, JsonapiError> {
    let syntax = Regex::new(pattern)
        .map_err(|e| JsonapiError::Unknown(format!("query syntax pattern: {}", e)))?;
    Ok(syntax.is_match(value))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a `name[inner]` query key. Returns `None` for plain keys.
fn bracket_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key.get(open + 1..key.len().checked_sub(1)?)?;
    if !key.ends_with(']') || inner.is_empty() {
        return None;
    }
    Some((&key[..open], inner))
}

fn invalid_parameter(parameter: &str, detail: String) -> ErrorObject {
    ErrorObject {
        status: Some("422".to_string()),
        code: Some("EINVALID".to_string()),
        title: Some("Invalid Query".to_string()),
        detail: Some(detail),
        source: Some(ErrorSource {
            pointer: None,
            parameter: Some(parameter.to_string()),
        }),
        ..ErrorObject::default()
    }
}

/// Reject sparse fieldsets naming fields that are not declared on the
/// addressed resource type. Violations batch into one validation error.
pub fn verify_sparse_fieldsets(query: &Query, registry: &Registry) -> Result<(), JsonapiError> {
    let fields = match &query.fields {
        Some(fields) => fields,
        None => return Ok(()),
    };
    let mut errors = Vec::new();
    for (resource, requested) in fields {
        if let Some(definition) = registry.definition(resource) {
            for field in requested {
                if definition.field(field).is_none() {
                    errors.push(invalid_parameter(
                        &format!("fields[{}]", resource),
                        format!("Unknown field '{}' on resource '{}'.", field, resource),
                    ));
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(JsonapiError::Validation(errors))
    }
}

/// Path tree built from dotted include paths:
/// `"comments.author,tags"` -> `{comments: {author: {}}, tags: {}}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncludeGraph(BTreeMap<String, IncludeGraph>);

impl IncludeGraph {
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut graph = IncludeGraph::default();
        for path in paths {
            let mut node = &mut graph;
            for segment in path.as_ref().split('.').filter(|s| !s.is_empty()) {
                node = node.0.entry(segment.to_string()).or_default();
            }
        }
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IncludeGraph)> {
        self.0.iter()
    }
}
