//! Schema documents: a set of relations plus a designated default relation.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::AgentError;
use crate::types::{Method, Relation};
use crate::validator::{describe, schema_document_shape, validate_document};

/// Parsed schema document.
#[derive(Debug)]
pub struct Schema {
    href: String,
    relations: IndexMap<String, Relation>,
    default_relation: String,
}

impl Schema {
    /// Parse a schema document fetched from `href`.
    ///
    /// `fallback_default` names the default relation when the document has
    /// no `defaultRelation` of its own.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::SchemaParse` if the document is malformed, a
    /// link has an unknown method, or the default relation is missing.
    pub fn parse(href: &str, document: &Value, fallback_default: &str) -> Result<Self, AgentError> {
        let parse_error = |message: String| AgentError::SchemaParse {
            href: href.to_string(),
            message,
        };

        validate_document(&schema_document_shape(), document)
            .map_err(|errors| parse_error(describe(&errors)))?;

        let default_relation = document
            .get("defaultRelation")
            .and_then(Value::as_str)
            .unwrap_or(fallback_default)
            .to_string();

        let links = document
            .get("links")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_error("missing links".to_string()))?;

        let mut relations = IndexMap::with_capacity(links.len());
        for (index, link) in links.iter().enumerate() {
            let field = |key: &str| {
                link.get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| parse_error(format!("/links/{}: missing {}", index, key)))
            };
            let rel = field("rel")?;
            let target = field("href")?;
            let method = field("method")?;
            let method = Method::parse(method).ok_or_else(|| {
                parse_error(format!("/links/{}: unknown method \"{}\"", index, method))
            })?;

            let mut relation = Relation::new(rel, target).method(method);
            if let Some(nested) = link_schema_href(link) {
                relation = relation.schema_href(nested);
            }
            relations.insert(rel.to_string(), relation);
        }

        if !relations.contains_key(&default_relation) {
            return Err(parse_error(format!(
                "missing default relation '{}'",
                default_relation
            )));
        }

        Ok(Self {
            href: href.to_string(),
            relations,
            default_relation,
        })
    }

    /// The exact reference this schema was fetched and cached under.
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn relations(&self) -> &IndexMap<String, Relation> {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Name of the top-level relation.
    pub fn default_relation(&self) -> &str {
        &self.default_relation
    }

    /// The top-level relation itself.
    pub fn default(&self) -> &Relation {
        // parse() refuses documents without it
        &self.relations[self.default_relation.as_str()]
    }
}

/// Schema reference of a link: `"schema": "..."` or `"schema": {"href": "..."}`.
pub(crate) fn link_schema_href(link: &Value) -> Option<&str> {
    match link.get("schema")? {
        Value::String(href) => Some(href),
        Value::Object(obj) => obj.get("href").and_then(Value::as_str),
        _ => None,
    }
}
