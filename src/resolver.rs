//! Derivation of top-level relation names from root links.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::schema::Schema;
use crate::types::Relation;

/// Build the top-level relations table.
///
/// For each root link, in document order, the default relation of the
/// link's schema is published under the link name. Every other relation of
/// that schema that targets the same href is published under
/// `"{link}/{relation}"`. A later link with an already-used name replaces the
/// earlier entry.
///
/// `schema_for` fetches (or returns the cached) schema for a reference.
pub fn resolve_relations<F>(
    links: &[Relation],
    mut schema_for: F,
) -> Result<IndexMap<String, Relation>, AgentError>
where
    F: FnMut(&str) -> Result<Rc<Schema>, AgentError>,
{
    let mut relations = IndexMap::new();

    for link in links {
        let schema_href = link
            .nested_schema()
            .ok_or_else(|| AgentError::MissingSchema {
                name: link.name().to_string(),
            })?;
        let schema = schema_for(schema_href)?;

        let root = schema.default();
        bind(root, &schema);
        publish(&mut relations, link.name().to_string(), root);

        for (key, relation) in schema.relations() {
            bind(relation, &schema);
            if key == schema.default_relation() || relation.href() != root.href() {
                continue;
            }
            publish(&mut relations, format!("{}/{}", link.name(), key), relation);
        }
    }

    Ok(relations)
}

fn bind(relation: &Relation, schema: &Schema) {
    // relations belong to exactly one schema, so rebinding is always a no-op
    let bound = relation.bind_schema(schema.href());
    debug_assert!(bound, "relation bound to two schemas");
}

fn publish(relations: &mut IndexMap<String, Relation>, name: String, relation: &Relation) {
    debug!(name = %name, href = relation.href(), method = %relation.http_method(), "relation");
    if relations.insert(name.clone(), relation.clone()).is_some() {
        warn!(name = %name, "duplicate relation name, keeping the later one");
    }
}
