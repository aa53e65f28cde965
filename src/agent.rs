//! The agent: lazy root discovery, schema caching and request dispatch.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::codec::{Codec, JsonCodec};
use crate::error::AgentError;
use crate::resolver::resolve_relations;
use crate::schema::{link_schema_href, Schema};
use crate::transport::Transport;
use crate::types::{
    expand_href, resolve_url, Method, Relation, RelationRef, RequestOptions, Response, SchemaRef,
    DEFAULT_LINKS_PROPERTY, DEFAULT_RELATION_NAME,
};
use crate::validator::{describe, root_document_shape, validate_document};

#[cfg(feature = "remote")]
use crate::error::TransportError;
#[cfg(feature = "remote")]
use crate::transport::HttpTransport;

/// Per-agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// URL of the root document.
    pub endpoint: String,
    /// Root document property holding the link list.
    pub links_property: String,
    /// Default relation of schemas that don't name their own.
    pub default_relation_name: String,
}

impl AgentConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            links_property: DEFAULT_LINKS_PROPERTY.to_string(),
            default_relation_name: DEFAULT_RELATION_NAME.to_string(),
        }
    }

    pub fn links_property(mut self, property: impl Into<String>) -> Self {
        self.links_property = property.into();
        self
    }

    pub fn default_relation(mut self, name: impl Into<String>) -> Self {
        self.default_relation_name = name.into();
        self
    }
}

#[derive(Debug)]
struct Tables {
    relations: IndexMap<String, Relation>,
    schemas: IndexMap<String, Rc<Schema>>,
}

#[derive(Debug)]
enum State {
    Unloaded,
    Loaded(Tables),
}

/// Hypermedia client rooted at one endpoint.
///
/// The root document is fetched on first use of [`relations`](Self::relations),
/// [`schemas`](Self::schemas), [`relation`](Self::relation) or
/// [`schema`](Self::schema), and kept for the agent's lifetime. Schemas are
/// fetched once per distinct reference string. Build a new agent to refresh.
///
/// All state is owned and mutated through `&mut self`; share an agent across
/// threads by wrapping it in a `Mutex`.
#[derive(Debug)]
pub struct Agent<T, C = JsonCodec> {
    config: AgentConfig,
    transport: T,
    codec: C,
    state: State,
}

#[cfg(feature = "remote")]
impl Agent<HttpTransport> {
    /// Agent with the default HTTP transport and JSON codec.
    ///
    /// Customize the transport (headers, for instance) through
    /// [`transport_mut`](Self::transport_mut) before the first request.
    pub fn new(config: AgentConfig) -> Result<Self, TransportError> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> Agent<T> {
    pub fn with_transport(config: AgentConfig, transport: T) -> Self {
        Self::with_codec(config, transport, JsonCodec)
    }
}

impl<T: Transport, C: Codec> Agent<T, C> {
    pub fn with_codec(config: AgentConfig, transport: T, codec: C) -> Self {
        Self {
            config,
            transport,
            codec,
            state: State::Unloaded,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// True while the root document has not been loaded.
    pub fn needs_load(&self) -> bool {
        matches!(self.state, State::Unloaded)
    }

    /// Load the root document now instead of on first access.
    ///
    /// A no-op once loaded. On failure nothing is kept, so the next access
    /// tries again.
    pub fn load_root(&mut self) -> Result<(), AgentError> {
        self.tables().map(|_| ())
    }

    /// Top-level relations by name, in root document order.
    pub fn relations(&mut self) -> Result<&IndexMap<String, Relation>, AgentError> {
        Ok(&self.tables()?.relations)
    }

    /// Schemas fetched so far, keyed by the exact reference they were
    /// requested with.
    pub fn schemas(&mut self) -> Result<&IndexMap<String, Rc<Schema>>, AgentError> {
        Ok(&self.tables()?.schemas)
    }

    /// Resolve a relation.
    ///
    /// A [`RelationRef::Resolved`] relation is returned as is without
    /// loading anything.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::NotFound` if no top-level relation has the name,
    /// or any error from loading the root document.
    pub fn relation(&mut self, relation: impl Into<RelationRef>) -> Result<Relation, AgentError> {
        match relation.into() {
            RelationRef::Resolved(relation) => Ok(relation),
            RelationRef::Name(name) => self
                .relations()?
                .get(&name)
                .cloned()
                .ok_or_else(|| AgentError::NotFound { name }),
        }
    }

    /// Look up a schema, fetching and parsing it on first reference.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::MissingSchema` for a relation without a schema
    /// reference, `AgentError::SchemaParse` for a malformed document, or the
    /// transport/decode error of the fetch.
    pub fn schema(&mut self, schema: impl Into<SchemaRef>) -> Result<Rc<Schema>, AgentError> {
        let href = match schema.into() {
            SchemaRef::Href(href) => href,
            SchemaRef::Of(relation) => {
                return match relation.nested_schema() {
                    Some(href) => self.schema(href.to_string()),
                    None => Err(AgentError::MissingSchema {
                        name: relation.name().to_string(),
                    }),
                };
            }
        };

        if let Some(schema) = self.tables()?.schemas.get(&href) {
            return Ok(Rc::clone(schema));
        }
        let schema = Rc::new(self.fetch_schema(&href)?);
        self.tables()?.schemas.insert(href, Rc::clone(&schema));
        Ok(schema)
    }

    /// Dispatch a relation with an optional body.
    pub fn request(
        &mut self,
        relation: impl Into<RelationRef>,
        body: Option<&Value>,
    ) -> Result<Response, AgentError> {
        self.request_with(relation, body, &RequestOptions::default())
    }

    /// Dispatch a relation with template parameters, headers or query pairs.
    ///
    /// # Errors
    ///
    /// Fails with `AgentError::NotFound` or `AgentError::MissingParameter`
    /// before any network call. Transport and codec failures are returned
    /// unchanged inside their `AgentError` variant.
    pub fn request_with(
        &mut self,
        relation: impl Into<RelationRef>,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Response, AgentError> {
        let relation = self.relation(relation)?;
        let href = expand_href(relation.href(), &options.params)?;
        let url = resolve_url(&self.config.endpoint, &href)?;
        let method = relation.http_method();

        let body = self
            .codec
            .encode(body)
            .map_err(|source| AgentError::Encode { source })?;

        let mut options = options.clone();
        let has_content_type = options
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
        if body.is_some() && !has_content_type {
            options.headers.push((
                "Content-Type".to_string(),
                self.codec.content_type().to_string(),
            ));
        }

        debug!(relation = relation.name(), %method, url = %url, "request");
        let raw = self
            .transport
            .send(method, &url, body, &options)
            .map_err(|source| AgentError::Transport {
                method,
                url: url.clone(),
                source,
            })?;
        debug!(status = raw.status, url = %url, "response");

        let data = self
            .codec
            .decode(&raw.body)
            .map_err(|source| AgentError::Decode { url, source })?;

        Ok(Response::new(relation, raw, data))
    }

    fn tables(&mut self) -> Result<&mut Tables, AgentError> {
        if let State::Unloaded = self.state {
            self.state = State::Loaded(self.fetch_root()?);
        }
        match &mut self.state {
            State::Loaded(tables) => Ok(tables),
            State::Unloaded => Err(AgentError::InvalidRoot {
                url: self.config.endpoint.clone(),
                message: "root document not loaded".to_string(),
            }),
        }
    }

    fn fetch_root(&self) -> Result<Tables, AgentError> {
        let endpoint = self.config.endpoint.as_str();
        let root = self.fetch_document(endpoint)?;
        let links = root_links(endpoint, &root, &self.config.links_property)?;

        let mut schemas: IndexMap<String, Rc<Schema>> = IndexMap::new();
        let relations = resolve_relations(&links, |href| {
            if let Some(schema) = schemas.get(href) {
                return Ok(Rc::clone(schema));
            }
            let schema = Rc::new(self.fetch_schema(href)?);
            schemas.insert(href.to_string(), Rc::clone(&schema));
            Ok(schema)
        })?;

        info!(
            endpoint,
            relations = relations.len(),
            schemas = schemas.len(),
            "root loaded"
        );
        Ok(Tables { relations, schemas })
    }

    fn fetch_schema(&self, href: &str) -> Result<Schema, AgentError> {
        let url = resolve_url(&self.config.endpoint, href)?;
        debug!(href, url = %url, "fetching schema");
        let document = self.fetch_document(&url)?;
        Schema::parse(href, &document, &self.config.default_relation_name)
    }

    fn fetch_document(&self, url: &str) -> Result<Value, AgentError> {
        let raw = self
            .transport
            .get(url)
            .map_err(|source| AgentError::Transport {
                method: Method::Get,
                url: url.to_string(),
                source,
            })?;
        self.codec
            .decode(&raw.body)
            .map_err(|source| AgentError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

/// Read the link list of a root document.
fn root_links(url: &str, root: &Value, links_property: &str) -> Result<Vec<Relation>, AgentError> {
    let invalid = |message: String| AgentError::InvalidRoot {
        url: url.to_string(),
        message,
    };

    validate_document(&root_document_shape(links_property), root)
        .map_err(|errors| invalid(describe(&errors)))?;

    let links = root
        .get(links_property)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("missing {}", links_property)))?;

    links
        .iter()
        .enumerate()
        .map(|(index, link)| {
            let name = link.get("name").and_then(Value::as_str);
            let href = link.get("href").and_then(Value::as_str);
            let (Some(name), Some(href)) = (name, href) else {
                return Err(invalid(format!(
                    "/{}/{}: missing name or href",
                    links_property, index
                )));
            };

            let method = match link.get("method").and_then(Value::as_str) {
                Some(m) => Method::parse(m).ok_or_else(|| {
                    invalid(format!(
                        "/{}/{}: unknown method \"{}\"",
                        links_property, index, m
                    ))
                })?,
                None => Method::Get,
            };

            let mut relation = Relation::new(name, href).method(method);
            if let Some(schema_href) = link_schema_href(link) {
                relation = relation.schema_href(schema_href);
            }
            Ok(relation)
        })
        .collect()
}
