//! Hypermedia API client
//!
//! Given a root endpoint, the agent discovers named relations by following a
//! self-describing schema graph, caches every schema it fetches, and
//! dispatches requests by relation name instead of hand-built URLs.
//!
//! # Example
//!
//! ```no_run
//! use hyperagent::{Agent, AgentConfig, RequestOptions};
//! use serde_json::json;
//!
//! let mut agent = Agent::new(AgentConfig::new("https://api.example.com"))?;
//! agent.transport_mut().set_header("Accept", "application/json")?;
//!
//! for (name, relation) in agent.relations()? {
//!     println!("{} {} {}", name, relation.http_method(), relation.href());
//! }
//!
//! let users = agent.request("users", None)?;
//! println!("{}", users.data());
//!
//! let created = agent.request("users/create", Some(&json!({ "name": "ada" })))?;
//! let one = agent.request_with("users/one", None, &RequestOptions::new().param("id", "42"))?;
//! # let _ = (created, one);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Documents
//!
//! The root document lists links under `_links` (configurable):
//!
//! ```json
//! { "_links": [ { "name": "users", "href": "/users", "schema": { "href": "/schemata/users" } } ] }
//! ```
//!
//! Each schema document lists its relations and may name its default one
//! (otherwise `all`):
//!
//! ```json
//! {
//!   "defaultRelation": "all",
//!   "links": [
//!     { "rel": "all", "href": "/users", "method": "GET" },
//!     { "rel": "create", "href": "/users", "method": "POST" },
//!     { "rel": "one", "href": "/users/{id}", "method": "GET" }
//!   ]
//! }
//! ```
//!
//! # Relation names
//!
//! | Name | Source |
//! |------|--------|
//! | `users` | default relation of the `users` link's schema |
//! | `users/create` | schema relation sharing the default relation's href |
//! | (none) | schema relations with a different href, reachable via [`Agent::schema`] |

mod agent;
mod codec;
mod error;
mod resolver;
mod schema;
mod transport;
mod types;
mod validator;

pub use agent::{Agent, AgentConfig};
pub use codec::{Codec, JsonCodec};
pub use error::{AgentError, CodecError, DocumentError, TransportError};
pub use resolver::resolve_relations;
pub use schema::Schema;
pub use transport::{RawResponse, Transport};
pub use types::{
    expand_href, resolve_url, Method, Relation, RelationRef, RequestOptions, Response,
    SchemaRef, DEFAULT_LINKS_PROPERTY, DEFAULT_RELATION_NAME,
};
pub use validator::{root_document_shape, schema_document_shape, validate_document};

#[cfg(feature = "remote")]
pub use transport::HttpTransport;
