//! Core types for relation discovery.

use std::cell::OnceCell;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use url::Url;
use urlencoding::encode;

use crate::error::AgentError;
use crate::transport::RawResponse;

/// Default property holding the link list of the root document.
pub const DEFAULT_LINKS_PROPERTY: &str = "_links";

/// Default name of a schema's top-level relation.
pub const DEFAULT_RELATION_NAME: &str = "all";

/// HTTP verb of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Parse a method name, ignoring case.
    ///
    /// Returns `None` for unknown verbs (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "patch" => Some(Method::Patch),
            "delete" => Some(Method::Delete),
            "head" => Some(Method::Head),
            "options" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, addressable action: target href, HTTP method and an optional
/// reference to the schema describing the target resource.
///
/// Relations are immutable apart from the owning schema, which is bound at
/// most once during root resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    href: String,
    method: Method,
    schema_href: Option<String>,
    owner: OnceCell<String>,
}

impl Relation {
    /// Create a `GET` relation with no schema reference.
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
            method: Method::Get,
            schema_href: None,
            owner: OnceCell::new(),
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the reference of the schema describing the target resource.
    ///
    /// An empty reference is treated as absent.
    pub fn schema_href(mut self, href: impl Into<String>) -> Self {
        let href = href.into();
        self.schema_href = (!href.is_empty()).then_some(href);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target href, possibly a template with `{param}` placeholders.
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn http_method(&self) -> Method {
        self.method
    }

    /// Reference of the nested schema this relation points at, if any.
    pub fn nested_schema(&self) -> Option<&str> {
        self.schema_href.as_deref()
    }

    /// Href of the schema this relation was resolved from.
    ///
    /// `None` until root resolution binds it. Look the schema up with
    /// [`Agent::schema`](crate::Agent::schema).
    pub fn schema(&self) -> Option<&str> {
        self.owner.get().map(String::as_str)
    }

    /// Bind the owning schema. Returns false if already bound elsewhere.
    pub(crate) fn bind_schema(&self, href: &str) -> bool {
        match self.owner.get() {
            Some(existing) => existing == href,
            None => self.owner.set(href.to_string()).is_ok(),
        }
    }
}

/// A relation given by name, or one the caller already holds.
#[derive(Debug, Clone)]
pub enum RelationRef {
    Name(String),
    Resolved(Relation),
}

impl From<&str> for RelationRef {
    fn from(name: &str) -> Self {
        RelationRef::Name(name.to_string())
    }
}

impl From<String> for RelationRef {
    fn from(name: String) -> Self {
        RelationRef::Name(name)
    }
}

impl From<Relation> for RelationRef {
    fn from(relation: Relation) -> Self {
        RelationRef::Resolved(relation)
    }
}

impl From<&Relation> for RelationRef {
    fn from(relation: &Relation) -> Self {
        RelationRef::Resolved(relation.clone())
    }
}

/// A schema given by reference, or via the relation pointing at it.
#[derive(Debug, Clone)]
pub enum SchemaRef {
    Href(String),
    Of(Relation),
}

impl From<&str> for SchemaRef {
    fn from(href: &str) -> Self {
        SchemaRef::Href(href.to_string())
    }
}

impl From<String> for SchemaRef {
    fn from(href: String) -> Self {
        SchemaRef::Href(href)
    }
}

impl From<Relation> for SchemaRef {
    fn from(relation: Relation) -> Self {
        SchemaRef::Of(relation)
    }
}

impl From<&Relation> for SchemaRef {
    fn from(relation: &Relation) -> Self {
        SchemaRef::Of(relation.clone())
    }
}

/// Per-request extras passed through to the transport.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Values for `{name}` placeholders in the relation href.
    pub params: Vec<(String, String)>,
    /// Additional request headers.
    pub headers: Vec<(String, String)>,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Result of dispatching a relation.
#[derive(Debug, Clone)]
pub struct Response {
    relation: Relation,
    raw: RawResponse,
    data: Value,
}

impl Response {
    pub(crate) fn new(relation: Relation, raw: RawResponse, data: Value) -> Self {
        Self {
            relation,
            raw,
            data,
        }
    }

    /// The relation that was dispatched.
    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// Transport result, including status and headers.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Decoded response body (`Null` for an empty body).
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Resolve an href against the endpoint as an RFC 3986 reference.
///
/// Absolute hrefs replace the endpoint; `/path` replaces its path; a bare
/// `path` replaces its last segment, so endpoints naming a directory should
/// end in `/`.
///
/// # Errors
///
/// Returns `AgentError::InvalidUrl` if the endpoint isn't an absolute URL or
/// the href can't be joined to it.
pub fn resolve_url(endpoint: &str, href: &str) -> Result<String, AgentError> {
    let base = Url::parse(endpoint).map_err(|e| AgentError::InvalidUrl {
        url: endpoint.to_string(),
        message: e.to_string(),
    })?;
    let url = base.join(href).map_err(|e| AgentError::InvalidUrl {
        url: href.to_string(),
        message: e.to_string(),
    })?;
    Ok(url.into())
}

/// Fill `{name}` placeholders of an href template.
///
/// Values are percent-encoded as single path segments.
///
/// # Errors
///
/// Returns `AgentError::MissingParameter` for a placeholder with no value.
pub fn expand_href(href: &str, params: &[(String, String)]) -> Result<String, AgentError> {
    let mut out = String::with_capacity(href.len());
    let mut rest = href;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = params
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| AgentError::MissingParameter {
                name: name.to_string(),
                href: href.to_string(),
            })?;
        out.push_str(&rest[..start]);
        out.push_str(&encode(value));
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_ignores_case() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("post"), Some(Method::Post));
        assert_eq!(Method::parse("Delete"), Some(Method::Delete));
        assert_eq!(Method::parse("fetch"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn method_displays_lowercase() {
        assert_eq!(Method::Patch.to_string(), "patch");
        assert_eq!(Method::default(), Method::Get);
    }

    #[test]
    fn relation_defaults() {
        let rel = Relation::new("users", "/users");
        assert_eq!(rel.name(), "users");
        assert_eq!(rel.http_method(), Method::Get);
        assert_eq!(rel.nested_schema(), None);
        assert_eq!(rel.schema(), None);
    }

    #[test]
    fn empty_schema_href_is_absent() {
        let rel = Relation::new("users", "/users").schema_href("");
        assert_eq!(rel.nested_schema(), None);
    }

    #[test]
    fn bind_schema_is_set_once() {
        let rel = Relation::new("all", "/users");
        assert!(rel.bind_schema("/schemata/users"));
        assert!(rel.bind_schema("/schemata/users"));
        assert!(!rel.bind_schema("/schemata/other"));
        assert_eq!(rel.schema(), Some("/schemata/users"));
    }

    #[test]
    fn clone_keeps_binding() {
        let rel = Relation::new("all", "/users");
        rel.bind_schema("/schemata/users");
        assert_eq!(rel.clone().schema(), Some("/schemata/users"));
    }

    #[test]
    fn resolve_url_relative() {
        assert_eq!(
            resolve_url("http://api.test", "/users").unwrap(),
            "http://api.test/users"
        );
        assert_eq!(
            resolve_url("http://api.test/v1/", "users").unwrap(),
            "http://api.test/v1/users"
        );
        assert_eq!(
            resolve_url("http://api.test", "").unwrap(),
            "http://api.test/"
        );
    }

    #[test]
    fn resolve_url_against_document_endpoint() {
        assert_eq!(
            resolve_url("http://api.test/root.json", "/users").unwrap(),
            "http://api.test/users"
        );
        assert_eq!(
            resolve_url("http://api.test/v1/root.json?format=hal", "users").unwrap(),
            "http://api.test/v1/users"
        );
    }

    #[test]
    fn resolve_url_absolute_and_protocol_relative() {
        assert_eq!(
            resolve_url("http://api.test", "https://other.test/schemata/users").unwrap(),
            "https://other.test/schemata/users"
        );
        assert_eq!(
            resolve_url("https://api.test/root", "//cdn.test/schemata/users").unwrap(),
            "https://cdn.test/schemata/users"
        );
    }

    #[test]
    fn resolve_url_invalid_endpoint() {
        let result = resolve_url("api.test", "/users");
        assert!(matches!(
            result,
            Err(AgentError::InvalidUrl { ref url, .. }) if url == "api.test"
        ));
    }

    #[test]
    fn expand_href_fills_placeholders() {
        let params = vec![
            ("org".to_string(), "acme".to_string()),
            ("id".to_string(), "42".to_string()),
        ];
        assert_eq!(
            expand_href("/orgs/{org}/users/{id}", &params).unwrap(),
            "/orgs/acme/users/42"
        );
    }

    #[test]
    fn expand_href_encodes_reserved_characters() {
        let params = vec![("id".to_string(), "a/b?admin=1#x%".to_string())];
        let href = expand_href("/users/{id}", &params).unwrap();
        assert_eq!(href, "/users/a%2Fb%3Fadmin%3D1%23x%25");
        assert_eq!(
            resolve_url("http://api.test", &href).unwrap(),
            "http://api.test/users/a%2Fb%3Fadmin%3D1%23x%25"
        );
    }

    #[test]
    fn expand_href_without_placeholders() {
        assert_eq!(expand_href("/users", &[]).unwrap(), "/users");
    }

    #[test]
    fn expand_href_missing_parameter() {
        let result = expand_href("/users/{id}", &[]);
        assert!(matches!(
            result,
            Err(AgentError::MissingParameter { ref name, .. }) if name == "id"
        ));
    }

    #[test]
    fn expand_href_unclosed_brace_kept() {
        assert_eq!(expand_href("/users/{id", &[]).unwrap(), "/users/{id");
    }
}
