//! Shape validation of root and schema documents.
//!
//! Documents are checked against small built-in JSON Schemas before they are
//! parsed, so malformed input is reported with JSON pointers to the
//! offending values.

use serde_json::{json, Value};

use crate::error::DocumentError;

fn schema_reference_shape() -> Value {
    json!({
        "anyOf": [
            { "type": "string" },
            {
                "type": "object",
                "required": ["href"],
                "properties": { "href": { "type": "string" } }
            }
        ]
    })
}

/// Expected shape of a schema document.
pub fn schema_document_shape() -> Value {
    json!({
        "type": "object",
        "required": ["links"],
        "properties": {
            "defaultRelation": { "type": "string", "minLength": 1 },
            "links": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["rel", "href", "method"],
                    "properties": {
                        "rel": { "type": "string", "minLength": 1 },
                        "href": { "type": "string" },
                        "method": { "type": "string" },
                        "schema": schema_reference_shape()
                    }
                }
            }
        }
    })
}

/// Expected shape of a root document whose links live at `links_property`.
pub fn root_document_shape(links_property: &str) -> Value {
    json!({
        "type": "object",
        "required": [links_property],
        "properties": {
            links_property: {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "href"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "href": { "type": "string" },
                        "method": { "type": "string" },
                        "schema": schema_reference_shape()
                    }
                }
            }
        }
    })
}

/// Validate a document against a shape, collecting every violation.
pub fn validate_document(shape: &Value, document: &Value) -> Result<(), Vec<DocumentError>> {
    let validator = jsonschema::validator_for(shape).map_err(|e| {
        vec![DocumentError {
            path: String::new(),
            message: format!("invalid document shape: {}", e),
        }]
    })?;

    let errors: Vec<DocumentError> = validator
        .iter_errors(document)
        .map(|e| DocumentError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Join violations into one message.
pub fn describe(errors: &[DocumentError]) -> String {
    errors
        .iter()
        .map(DocumentError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
