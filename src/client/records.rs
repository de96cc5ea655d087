//! Typed API records
//!
//! The backend speaks loose JSON; this module pins it down into explicit
//! records with fallible parsers. The policy for the server's optional text
//! fields is deliberate and uniform: a missing or null *optional* string
//! parses as the empty string, while a missing *required* field is a
//! [`RecordError`], never a silent default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from parsing a record out of a JSON value
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("{record} is missing required field '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record} field '{field}' has the wrong type")]
    WrongType {
        record: &'static str,
        field: &'static str,
    },

    #[error("Expected a JSON object for {0}")]
    NotAnObject(&'static str),
}

fn required_str(
    value: &Value,
    record: &'static str,
    field: &'static str,
) -> Result<String, RecordError> {
    match value.get(field) {
        None | Some(Value::Null) => Err(RecordError::MissingField { record, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        // Servers sometimes emit numeric ids; accept them as strings.
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}

fn optional_str(value: &Value, record: &'static str, field: &'static str) -> Result<String, RecordError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}

// ============================================================================
// Auth records (shapes from the backend's register/login/profile endpoints)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserProfile,
}

/// Body of the `/health` endpoint. Reachability is decided by status code
/// alone; this record exists for diagnostics output.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

// ============================================================================
// Complaint-domain records
// ============================================================================

/// A complaint category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Optional on the wire; empty string when absent
    pub description: String,
}

impl Category {
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject("Category"));
        }
        Ok(Self {
            id: required_str(value, "Category", "id")?,
            name: required_str(value, "Category", "name")?,
            description: optional_str(value, "Category", "description")?,
        })
    }
}

/// A filed complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    /// Optional free-text location; empty string when absent
    pub location: String,
    /// Optional server-side URL of an attached image; empty string when absent
    pub image_url: String,
    pub status: String,
    /// Optional RFC 3339 creation time; empty string when absent
    pub created_at: String,
}

impl Complaint {
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject("Complaint"));
        }
        Ok(Self {
            id: required_str(value, "Complaint", "id")?,
            title: required_str(value, "Complaint", "title")?,
            description: optional_str(value, "Complaint", "description")?,
            category_id: required_str(value, "Complaint", "category_id")?,
            location: optional_str(value, "Complaint", "location")?,
            image_url: optional_str(value, "Complaint", "image_url")?,
            status: optional_str(value, "Complaint", "status")?,
            created_at: optional_str(value, "Complaint", "created_at")?,
        })
    }

    /// Parse a JSON array of complaints, failing on the first bad element
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, RecordError> {
        let items = value
            .as_array()
            .ok_or(RecordError::NotAnObject("Complaint list"))?;
        items.iter().map(Self::from_value).collect()
    }
}

/// A file attached to a complaint, as the server stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub complaint_id: String,
    pub url: String,
    /// Optional MIME type; empty string when absent
    pub content_type: String,
}

impl Attachment {
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject("Attachment"));
        }
        Ok(Self {
            id: required_str(value, "Attachment", "id")?,
            complaint_id: required_str(value, "Attachment", "complaint_id")?,
            url: required_str(value, "Attachment", "url")?,
            content_type: optional_str(value, "Attachment", "content_type")?,
        })
    }

    /// Parse a JSON array of attachments, failing on the first bad element
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, RecordError> {
        let items = value
            .as_array()
            .ok_or(RecordError::NotAnObject("Attachment list"))?;
        items.iter().map(Self::from_value).collect()
    }
}

/// Payload for creating or updating a complaint
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintDraft {
    pub title: String,
    pub description: String,
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Base64-encoded image attachment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parses_with_optional_description() {
        let full = json!({"id": "1", "name": "Roads", "description": "Potholes"});
        let cat = Category::from_value(&full).unwrap();
        assert_eq!(cat.description, "Potholes");

        let bare = json!({"id": 2, "name": "Water"});
        let cat = Category::from_value(&bare).unwrap();
        assert_eq!(cat.id, "2");
        assert_eq!(cat.description, "");
    }

    #[test]
    fn test_category_missing_name_is_an_error() {
        let value = json!({"id": "1"});
        assert!(matches!(
            Category::from_value(&value),
            Err(RecordError::MissingField {
                record: "Category",
                field: "name"
            })
        ));
    }

    #[test]
    fn test_complaint_optional_fields_default_to_empty() {
        let value = json!({
            "id": "c-9",
            "title": "Broken streetlight",
            "category_id": "3"
        });
        let complaint = Complaint::from_value(&value).unwrap();
        assert_eq!(complaint.location, "");
        assert_eq!(complaint.image_url, "");
        assert_eq!(complaint.status, "");
    }

    #[test]
    fn test_complaint_wrong_type_is_an_error() {
        let value = json!({
            "id": "c-9",
            "title": "x",
            "category_id": "3",
            "location": 42
        });
        assert!(matches!(
            Complaint::from_value(&value),
            Err(RecordError::WrongType {
                record: "Complaint",
                field: "location"
            })
        ));
    }

    #[test]
    fn test_complaint_list_fails_on_bad_element() {
        let good = json!([{"id": "1", "title": "a", "category_id": "1"}]);
        assert_eq!(Complaint::list_from_value(&good).unwrap().len(), 1);

        let bad = json!([{"id": "1", "title": "a", "category_id": "1"}, {"title": "b"}]);
        assert!(Complaint::list_from_value(&bad).is_err());
    }

    #[test]
    fn test_attachment_parses_with_optional_content_type() {
        let full = json!({
            "id": "a-1",
            "complaint_id": "c-9",
            "url": "http://192.168.1.10:8000/uploads/a-1.jpg",
            "content_type": "image/jpeg"
        });
        let attachment = Attachment::from_value(&full).unwrap();
        assert_eq!(attachment.content_type, "image/jpeg");

        let bare = json!({"id": "a-2", "complaint_id": "c-9", "url": "/uploads/a-2.jpg"});
        let attachment = Attachment::from_value(&bare).unwrap();
        assert_eq!(attachment.content_type, "");
    }

    #[test]
    fn test_attachment_missing_url_is_an_error() {
        let value = json!({"id": "a-1", "complaint_id": "c-9"});
        assert!(matches!(
            Attachment::from_value(&value),
            Err(RecordError::MissingField {
                record: "Attachment",
                field: "url"
            })
        ));
    }

    #[test]
    fn test_attachment_list_fails_on_bad_element() {
        let good = json!([{"id": "a-1", "complaint_id": "c-9", "url": "/uploads/a-1.jpg"}]);
        assert_eq!(Attachment::list_from_value(&good).unwrap().len(), 1);

        let bad = json!([{"id": "a-1", "url": "/uploads/a-1.jpg"}]);
        assert!(Attachment::list_from_value(&bad).is_err());
    }

    #[test]
    fn test_token_response_deserializes() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {
                "id": "u-1",
                "full_name": "Test User",
                "email": "test@example.com",
                "is_active": true,
                "created_at": "2026-08-01T09:30:00Z",
                "updated_at": "2026-08-15T17:45:00Z"
            }
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.user.email, "test@example.com");
        assert_eq!(token.user.created_at.to_rfc3339(), "2026-08-01T09:30:00+00:00");
        assert!(token.user.updated_at > token.user.created_at);
    }

    #[test]
    fn test_draft_skips_absent_optionals() {
        let draft = ComplaintDraft {
            title: "t".to_string(),
            description: "d".to_string(),
            category_id: "1".to_string(),
            location: None,
            image: None,
        };
        let json = serde_json::to_string(&draft).unwrap();
        assert!(!json.contains("location"));
        assert!(!json.contains("image"));
    }
}
