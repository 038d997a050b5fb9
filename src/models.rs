use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppResult, INVALID_NAME, PersonError},
    normalize::normalize_name,
};

pub const PERSON_CREATED: &str = "Person created successfully.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

/// A person that has passed validation and normalization but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
}

/// Body of `POST /api` and `PUT /api/{token}`.
///
/// `name` is kept as raw JSON so a number or `null` is reported as a
/// validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonPayload {
    #[serde(default)]
    pub name: Option<Value>,
}

impl PersonPayload {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(Value::String(name.into())),
        }
    }

    /// Validates the payload and returns the record in canonical form.
    pub fn into_new_person(self) -> AppResult<NewPerson> {
        let Some(Value::String(raw)) = self.name else {
            return Err(PersonError::validation(INVALID_NAME));
        };

        let name = normalize_name(&raw);
        if name.is_empty() {
            return Err(PersonError::validation(INVALID_NAME));
        }

        Ok(NewPerson { name })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
