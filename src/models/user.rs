use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account known to the auth provider. Its id, as a string, is the `uid`
/// that scopes every feed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created_at: i64,
}

impl User {
    pub fn uid(&self) -> String {
        self.id.to_string()
    }
}
