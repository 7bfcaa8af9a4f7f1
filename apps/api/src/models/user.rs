use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity resolved from a bearer token by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}
