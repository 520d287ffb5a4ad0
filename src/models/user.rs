// src/models/user.rs

use serde::{Deserialize, Serialize};

/// The authenticated caller, as resolved from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Stable user id issued by the auth provider.
    pub id: String,
    pub email: Option<String>,
}
