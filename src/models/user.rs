use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// The `users(name)` relation as embedded in service and booking rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserName {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}
