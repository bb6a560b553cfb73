use serde::{Deserialize, Deserializer, Serialize};

use super::user::UserName;
use super::view::UNKNOWN_PRACTITIONER;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub price: f64,
    pub user_id: String,
}

/// A catalog row: the service plus its owner's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceWithProvider {
    #[serde(flatten)]
    pub service: Service,
    #[serde(default)]
    pub users: Option<UserName>,
}

impl ServiceWithProvider {
    pub fn provider_name(&self) -> &str {
        self.users
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .unwrap_or(UNKNOWN_PRACTITIONER)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_row_with_provider() {
        let row: ServiceWithProvider = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "title": "Deep Tissue",
            "description": "Sixty minutes",
            "specialties": ["back", "sports"],
            "price": 80.0,
            "user_id": "u-alice",
            "users": { "name": "Alice" }
        }))
        .unwrap();
        assert_eq!(row.provider_name(), "Alice");
        assert_eq!(row.service.specialties, vec!["back", "sports"]);
    }

    #[test]
    fn test_catalog_row_missing_provider() {
        let row: ServiceWithProvider = serde_json::from_value(serde_json::json!({
            "id": "s2",
            "title": "Reiki",
            "specialties": null,
            "price": 40,
            "user_id": "u-gone",
            "users": null
        }))
        .unwrap();
        assert_eq!(row.provider_name(), "Unknown Practitioner");
        assert!(row.service.specialties.is_empty());
        assert!(row.service.description.is_none());
    }
}
