use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription tier stored as lowercase text in Postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Subscription {
    Starter,
    Pro,
    Business,
}

/// Account row. Credentials and session state never serialize; the
/// public projection is email, subscription, avatarURL and verify.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub subscription: Subscription,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    #[serde(rename = "verify")]
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            subscription: Subscription::Starter,
            avatar_url: "https://www.gravatar.com/avatar/abc?d=identicon&s=250".to_string(),
            verified: false,
            verification_token: Some("deadbeef".to_string()),
            token: Some("jwt".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("token").is_none());
        assert!(value.get("verification_token").is_none());
        assert_eq!(value["email"], "user@example.com");
        assert_eq!(value["subscription"], "starter");
        assert_eq!(value["verify"], false);
        assert!(value["avatarURL"].as_str().unwrap().contains("gravatar"));
    }

    #[test]
    fn test_subscription_round_trip() {
        let parsed: Subscription = serde_json::from_str("\"business\"").unwrap();
        assert_eq!(parsed, Subscription::Business);
        assert_eq!(
            serde_json::to_string(&Subscription::Pro).unwrap(),
            "\"pro\""
        );
        assert!(serde_json::from_str::<Subscription>("\"premium\"").is_err());
    }
}
