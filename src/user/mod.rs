mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{Result, ServerError};

const AVATAR_PROVIDER: &str = "https://api.dicebear.com/5.x/avataaars/svg";
const AVATAR_SEEDS: u32 = 10_000;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// User as saved on database.
///
/// `password` holds the PHC hash and never leaves the server.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub name: String,
    pub bio: String,
    pub profile_picture: String,
    pub native_language: String,
    pub learning_language: String,
    pub country: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub friends: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fields other learners may see.
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            profile_picture: self.profile_picture.clone(),
            native_language: self.native_language.clone(),
            learning_language: self.learning_language.clone(),
        }
    }
}

/// Public subset of a [`User`], joined into friend request listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub profile_picture: String,
    pub native_language: String,
    pub learning_language: String,
}

/// Profile as submitted during onboarding, before completeness is checked.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub country: Option<String>,
    pub profile_picture: Option<String>,
}

/// Complete onboarding profile.
///
/// An empty picture was already dropped by [`ProfileDraft::complete`].
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct Profile {
    pub name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub country: String,
    #[validate(url(message = "Profile picture must be an URL."))]
    pub profile_picture: Option<String>,
}

impl ProfileDraft {
    /// Turn the draft into a [`Profile`].
    ///
    /// Fails with every empty or absent required field, in declaration order.
    pub fn complete(self) -> Result<Profile> {
        fn take(
            value: Option<String>,
            field: &'static str,
            missing: &mut Vec<&'static str>,
        ) -> String {
            match value {
                Some(value) if !value.is_empty() => value,
                _ => {
                    missing.push(field);
                    String::default()
                },
            }
        }

        let mut missing = Vec::new();
        let profile = Profile {
            name: take(self.name, "name", &mut missing),
            bio: take(self.bio, "bio", &mut missing),
            native_language: take(
                self.native_language,
                "nativeLanguage",
                &mut missing,
            ),
            learning_language: take(
                self.learning_language,
                "learningLanguage",
                &mut missing,
            ),
            country: take(self.country, "country", &mut missing),
            profile_picture: self.profile_picture.filter(|p| !p.is_empty()),
        };

        if missing.is_empty() {
            Ok(profile)
        } else {
            Err(ServerError::MissingFields(missing))
        }
    }
}

/// Check `local@domain.tld` shape, without whitespace.
pub fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    if EMAIL.as_ref().is_some_and(|re| re.is_match(email)) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Pick one of the generated avatars at random.
pub fn random_avatar() -> String {
    let seed = rand::thread_rng().gen_range(0..AVATAR_SEEDS);
    format!("{AVATAR_PROVIDER}?seed={seed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProfileDraft {
        ProfileDraft {
            name: Some("Ann".into()),
            bio: Some("x".into()),
            native_language: Some("en".into()),
            learning_language: Some("fr".into()),
            country: Some("US".into()),
            profile_picture: None,
        }
    }

    #[test]
    fn test_complete_profile() {
        let profile = draft().complete().unwrap();
        assert_eq!(profile.name, "Ann");
        assert_eq!(profile.profile_picture, None);
    }

    #[test]
    fn test_single_missing_field() {
        let draft = ProfileDraft {
            name: Some(String::new()),
            ..draft()
        };

        match draft.complete() {
            Err(ServerError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["name"])
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_every_missing_field() {
        match ProfileDraft::default().complete() {
            Err(ServerError::MissingFields(fields)) => assert_eq!(
                fields,
                vec![
                    "name",
                    "bio",
                    "nativeLanguage",
                    "learningLanguage",
                    "country"
                ]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_picture_is_dropped() {
        let draft = ProfileDraft {
            profile_picture: Some(String::new()),
            ..draft()
        };

        let profile = draft.complete().unwrap();
        assert_eq!(profile.profile_picture, None);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_picture_must_be_url() {
        let draft = ProfileDraft {
            profile_picture: Some("not a url".into()),
            ..draft()
        };

        assert!(draft.complete().unwrap().validate().is_err());
    }

    #[test]
    fn test_long_fields_are_accepted() {
        let draft = ProfileDraft {
            name: Some("A".repeat(60)),
            bio: Some("b".repeat(1_000)),
            ..draft()
        };

        let profile = draft.complete().unwrap();
        assert_eq!(profile.name.len(), 60);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@sub.domain.org").is_ok());
        assert!(validate_email("a x@x.com").is_err());
        assert!(validate_email("a@xcom").is_err());
        assert!(validate_email("@x.com").is_err());
    }

    #[test]
    fn test_password_is_never_serialized() {
        let user = User {
            password: "$argon2id$v=19$secret".into(),
            ..Default::default()
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("_id").is_some());
        assert_eq!(json["isVerified"], false);
    }

    #[test]
    fn test_random_avatar() {
        assert!(random_avatar().starts_with(AVATAR_PROVIDER));
    }
}
