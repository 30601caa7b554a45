use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::auth::USERNAME_REGEX;

/// Access level of an account.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular author and commenter. Every new account starts here.
    User,
    /// May review posts and remove comments.
    Moderator,
    /// Full access to the admin console.
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Moderators and admins share the moderation console.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

/// A user account as returned by the API. The password hash never leaves the database layer.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields are left untouched; an empty `bio`
/// or `avatar` clears the stored value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub avatar: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar.is_none()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Activity totals for the authenticated author.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_likes_received: i64,
    pub total_views: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Moderator.is_admin());
        assert!(!Role::User.is_admin());

        assert!(Role::Admin.can_moderate());
        assert!(Role::Moderator.can_moderate());
        assert!(!Role::User.can_moderate());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn test_update_profile_validation() {
        let valid = UpdateProfileRequest {
            username: Some("new_name".to_string()),
            bio: Some("Writes about Rust".to_string()),
            avatar: None,
        };
        assert!(valid.validate().is_ok());
        assert!(!valid.is_empty());

        let bad_username = UpdateProfileRequest {
            username: Some("no spaces!".to_string()),
            bio: None,
            avatar: None,
        };
        assert!(bad_username.validate().is_err());

        let nothing = UpdateProfileRequest {
            username: None,
            bio: None,
            avatar: None,
        };
        assert!(nothing.validate().is_ok());
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_change_password_validation() {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"secret1","newPassword":"123"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"secret1","newPassword":"longer-secret"}"#)
                .unwrap();
        assert!(request.validate().is_ok());
    }
}
