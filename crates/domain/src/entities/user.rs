use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

pub type Timestamp = DateTime<Utc>;

// Unanchored: a match anywhere in the address is enough
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex should compile"));

const MIN_USERNAME_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Moderator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            other => Err(DomainError::ParseError(format!("unknown user role: {}", other))),
        }
    }
}

/// Core User entity - a validated record, persisted or about to be
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>, // None until the store assigns one
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(email: String, username: String) -> Self {
        Self {
            id: None,
            email,
            username,
            first_name: None,
            last_name: None,
            role: UserRole::default(),
            profile_image_url: None,
            is_active: true,
            last_login: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Partial user input as it arrives from callers. Nothing is guaranteed
/// until [`UserDraft::validate`] turns it into a [`User`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDraft {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub profile_image_url: Option<String>,
    pub is_active: Option<bool>,
    pub last_login: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl UserDraft {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<User, DomainError> {
        self.validate_at(Utc::now())
    }

    /// Checks every rule, then fills defaults: `role` becomes `user`,
    /// `isActive` becomes `true`, `createdAt` is stamped when missing and
    /// `updatedAt` is always overwritten with `now`.
    ///
    /// Username length is counted in Unicode scalar values (`chars()`), not
    /// UTF-16 code units, so `"𝒜b"` is two characters and too short.
    pub fn validate_at(self, now: Timestamp) -> Result<User, DomainError> {
        let mut errors = Vec::new();

        match self.email.as_deref() {
            None | Some("") => errors.push("Email is required"),
            Some(email) if !EMAIL_SHAPE.is_match(email) => errors.push("Invalid email format"),
            Some(_) => {}
        }

        match self.username.as_deref() {
            None | Some("") => errors.push("Username is required"),
            Some(username) if username.chars().count() < MIN_USERNAME_CHARS => {
                errors.push("Username must be at least 3 characters")
            }
            Some(_) => {}
        }

        if !errors.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "Validation failed: {}",
                errors.join(", ")
            )));
        }

        Ok(User {
            id: None,
            email: self.email.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role.unwrap_or_default(),
            profile_image_url: self.profile_image_url,
            is_active: self.is_active.unwrap_or(true),
            last_login: self.last_login,
            created_at: Some(self.created_at.unwrap_or(now)),
            updated_at: Some(now),
        })
    }
}

impl From<User> for UserDraft {
    fn from(user: User) -> Self {
        Self {
            email: Some(user.email),
            username: Some(user.username),
            first_name: user.first_name,
            last_name: user.last_name,
            role: Some(user.role),
            profile_image_url: user.profile_image_url,
            is_active: Some(user.is_active),
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Attribute names of [`User`], used to pick an ordering field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserField {
    Id,
    Email,
    Username,
    FirstName,
    LastName,
    Role,
    ProfileImageUrl,
    IsActive,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::Username => "username",
            UserField::FirstName => "firstName",
            UserField::LastName => "lastName",
            UserField::Role => "role",
            UserField::ProfileImageUrl => "profileImageUrl",
            UserField::IsActive => "isActive",
            UserField::LastLogin => "lastLogin",
            UserField::CreatedAt => "createdAt",
            UserField::UpdatedAt => "updatedAt",
        }
    }
}

impl FromStr for UserField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "id" => UserField::Id,
            "email" => UserField::Email,
            "username" => UserField::Username,
            "firstName" => UserField::FirstName,
            "lastName" => UserField::LastName,
            "role" => UserField::Role,
            "profileImageUrl" => UserField::ProfileImageUrl,
            "isActive" => UserField::IsActive,
            "lastLogin" => UserField::LastLogin,
            "createdAt" => UserField::CreatedAt,
            "updatedAt" => UserField::UpdatedAt,
            other => return Err(DomainError::ParseError(format!("unknown user field: {}", other))),
        };
        Ok(field)
    }
}
