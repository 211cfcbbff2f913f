//! Back-office accounts, roles, and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a back-office account.
pub struct SystemUser {
    pub id: i64,
    /// Login identifier, stored lowercased.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 hash; never serialized to API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// City the account is scoped to. `None` sees every city.
    pub assigned_city: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    #[default]
    Normal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Normal => "normal",
        }
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "super_admin" | "superadmin" | "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "admin" | "Admin" | "ADMIN" => Ok(Role::Admin),
            "normal" | "Normal" | "NORMAL" => Ok(Role::Normal),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["super_admin", "admin", "normal"],
            )),
        }
    }
}

impl SystemUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Admins and super admins may mutate employees and leaves.
    pub fn can_manage(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::Admin)
    }

    pub fn full_name(&self) -> String {
        let last = self.last_name.trim();
        if last.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, last)
        }
    }

    /// City the account is restricted to when listing employees.
    pub fn city_scope(&self) -> Option<&str> {
        if self.is_super_admin() {
            return None;
        }
        self.assigned_city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a system user.
pub struct SystemUserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub assigned_city: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SystemUser> for SystemUserResponse {
    fn from(user: SystemUser) -> Self {
        SystemUserResponse {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            assigned_city: user.assigned_city,
            is_active: user.is_active,
            last_login: user.last_login,
            created_by: user.created_by,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: SystemUserResponse,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for creating a new back-office account.
pub struct CreateSystemUser {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    pub assigned_city: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
/// Partial update for an account; `None` keeps the stored value.
pub struct UpdateSystemUser {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub assigned_city: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}
