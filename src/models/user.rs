// SPDX-License-Identifier: MIT

//! User account model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Account role, in ascending order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    NotRegistered,
    User,
    Merchant,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::NotRegistered => "NOT_REGISTERED",
            Role::User => "USER",
            Role::Merchant => "MERCHANT",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NOT_REGISTERED" => Some(Role::NotRegistered),
            "USER" => Some(Role::User),
            "MERCHANT" => Some(Role::Merchant),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// OAuth2 provider for socially-linked accounts; `None` on the user means a
/// local username/password account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderType {
    Kakao,
    Naver,
    Google,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::Kakao => "KAKAO",
            ProviderType::Naver => "NAVER",
            ProviderType::Google => "GOOGLE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "KAKAO" => Some(ProviderType::Kakao),
            "NAVER" => Some(ProviderType::Naver),
            "GOOGLE" => Some(ProviderType::Google),
            _ => None,
        }
    }
}

/// A user account. Either a local username/password account or an OAuth2
/// provider-linked one; the unused identity fields stay `None`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub provider_type: Option<ProviderType>,
    pub provider_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Role,
    pub nickname: Option<String>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}
