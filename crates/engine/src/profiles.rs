//! The module contains `Profile`, the identity of every user of the service.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Role of a profile.
///
/// - `admin`: manages users, items, vouchers and reads analytics.
/// - `centre_staff`: records recycling sessions; the profile id is the
///   collection centre id.
/// - `recycler`: earns and redeems points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CentreStaff,
    Recycler,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::CentreStaff => "centre_staff",
            Self::Recycler => "recycler",
        }
    }

    /// Returns true for roles allowed to record recycling sessions.
    pub fn can_record_sessions(self) -> bool {
        matches!(self, Self::Admin | Self::CentreStaff)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "centre_staff" => Ok(Self::CentreStaff),
            "recycler" => Ok(Self::Recycler),
            other => Err(EngineError::InvalidInput(format!("invalid role: {other}"))),
        }
    }
}

/// A user of the service.
///
/// The point total is not part of the profile: it is always derived from the
/// ledger (see [`Engine::balance`](crate::Engine::balance)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub role: Role,
    /// Short member code shown to the recycler and typed by centre staff.
    pub public_id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub role: String,
    pub public_id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Profile {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            role: Role::try_from(model.role.as_str())?,
            id: model.id,
            public_id: model.public_id,
            full_name: model.full_name,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
