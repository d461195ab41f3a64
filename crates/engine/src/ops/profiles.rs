use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Profile, ResultEngine, Role, auth_tokens, points_ledger, profiles, sessions,
    util::{
        PUBLIC_ID_LEN, hash_password, new_id, new_public_id, new_token, normalize_email,
        normalize_member_code, normalize_optional_text, sha256_hex, verify_password,
    },
    vouchers::redemptions,
};

use super::{Engine, with_tx};

const PUBLIC_ID_ATTEMPTS: usize = 8;

/// Input for [`Engine::create_profile`].
#[derive(Clone, Debug)]
pub struct NewProfile {
    pub email: String,
    /// Profiles without a password cannot log in (e.g. recyclers registered
    /// at the counter).
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
}

/// Partial update applied by administrators. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

impl Engine {
    pub(super) async fn require_profile(
        &self,
        db: &DatabaseTransaction,
        profile_id: &str,
    ) -> ResultEngine<profiles::Model> {
        profiles::Entity::find_by_id(profile_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
    }

    pub(super) async fn require_recycler(
        &self,
        db: &DatabaseTransaction,
        profile_id: &str,
    ) -> ResultEngine<Profile> {
        let profile = Profile::try_from(self.require_profile(db, profile_id).await?)?;
        if profile.role != Role::Recycler {
            return Err(EngineError::NotRecycler(format!(
                "profile {} has role '{}', not a recycler",
                profile.public_id,
                profile.role.as_str()
            )));
        }
        Ok(profile)
    }

    async fn ensure_email_free(
        &self,
        db: &DatabaseTransaction,
        email: &str,
        except_id: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = profiles::Entity::find().filter(profiles::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(profiles::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }

    async fn unused_public_id(&self, db: &DatabaseTransaction) -> ResultEngine<String> {
        for _ in 0..PUBLIC_ID_ATTEMPTS {
            let candidate = new_public_id();
            let taken = profiles::Entity::find()
                .filter(profiles::Column::PublicId.eq(candidate.as_str()))
                .one(db)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(EngineError::ExistingKey(format!(
            "no free {PUBLIC_ID_LEN}-character member code"
        )))
    }

    /// Create a profile with a fresh id and member code.
    pub async fn create_profile(&self, input: NewProfile) -> ResultEngine<Profile> {
        let email = normalize_email(&input.email)?;
        let full_name = normalize_optional_text(input.full_name.as_deref());
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.ensure_email_free(&db_tx, &email, None).await?;
            let public_id = self.unused_public_id(&db_tx).await?;

            let model = profiles::ActiveModel {
                id: ActiveValue::Set(new_id()),
                role: ActiveValue::Set(input.role.as_str().to_string()),
                public_id: ActiveValue::Set(public_id),
                full_name: ActiveValue::Set(full_name),
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Profile::try_from(model)
        })
    }

    /// Self-registration. The role is always `recycler`.
    pub async fn register_recycler(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ResultEngine<Profile> {
        self.create_profile(NewProfile {
            email: email.to_string(),
            password: Some(password.to_string()),
            full_name: full_name.map(ToString::to_string),
            role: Role::Recycler,
        })
        .await
    }

    pub async fn profile(&self, profile_id: &str) -> ResultEngine<Profile> {
        with_tx!(self, |db_tx| {
            Profile::try_from(self.require_profile(&db_tx, profile_id).await?)
        })
    }

    /// List profiles, newest first, optionally restricted to one role.
    pub async fn list_profiles(&self, role: Option<Role>) -> ResultEngine<Vec<Profile>> {
        let mut query = profiles::Entity::find().order_by_desc(profiles::Column::CreatedAt);
        if let Some(role) = role {
            query = query.filter(profiles::Column::Role.eq(role.as_str()));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Profile::try_from)
            .collect()
    }

    pub async fn update_profile(
        &self,
        profile_id: &str,
        update: ProfileUpdate,
    ) -> ResultEngine<Profile> {
        let email = update.email.as_deref().map(normalize_email).transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_profile(&db_tx, profile_id).await?;
            let mut active: profiles::ActiveModel = model.into();

            if let Some(email) = email {
                self.ensure_email_free(&db_tx, &email, Some(profile_id)).await?;
                active.email = ActiveValue::Set(email);
            }
            if let Some(full_name) = update.full_name.as_deref() {
                active.full_name = ActiveValue::Set(normalize_optional_text(Some(full_name)));
            }
            if let Some(role) = update.role {
                active.role = ActiveValue::Set(role.as_str().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            Profile::try_from(active.update(&db_tx).await?)
        })
    }

    /// Delete a profile and its tokens.
    ///
    /// Profiles referenced by sessions, ledger entries or redemptions are
    /// kept: the ledger is append-only and history must stay resolvable.
    pub async fn delete_profile(&self, profile_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_profile(&db_tx, profile_id).await?;

            let sessions = sessions::Entity::find()
                .filter(
                    sessions::Column::RecyclerId
                        .eq(profile_id)
                        .or(sessions::Column::CollectionCentreId.eq(profile_id)),
                )
                .count(&db_tx)
                .await?;
            let entries = points_ledger::Entity::find()
                .filter(points_ledger::Column::UserId.eq(profile_id))
                .count(&db_tx)
                .await?;
            let redemptions = redemptions::Entity::find()
                .filter(redemptions::Column::UserId.eq(profile_id))
                .count(&db_tx)
                .await?;
            if sessions + entries + redemptions > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "profile {profile_id} has recorded activity"
                )));
            }

            auth_tokens::Entity::delete_many()
                .filter(auth_tokens::Column::ProfileId.eq(profile_id))
                .exec(&db_tx)
                .await?;
            profiles::Entity::delete_by_id(profile_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Resolve a member code typed by centre staff to a recycler profile.
    pub async fn lookup_recycler(&self, member_code: &str) -> ResultEngine<Profile> {
        let code = normalize_member_code(member_code)?;
        let model = profiles::Entity::find()
            .filter(profiles::Column::PublicId.eq(code.as_str()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member code".to_string()))?;
        let profile = Profile::try_from(model)?;
        if profile.role != Role::Recycler {
            return Err(EngineError::NotRecycler(format!(
                "This member code belongs to a user with role '{}', not a recycler.",
                profile.role.as_str()
            )));
        }
        Ok(profile)
    }

    /// Check credentials and issue a new bearer token.
    pub async fn login(&self, email: &str, password: &str) -> ResultEngine<(String, Profile)> {
        let invalid = || EngineError::Unauthorized("invalid email or password".to_string());
        let email = normalize_email(email).map_err(|_| invalid())?;

        with_tx!(self, |db_tx| {
            let model = profiles::Entity::find()
                .filter(profiles::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(invalid)?;
            let verified = model
                .password_hash
                .as_deref()
                .is_some_and(|stored| verify_password(stored, password));
            if !verified {
                return Err(invalid());
            }

            let token = new_token();
            auth_tokens::ActiveModel {
                token_hash: ActiveValue::Set(sha256_hex(&token)),
                profile_id: ActiveValue::Set(model.id.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            Ok((token, Profile::try_from(model)?))
        })
    }

    /// Resolve a bearer token to its profile.
    pub async fn profile_for_token(&self, token: &str) -> ResultEngine<Profile> {
        let unauthorized = || EngineError::Unauthorized("invalid token".to_string());
        let row = auth_tokens::Entity::find_by_id(sha256_hex(token))
            .one(&self.database)
            .await?
            .ok_or_else(unauthorized)?;
        let model = profiles::Entity::find_by_id(row.profile_id)
            .one(&self.database)
            .await?
            .ok_or_else(unauthorized)?;
        Profile::try_from(model)
    }

    /// Revoke a bearer token. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> ResultEngine<()> {
        auth_tokens::Entity::delete_by_id(sha256_hex(token))
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
