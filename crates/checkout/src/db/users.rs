//! User repository.
//!
//! Accounts are owned by the authentication service; checkout only reads the
//! fields that drive pricing, visibility and campaign audiences.

use sqlx::PgPool;
use tierstore_core::{DealerTier, UserId, UserIdentity, UserType};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: UserId,
    user_type: String,
    dealer_tier: Option<String>,
}

impl TryFrom<IdentityRow> for UserIdentity {
    type Error = RepositoryError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let user_type: UserType = row
            .user_type
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let dealer_tier = row
            .dealer_tier
            .map(|t| t.parse::<DealerTier>())
            .transpose()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_type,
            dealer_tier,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the pricing identity of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the role or tier is unknown.
    pub async fn get_identity(&self, id: UserId) -> Result<Option<UserIdentity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, user_type, dealer_tier FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserIdentity::try_from).transpose()
    }

    /// Insert or update a user's role and tier. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// when a dealer has no tier.
    pub async fn upsert(&self, identity: &UserIdentity) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (id, user_type, dealer_tier)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                user_type = EXCLUDED.user_type,
                dealer_tier = EXCLUDED.dealer_tier,
                updated_at = NOW()
            ",
        )
        .bind(identity.id)
        .bind(identity.user_type.as_str())
        .bind(identity.dealer_tier.map(DealerTier::as_str))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Move the id sequence past explicitly inserted ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sync_id_sequence(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('users', 'id'), GREATEST(MAX(id), 1)) FROM users",
        )
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
