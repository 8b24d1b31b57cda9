//! Campaign repository: definitions and redemption counting.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tierstore_core::campaign::{Campaign, CampaignRule, TargetAudience, UsageLimit};
use tierstore_core::{CampaignId, UserId};

use super::{RepositoryError, to_i32, to_u32};
use crate::store::UsageOutcome;

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: CampaignId,
    name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
    target_audience: Json<TargetAudience>,
    usage_limit_total: Option<i32>,
    usage_limit_per_user: Option<i32>,
    current_usage: i32,
    rule: Json<CampaignRule>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = RepositoryError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            target_audience: row.target_audience.0,
            usage_limit: UsageLimit {
                total_usage: row
                    .usage_limit_total
                    .map(|v| to_u32(v, "usage_limit_total"))
                    .transpose()?,
                per_user: row
                    .usage_limit_per_user
                    .map(|v| to_u32(v, "usage_limit_per_user"))
                    .transpose()?,
                current_usage: to_u32(row.current_usage, "current_usage")?,
            },
            rule: row.rule.0,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LimitRow {
    usage_limit_total: Option<i32>,
    usage_limit_per_user: Option<i32>,
    current_usage: i32,
}

/// Repository for campaign database operations.
pub struct CampaignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CampaignRepository<'a> {
    /// Create a new campaign repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a campaign by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or a JSON
    /// column does not match the campaign schema.
    pub async fn get_by_id(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let row = sqlx::query_as::<_, CampaignRow>(
            r"
            SELECT id, name, start_date, end_date, is_active, target_audience,
                   usage_limit_total, usage_limit_per_user, current_usage, rule
            FROM campaigns
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Campaign::try_from).transpose()
    }

    /// Record one redemption if both usage limits allow it.
    ///
    /// Locks the campaign row for the duration of the check so concurrent
    /// orders cannot overshoot either limit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the campaign does not exist.
    pub async fn record_usage(
        &self,
        id: CampaignId,
        user: UserId,
    ) -> Result<UsageOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let limits = sqlx::query_as::<_, LimitRow>(
            r"
            SELECT usage_limit_total, usage_limit_per_user, current_usage
            FROM campaigns
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if limits
            .usage_limit_total
            .is_some_and(|total| limits.current_usage >= total)
        {
            return Ok(UsageOutcome::TotalExhausted);
        }

        if let Some(per_user) = limits.usage_limit_per_user {
            let (used,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM campaign_usages WHERE campaign_id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(user)
            .fetch_one(&mut *tx)
            .await?;
            if used >= i64::from(per_user) {
                return Ok(UsageOutcome::PerUserExhausted);
            }
        }

        sqlx::query("UPDATE campaigns SET current_usage = current_usage + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO campaign_usages (campaign_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(UsageOutcome::Recorded)
    }

    /// Undo the most recent redemption by `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statements fail.
    pub async fn release_usage(&self, id: CampaignId, user: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r"
            DELETE FROM campaign_usages
            WHERE id = (
                SELECT id FROM campaign_usages
                WHERE campaign_id = $1 AND user_id = $2
                ORDER BY used_at DESC
                LIMIT 1
            )
            ",
        )
        .bind(id)
        .bind(user)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 1 {
            sqlx::query(
                "UPDATE campaigns SET current_usage = GREATEST(current_usage - 1, 0) WHERE id = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert or replace a campaign by ID. The redemption counter of an
    /// existing campaign is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(&self, campaign: &Campaign) -> Result<(), RepositoryError> {
        let limit = campaign.usage_limit;
        sqlx::query(
            r"
            INSERT INTO campaigns (
                id, name, campaign_type, start_date, end_date, is_active,
                target_audience, usage_limit_total, usage_limit_per_user,
                current_usage, rule
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                campaign_type = EXCLUDED.campaign_type,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                is_active = EXCLUDED.is_active,
                target_audience = EXCLUDED.target_audience,
                usage_limit_total = EXCLUDED.usage_limit_total,
                usage_limit_per_user = EXCLUDED.usage_limit_per_user,
                rule = EXCLUDED.rule,
                updated_at = NOW()
            ",
        )
        .bind(campaign.id)
        .bind(&campaign.name)
        .bind(campaign.campaign_type().as_str())
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.is_active)
        .bind(Json(&campaign.target_audience))
        .bind(limit.total_usage.map(|v| to_i32(v, "totalUsage")).transpose()?)
        .bind(limit.per_user.map(|v| to_i32(v, "perUser")).transpose()?)
        .bind(to_i32(limit.current_usage, "currentUsage")?)
        .bind(Json(&campaign.rule))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Move the ID sequence past explicitly inserted IDs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sync_id_sequence(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('campaigns', 'id'), GREATEST(MAX(id), 1)) FROM campaigns",
        )
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
