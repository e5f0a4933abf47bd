use async_trait::async_trait;
use shared::{Action, ActivitySnapshot, ScoringConfig, UserId};

use crate::db::types::{AchievementRecord, UserRecord};

#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no point value configured for action {0}")]
    UnknownAction(Action),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Read/write access to user records.
#[async_trait]
pub trait UserStore {
    async fn find_user(&self, user_id: UserId) -> anyhow::Result<Option<UserRecord>>;

    /// Atomic in-storage increment; returns the post-increment record.
    async fn increment_points(
        &self,
        user_id: UserId,
        delta: u32,
    ) -> anyhow::Result<Option<UserRecord>>;

    /// No-op unless `level` is higher than the stored one.
    async fn raise_level(&self, user_id: UserId, level: u32) -> anyhow::Result<()>;
}

/// Achievement definitions and their unlock memberships.
#[async_trait]
pub trait AchievementStore {
    /// Definitions the user has not unlocked yet.
    async fn achievements_locked_for(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<AchievementRecord>>;

    /// Idempotent set-add; `false` when the user already held it.
    async fn unlock(&self, achievement_id: i32, user_id: UserId) -> anyhow::Result<bool>;
}

/// Counters the achievement criteria evaluate against.
#[async_trait]
pub trait ActivityCounts {
    async fn news_authored(&self, user_id: UserId) -> anyhow::Result<u64>;
    async fn topics_authored(&self, user_id: UserId) -> anyhow::Result<u64>;
    async fn replies_related_to(&self, user_id: UserId) -> anyhow::Result<u64>;
    async fn events_organized(&self, user_id: UserId) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone)]
pub struct AwardOutcome {
    pub user: UserRecord,
    pub awarded: u32,
    pub unlocked: Vec<AchievementRecord>,
}

/// Awards points for user actions, keeps levels in line with the level
/// table and unlocks achievements whose criteria the user now meets.
pub struct ScoringEngine<S> {
    config: ScoringConfig,
    store: S,
}

impl<S> ScoringEngine<S> {
    pub fn new(config: ScoringConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> ScoringEngine<S>
where
    S: UserStore + AchievementStore + ActivityCounts + Send + Sync,
{
    /// Awards the action's points to the user, raises their level when the
    /// new total crosses a threshold and evaluates achievements against
    /// the post-increment state. Returns `None` for an unknown user.
    pub async fn award(
        &self,
        user_id: UserId,
        action: Action,
    ) -> Result<Option<AwardOutcome>, EngineError> {
        let delta = self
            .config
            .points_for(action)
            .ok_or(EngineError::UnknownAction(action))?;

        let Some(mut user) = self.store.increment_points(user_id, delta).await? else {
            return Ok(None);
        };

        let level = self.config.level_for(user.points.max(0) as u32);
        if level as i32 > user.level {
            self.store.raise_level(user_id, level).await?;
            user.level = level as i32;
        }

        let unlocked = self.evaluate(&user).await?;

        Ok(Some(AwardOutcome {
            user,
            awarded: delta,
            unlocked,
        }))
    }

    /// Evaluates all achievements the user has not unlocked yet and
    /// returns the ones newly unlocked by this call. Safe to call
    /// repeatedly; already-held achievements are never re-granted.
    pub async fn check_achievements(
        &self,
        user_id: UserId,
    ) -> Result<Option<Vec<AchievementRecord>>, EngineError> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.evaluate(&user).await?))
    }

    async fn evaluate(&self, user: &UserRecord) -> Result<Vec<AchievementRecord>, EngineError> {
        let candidates = self.store.achievements_locked_for(user.id).await?;
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let activity = self.snapshot(user).await?;

        let mut unlocked = Vec::new();
        for achievement in candidates {
            let Some(criteria) = achievement.criteria() else {
                tracing::warn!(
                    achievement = achievement.id,
                    kind = %achievement.criteria_type,
                    "skipping achievement with unrecognized criteria kind"
                );
                continue;
            };
            if !criteria.is_met(&activity) {
                continue;
            }
            match self.store.unlock(achievement.id, user.id).await {
                Ok(true) => unlocked.push(achievement),
                // A concurrent evaluation already granted it
                Ok(false) => {}
                // Independent failures must not block the remaining
                // candidates; the achievement stays locked and will be
                // caught up on the next evaluation
                Err(e) => tracing::warn!(
                    achievement = achievement.id,
                    user = user.id,
                    "failed to persist unlock: {e:#}"
                ),
            }
        }
        Ok(unlocked)
    }

    async fn snapshot(&self, user: &UserRecord) -> Result<ActivitySnapshot, EngineError> {
        Ok(ActivitySnapshot {
            points: user.points.max(0) as u32,
            news_authored: self.store.news_authored(user.id).await?,
            topics_authored: self.store.topics_authored(user.id).await?,
            replies_related: self.store.replies_related_to(user.id).await?,
            events_organized: self.store.events_organized(user.id).await?,
        })
    }
}
