use rocket::{
    fairing::{self, AdHoc},
    Build, Rocket,
};
use rocket_db_pools::Database;
use shared::{AchievementCriteria, UserId};
use sqlx::PgPool;

#[derive(Database, Clone, Debug)]
#[database("agora")]
pub struct DB(PgPool);

pub mod types;

use types::{
    AchievementRecord, EventRecord, LeaderboardRecord, NewsRecord, ReplyRecord, Statistics,
    TopicRecord, UserRecord,
};

impl DB {
    pub async fn create_user(
        &self,
        username: &str,
        name: &str,
        email: &str,
        image: Option<&str>,
    ) -> anyhow::Result<Option<UserRecord>> {
        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, name, email, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, name, email, image, role, points, level, created_at
            "#,
        )
        .bind(username)
        .bind(name)
        .bind(email)
        .bind(image)
        .fetch_optional(&self.0)
        .await?)
    }

    pub async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<UserRecord>> {
        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, name, email, image, role, points, level, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.0)
        .await?)
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> anyhow::Result<Option<UserRecord>> {
        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, name, email, image, role, points, level, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.0)
        .await?)
    }

    // The increment happens in storage so concurrent awards can't lose an
    // update; the returned record carries the post-increment total.
    pub async fn increment_user_points(
        &self,
        user_id: UserId,
        delta: u32,
    ) -> anyhow::Result<Option<UserRecord>> {
        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET points = points + $2, updated_at = now()
            WHERE id = $1
            RETURNING id, username, name, email, image, role, points, level, created_at
            "#,
        )
        .bind(user_id)
        .bind(delta as i32)
        .fetch_optional(&self.0)
        .await?)
    }

    // Guarded so a stale caller can never lower a level.
    pub async fn raise_user_level(&self, user_id: UserId, level: u32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET level = $2, updated_at = now()
            WHERE id = $1 AND level < $2
            "#,
        )
        .bind(user_id)
        .bind(level as i32)
        .execute(&self.0)
        .await?;
        Ok(())
    }

    pub async fn get_leaderboard(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<LeaderboardRecord>, i64)> {
        let records = sqlx::query_as::<_, LeaderboardRecord>(
            r#"
            SELECT id, username, name, points, level,
                   RANK() OVER (ORDER BY points DESC) AS place
            FROM users
            ORDER BY points DESC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(page * limit)
        .fetch_all(&self.0)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.0)
            .await?;

        Ok((records, total))
    }

    pub async fn create_achievement(
        &self,
        name: &str,
        description: &str,
        image: Option<&str>,
        criteria: AchievementCriteria,
        points: u32,
    ) -> anyhow::Result<AchievementRecord> {
        Ok(sqlx::query_as::<_, AchievementRecord>(
            r#"
            INSERT INTO achievements (name, description, image, criteria_type, criteria_value, points)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, image, criteria_type, criteria_value, points
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(image)
        .bind(criteria.kind())
        .bind(criteria.threshold() as i32)
        .bind(points as i32)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn list_achievements(&self) -> anyhow::Result<Vec<AchievementRecord>> {
        Ok(sqlx::query_as::<_, AchievementRecord>(
            r#"
            SELECT id, name, description, image, criteria_type, criteria_value, points
            FROM achievements
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.0)
        .await?)
    }

    pub async fn achievements_locked_for(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<AchievementRecord>> {
        Ok(sqlx::query_as::<_, AchievementRecord>(
            r#"
            SELECT a.id, a.name, a.description, a.image, a.criteria_type, a.criteria_value, a.points
            FROM achievements a
            WHERE NOT EXISTS (
                SELECT 1 FROM achievement_unlocks u
                WHERE u.achievement_id = a.id AND u.user_id = $1
            )
            ORDER BY a.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.0)
        .await?)
    }

    pub async fn achievements_unlocked_by(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<AchievementRecord>> {
        Ok(sqlx::query_as::<_, AchievementRecord>(
            r#"
            SELECT a.id, a.name, a.description, a.image, a.criteria_type, a.criteria_value, a.points
            FROM achievements a
            JOIN achievement_unlocks u ON u.achievement_id = a.id
            WHERE u.user_id = $1
            ORDER BY u.unlocked_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.0)
        .await?)
    }

    // Set-add semantics: the second of two racing unlocks hits the
    // primary key conflict and reports `false`.
    pub async fn unlock_achievement(
        &self,
        achievement_id: i32,
        user_id: UserId,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO achievement_unlocks (achievement_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(achievement_id)
        .bind(user_id)
        .execute(&self.0)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count_news_by_author(&self, user_id: UserId) -> anyhow::Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news WHERE author_id = $1")
                .bind(user_id)
                .fetch_one(&self.0)
                .await?,
        )
    }

    pub async fn count_topics_by_author(&self, user_id: UserId) -> anyhow::Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM topics WHERE author_id = $1")
                .bind(user_id)
                .fetch_one(&self.0)
                .await?,
        )
    }

    /// Replies sitting under topics the user authored.
    pub async fn count_replies_related_to(&self, user_id: UserId) -> anyhow::Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM replies r
            JOIN topics t ON t.id = r.topic_id
            WHERE t.author_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn count_events_by_organizer(&self, user_id: UserId) -> anyhow::Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE organizer_id = $1")
                .bind(user_id)
                .fetch_one(&self.0)
                .await?,
        )
    }

    pub async fn insert_news(
        &self,
        title: &str,
        slug: &str,
        summary: Option<&str>,
        content: &str,
        author_id: UserId,
        published: bool,
    ) -> anyhow::Result<Option<NewsRecord>> {
        Ok(sqlx::query_as::<_, NewsRecord>(
            r#"
            INSERT INTO news (title, slug, summary, content, author_id, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id, title, slug, summary, content, author_id, published, created_at
            "#,
        )
        .bind(title)
        .bind(slug)
        .bind(summary)
        .bind(content)
        .bind(author_id)
        .bind(published)
        .fetch_optional(&self.0)
        .await?)
    }

    pub async fn list_news(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<NewsRecord>, i64)> {
        let records = sqlx::query_as::<_, NewsRecord>(
            r#"
            SELECT id, title, slug, summary, content, author_id, published, created_at
            FROM news
            WHERE published
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(page * limit)
        .fetch_all(&self.0)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news WHERE published")
            .fetch_one(&self.0)
            .await?;

        Ok((records, total))
    }

    pub async fn insert_topic(
        &self,
        title: &str,
        content: &str,
        author_id: UserId,
    ) -> anyhow::Result<TopicRecord> {
        Ok(sqlx::query_as::<_, TopicRecord>(
            r#"
            INSERT INTO topics (title, content, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, author_id, CAST(0 AS BIGINT) AS replies, created_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn get_topic(&self, topic_id: i32) -> anyhow::Result<Option<TopicRecord>> {
        Ok(sqlx::query_as::<_, TopicRecord>(
            r#"
            SELECT t.id, t.title, t.content, t.author_id,
                   (SELECT COUNT(*) FROM replies r WHERE r.topic_id = t.id) AS replies,
                   t.created_at
            FROM topics t
            WHERE t.id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_optional(&self.0)
        .await?)
    }

    pub async fn list_topics(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<TopicRecord>, i64)> {
        let records = sqlx::query_as::<_, TopicRecord>(
            r#"
            SELECT t.id, t.title, t.content, t.author_id,
                   (SELECT COUNT(*) FROM replies r WHERE r.topic_id = t.id) AS replies,
                   t.created_at
            FROM topics t
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(page * limit)
        .fetch_all(&self.0)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.0)
            .await?;

        Ok((records, total))
    }

    pub async fn insert_reply(
        &self,
        topic_id: i32,
        author_id: UserId,
        content: &str,
    ) -> anyhow::Result<ReplyRecord> {
        Ok(sqlx::query_as::<_, ReplyRecord>(
            r#"
            INSERT INTO replies (topic_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, topic_id, author_id, content, created_at
            "#,
        )
        .bind(topic_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn list_replies(&self, topic_id: i32) -> anyhow::Result<Vec<ReplyRecord>> {
        Ok(sqlx::query_as::<_, ReplyRecord>(
            r#"
            SELECT id, topic_id, author_id, content, created_at
            FROM replies
            WHERE topic_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.0)
        .await?)
    }

    pub async fn insert_event(
        &self,
        title: &str,
        description: &str,
        location: Option<&str>,
        starts_at: chrono::NaiveDateTime,
        organizer_id: UserId,
    ) -> anyhow::Result<EventRecord> {
        Ok(sqlx::query_as::<_, EventRecord>(
            r#"
            INSERT INTO events (title, description, location, starts_at, organizer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, location, starts_at, organizer_id, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(starts_at)
        .bind(organizer_id)
        .fetch_one(&self.0)
        .await?)
    }

    pub async fn list_events(
        &self,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<EventRecord>, i64)> {
        let records = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT id, title, description, location, starts_at, organizer_id, created_at
            FROM events
            ORDER BY starts_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(page * limit)
        .fetch_all(&self.0)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
            .fetch_one(&self.0)
            .await?;

        Ok((records, total))
    }

    pub async fn statistics(&self) -> anyhow::Result<Statistics> {
        Ok(sqlx::query_as::<_, Statistics>(
            r#"
            SELECT (SELECT COUNT(*) FROM users) AS users,
                   (SELECT COUNT(*) FROM news) AS news,
                   (SELECT COUNT(*) FROM topics) AS topics,
                   (SELECT COUNT(*) FROM replies) AS replies,
                   (SELECT COUNT(*) FROM events) AS events,
                   (SELECT COUNT(*) FROM achievement_unlocks) AS unlocked_achievements
            "#,
        )
        .fetch_one(&self.0)
        .await?)
    }
}

#[async_trait::async_trait]
impl crate::engine::UserStore for DB {
    async fn find_user(&self, user_id: UserId) -> anyhow::Result<Option<UserRecord>> {
        self.get_user(user_id).await
    }

    async fn increment_points(
        &self,
        user_id: UserId,
        delta: u32,
    ) -> anyhow::Result<Option<UserRecord>> {
        self.increment_user_points(user_id, delta).await
    }

    async fn raise_level(&self, user_id: UserId, level: u32) -> anyhow::Result<()> {
        self.raise_user_level(user_id, level).await
    }
}

#[async_trait::async_trait]
impl crate::engine::AchievementStore for DB {
    async fn achievements_locked_for(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<AchievementRecord>> {
        DB::achievements_locked_for(self, user_id).await
    }

    async fn unlock(&self, achievement_id: i32, user_id: UserId) -> anyhow::Result<bool> {
        self.unlock_achievement(achievement_id, user_id).await
    }
}

#[async_trait::async_trait]
impl crate::engine::ActivityCounts for DB {
    async fn news_authored(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.count_news_by_author(user_id).await?.max(0) as u64)
    }

    async fn topics_authored(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.count_topics_by_author(user_id).await?.max(0) as u64)
    }

    async fn replies_related_to(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.count_replies_related_to(user_id).await?.max(0) as u64)
    }

    async fn events_organized(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.count_events_by_organizer(user_id).await?.max(0) as u64)
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                rocket::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
    })
}
