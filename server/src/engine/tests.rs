use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use shared::{AchievementCriteria, LevelTable, ScoringConfig};

use super::*;

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    news: u64,
    topics: u64,
    replies: u64,
    events: u64,
}

#[derive(Default)]
struct MemoryStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
    achievements: Vec<AchievementRecord>,
    unlocks: Mutex<HashSet<(i32, UserId)>>,
    counts: Mutex<HashMap<UserId, Counts>>,
    // Unlocks for these achievement ids fail with a storage error
    broken_unlocks: HashSet<i32>,
}

impl MemoryStore {
    fn with_user(self, user_id: UserId) -> Self {
        self.users.lock().unwrap().insert(user_id, user(user_id));
        self
    }

    fn with_achievement(mut self, id: i32, criteria: AchievementCriteria) -> Self {
        self.achievements.push(achievement(id, criteria));
        self
    }

    fn with_broken_unlock(mut self, achievement_id: i32) -> Self {
        self.broken_unlocks.insert(achievement_id);
        self
    }

    fn set_counts(&self, user_id: UserId, counts: Counts) {
        self.counts.lock().unwrap().insert(user_id, counts);
    }

    fn points_of(&self, user_id: UserId) -> i32 {
        self.users.lock().unwrap()[&user_id].points
    }

    fn counts_of(&self, user_id: UserId) -> Counts {
        self.counts
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }
}

fn user(id: UserId) -> UserRecord {
    UserRecord {
        id,
        username: format!("user-{id}"),
        name: format!("User {id}"),
        email: format!("user-{id}@agora.community"),
        image: None,
        role: "user".to_string(),
        points: 0,
        level: 1,
        created_at: NaiveDateTime::default(),
    }
}

fn achievement(id: i32, criteria: AchievementCriteria) -> AchievementRecord {
    AchievementRecord {
        id,
        name: format!("achievement-{id}"),
        description: format!("Achievement {id}"),
        image: None,
        criteria_type: criteria.kind().to_string(),
        criteria_value: criteria.threshold() as i32,
        points: 0,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: UserId) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn increment_points(
        &self,
        user_id: UserId,
        delta: u32,
    ) -> anyhow::Result<Option<UserRecord>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&user_id).map(|user| {
            user.points += delta as i32;
            user.clone()
        }))
    }

    async fn raise_level(&self, user_id: UserId, level: u32) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            if user.level < level as i32 {
                user.level = level as i32;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AchievementStore for MemoryStore {
    async fn achievements_locked_for(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<AchievementRecord>> {
        let unlocks = self.unlocks.lock().unwrap();
        Ok(self
            .achievements
            .iter()
            .filter(|a| !unlocks.contains(&(a.id, user_id)))
            .cloned()
            .collect())
    }

    async fn unlock(&self, achievement_id: i32, user_id: UserId) -> anyhow::Result<bool> {
        if self.broken_unlocks.contains(&achievement_id) {
            anyhow::bail!("storage unavailable");
        }
        Ok(self.unlocks.lock().unwrap().insert((achievement_id, user_id)))
    }
}

#[async_trait]
impl ActivityCounts for MemoryStore {
    async fn news_authored(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.counts_of(user_id).news)
    }

    async fn topics_authored(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.counts_of(user_id).topics)
    }

    async fn replies_related_to(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.counts_of(user_id).replies)
    }

    async fn events_organized(&self, user_id: UserId) -> anyhow::Result<u64> {
        Ok(self.counts_of(user_id).events)
    }
}

fn engine(store: MemoryStore) -> ScoringEngine<MemoryStore> {
    ScoringEngine::new(ScoringConfig::default(), store)
}

#[tokio::test]
async fn award_applies_configured_point_value() {
    let engine = engine(MemoryStore::default().with_user(1));

    let outcome = engine.award(1, Action::CreateNews).await.unwrap().unwrap();

    assert_eq!(outcome.awarded, 10);
    assert_eq!(outcome.user.points, 10);
    assert_eq!(engine.store().points_of(1), 10);
}

#[tokio::test]
async fn levels_follow_the_threshold_table() {
    let engine = engine(MemoryStore::default().with_user(1));

    for _ in 0..10 {
        let outcome = engine.award(1, Action::CreateTopic).await.unwrap().unwrap();
        assert_eq!(outcome.user.level, 1);
    }
    assert_eq!(engine.store().points_of(1), 50);

    // Ten more topic awards cross the 100-point threshold on the last call
    for _ in 0..9 {
        engine.award(1, Action::CreateTopic).await.unwrap();
    }
    let outcome = engine.award(1, Action::CreateTopic).await.unwrap().unwrap();
    assert_eq!(outcome.user.points, 100);
    assert_eq!(outcome.user.level, 2);
}

#[tokio::test]
async fn unknown_action_fails_before_touching_storage() {
    let config = ScoringConfig::new(BTreeMap::new(), LevelTable::default());
    let engine = ScoringEngine::new(config, MemoryStore::default().with_user(1));

    let err = engine.award(1, Action::ReplyTopic).await.unwrap_err();

    assert!(matches!(err, EngineError::UnknownAction(Action::ReplyTopic)));
    assert_eq!(engine.store().points_of(1), 0);
}

#[tokio::test]
async fn missing_user_yields_none() {
    let engine = engine(MemoryStore::default());

    assert!(engine.award(7, Action::CreateNews).await.unwrap().is_none());
    assert!(engine.check_achievements(7).await.unwrap().is_none());
}

#[tokio::test]
async fn level_is_never_lowered() {
    let store = MemoryStore::default().with_user(1);
    store.users.lock().unwrap().get_mut(&1).unwrap().level = 3;
    let engine = engine(store);

    // 5 points maps to level 1, well below the stored level
    let outcome = engine.award(1, Action::CreateTopic).await.unwrap().unwrap();

    assert_eq!(outcome.user.level, 3);
}

#[tokio::test]
async fn points_criterion_sees_the_post_increment_total() {
    let engine = engine(
        MemoryStore::default()
            .with_user(1)
            .with_achievement(10, AchievementCriteria::Points(10)),
    );

    let outcome = engine.award(1, Action::CreateNews).await.unwrap().unwrap();

    assert_eq!(outcome.unlocked.len(), 1);
    assert_eq!(outcome.unlocked[0].id, 10);

    // A second evaluation does not re-grant it
    let again = engine.check_achievements(1).await.unwrap().unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn count_criterion_unlocks_exactly_at_threshold() {
    let engine = engine(
        MemoryStore::default()
            .with_user(1)
            .with_achievement(20, AchievementCriteria::News(3)),
    );

    engine.store().set_counts(
        1,
        Counts {
            news: 2,
            ..Counts::default()
        },
    );
    assert!(engine.check_achievements(1).await.unwrap().unwrap().is_empty());

    engine.store().set_counts(
        1,
        Counts {
            news: 3,
            ..Counts::default()
        },
    );
    let unlocked = engine.check_achievements(1).await.unwrap().unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].id, 20);
    assert_eq!(engine.store().counts_of(1).news, 3);
}

#[tokio::test]
async fn concurrent_awards_do_not_lose_updates() {
    let engine = Arc::new(engine(MemoryStore::default().with_user(1)));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.award(1, Action::ReplyTopic).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.store().points_of(1), 20);
}

#[tokio::test]
async fn concurrent_evaluations_grant_a_single_membership() {
    let engine = Arc::new(engine(
        MemoryStore::default()
            .with_user(1)
            .with_achievement(30, AchievementCriteria::Points(0)),
    ));

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.check_achievements(1).await })
    };
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.check_achievements(1).await })
    };
    let first = first.await.unwrap().unwrap().unwrap();
    let second = second.await.unwrap().unwrap().unwrap();

    assert_eq!(first.len() + second.len(), 1);
    assert_eq!(engine.store().unlocks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_unlock_does_not_block_the_rest() {
    let engine = engine(
        MemoryStore::default()
            .with_user(1)
            .with_achievement(1, AchievementCriteria::Points(5))
            .with_achievement(2, AchievementCriteria::Points(5))
            .with_broken_unlock(1),
    );
    engine.store().users.lock().unwrap().get_mut(&1).unwrap().points = 10;

    let unlocked = engine.check_achievements(1).await.unwrap().unwrap();

    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].id, 2);
    // The failed one stays locked and is retried on the next evaluation
    let candidates = engine.store().achievements_locked_for(1).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, 1);
}

#[tokio::test]
async fn unrecognized_criteria_kinds_are_skipped() {
    let mut store = MemoryStore::default().with_user(1);
    store.achievements.push(AchievementRecord {
        criteria_type: "streak".to_string(),
        ..achievement(40, AchievementCriteria::Points(0))
    });
    let engine = engine(store);

    let unlocked = engine.check_achievements(1).await.unwrap().unwrap();

    assert!(unlocked.is_empty());
}
