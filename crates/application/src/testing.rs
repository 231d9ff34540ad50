//! 测试替身。
//!
//! 内存版仓储（模拟外键约束与唯一约束）、快照式内存事务、记录型邮件发送器、
//! 内存对象存储、可调时钟，以及把它们组装成 [`Services`] 的 [`TestApp`]。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use domain::{
    ActivationKey, Comment, CommentId, CommentRepository, Follow, FollowId, FollowRepository,
    Like, LikeId, LikeRepository, NewComment, NewFollow, NewLike, NewNotification,
    NewPosting, NewPostingReport, NewUser, NewUserReport, Notification, NotificationId,
    NotificationRepository, PasswordHash, PasswordReset, PasswordResetRepository,
    PasswordResetUpsert, Posting, PostingId, PostingQuery, PostingReport, PostingRepository,
    ReportId, ReportRepository, RepositoryError, RepositoryResult, SelfIntroduction, Timestamp,
    User, UserCounter, UserCounters, UserEmail, UserId, UserName, UserReport, UserRepository,
};

use crate::{
    clock::Clock,
    identity::Actor,
    mail::{MailError, MailMessage, Mailer},
    notifier::StoredNotifications,
    password::{PasswordHasher, PasswordHasherError},
    services::{
        ActivateUserRequest, RegisterPostingRequest, RegisterUserRequest, ServiceDependencies,
        ServiceSettings, Services,
    },
    storage::{ObjectStorage, StorageError, StoredObject},
    token::{TokenError, TokenService},
    transaction::{TransactionManager, UnitOfWork},
};

pub const TEST_PASSWORD: &str = "Password1234";

fn foreign_key(message: &str) -> RepositoryError {
    RepositoryError::storage(format!("foreign key violation: {message}"))
}

/// 全部表的内存快照。
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: BTreeMap<i64, User>,
    pub postings: BTreeMap<i64, Posting>,
    pub likes: BTreeMap<i64, Like>,
    pub comments: BTreeMap<i64, Comment>,
    pub follows: BTreeMap<i64, Follow>,
    pub notifications: BTreeMap<i64, Notification>,
    pub password_resets: HashMap<i64, PasswordReset>,
    pub user_reports: BTreeMap<i64, UserReport>,
    pub posting_reports: BTreeMap<i64, PostingReport>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> RepositoryResult<&User> {
        self.users.get(&id.0).ok_or(RepositoryError::NotFound)
    }

    fn user_mut(&mut self, id: UserId) -> RepositoryResult<&mut User> {
        self.users.get_mut(&id.0).ok_or(RepositoryError::NotFound)
    }

    fn posting_owner(&self, posting_id: PostingId) -> Option<UserId> {
        self.postings.get(&posting_id.0).map(|posting| posting.user_id)
    }

    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.users.values().find(|user| user.name.as_str() == name)
    }

    fn bump_user(&mut self, id: UserId, counter: UserCounter, delta: i64) {
        if let Some(user) = self.users.get_mut(&id.0) {
            user.counters.add(counter, delta);
        }
    }

    fn ensure_posting_unreferenced(&self, posting_id: PostingId) -> RepositoryResult<()> {
        if self.likes.values().any(|like| like.posting_id == posting_id)
            || self.comments.values().any(|c| c.posting_id == posting_id)
            || self.posting_reports.values().any(|r| r.posting_id == posting_id)
        {
            return Err(foreign_key("posting is still referenced"));
        }
        Ok(())
    }

    fn ensure_user_unreferenced(&self, user_id: UserId) -> RepositoryResult<()> {
        let referenced = self.postings.values().any(|p| p.user_id == user_id)
            || self.likes.values().any(|l| l.user_id == user_id)
            || self.comments.values().any(|c| c.user_id == user_id)
            || self
                .follows
                .values()
                .any(|f| f.following_user_id == user_id || f.followed_user_id == user_id)
            || self
                .notifications
                .values()
                .any(|n| n.visitor_user_id == user_id || n.visited_user_id == user_id)
            || self.password_resets.contains_key(&user_id.0)
            || self.user_reports.values().any(|r| r.user_id == user_id);
        if referenced {
            return Err(foreign_key("user is still referenced"));
        }
        Ok(())
    }
}

fn remove_where<V>(map: &mut BTreeMap<i64, V>, predicate: impl Fn(&V) -> bool) -> u64 {
    let before = map.len();
    map.retain(|_, value| !predicate(value));
    (before - map.len()) as u64
}

/// 实现全部仓储接口的内存存储。
#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepositories {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryRepositories {
    async fn create(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut state = self.lock();
        let duplicate = state
            .users
            .values()
            .any(|u| u.name == user.name || u.email == user.email);
        if duplicate {
            return Err(RepositoryError::Duplicate);
        }
        let id = state.next_id();
        let stored = User {
            id: UserId(id),
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            icon: String::new(),
            self_introduction: String::new(),
            counters: UserCounters::default(),
            activation_key: user.activation_key,
            email_verified: false,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: UserId) -> RepositoryResult<User> {
        self.lock().user(id).cloned()
    }

    async fn get_by_name(&self, name: &UserName) -> RepositoryResult<User> {
        self.lock()
            .users
            .values()
            .find(|user| &user.name == name)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &UserEmail) -> RepositoryResult<User> {
        self.lock()
            .users
            .values()
            .find(|user| &user.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn activate(
        &self,
        name: &UserName,
        key: &ActivationKey,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let mut state = self.lock();
        let user = state
            .users
            .values_mut()
            .find(|user| &user.name == name && &user.activation_key == key && !user.email_verified)
            .ok_or(RepositoryError::NotFound)?;
        user.email_verified = true;
        user.updated_at = now;
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        password: &PasswordHash,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let mut state = self.lock();
        let user = state.user_mut(id)?;
        user.password = password.clone();
        user.updated_at = now;
        Ok(())
    }

    async fn update_icon(&self, id: UserId, icon_url: &str, now: Timestamp) -> RepositoryResult<()> {
        let mut state = self.lock();
        let user = state.user_mut(id)?;
        user.icon = icon_url.to_owned();
        user.updated_at = now;
        Ok(())
    }

    async fn update_self_introduction(
        &self,
        id: UserId,
        self_introduction: &SelfIntroduction,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let mut state = self.lock();
        let user = state.user_mut(id)?;
        user.self_introduction = self_introduction.as_str().to_owned();
        user.updated_at = now;
        Ok(())
    }

    async fn adjust_counter(
        &self,
        id: UserId,
        counter: UserCounter,
        delta: i64,
    ) -> RepositoryResult<()> {
        let mut state = self.lock();
        state.user_mut(id)?.counters.add(counter, delta);
        Ok(())
    }

    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let owners: Vec<UserId> = state
            .likes
            .values()
            .filter(|like| like.user_id == liker)
            .filter_map(|like| state.posting_owner(like.posting_id))
            .collect();
        for owner in &owners {
            state.bump_user(*owner, UserCounter::Liked, -1);
        }
        Ok(owners.len() as u64)
    }

    async fn decrement_like_counts_for_likes_on_postings_of(
        &self,
        owner: UserId,
    ) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let likers: Vec<UserId> = state
            .likes
            .values()
            .filter(|like| state.posting_owner(like.posting_id) == Some(owner))
            .map(|like| like.user_id)
            .collect();
        for liker in &likers {
            state.bump_user(*liker, UserCounter::Likes, -1);
        }
        Ok(likers.len() as u64)
    }

    async fn decrement_like_counts_for_likes_on_posting(
        &self,
        posting_id: PostingId,
    ) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let likers: Vec<UserId> = state
            .likes
            .values()
            .filter(|like| like.posting_id == posting_id)
            .map(|like| like.user_id)
            .collect();
        for liker in &likers {
            state.bump_user(*liker, UserCounter::Likes, -1);
        }
        Ok(likers.len() as u64)
    }

    async fn decrement_follow_counts_for(&self, user_id: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let relations: Vec<(UserId, UserId)> = state
            .follows
            .values()
            .map(|f| (f.following_user_id, f.followed_user_id))
            .filter(|(following, followed)| *following == user_id || *followed == user_id)
            .collect();
        for (following, followed) in &relations {
            if *following == user_id {
                state.bump_user(*followed, UserCounter::Followed, -1);
            } else {
                state.bump_user(*following, UserCounter::Follows, -1);
            }
        }
        Ok(relations.len() as u64)
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        if !state.users.contains_key(&id.0) {
            return Ok(0);
        }
        state.ensure_user_unreferenced(id)?;
        state.users.remove(&id.0);
        Ok(1)
    }
}

#[async_trait]
impl PostingRepository for MemoryRepositories {
    async fn create(&self, posting: &NewPosting) -> RepositoryResult<Posting> {
        let mut state = self.lock();
        let user_name = state
            .user(posting.user_id)
            .map_err(|_| foreign_key("postings.user_id"))?
            .name
            .clone();
        let id = state.next_id();
        let stored = Posting {
            id: PostingId(id),
            user_id: posting.user_id,
            user_name,
            title: posting.title.clone(),
            image_url: posting.image_url.clone(),
            image_key: posting.image_key.clone(),
            liked_count: 0,
            deleting_at: None,
            created_at: posting.created_at,
            updated_at: posting.created_at,
        };
        state.postings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: PostingId) -> RepositoryResult<Posting> {
        self.lock()
            .postings
            .get(&id.0)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self, query: &PostingQuery) -> RepositoryResult<Vec<Posting>> {
        let state = self.lock();
        let mut postings: Vec<Posting> = state
            .postings
            .values()
            .filter(|p| p.deleting_at.is_none() && p.created_at < query.since)
            .filter(|p| query.user_id.map_or(true, |owner| p.user_id == owner))
            .cloned()
            .collect();
        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        postings.truncate(query.limit as usize);
        Ok(postings)
    }

    async fn list_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Posting>> {
        Ok(self
            .lock()
            .postings
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn adjust_liked_count(&self, id: PostingId, delta: i64) -> RepositoryResult<()> {
        let mut state = self.lock();
        let posting = state
            .postings
            .get_mut(&id.0)
            .ok_or(RepositoryError::NotFound)?;
        posting.liked_count += delta;
        Ok(())
    }

    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let postings: Vec<PostingId> = state
            .likes
            .values()
            .filter(|like| like.user_id == liker)
            .map(|like| like.posting_id)
            .collect();
        for posting_id in &postings {
            if let Some(posting) = state.postings.get_mut(&posting_id.0) {
                posting.liked_count -= 1;
            }
        }
        Ok(postings.len() as u64)
    }

    async fn mark_deleting(&self, id: PostingId, at: Timestamp) -> RepositoryResult<u64> {
        let mut state = self.lock();
        match state.postings.get_mut(&id.0) {
            Some(posting) => {
                posting.deleting_at = Some(at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: PostingId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        if !state.postings.contains_key(&id.0) {
            return Ok(0);
        }
        state.ensure_posting_unreferenced(id)?;
        state.postings.remove(&id.0);
        Ok(1)
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let ids: Vec<PostingId> = state
            .postings
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect();
        for id in &ids {
            state.ensure_posting_unreferenced(*id)?;
        }
        Ok(remove_where(&mut state.postings, |p| p.user_id == user_id))
    }
}

#[async_trait]
impl LikeRepository for MemoryRepositories {
    async fn create(&self, like: &NewLike) -> RepositoryResult<Like> {
        let mut state = self.lock();
        state.user(like.user_id).map_err(|_| foreign_key("likes.user_id"))?;
        if !state.postings.contains_key(&like.posting_id.0) {
            return Err(foreign_key("likes.posting_id"));
        }
        if state
            .likes
            .values()
            .any(|l| l.user_id == like.user_id && l.posting_id == like.posting_id)
        {
            return Err(RepositoryError::Duplicate);
        }
        let id = state.next_id();
        let stored = Like {
            id: LikeId(id),
            user_id: like.user_id,
            posting_id: like.posting_id,
            created_at: like.created_at,
        };
        state.likes.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<Like> {
        self.lock()
            .likes
            .values()
            .find(|l| l.user_id == user_id && l.posting_id == posting_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn liked_posting_ids(
        &self,
        user_id: UserId,
        candidates: &[PostingId],
    ) -> RepositoryResult<Vec<PostingId>> {
        Ok(self
            .lock()
            .likes
            .values()
            .filter(|l| l.user_id == user_id && candidates.contains(&l.posting_id))
            .map(|l| l.posting_id)
            .collect())
    }

    async fn delete(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().likes, |l| {
            l.user_id == user_id && l.posting_id == posting_id
        }))
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().likes, |l| l.user_id == user_id))
    }

    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let owned: Vec<PostingId> = state
            .postings
            .values()
            .filter(|p| p.user_id == owner)
            .map(|p| p.id)
            .collect();
        Ok(remove_where(&mut state.likes, |l| owned.contains(&l.posting_id)))
    }

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().likes, |l| l.posting_id == posting_id))
    }
}

#[async_trait]
impl CommentRepository for MemoryRepositories {
    async fn create(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        let mut state = self.lock();
        let user_name = state
            .user(comment.user_id)
            .map_err(|_| foreign_key("comments.user_id"))?
            .name
            .clone();
        if !state.postings.contains_key(&comment.posting_id.0) {
            return Err(foreign_key("comments.posting_id"));
        }
        let id = state.next_id();
        let stored = Comment {
            id: CommentId(id),
            user_id: comment.user_id,
            user_name,
            posting_id: comment.posting_id,
            body: comment.body.clone(),
            created_at: comment.created_at,
        };
        state.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: CommentId) -> RepositoryResult<Comment> {
        self.lock()
            .comments
            .get(&id.0)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_by_posting(&self, posting_id: PostingId) -> RepositoryResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .lock()
            .comments
            .values()
            .filter(|c| c.posting_id == posting_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn delete(&self, id: CommentId) -> RepositoryResult<u64> {
        Ok(self.lock().comments.remove(&id.0).map_or(0, |_| 1))
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().comments, |c| c.user_id == user_id))
    }

    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let owned: Vec<PostingId> = state
            .postings
            .values()
            .filter(|p| p.user_id == owner)
            .map(|p| p.id)
            .collect();
        Ok(remove_where(&mut state.comments, |c| owned.contains(&c.posting_id)))
    }

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().comments, |c| c.posting_id == posting_id))
    }
}

#[async_trait]
impl FollowRepository for MemoryRepositories {
    async fn create(&self, follow: &NewFollow) -> RepositoryResult<Follow> {
        let mut state = self.lock();
        state
            .user(follow.following_user_id)
            .map_err(|_| foreign_key("follows.following_user_id"))?;
        state
            .user(follow.followed_user_id)
            .map_err(|_| foreign_key("follows.followed_user_id"))?;
        if state.follows.values().any(|f| {
            f.following_user_id == follow.following_user_id
                && f.followed_user_id == follow.followed_user_id
        }) {
            return Err(RepositoryError::Duplicate);
        }
        let id = state.next_id();
        let stored = Follow {
            id: FollowId(id),
            following_user_id: follow.following_user_id,
            followed_user_id: follow.followed_user_id,
            created_at: follow.created_at,
        };
        state.follows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, following: UserId, followed: UserId) -> RepositoryResult<Follow> {
        self.lock()
            .follows
            .values()
            .find(|f| f.following_user_id == following && f.followed_user_id == followed)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, following: UserId, followed: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().follows, |f| {
            f.following_user_id == following && f.followed_user_id == followed
        }))
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().follows, |f| {
            f.following_user_id == user_id || f.followed_user_id == user_id
        }))
    }
}

#[async_trait]
impl NotificationRepository for MemoryRepositories {
    async fn create(&self, notification: &NewNotification) -> RepositoryResult<()> {
        let mut state = self.lock();
        let visitor_name = state
            .user(notification.visitor_user_id)
            .map_err(|_| foreign_key("notifications.visitor_user_id"))?
            .name
            .clone();
        state
            .user(notification.visited_user_id)
            .map_err(|_| foreign_key("notifications.visited_user_id"))?;
        let id = state.next_id();
        state.notifications.insert(
            id,
            Notification {
                id: NotificationId(id),
                visitor_user_id: notification.visitor_user_id,
                visitor_name,
                visited_user_id: notification.visited_user_id,
                action: notification.action,
                created_at: notification.created_at,
            },
        );
        Ok(())
    }

    async fn list_for_user(&self, visited: UserId) -> RepositoryResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .lock()
            .notifications
            .values()
            .filter(|n| n.visited_user_id == visited)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().notifications, |n| {
            n.visitor_user_id == user_id || n.visited_user_id == user_id
        }))
    }
}

#[async_trait]
impl PasswordResetRepository for MemoryRepositories {
    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Option<PasswordReset>> {
        Ok(self.lock().password_resets.get(&user_id.0).cloned())
    }

    async fn upsert(&self, reset: &PasswordResetUpsert) -> RepositoryResult<Option<i32>> {
        let mut state = self.lock();
        state
            .user(reset.user_id)
            .map_err(|_| foreign_key("password_resets.user_id"))?;
        let attempts = state
            .password_resets
            .get(&reset.user_id.0)
            .map_or(0, |current| current.attempts_on(reset.updated_at));
        if attempts >= reset.daily_limit {
            return Ok(None);
        }
        state.password_resets.insert(
            reset.user_id.0,
            PasswordReset {
                user_id: reset.user_id,
                email_count: attempts + 1,
                reset_key: reset.reset_key,
                key_expires_at: reset.key_expires_at,
                updated_at: reset.updated_at,
            },
        );
        Ok(Some(attempts + 1))
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(self
            .lock()
            .password_resets
            .remove(&user_id.0)
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl ReportRepository for MemoryRepositories {
    async fn create_user_report(&self, report: &NewUserReport) -> RepositoryResult<UserReport> {
        let mut state = self.lock();
        state
            .user(report.user_id)
            .map_err(|_| foreign_key("user_reports.user_id"))?;
        let id = state.next_id();
        let stored = UserReport {
            id: ReportId(id),
            user_id: report.user_id,
            detail: report.detail.clone(),
            created_at: report.created_at,
        };
        state.user_reports.insert(id, stored.clone());
        Ok(stored)
    }

    async fn create_posting_report(
        &self,
        report: &NewPostingReport,
    ) -> RepositoryResult<PostingReport> {
        let mut state = self.lock();
        if !state.postings.contains_key(&report.posting_id.0) {
            return Err(foreign_key("posting_reports.posting_id"));
        }
        let id = state.next_id();
        let stored = PostingReport {
            id: ReportId(id),
            posting_id: report.posting_id,
            detail: report.detail.clone(),
            created_at: report.created_at,
        };
        state.posting_reports.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_user_reports(&self, user_id: UserId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().user_reports, |r| r.user_id == user_id))
    }

    async fn delete_posting_reports(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        Ok(remove_where(&mut self.lock().posting_reports, |r| {
            r.posting_id == posting_id
        }))
    }

    async fn delete_posting_reports_on_postings_of(
        &self,
        owner: UserId,
    ) -> RepositoryResult<u64> {
        let mut state = self.lock();
        let owned: Vec<PostingId> = state
            .postings
            .values()
            .filter(|p| p.user_id == owner)
            .map(|p| p.id)
            .collect();
        Ok(remove_where(&mut state.posting_reports, |r| {
            owned.contains(&r.posting_id)
        }))
    }
}

/// 在快照副本上工作，提交时整体替换共享状态，回滚时丢弃副本。
pub struct MemoryUnitOfWork {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryRepositories,
    finished: AtomicBool,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.working
    }

    fn postings(&self) -> &dyn PostingRepository {
        &self.working
    }

    fn likes(&self) -> &dyn LikeRepository {
        &self.working
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.working
    }

    fn follows(&self) -> &dyn FollowRepository {
        &self.working
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.working
    }

    fn password_resets(&self) -> &dyn PasswordResetRepository {
        &self.working
    }

    fn reports(&self) -> &dyn ReportRepository {
        &self.working
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(RepositoryError::storage("transaction already finished"));
        }
        let snapshot = self.working.lock().clone();
        *self.shared.lock().unwrap_or_else(|p| p.into_inner()) = snapshot;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), RepositoryError> {
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// 内存存储入口，同时充当事务管理器。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    repositories: Arc<MemoryRepositories>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Arc<MemoryRepositories> {
        self.repositories.clone()
    }

    pub fn snapshot(&self) -> MemoryState {
        self.repositories.lock().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        f(&mut self.repositories.lock())
    }
}

#[async_trait]
impl TransactionManager for InMemoryStore {
    async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, RepositoryError> {
        let snapshot = self.repositories.lock().clone();
        Ok(Arc::new(MemoryUnitOfWork {
            shared: self.repositories.state.clone(),
            working: MemoryRepositories {
                state: Arc::new(Mutex::new(snapshot)),
            },
            finished: AtomicBool::new(false),
        }))
    }
}

/// 不做真正哈希的密码器，避免测试里跑 bcrypt。
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain${plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain${plaintext}"))
    }
}

/// 可手动拨动的时钟。
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// 记录所有发出的邮件。
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn last_to(&self, email: &str) -> Option<MailMessage> {
        self.sent()
            .into_iter()
            .rev()
            .find(|mail| mail.to.as_str() == email)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message);
        Ok(())
    }
}

/// 内存对象存储，键为 `bucket/key`。
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStorage {
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&format!("{bucket}/{key}"))
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let path = format!("{bucket}/{key}");
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(path.clone(), bytes);
        Ok(StoredObject {
            key: key.to_owned(),
            url: format!("memory://{path}"),
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&format!("{bucket}/{key}"));
        Ok(())
    }
}

/// 令牌即 `token-for:<name>`，不做签名。
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeTokenService;

impl TokenService for FakeTokenService {
    fn issue(&self, name: &UserName) -> Result<String, TokenError> {
        Ok(format!("token-for:{name}"))
    }

    fn verify(&self, token: &str) -> Result<UserName, TokenError> {
        let name = token
            .strip_prefix("token-for:")
            .ok_or(TokenError::Invalid)?;
        UserName::parse(name).map_err(|_| TokenError::ClaimsMissing)
    }
}

/// 一个 1x1 PNG 的 base64 文本。
pub fn png_base64() -> String {
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==".to_owned()
}

/// 用内存替身组装的完整服务集合。
pub struct TestApp {
    pub services: Services,
    pub store: InMemoryStore,
    pub mailer: Arc<RecordingMailer>,
    pub storage: Arc<MemoryObjectStorage>,
    pub clock: Arc<FixedClock>,
    settings: ServiceSettings,
    token_service: Arc<dyn TokenService>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(ServiceSettings::default(), Arc::new(FakeTokenService))
    }

    pub fn with(settings: ServiceSettings, token_service: Arc<dyn TokenService>) -> Self {
        let store = InMemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let storage = Arc::new(MemoryObjectStorage::default());
        let clock = Arc::new(FixedClock::default());
        let services = build_services(
            &store,
            settings.clone(),
            token_service.clone(),
            mailer.clone(),
            storage.clone(),
            clock.clone(),
        );
        Self {
            services,
            store,
            mailer,
            storage,
            clock,
            settings,
            token_service,
        }
    }

    /// 在同一份存储上换掉邮件与对象存储实现，用于注入失败。
    pub fn services_with(
        &self,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Services {
        build_services(
            &self.store,
            self.settings.clone(),
            self.token_service.clone(),
            mailer,
            storage,
            self.clock.clone(),
        )
    }

    pub fn token_service(&self) -> Arc<dyn TokenService> {
        self.token_service.clone()
    }

    /// 注册并激活 `{name}@example.com`，密码为 [`TEST_PASSWORD`]。
    pub async fn register_active_user(&self, name: &str) -> Actor {
        self.services
            .users
            .register(RegisterUserRequest {
                user_name: name.to_owned(),
                email: format!("{name}@example.com"),
                password: TEST_PASSWORD.to_owned(),
            })
            .await
            .expect("register test user");
        let key = self
            .store
            .snapshot()
            .user_by_name(name)
            .map(|user| user.activation_key)
            .expect("registered user is stored");
        self.services
            .users
            .activate(ActivateUserRequest {
                user_name: name.to_owned(),
                activation_key: key.to_string(),
            })
            .await
            .expect("activate test user");
        Actor::new(UserName::parse(name).expect("valid test user name"))
    }

    /// 拨快一秒后发布投稿，保证列表的 `created_at < now` 条件能看到它。
    pub async fn create_posting(&self, actor: &Actor, title: &str) -> PostingId {
        self.clock.advance(Duration::seconds(1));
        let posting = self
            .services
            .postings
            .register(
                actor,
                RegisterPostingRequest {
                    title: title.to_owned(),
                    image: png_base64(),
                },
            )
            .await
            .expect("create test posting");
        self.clock.advance(Duration::seconds(1));
        posting.id
    }

    pub fn user(&self, name: &str) -> User {
        self.store
            .snapshot()
            .user_by_name(name)
            .cloned()
            .expect("user exists")
    }
}

fn build_services(
    store: &InMemoryStore,
    settings: ServiceSettings,
    token_service: Arc<dyn TokenService>,
    mailer: Arc<dyn Mailer>,
    storage: Arc<dyn ObjectStorage>,
    clock: Arc<FixedClock>,
) -> Services {
    let repositories = store.repositories();
    Services::new(ServiceDependencies {
        users: repositories.clone(),
        postings: repositories.clone(),
        likes: repositories.clone(),
        comments: repositories.clone(),
        follows: repositories.clone(),
        notifications: repositories.clone(),
        password_resets: repositories.clone(),
        reports: repositories,
        transactions: Arc::new(store.clone()),
        password_hasher: Arc::new(PlainPasswordHasher),
        token_service,
        clock,
        storage,
        mailer,
        notifier: Arc::new(StoredNotifications),
        settings,
    })
}
