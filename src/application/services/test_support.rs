//! In-memory transaction and publisher fakes for service tests.
//!
//! Every fake appends to a shared journal (`commit:<table>`, `rollback:<table>`,
//! `publish:<topic>:<key>`) so tests can assert the order of side effects.

use async_trait::async_trait;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::entities::{Link, User};
use crate::domain::events::{CommitReceipt, DomainEvent};
use crate::domain::repositories::{
    LinkRepository, LinkTransaction, UserRepository, UserTransaction,
};
use crate::error::AppError;
use crate::infrastructure::messaging::{Delivery, EventPublisher, MessagingError};

pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct Tables {
    pub users: HashMap<String, User>,
    pub links: HashMap<String, Link>,
}

/// Shared store behind both fake repositories.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub tables: Arc<Mutex<Tables>>,
    pub journal: Journal,
    fail_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.tables.lock().unwrap().users.get(id).cloned()
    }

    pub fn link(&self, id: &str) -> Option<Link> {
        self.tables.lock().unwrap().links.get(id).cloned()
    }

    pub fn insert_user(&self, user: User) {
        self.tables
            .lock()
            .unwrap()
            .users
            .insert(user.id.clone(), user);
    }

    pub fn insert_link(&self, link: Link) {
        self.tables
            .lock()
            .unwrap()
            .links
            .insert(link.id.clone(), link);
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }

    fn finish(&self, table: &str) -> Result<CommitReceipt, AppError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            self.record(format!("rollback:{table}"));
            return Err(AppError::persistence(
                "Failed to commit transaction",
                json!({}),
            ));
        }
        self.record(format!("commit:{table}"));
        Ok(CommitReceipt::new())
    }
}

pub struct MemoryUserRepository(pub MemoryStore);

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, AppError> {
        Ok(Box::new(MemoryUserTransaction {
            store: self.0.clone(),
            staged: HashMap::new(),
        }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.0.user(id))
    }
}

/// Buffers writes until commit.
struct MemoryUserTransaction {
    store: MemoryStore,
    staged: HashMap<String, User>,
}

impl MemoryUserTransaction {
    fn visible(&self, id: &str) -> Option<User> {
        self.staged.get(id).cloned().or_else(|| self.store.user(id))
    }
}

#[async_trait]
impl UserTransaction for MemoryUserTransaction {
    async fn count_by_id(&mut self, id: &str) -> Result<i64, AppError> {
        Ok(i64::from(self.visible(id).is_some()))
    }

    async fn find_by_id(&mut self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.visible(id))
    }

    async fn insert(&mut self, user: &User) -> Result<(), AppError> {
        if self.visible(&user.id).is_some() {
            return Err(AppError::conflict("Resource already exists", json!({})));
        }
        self.staged.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&mut self, user: &User) -> Result<(), AppError> {
        self.staged.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError> {
        let this = *self;
        let receipt = this.store.finish("users")?;
        let mut tables = this.store.tables.lock().unwrap();
        tables.users.extend(this.staged);
        Ok(receipt)
    }
}

pub struct MemoryLinkRepository(pub MemoryStore);

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AppError> {
        Ok(Box::new(MemoryLinkTransaction {
            store: self.0.clone(),
            staged: HashMap::new(),
            deleted: Vec::new(),
        }))
    }

    async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Link>, AppError> {
        Ok(self.0.link(id).filter(|link| link.user_id == user_id))
    }

    async fn list_by_user(&self, user_id: &str, active_only: bool) -> Result<Vec<Link>, AppError> {
        let tables = self.0.tables.lock().unwrap();
        let mut links: Vec<Link> = tables
            .links
            .values()
            .filter(|link| link.user_id == user_id && (!active_only || link.is_active))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }
}

struct MemoryLinkTransaction {
    store: MemoryStore,
    staged: HashMap<String, Link>,
    deleted: Vec<String>,
}

impl MemoryLinkTransaction {
    fn short_url_taken(&self, link: &Link) -> bool {
        let tables = self.store.tables.lock().unwrap();
        tables
            .links
            .values()
            .chain(self.staged.values())
            .any(|other| other.id != link.id && other.short_url == link.short_url)
    }
}

#[async_trait]
impl LinkTransaction for MemoryLinkTransaction {
    async fn user_exists(&mut self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.store.user(user_id).is_some())
    }

    async fn find_by_id_and_user(
        &mut self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Link>, AppError> {
        let link = self.staged.get(id).cloned().or_else(|| self.store.link(id));
        Ok(link.filter(|link| link.user_id == user_id))
    }

    async fn insert(&mut self, link: &Link) -> Result<(), AppError> {
        if self.short_url_taken(link) {
            return Err(AppError::conflict("Resource already exists", json!({})));
        }
        self.staged.insert(link.id.clone(), link.clone());
        Ok(())
    }

    async fn update(&mut self, link: &Link) -> Result<(), AppError> {
        if self.short_url_taken(link) {
            return Err(AppError::conflict("Resource already exists", json!({})));
        }
        self.staged.insert(link.id.clone(), link.clone());
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<bool, AppError> {
        let existed = self.staged.remove(id).is_some() || self.store.link(id).is_some();
        if existed {
            self.deleted.push(id.to_string());
        }
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError> {
        let this = *self;
        let receipt = this.store.finish("links")?;
        let mut tables = this.store.tables.lock().unwrap();
        tables.links.extend(this.staged);
        for id in &this.deleted {
            tables.links.remove(id);
        }
        Ok(receipt)
    }
}

/// Publisher that records events instead of sending them.
pub struct RecordingPublisher<E> {
    pub sent: Mutex<Vec<E>>,
    journal: Journal,
    fail: bool,
}

impl<E: DomainEvent + Clone> RecordingPublisher<E> {
    pub fn new(journal: Journal) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            journal,
            fail: false,
        }
    }

    /// A publisher whose broker never acknowledges.
    pub fn failing(journal: Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }

    pub fn sent(&self) -> Vec<E> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl<E: DomainEvent + Clone> EventPublisher<E> for RecordingPublisher<E> {
    fn topic(&self) -> &str {
        E::KIND.topic()
    }

    async fn send(&self, event: &E) -> Result<Delivery, MessagingError> {
        if self.fail {
            return Err(MessagingError::Transport(KafkaError::MessageProduction(
                RDKafkaErrorCode::MessageTimedOut,
            )));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(event.clone());
        self.journal
            .lock()
            .unwrap()
            .push(format!("publish:{}:{}", E::KIND.topic(), event.id()));

        Ok(Delivery {
            partition: 0,
            offset: sent.len() as i64 - 1,
        })
    }
}
