#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use devshort::application::services::{AuthService, LinkService, UserService};
use devshort::domain::events::DomainEvent;
use devshort::infrastructure::messaging::{
    ConsumedMessage, ConsumerGroup, Delivery, EventPublisher, MessageHandler, MessagingError,
    encode_event,
};
use devshort::infrastructure::persistence::{PgLinkRepository, PgUserRepository};
use devshort::state::AppState;
use serde_json::json;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Log {
    /// topic -> partitions -> messages
    topics: HashMap<String, Vec<Vec<ConsumedMessage>>>,
    /// (topic, partition) -> next offset to consume
    committed: HashMap<(String, i32), i64>,
}

/// Partitioned in-memory broker. Messages with the same key land on the same
/// partition, and committed offsets survive the group members that wrote them.
#[derive(Clone)]
pub struct MemoryBroker {
    partitions: usize,
    log: Arc<Mutex<Log>>,
    produced: Arc<Notify>,
    closes: Arc<AtomicUsize>,
}

impl MemoryBroker {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions,
            log: Arc::default(),
            produced: Arc::new(Notify::new()),
            closes: Arc::default(),
        }
    }

    pub fn partition_for(&self, key: &str) -> i32 {
        let hash = key.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31) + b as usize);
        (hash % self.partitions) as i32
    }

    /// Appends a raw record and returns where it landed.
    pub fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> Delivery {
        let partition = self.partition_for(key);
        let mut log = self.log.lock().unwrap();
        let partitions = log
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| vec![Vec::new(); self.partitions]);
        let messages = &mut partitions[partition as usize];
        let offset = messages.len() as i64;

        messages.push(ConsumedMessage {
            topic: topic.to_string(),
            partition,
            offset,
            key: Some(key.as_bytes().to_vec()),
            payload: Some(payload.to_vec()),
            timestamp: Some(1_700_000_000_000 + offset),
        });
        drop(log);

        self.produced.notify_waiters();
        Delivery { partition, offset }
    }

    pub fn produce_event<E: DomainEvent>(&self, event: &E) -> Delivery {
        let (key, payload) = encode_event(event).unwrap();
        self.produce(E::KIND.topic(), &key, &payload)
    }

    /// Next offset the group will read from `partition`, if anything was committed.
    pub fn committed(&self, topic: &str, partition: i32) -> Option<i64> {
        self.log
            .lock()
            .unwrap()
            .committed
            .get(&(topic.to_string(), partition))
            .copied()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// A new group member starting from the committed offsets.
    pub fn member(&self) -> MemoryGroup {
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        MemoryGroup {
            broker: self.clone(),
            topic: Mutex::new(None),
            positions: Mutex::new(HashMap::new()),
            next_partition: AtomicUsize::new(0),
            subscribe_failures: AtomicUsize::new(0),
            subscribe_attempts: Arc::default(),
            faults_tx,
            faults_rx: Some(faults_rx),
        }
    }
}

#[async_trait]
impl<E: DomainEvent> EventPublisher<E> for MemoryBroker {
    fn topic(&self) -> &str {
        E::KIND.topic()
    }

    async fn send(&self, event: &E) -> Result<Delivery, MessagingError> {
        let (key, payload) = encode_event(event)?;
        Ok(self.produce(E::KIND.topic(), &key, &payload))
    }
}

/// One member of a consumer group on a [`MemoryBroker`]. It owns every
/// partition of the topic it subscribes to.
pub struct MemoryGroup {
    broker: MemoryBroker,
    topic: Mutex<Option<String>>,
    positions: Mutex<HashMap<i32, i64>>,
    next_partition: AtomicUsize,
    subscribe_failures: AtomicUsize,
    subscribe_attempts: Arc<AtomicUsize>,
    faults_tx: mpsc::UnboundedSender<MessagingError>,
    faults_rx: Option<mpsc::UnboundedReceiver<MessagingError>>,
}

impl MemoryGroup {
    /// Makes the next `n` subscribe calls fail.
    pub fn failing_joins(self, n: usize) -> Self {
        self.subscribe_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn subscribe_attempts(&self) -> Arc<AtomicUsize> {
        self.subscribe_attempts.clone()
    }

    /// Queues a client fault for the runner's drain task.
    pub fn inject_fault(&self, reason: &str) {
        self.faults_tx
            .send(MessagingError::Group(reason.to_string()))
            .unwrap();
    }

    fn next_message(&self) -> Option<ConsumedMessage> {
        let topic = self.topic.lock().unwrap().clone()?;
        let log = self.broker.log.lock().unwrap();
        let partitions = log.topics.get(&topic)?;
        let mut positions = self.positions.lock().unwrap();

        let start = self.next_partition.load(Ordering::SeqCst);
        for i in 0..partitions.len() {
            let partition = (start + i) % partitions.len();
            let position = *positions
                .entry(partition as i32)
                .or_insert_with(|| {
                    log.committed
                        .get(&(topic.clone(), partition as i32))
                        .copied()
                        .unwrap_or(0)
                });

            if let Some(message) = partitions[partition].get(position as usize) {
                positions.insert(partition as i32, position + 1);
                self.next_partition
                    .store((partition + 1) % partitions.len(), Ordering::SeqCst);
                return Some(message.clone());
            }
        }
        None
    }
}

#[async_trait]
impl ConsumerGroup for MemoryGroup {
    fn subscribe(&self, topic: &str) -> Result<(), MessagingError> {
        self.subscribe_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.subscribe_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.subscribe_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(MessagingError::Group("coordinator not available".to_string()));
        }

        *self.topic.lock().unwrap() = Some(topic.to_string());
        Ok(())
    }

    async fn claim(&self) -> Result<ConsumedMessage, MessagingError> {
        loop {
            let produced = self.broker.produced.notified();
            if let Some(message) = self.next_message() {
                return Ok(message);
            }
            produced.await;
        }
    }

    fn acknowledge(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        self.broker
            .log
            .lock()
            .unwrap()
            .committed
            .insert((message.topic.clone(), message.partition), message.offset + 1);
        Ok(())
    }

    fn redeliver(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        self.positions
            .lock()
            .unwrap()
            .insert(message.partition, message.offset);
        Ok(())
    }

    fn take_errors(&mut self) -> Option<mpsc::UnboundedReceiver<MessagingError>> {
        self.faults_rx.take()
    }

    fn close(self) {
        self.broker.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a [`RecordingHandler`] saw for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    pub ok: bool,
}

/// Wraps a handler, records every attempt, and cancels `token` after
/// `stop_after` attempts.
pub struct RecordingHandler {
    inner: Arc<dyn MessageHandler>,
    token: CancellationToken,
    stop_after: usize,
    attempts: Mutex<Vec<Attempt>>,
    fail_once: Mutex<HashSet<String>>,
}

impl RecordingHandler {
    pub fn new(inner: Arc<dyn MessageHandler>, token: CancellationToken, stop_after: usize) -> Self {
        Self {
            inner,
            token,
            stop_after,
            attempts: Mutex::new(Vec::new()),
            fail_once: Mutex::new(HashSet::new()),
        }
    }

    /// The first delivery of a message with this key fails.
    pub fn fail_once(self, key: &str) -> Self {
        self.fail_once.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        let key = message.key_str().unwrap_or_default().to_string();

        let fail = self.fail_once.lock().unwrap().remove(&key);
        let result = if fail {
            Err(MessagingError::Group("downstream unavailable".to_string()))
        } else {
            self.inner.handle(message).await
        };

        let mut attempts = self.attempts.lock().unwrap();
        attempts.push(Attempt {
            partition: message.partition,
            offset: message.offset,
            key,
            ok: result.is_ok(),
        });
        if attempts.len() >= self.stop_after {
            self.token.cancel();
        }

        result
    }
}

/// Handler that accepts everything.
pub struct AcceptAll;

#[async_trait]
impl MessageHandler for AcceptAll {
    async fn handle(&self, _message: &ConsumedMessage) -> Result<(), MessagingError> {
        Ok(())
    }
}

// ─── HTTP / DATABASE FIXTURES ────────────────────────────────────────────────

pub const TEST_PASSWORD: &str = "rahasia";

/// Application state over `pool` with event publishing disabled.
pub fn create_test_state(pool: PgPool) -> AppState {
    let pool = Arc::new(pool);
    let auth_service = Arc::new(AuthService::new(
        "test-signing-secret",
        Duration::from_secs(3600),
    ));

    let user_service = Arc::new(UserService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        auth_service.clone(),
        None,
    ));
    let link_service = Arc::new(LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        None,
    ));

    AppState::new(user_service, link_service, auth_service, pool, None)
}

pub fn make_server(pool: PgPool) -> TestServer {
    TestServer::new(devshort::routes::router(create_test_state(pool))).unwrap()
}

/// Registers `id` through the API and returns a bearer token for it.
pub async fn register_and_login(server: &TestServer, id: &str) -> String {
    server
        .post("/api/users")
        .json(&json!({ "id": id, "password": TEST_PASSWORD, "name": format!("User {id}") }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/users/_login")
        .json(&json!({ "id": id, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.json::<serde_json::Value>()["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub async fn create_test_user(pool: &PgPool, id: &str) {
    sqlx::query(
        "INSERT INTO users (id, name, password, created_at, updated_at) VALUES ($1, $2, 'x', 1, 1)",
    )
    .bind(id)
    .bind(format!("User {id}"))
    .execute(pool)
    .await
    .unwrap();
}
