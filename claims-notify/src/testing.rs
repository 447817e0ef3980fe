//! In-memory stores and recording channels for notification tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use claims_core::store::CANDIDATE_HORIZON_DAYS;
use claims_core::types::{
    deadlines_for, DamageReport, NewNotification, Notification, NotificationType, ReportRecord, ReportStatus, Role,
    User,
};
use claims_core::{NotificationStore, ReportStore, Stores, UserStore};
use claims_delivery::{DeliveryChannel, Dispatcher, OutboundMessage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::service::NotificationService;
use crate::templates::Templates;

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn user(id: &str, role: Role, phone: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        phone: phone.map(str::to_string),
        role,
        is_active: true,
    }
}

pub fn record_with_damage_date(id: &str, damage_date: DateTime<Utc>) -> ReportRecord {
    let (airbnb, proof) = deadlines_for(damage_date);
    let mut reporter = user("reporter-1", Role::Cleaner, None);
    reporter.name = "Casey Cleaner".to_string();

    ReportRecord {
        id: id.to_string(),
        property_name: "Seaside Loft".to_string(),
        property_address: Some("1 Harbour Road".to_string()),
        damage_type: Some("Stain".to_string()),
        description: None,
        damage_date,
        checkout_date: None,
        airbnb_deadline: Some(airbnb),
        proof_deadline: Some(proof),
        submitted_to_airbnb: false,
        status: ReportStatus::Pending.to_string(),
        reporter: Some(reporter),
        first_item_name: None,
    }
}

pub fn report_with_damage_date(damage_date: DateTime<Utc>) -> DamageReport {
    DamageReport::try_from(record_with_damage_date("report-1", damage_date)).unwrap()
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    reports: Mutex<Vec<ReportRecord>>,
    notifications: Mutex<Vec<Notification>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    insert_attempts: AtomicUsize,
    fail_insert_at: AtomicUsize,
}

impl MemoryStore {
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_report(&self, record: ReportRecord) {
        self.reports.lock().unwrap().push(record);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Rejects only the `attempt`-th insert from now on (1-based); later inserts succeed.
    pub fn fail_insert_once(&self, attempt: usize) {
        let done = self.insert_attempts.load(Ordering::SeqCst);
        self.fail_insert_at.store(done + attempt, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

fn within(deadline: Option<DateTime<Utc>>, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| d >= from && d < until)
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn find_reports_with_upcoming_deadlines(&self, now: DateTime<Utc>) -> Result<Vec<ReportRecord>> {
        self.check_reads()?;
        let horizon = now + Duration::days(CANDIDATE_HORIZON_DAYS);
        let proof_required = ReportStatus::ProofRequired.as_str();

        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                (!r.submitted_to_airbnb && within(r.airbnb_deadline, now, horizon))
                    || (r.status == proof_required && within(r.proof_deadline, now, horizon))
            })
            .cloned()
            .collect())
    }

    async fn find_report_by_id(&self, id: &str) -> Result<Option<ReportRecord>> {
        self.check_reads()?;
        Ok(self.reports.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_active_users_by_role(&self, roles: &[Role]) -> Result<Vec<User>> {
        self.check_reads()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_active && roles.contains(&u.role))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, record: NewNotification) -> Result<Notification> {
        let attempt = self.insert_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("insert rejected"));
        }
        if attempt == self.fail_insert_at.load(Ordering::SeqCst) {
            return Err(anyhow!("transient insert failure"));
        }
        let mut rows = self.notifications.lock().unwrap();
        let notification = Notification {
            id: format!("n{}", rows.len() + 1),
            user_id: record.user_id,
            damage_report_id: record.damage_report_id,
            notification_type: record.notification_type,
            title: record.title,
            message: record.message,
            is_read: false,
            created_at: record.created_at,
            scheduled_for: record.scheduled_for,
        };
        rows.push(notification.clone());
        Ok(notification)
    }

    async fn exists_for_report_type_today(
        &self,
        report_id: &str,
        notification_type: NotificationType,
        day_start: DateTime<Utc>,
    ) -> Result<bool> {
        self.check_reads()?;
        Ok(self.notifications.lock().unwrap().iter().any(|n| {
            n.damage_report_id.as_deref() == Some(report_id)
                && n.notification_type == notification_type
                && n.created_at >= day_start
        }))
    }
}

/// Channel double that records completed sends; can be switched off or made to hang.
pub struct RecordingChannel {
    name: &'static str,
    configured: AtomicBool,
    hang: AtomicBool,
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    attempts: AtomicUsize,
}

impl RecordingChannel {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: AtomicBool::new(true),
            hang: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn targets(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.subject.clone()).collect()
    }

    /// Polls until `count` sends have completed, failing the test after two seconds.
    pub async fn wait_for(&self, count: usize) {
        let waited = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while self.sent_count() < count {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "{}: expected {} sends, saw {} after {} attempts",
            self.name,
            count,
            self.sent_count(),
            self.attempts.load(Ordering::SeqCst)
        );
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn send(&self, target: &str, message: &OutboundMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.sent.lock().unwrap().push((target.to_string(), message.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub email: Arc<RecordingChannel>,
    pub sms: Arc<RecordingChannel>,
    pub service: NotificationService,
}

/// A service over an empty in-memory store, rendering dates in UTC.
pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let email = RecordingChannel::new("email");
    let sms = RecordingChannel::new("sms");

    let stores = Stores {
        reports: store.clone(),
        users: store.clone(),
        notifications: store.clone(),
    };
    let dispatcher = Dispatcher::new(
        email.clone(),
        sms.clone(),
        std::time::Duration::from_secs(10),
        std::time::Duration::from_secs(30),
    );
    let offset = Utc.fix();
    let service = NotificationService::new(
        stores,
        dispatcher,
        Templates::new("http://localhost:3000", offset),
        offset,
    );

    Harness {
        store,
        email,
        sms,
        service,
    }
}
