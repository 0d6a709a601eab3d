//! In-process store implementing every core storage trait.
//!
//! Used by the test suites and by the server when `PROCURA_STORE=memory`.
//! State lives behind a single `tokio::sync::RwLock`; ids are assigned
//! sequentially per table starting at 1.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use procura_core::error::{CoreError, CoreResult};
use procura_core::query::{PageRequest, RfpFilter, RfpSort};
use procura_core::rfp::{Rfp, RfpStatus};
use procura_core::roles::Role;
use procura_core::store::{
    MonthBucket, MonthTotal, RfpChanges, RfpDraft, RfpStore, StatusTotal, UserStore,
    VendorSettingsStore, VendorTotal,
};
use procura_core::types::{DbId, Timestamp};
use procura_core::user::{NewUser, User};
use procura_core::vendor_settings::{SaveVendorSettings, VendorIntegrationSettings};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    rfps: BTreeMap<DbId, Rfp>,
    users: BTreeMap<DbId, User>,
    vendor_settings: BTreeMap<DbId, VendorIntegrationSettings>,
    next_rfp_id: DbId,
    next_user_id: DbId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Current time, never earlier than `floor`.
///
/// Keeps `updated_at` monotonic per record when the clock is coarse.
fn now_after(floor: Timestamp) -> Timestamp {
    Utc::now().max(floor)
}

#[async_trait]
impl RfpStore for MemoryStore {
    async fn insert(&self, draft: RfpDraft) -> CoreResult<Rfp> {
        let mut tables = self.tables.write().await;
        tables.next_rfp_id += 1;
        let id = tables.next_rfp_id;
        let now = Utc::now();

        let rfp = Rfp {
            id,
            title: draft.title,
            description: draft.description,
            amount: draft.amount,
            submission_deadline: draft.submission_deadline,
            status: draft.status,
            vendor_id: draft.vendor_id,
            status_history: vec![draft.initial_history],
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.rfps.insert(id, rfp.clone());
        Ok(rfp)
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Rfp>> {
        Ok(self.tables.read().await.rfps.get(&id).cloned())
    }

    async fn update(&self, id: DbId, changes: RfpChanges) -> CoreResult<Option<Rfp>> {
        let mut tables = self.tables.write().await;
        let Some(rfp) = tables.rfps.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(rfp);
        rfp.updated_at = now_after(rfp.updated_at);
        Ok(Some(rfp.clone()))
    }

    async fn delete(&self, id: DbId) -> CoreResult<bool> {
        Ok(self.tables.write().await.rfps.remove(&id).is_some())
    }

    async fn list(
        &self,
        filter: &RfpFilter,
        sort: RfpSort,
        page: PageRequest,
    ) -> CoreResult<(Vec<Rfp>, i64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Rfp> = tables.rfps.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len() as i64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn status_totals(&self, vendor_id: Option<DbId>) -> CoreResult<Vec<StatusTotal>> {
        let tables = self.tables.read().await;
        let mut totals: Vec<StatusTotal> = Vec::new();
        for rfp in tables
            .rfps
            .values()
            .filter(|r| vendor_id.map_or(true, |v| v == r.vendor_id))
        {
            match totals.iter_mut().find(|t| t.status == rfp.status) {
                Some(total) => {
                    total.count += 1;
                    total.total_value += rfp.amount;
                }
                None => totals.push(StatusTotal {
                    status: rfp.status,
                    count: 1,
                    total_value: rfp.amount,
                }),
            }
        }
        Ok(totals)
    }

    async fn awarded_by_month(&self, year: i32) -> CoreResult<Vec<MonthTotal>> {
        let tables = self.tables.read().await;
        let mut months: BTreeMap<u32, MonthTotal> = BTreeMap::new();
        for rfp in tables.rfps.values().filter(|r| {
            r.status == RfpStatus::Awarded && r.updated_at.year() == year
        }) {
            let month = rfp.updated_at.month();
            let entry = months.entry(month).or_insert(MonthTotal {
                month,
                total: 0.0,
                count: 0,
            });
            entry.total += rfp.amount;
            entry.count += 1;
        }
        Ok(months.into_values().collect())
    }

    async fn created_by_month(
        &self,
        since: Timestamp,
        vendor_id: Option<DbId>,
    ) -> CoreResult<Vec<MonthBucket>> {
        let tables = self.tables.read().await;
        let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
        for rfp in tables.rfps.values().filter(|r| {
            r.created_at >= since && vendor_id.map_or(true, |v| v == r.vendor_id)
        }) {
            let key = (rfp.created_at.year(), rfp.created_at.month());
            let bucket = buckets.entry(key).or_insert(MonthBucket {
                year: key.0,
                month: key.1,
                count: 0,
                total_amount: 0.0,
            });
            bucket.count += 1;
            bucket.total_amount += rfp.amount;
        }
        Ok(buckets.into_values().collect())
    }

    async fn vendor_totals(&self) -> CoreResult<Vec<VendorTotal>> {
        let tables = self.tables.read().await;
        let mut vendors: BTreeMap<DbId, VendorTotal> = BTreeMap::new();
        for rfp in tables.rfps.values() {
            let total = vendors.entry(rfp.vendor_id).or_insert(VendorTotal {
                vendor_id: rfp.vendor_id,
                total_rfps: 0,
                total_value: 0.0,
                submitted: 0,
                awarded: 0,
                rejected: 0,
                awarded_value: 0.0,
            });
            total.total_rfps += 1;
            total.total_value += rfp.amount;
            match rfp.status {
                RfpStatus::Submitted => total.submitted += 1,
                RfpStatus::Awarded => {
                    total.awarded += 1;
                    total.awarded_value += rfp.amount;
                }
                RfpStatus::Rejected => total.rejected += 1,
                RfpStatus::Draft => {}
            }
        }
        Ok(vendors.into_values().collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, input: NewUser) -> CoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(CoreError::Conflict(
                "Duplicate value violates unique constraint: uq_users_email".into(),
            ));
        }
        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[DbId]) -> CoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn count_by_role(&self, role: Role) -> CoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().filter(|u| u.role == role).count() as i64)
    }
}

#[async_trait]
impl VendorSettingsStore for MemoryStore {
    async fn get(&self, vendor_id: DbId) -> CoreResult<Option<VendorIntegrationSettings>> {
        Ok(self.tables.read().await.vendor_settings.get(&vendor_id).cloned())
    }

    async fn upsert(
        &self,
        vendor_id: DbId,
        input: &SaveVendorSettings,
    ) -> CoreResult<VendorIntegrationSettings> {
        let mut tables = self.tables.write().await;
        let settings = tables
            .vendor_settings
            .entry(vendor_id)
            .or_insert_with(|| VendorIntegrationSettings::empty(vendor_id));
        if let Some(sheets) = &input.google_sheets {
            settings.google_sheets = Some(sheets.clone());
        }
        if let Some(twilio) = &input.twilio {
            settings.twilio = Some(twilio.clone());
        }
        settings.updated_at = Some(Utc::now());
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procura_core::rfp::StatusHistoryEntry;

    fn draft(vendor_id: DbId, amount: f64) -> RfpDraft {
        let now = Utc::now();
        RfpDraft {
            title: "Desks".into(),
            description: "Office desks".into(),
            amount,
            submission_deadline: now,
            status: RfpStatus::Draft,
            vendor_id,
            initial_history: StatusHistoryEntry {
                status: RfpStatus::Draft,
                changed_at: now,
                changed_by: vendor_id,
            },
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_delete_removes() {
        let store = MemoryStore::new();
        let a = store.insert(draft(1, 10.0)).await.unwrap();
        let b = store.insert(draft(1, 20.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        assert!(RfpStore::find_by_id(&store, a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store.update(42, RfpChanges::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let input = NewUser {
            name: "Acme".into(),
            email: "acme@example.com".into(),
            password_hash: "hash".into(),
            role: Role::Vendor,
        };
        store.create(input.clone()).await.unwrap();
        let err = store.create(input).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_status_totals_scoped_by_vendor() {
        let store = MemoryStore::new();
        store.insert(draft(1, 10.0)).await.unwrap();
        store.insert(draft(1, 15.0)).await.unwrap();
        store.insert(draft(2, 99.0)).await.unwrap();

        let totals = store.status_totals(Some(1)).await.unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[0].total_value, 25.0);
    }
}
