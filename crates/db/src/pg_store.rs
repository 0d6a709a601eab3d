//! PostgreSQL implementation of the core storage traits.

use std::collections::HashMap;

use async_trait::async_trait;
use procura_core::error::{CoreError, CoreResult};
use procura_core::query::{PageRequest, RfpFilter, RfpSort};
use procura_core::rfp::{Rfp, ENTITY_RFP};
use procura_core::roles::Role;
use procura_core::store::{
    MonthBucket, MonthTotal, RfpChanges, RfpDraft, RfpStore, StatusTotal, UserStore,
    VendorSettingsStore, VendorTotal,
};
use procura_core::types::{DbId, Timestamp};
use procura_core::user::{NewUser, User};
use procura_core::vendor_settings::{SaveVendorSettings, VendorIntegrationSettings};

use crate::models::rfp::{CommentRow, RfpRow, StatusHistoryRow};
use crate::repositories::{RfpRepo, UserRepo, VendorSettingsRepo};
use crate::{map_db_error, DbPool};

/// Store backed by a PostgreSQL pool. Cheap to clone.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Attach history and comments to RFP rows, preserving row order.
    async fn hydrate(&self, rows: Vec<RfpRow>) -> CoreResult<Vec<Rfp>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();

        let mut history: HashMap<DbId, Vec<StatusHistoryRow>> = HashMap::new();
        for row in RfpRepo::history_for(&self.pool, &ids)
            .await
            .map_err(map_db_error)?
        {
            history.entry(row.rfp_id).or_default().push(row);
        }

        let mut comments: HashMap<DbId, Vec<CommentRow>> = HashMap::new();
        for row in RfpRepo::comments_for(&self.pool, &ids)
            .await
            .map_err(map_db_error)?
        {
            comments.entry(row.rfp_id).or_default().push(row);
        }

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_rfp(
                    history.remove(&id).unwrap_or_default(),
                    comments.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }

    async fn load(&self, id: DbId) -> CoreResult<Option<Rfp>> {
        let row = RfpRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RfpStore for PgStore {
    async fn insert(&self, draft: RfpDraft) -> CoreResult<Rfp> {
        let id = RfpRepo::insert(&self.pool, &draft)
            .await
            .map_err(map_db_error)?;
        self.load(id).await?.ok_or(CoreError::NotFound {
            entity: ENTITY_RFP,
            id,
        })
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Rfp>> {
        self.load(id).await
    }

    async fn update(&self, id: DbId, changes: RfpChanges) -> CoreResult<Option<Rfp>> {
        let updated = RfpRepo::update(&self.pool, id, &changes)
            .await
            .map_err(map_db_error)?;
        if !updated {
            return Ok(None);
        }
        self.load(id).await
    }

    async fn delete(&self, id: DbId) -> CoreResult<bool> {
        RfpRepo::delete(&self.pool, id).await.map_err(map_db_error)
    }

    async fn list(
        &self,
        filter: &RfpFilter,
        sort: RfpSort,
        page: PageRequest,
    ) -> CoreResult<(Vec<Rfp>, i64)> {
        let total = RfpRepo::count(&self.pool, filter)
            .await
            .map_err(map_db_error)?;
        let rows = RfpRepo::list(&self.pool, filter, sort, page)
            .await
            .map_err(map_db_error)?;
        Ok((self.hydrate(rows).await?, total))
    }

    async fn status_totals(&self, vendor_id: Option<DbId>) -> CoreResult<Vec<StatusTotal>> {
        RfpRepo::status_totals(&self.pool, vendor_id)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(|row| row.into_total())
            .collect()
    }

    async fn awarded_by_month(&self, year: i32) -> CoreResult<Vec<MonthTotal>> {
        let rows = RfpRepo::awarded_by_month(&self.pool, year)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(MonthTotal::from).collect())
    }

    async fn created_by_month(
        &self,
        since: Timestamp,
        vendor_id: Option<DbId>,
    ) -> CoreResult<Vec<MonthBucket>> {
        let rows = RfpRepo::created_by_month(&self.pool, since, vendor_id)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(MonthBucket::from).collect())
    }

    async fn vendor_totals(&self) -> CoreResult<Vec<VendorTotal>> {
        let rows = RfpRepo::vendor_totals(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(VendorTotal::from).collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, input: NewUser) -> CoreResult<User> {
        UserRepo::create(&self.pool, &input)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<User>> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        UserRepo::find_by_email(&self.pool, email)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_many(&self, ids: &[DbId]) -> CoreResult<Vec<User>> {
        UserRepo::find_many(&self.pool, ids)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn count_by_role(&self, role: Role) -> CoreResult<i64> {
        UserRepo::count_by_role(&self.pool, role.as_str())
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl VendorSettingsStore for PgStore {
    async fn get(&self, vendor_id: DbId) -> CoreResult<Option<VendorIntegrationSettings>> {
        VendorSettingsRepo::find(&self.pool, vendor_id)
            .await
            .map_err(map_db_error)?
            .map(VendorIntegrationSettings::try_from)
            .transpose()
    }

    async fn upsert(
        &self,
        vendor_id: DbId,
        input: &SaveVendorSettings,
    ) -> CoreResult<VendorIntegrationSettings> {
        let google_sheets = encode_section(input.google_sheets.as_ref())?;
        let twilio = encode_section(input.twilio.as_ref())?;
        VendorSettingsRepo::upsert(&self.pool, vendor_id, google_sheets, twilio)
            .await
            .map_err(map_db_error)?
            .try_into()
    }
}

fn encode_section<T: serde::Serialize>(section: Option<&T>) -> CoreResult<Option<serde_json::Value>> {
    section
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| CoreError::Internal(format!("failed to encode settings: {e}")))
}
