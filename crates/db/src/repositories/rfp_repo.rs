//! Repository for the `rfps`, `rfp_status_history` and `rfp_comments` tables.

use procura_core::query::{PageRequest, RfpFilter, RfpSort};
use procura_core::store::{RfpChanges, RfpDraft};
use procura_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::rfp::{
    CommentRow, MonthBucketRow, MonthTotalRow, RfpRow, StatusHistoryRow, StatusTotalRow,
    VendorTotalRow,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `rfps` SELECT queries.
const COLUMNS: &str = "\
    id, title, description, amount, submission_deadline, \
    status, vendor_id, created_at, updated_at";

const HISTORY_COLUMNS: &str = "rfp_id, status, changed_at, changed_by";

const COMMENT_COLUMNS: &str = "rfp_id, text, author, created_at";

// ---------------------------------------------------------------------------
// RfpRepo
// ---------------------------------------------------------------------------

/// Provides CRUD, listing and aggregate queries for RFPs.
pub struct RfpRepo;

impl RfpRepo {
    /// Insert an RFP and its creation history entry in one transaction.
    pub async fn insert(pool: &PgPool, draft: &RfpDraft) -> Result<DbId, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO rfps (title, description, amount, submission_deadline, status, vendor_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.amount)
        .bind(draft.submission_deadline)
        .bind(draft.status.as_str())
        .bind(draft.vendor_id)
        .fetch_one(&mut *tx)
        .await?;

        let entry = &draft.initial_history;
        sqlx::query(
            "INSERT INTO rfp_status_history (rfp_id, status, changed_at, changed_by)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(entry.status.as_str())
        .bind(entry.changed_at)
        .bind(entry.changed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Find an RFP row by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RfpRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rfps WHERE id = $1");
        sqlx::query_as::<_, RfpRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Status history for the given RFPs, oldest entry first per RFP.
    pub async fn history_for(
        pool: &PgPool,
        rfp_ids: &[DbId],
    ) -> Result<Vec<StatusHistoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM rfp_status_history \
             WHERE rfp_id = ANY($1) ORDER BY rfp_id, id"
        );
        sqlx::query_as::<_, StatusHistoryRow>(&query)
            .bind(rfp_ids)
            .fetch_all(pool)
            .await
    }

    /// Comments for the given RFPs, oldest first per RFP.
    pub async fn comments_for(
        pool: &PgPool,
        rfp_ids: &[DbId],
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM rfp_comments \
             WHERE rfp_id = ANY($1) ORDER BY rfp_id, id"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(rfp_ids)
            .fetch_all(pool)
            .await
    }

    /// Apply changes, append history/comment rows and bump `updated_at`.
    ///
    /// The row is locked for the duration of the transaction. Returns `false`
    /// if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &RfpChanges,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists = sqlx::query_scalar::<_, DbId>("SELECT id FROM rfps WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE rfps SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                amount = COALESCE($4, amount),
                submission_deadline = COALESCE($5, submission_deadline),
                status = COALESCE($6, status),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.amount)
        .bind(changes.submission_deadline)
        .bind(changes.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;

        if let Some(entry) = &changes.history_entry {
            sqlx::query(
                "INSERT INTO rfp_status_history (rfp_id, status, changed_at, changed_by)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(entry.status.as_str())
            .bind(entry.changed_at)
            .bind(entry.changed_by)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(comment) = &changes.comment {
            sqlx::query(
                "INSERT INTO rfp_comments (rfp_id, text, author, created_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(&comment.text)
            .bind(comment.author)
            .bind(comment.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Delete an RFP. History and comments go with it (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rfps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One page of RFP rows matching `filter`, ordered by `sort` with id as tiebreak.
    pub async fn list(
        pool: &PgPool,
        filter: &RfpFilter,
        sort: RfpSort,
        page: PageRequest,
    ) -> Result<Vec<RfpRow>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_rfp_filter(filter);
        let direction = sort.direction.sql();

        let query = format!(
            "SELECT {COLUMNS} FROM rfps {where_clause} \
             ORDER BY {} {direction}, id {direction} \
             LIMIT ${bind_idx} OFFSET ${}",
            sort.field.column(),
            bind_idx + 1
        );

        let q = bind_rfp_values(sqlx::query_as::<_, RfpRow>(&query), &bind_values);
        q.bind(page.limit).bind(page.offset()).fetch_all(pool).await
    }

    /// Count RFPs matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &RfpFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_rfp_filter(filter);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM rfps {where_clause}");

        let q = bind_rfp_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Count and summed amount per status, optionally for one vendor.
    pub async fn status_totals(
        pool: &PgPool,
        vendor_id: Option<DbId>,
    ) -> Result<Vec<StatusTotalRow>, sqlx::Error> {
        sqlx::query_as::<_, StatusTotalRow>(
            "SELECT status,
                    COUNT(*)::BIGINT AS count,
                    COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS total_value
             FROM rfps
             WHERE ($1::BIGINT IS NULL OR vendor_id = $1)
             GROUP BY status",
        )
        .bind(vendor_id)
        .fetch_all(pool)
        .await
    }

    /// Awarded RFPs per UTC month of `updated_at` within `year`.
    pub async fn awarded_by_month(
        pool: &PgPool,
        year: i32,
    ) -> Result<Vec<MonthTotalRow>, sqlx::Error> {
        sqlx::query_as::<_, MonthTotalRow>(
            "SELECT EXTRACT(MONTH FROM updated_at AT TIME ZONE 'UTC')::INT AS month,
                    COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS total,
                    COUNT(*)::BIGINT AS count
             FROM rfps
             WHERE status = 'Awarded'
               AND EXTRACT(YEAR FROM updated_at AT TIME ZONE 'UTC')::INT = $1
             GROUP BY 1
             ORDER BY 1",
        )
        .bind(year)
        .fetch_all(pool)
        .await
    }

    /// RFPs created since `since`, grouped by UTC year and month.
    pub async fn created_by_month(
        pool: &PgPool,
        since: Timestamp,
        vendor_id: Option<DbId>,
    ) -> Result<Vec<MonthBucketRow>, sqlx::Error> {
        sqlx::query_as::<_, MonthBucketRow>(
            "SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT AS year,
                    EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::INT AS month,
                    COUNT(*)::BIGINT AS count,
                    COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS total_amount
             FROM rfps
             WHERE created_at >= $1
               AND ($2::BIGINT IS NULL OR vendor_id = $2)
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .bind(since)
        .bind(vendor_id)
        .fetch_all(pool)
        .await
    }

    /// Per-vendor totals for every vendor owning at least one RFP.
    pub async fn vendor_totals(pool: &PgPool) -> Result<Vec<VendorTotalRow>, sqlx::Error> {
        sqlx::query_as::<_, VendorTotalRow>(
            "SELECT vendor_id,
                    COUNT(*)::BIGINT AS total_rfps,
                    COALESCE(SUM(amount), 0)::DOUBLE PRECISION AS total_value,
                    COUNT(*) FILTER (WHERE status = 'Submitted')::BIGINT AS submitted,
                    COUNT(*) FILTER (WHERE status = 'Awarded')::BIGINT AS awarded,
                    COUNT(*) FILTER (WHERE status = 'Rejected')::BIGINT AS rejected,
                    COALESCE(SUM(amount) FILTER (WHERE status = 'Awarded'), 0)::DOUBLE PRECISION
                        AS awarded_value
             FROM rfps
             GROUP BY vendor_id
             ORDER BY vendor_id",
        )
        .fetch_all(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Dynamic filter helpers
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built queries.
enum BindValue {
    BigInt(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from an [`RfpFilter`].
///
/// Returns `(where_clause, bind_values, next_bind_idx)`.
fn build_rfp_filter(filter: &RfpFilter) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(vendor_id) = filter.vendor_id {
        conditions.push(format!("vendor_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(vendor_id));
    }

    if let Some(status) = filter.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.as_str().to_string()));
    }

    if let Some(min) = filter.min_amount {
        conditions.push(format!("amount >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Float(min));
    }

    if let Some(max) = filter.max_amount {
        conditions.push(format!("amount <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Float(max));
    }

    if let Some(from) = filter.deadline_from {
        conditions.push(format!("submission_deadline >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = filter.deadline_to {
        conditions.push(format!("submission_deadline <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    if let Some(ref search) = filter.search {
        conditions.push(format!(
            "(title ILIKE ${bind_idx} ESCAPE '\\' OR description ILIKE ${bind_idx} ESCAPE '\\')"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{}%", escape_like(search))));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Apply bind values to a `query_as` query.
fn bind_rfp_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Apply bind values to a `query_scalar` query.
fn bind_rfp_values_scalar<'q, O>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
