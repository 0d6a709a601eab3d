//! Repository for the `vendor_integration_settings` table.

use procura_core::types::DbId;
use sqlx::PgPool;

use crate::models::vendor_settings::VendorSettingsRow;

const COLUMNS: &str = "vendor_id, google_sheets, twilio, updated_at";

/// Keyed get/upsert of per-vendor integration settings.
pub struct VendorSettingsRepo;

impl VendorSettingsRepo {
    pub async fn find(
        pool: &PgPool,
        vendor_id: DbId,
    ) -> Result<Option<VendorSettingsRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendor_integration_settings WHERE vendor_id = $1");
        sqlx::query_as::<_, VendorSettingsRow>(&query)
            .bind(vendor_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update. A `None` section keeps the stored value.
    pub async fn upsert(
        pool: &PgPool,
        vendor_id: DbId,
        google_sheets: Option<serde_json::Value>,
        twilio: Option<serde_json::Value>,
    ) -> Result<VendorSettingsRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO vendor_integration_settings (vendor_id, google_sheets, twilio)
             VALUES ($1, $2, $3)
             ON CONFLICT (vendor_id) DO UPDATE SET
                google_sheets = COALESCE(EXCLUDED.google_sheets, vendor_integration_settings.google_sheets),
                twilio = COALESCE(EXCLUDED.twilio, vendor_integration_settings.twilio),
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VendorSettingsRow>(&query)
            .bind(vendor_id)
            .bind(google_sheets)
            .bind(twilio)
            .fetch_one(pool)
            .await
    }
}
