//! Row type for `vendor_integration_settings`.
//!
//! Each integration section is stored as a nullable JSONB document.

use procura_core::error::{CoreError, CoreResult};
use procura_core::types::{DbId, Timestamp};
use procura_core::vendor_settings::VendorIntegrationSettings;
use serde::de::DeserializeOwned;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct VendorSettingsRow {
    pub vendor_id: DbId,
    pub google_sheets: Option<serde_json::Value>,
    pub twilio: Option<serde_json::Value>,
    pub updated_at: Timestamp,
}

impl TryFrom<VendorSettingsRow> for VendorIntegrationSettings {
    type Error = CoreError;

    fn try_from(row: VendorSettingsRow) -> CoreResult<Self> {
        Ok(VendorIntegrationSettings {
            vendor_id: row.vendor_id,
            google_sheets: decode_section("google_sheets", row.google_sheets)?,
            twilio: decode_section("twilio", row.twilio)?,
            updated_at: Some(row.updated_at),
        })
    }
}

fn decode_section<T: DeserializeOwned>(
    name: &str,
    value: Option<serde_json::Value>,
) -> CoreResult<Option<T>> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| CoreError::Internal(format!("malformed {name} settings: {e}")))
}
