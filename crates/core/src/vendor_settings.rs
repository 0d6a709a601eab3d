//! Per-vendor integration settings (spreadsheet sync and voice reminders).
//!
//! Settings are keyed by vendor id in a shared store so every server
//! instance sees the same configuration. Secrets are redacted on the way out.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::policy;
use crate::roles::{Actor, Role};
use crate::store::{UserStore, VendorSettingsStore};
use crate::types::{DbId, Timestamp};
use crate::user::ENTITY_USER;

/// Placeholder returned in place of secret values.
pub const REDACTED: &str = "********";

/// Google Sheets target for the vendor's customer ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleSheetsConfig {
    pub sheet_id: String,
    /// Service-account credentials JSON.
    #[serde(default)]
    pub credentials: serde_json::Value,
}

/// Twilio account used for payment reminder calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

/// Stored settings for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorIntegrationSettings {
    pub vendor_id: DbId,
    pub google_sheets: Option<GoogleSheetsConfig>,
    pub twilio: Option<TwilioConfig>,
    pub updated_at: Option<Timestamp>,
}

impl VendorIntegrationSettings {
    /// Settings for a vendor that has configured nothing yet.
    pub fn empty(vendor_id: DbId) -> Self {
        Self {
            vendor_id,
            google_sheets: None,
            twilio: None,
            updated_at: None,
        }
    }

    /// Replace secrets with [`REDACTED`].
    pub fn redacted(mut self) -> Self {
        if let Some(twilio) = self.twilio.as_mut() {
            twilio.auth_token = REDACTED.to_string();
        }
        if let Some(sheets) = self.google_sheets.as_mut() {
            if !sheets.credentials.is_null() {
                sheets.credentials = serde_json::Value::String(REDACTED.to_string());
            }
        }
        self
    }
}

/// Request body for saving settings. Omitted sections are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveVendorSettings {
    pub google_sheets: Option<GoogleSheetsConfig>,
    pub twilio: Option<TwilioConfig>,
}

impl SaveVendorSettings {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(sheets) = &self.google_sheets {
            require("google_sheets.sheet_id", &sheets.sheet_id)?;
        }
        if let Some(twilio) = &self.twilio {
            require("twilio.account_sid", &twilio.account_sid)?;
            require("twilio.auth_token", &twilio.auth_token)?;
            require("twilio.phone_number", &twilio.phone_number)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Read a vendor's settings (redacted). Unconfigured vendors get empty settings.
pub async fn get(
    store: &dyn VendorSettingsStore,
    actor: &Actor,
    vendor_id: DbId,
) -> CoreResult<VendorIntegrationSettings> {
    policy::ensure_vendor_view(actor, vendor_id)?;
    let settings = store
        .get(vendor_id)
        .await?
        .unwrap_or_else(|| VendorIntegrationSettings::empty(vendor_id));
    Ok(settings.redacted())
}

/// Save a vendor's settings. The target must be an existing vendor account.
pub async fn save(
    store: &dyn VendorSettingsStore,
    users: &dyn UserStore,
    actor: &Actor,
    vendor_id: DbId,
    input: SaveVendorSettings,
) -> CoreResult<VendorIntegrationSettings> {
    policy::ensure_vendor_view(actor, vendor_id)?;
    input.validate()?;

    let vendor = users
        .find_by_id(vendor_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: ENTITY_USER,
            id: vendor_id,
        })?;
    if vendor.role != Role::Vendor {
        return Err(CoreError::Validation(format!(
            "User {vendor_id} is not a vendor"
        )));
    }

    let saved = store.upsert(vendor_id, &input).await?;
    Ok(saved.redacted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_hides_secrets() {
        let settings = VendorIntegrationSettings {
            vendor_id: 4,
            google_sheets: Some(GoogleSheetsConfig {
                sheet_id: "sheet-1".into(),
                credentials: serde_json::json!({"private_key": "k"}),
            }),
            twilio: Some(TwilioConfig {
                account_sid: "AC1".into(),
                auth_token: "secret".into(),
                phone_number: "+15550001".into(),
            }),
            updated_at: None,
        }
        .redacted();

        let twilio = settings.twilio.unwrap();
        assert_eq!(twilio.auth_token, REDACTED);
        assert_eq!(twilio.account_sid, "AC1");
        let sheets = settings.google_sheets.unwrap();
        assert_eq!(sheets.sheet_id, "sheet-1");
        assert_eq!(sheets.credentials, serde_json::json!(REDACTED));
    }

    #[test]
    fn test_validate_requires_twilio_fields() {
        let input = SaveVendorSettings {
            twilio: Some(TwilioConfig {
                account_sid: "AC1".into(),
                auth_token: " ".into(),
                phone_number: "+15550001".into(),
            }),
            ..Default::default()
        };
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("auth_token"));
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(SaveVendorSettings::default().validate().is_ok());
    }
}
