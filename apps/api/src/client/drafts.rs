//! Locally persisted form and email drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::local_store::{load_json, save_json, LocalStore};
use crate::client::ClientError;
use crate::models::email::GeneratedEmailRow;

pub const FORM_DRAFT_KEY: &str = "email-generator-form-data";
pub const EMAIL_DRAFT_KEY: &str = "email-generator-emails";

const DEFAULT_TONE: &str = "professional";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    pub product_service: String,
    pub target_audience: String,
    pub selected_industry: String,
    pub selected_tone: String,
    pub custom_hook: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraft {
    pub email_a: String,
    pub email_b: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

pub struct Drafts<'a> {
    store: &'a dyn LocalStore,
}

impl<'a> Drafts<'a> {
    pub fn new(store: &'a dyn LocalStore) -> Self {
        Self { store }
    }

    pub fn save_form(&self, form: &FormDraft) -> Result<(), ClientError> {
        save_json(self.store, FORM_DRAFT_KEY, form)
    }

    pub fn load_form(&self) -> Result<Option<FormDraft>, ClientError> {
        load_json(self.store, FORM_DRAFT_KEY)
    }

    pub fn save_emails(&self, emails: &EmailDraft) -> Result<(), ClientError> {
        save_json(self.store, EMAIL_DRAFT_KEY, emails)
    }

    pub fn load_emails(&self) -> Result<Option<EmailDraft>, ClientError> {
        load_json(self.store, EMAIL_DRAFT_KEY)
    }

    /// Explicit reset of the generator form.
    pub fn clear(&self) -> Result<(), ClientError> {
        self.store.remove(FORM_DRAFT_KEY)?;
        self.store.remove(EMAIL_DRAFT_KEY)
    }

    /// Reloads a history record into the generator. Only one email comes back
    /// from history, so draft B is left empty.
    pub fn continue_editing(
        &self,
        record: &GeneratedEmailRow,
        now: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        self.save_form(&FormDraft {
            product_service: record.product_service.clone().unwrap_or_default(),
            target_audience: record.target_audience.clone().unwrap_or_default(),
            selected_industry: String::new(),
            selected_tone: record
                .tone
                .clone()
                .unwrap_or_else(|| DEFAULT_TONE.to_string()),
            custom_hook: String::new(),
        })?;
        self.save_emails(&EmailDraft {
            email_a: record.body.clone(),
            email_b: String::new(),
            timestamp: now.timestamp_millis(),
        })
    }
}
