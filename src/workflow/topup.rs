//! Top-up workflow: `Editing → Confirming (optional) → Submitted`.
//!
//! The confirmation step is a soft overdraft warning: it is entered only when
//! the requested storage exceeds the platform's unallotted capacity, and the
//! operator may proceed anyway.

use crate::api::{ApiClient, Transport};
use crate::cache::{Mutation, QueryCache};
use crate::error::{Error, Result};
use crate::state::{Agency, Currency, ResourceKind, TopUpPayload};
use crate::workflow::validation::validate_top_up;

pub const STORAGE_PRESETS_MB: [u64; 5] = [600, 1_000, 5_000, 10_000, 20_000];
pub const TOKEN_PRESETS: [u64; 5] = [20_000, 50_000, 100_000, 500_000, 1_000_000];
pub const WEBSITE_PRESETS: [u64; 5] = [1, 5, 10, 25, 50];
pub const IMAGE_PRESETS: [u64; 5] = [35, 100, 250, 500, 1_000];

pub fn presets(kind: ResourceKind) -> &'static [u64] {
    match kind {
        ResourceKind::Storage => &STORAGE_PRESETS_MB,
        ResourceKind::Tokens => &TOKEN_PRESETS,
        ResourceKind::Websites => &WEBSITE_PRESETS,
        ResourceKind::Images => &IMAGE_PRESETS,
    }
}

/// Requested deltas plus billing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopUpForm {
    /// Storage delta in MB
    pub storage: u64,
    pub tokens: u64,
    pub websites: u64,
    pub images: u64,
    pub amount: f64,
    pub currency: Currency,
}

impl TopUpForm {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Storage => self.storage,
            ResourceKind::Tokens => self.tokens,
            ResourceKind::Websites => self.websites,
            ResourceKind::Images => self.images,
        }
    }

    /// Custom quantity for one resource.
    pub fn set(&mut self, kind: ResourceKind, value: u64) {
        match kind {
            ResourceKind::Storage => self.storage = value,
            ResourceKind::Tokens => self.tokens = value,
            ResourceKind::Websites => self.websites = value,
            ResourceKind::Images => self.images = value,
        }
    }

    /// Pick the `index`-th preset (0-based) for a resource.
    pub fn select_preset(&mut self, kind: ResourceKind, index: usize) -> Result<()> {
        let options = presets(kind);
        let value = options.get(index).copied().ok_or_else(|| {
            Error::Validation(format!(
                "No preset #{} for {} (choose 1-{})",
                index + 1,
                kind,
                options.len()
            ))
        })?;
        self.set(kind, value);
        Ok(())
    }

    /// True when every resource delta is zero, whatever the amount.
    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|k| self.get(*k) == 0)
    }

    /// Non-zero deltas rendered for the summary panel.
    pub fn summary(&self) -> Vec<(ResourceKind, String)> {
        ResourceKind::ALL
            .iter()
            .filter(|k| self.get(**k) > 0)
            .map(|k| (*k, format!("+{}", k.format_amount(self.get(*k) as i64))))
            .collect()
    }

    pub fn to_payload(&self, agency_id: u64) -> TopUpPayload {
        TopUpPayload {
            id: agency_id,
            top_up: true,
            storage: self.storage,
            token_count: self.tokens,
            website_count: self.websites,
            image_count: self.images,
            amount: self.amount,
            currency: self.currency,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopUpState {
    Editing,
    Confirming { requested_mb: u64, available_mb: u64 },
    Submitted(Agency),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Storage request exceeds platform capacity; waiting for the operator.
    NeedsConfirmation { requested_mb: u64, available_mb: u64 },
    /// Backend applied the top-up and returned the updated agency.
    Submitted(Agency),
}

pub struct TopUpWorkflow {
    agency_id: u64,
    agency_name: String,
    form: TopUpForm,
    state: TopUpState,
    pending: bool,
    last_error: Option<String>,
}

impl TopUpWorkflow {
    /// Open the workflow for an agency with a blank form.
    pub fn new(agency: &Agency) -> Self {
        TopUpWorkflow {
            agency_id: agency.id,
            agency_name: agency.name.clone(),
            form: TopUpForm::default(),
            state: TopUpState::Editing,
            pending: false,
            last_error: None,
        }
    }

    pub fn agency_id(&self) -> u64 {
        self.agency_id
    }

    pub fn agency_name(&self) -> &str {
        &self.agency_name
    }

    pub fn form(&self) -> &TopUpForm {
        &self.form
    }

    /// Editable form; only available while editing.
    pub fn form_mut(&mut self) -> Result<&mut TopUpForm> {
        match self.state {
            TopUpState::Editing => Ok(&mut self.form),
            _ => Err(Error::Workflow("form is not editable".to_string())),
        }
    }

    pub fn state(&self) -> &TopUpState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn payload(&self) -> TopUpPayload {
        self.form.to_payload(self.agency_id)
    }

    /// Submit from `Editing`.
    ///
    /// `available_mb` is the platform's unallotted storage; `None` skips the
    /// overdraft check. Invalid forms fail without touching the network.
    pub fn submit<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
        available_mb: Option<u64>,
    ) -> Result<SubmitOutcome> {
        if self.state != TopUpState::Editing {
            return Err(Error::Workflow("top-up is not in the editing state".to_string()));
        }

        if let Err(e) = validate_top_up(&self.form) {
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        if let Some(available) = available_mb {
            if self.form.storage > available {
                tracing::info!(
                    requested_mb = self.form.storage,
                    available_mb = available,
                    "storage top-up exceeds platform capacity"
                );
                self.state = TopUpState::Confirming {
                    requested_mb: self.form.storage,
                    available_mb: available,
                };
                return Ok(SubmitOutcome::NeedsConfirmation {
                    requested_mb: self.form.storage,
                    available_mb: available,
                });
            }
        }

        self.send(api, cache)
    }

    /// Submit with the capacity figure taken from the cached system storage.
    /// If that figure cannot be fetched the check is skipped.
    pub fn submit_checked<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
    ) -> Result<SubmitOutcome> {
        let available = if self.form.storage > 0 {
            match cache.system_storage(api) {
                Ok(system) => Some(system.available_mb()),
                Err(Error::Unauthorized) => return Err(Error::Unauthorized),
                Err(e) => {
                    tracing::warn!(error = %e, "system storage unavailable; skipping capacity check");
                    None
                }
            }
        } else {
            None
        };
        self.submit(api, cache, available)
    }

    /// Proceed past the overdraft warning.
    pub fn proceed<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
    ) -> Result<SubmitOutcome> {
        if !matches!(self.state, TopUpState::Confirming { .. }) {
            return Err(Error::Workflow("no overdraft confirmation pending".to_string()));
        }
        self.send(api, cache)
    }

    /// Leave the overdraft warning and keep editing.
    pub fn back_to_editing(&mut self) {
        if matches!(self.state, TopUpState::Confirming { .. }) {
            self.state = TopUpState::Editing;
        }
    }

    fn send<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
    ) -> Result<SubmitOutcome> {
        if self.pending {
            return Err(Error::Workflow("top-up already in progress".to_string()));
        }
        self.pending = true;
        let payload = self.payload();
        tracing::info!(
            agency_id = payload.id,
            storage = payload.storage,
            tokens = payload.token_count,
            websites = payload.website_count,
            images = payload.image_count,
            "submitting top-up"
        );
        let result = api.top_up(&payload);
        self.pending = false;

        match result {
            Ok(agency) => {
                self.last_error = None;
                self.state = TopUpState::Submitted(agency.clone());
                cache.record(Mutation::TopUp);
                Ok(SubmitOutcome::Submitted(agency))
            }
            Err(e) => {
                tracing::warn!(error = %e, agency_id = payload.id, "top-up failed");
                self.state = TopUpState::Editing;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
