use crate::api::{ApiClient, Transport};
use crate::cache::{Mutation, QueryCache};
use crate::error::{Error, Result};
use crate::state::{Agency, Site};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleKind {
    Suspend,
    Reactivate,
    Delete,
}

impl LifecycleKind {
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleKind::Suspend => "suspend",
            LifecycleKind::Reactivate => "reactivate",
            LifecycleKind::Delete => "delete",
        }
    }

    /// The toggle offered next to an item: suspend when active, otherwise
    /// reactivate.
    pub fn toggle_for(is_active: bool) -> Self {
        if is_active {
            LifecycleKind::Suspend
        } else {
            LifecycleKind::Reactivate
        }
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Button styling for the confirm action. Delete is irreversible and must
/// look different from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Default,
    Destructive,
}

/// What a lifecycle action is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Target {
    Agency { id: u64, name: String },
    Website { id: u64, name: String, host: String },
}

impl Target {
    pub fn id(&self) -> u64 {
        match self {
            Target::Agency { id, .. } | Target::Website { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Agency { name, .. } | Target::Website { name, .. } => name,
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            Target::Agency { .. } => "agency",
            Target::Website { .. } => "website",
        }
    }

    fn title_noun(&self) -> &'static str {
        match self {
            Target::Agency { .. } => "Agency",
            Target::Website { .. } => "Website",
        }
    }

    pub fn mutation(&self) -> Mutation {
        match self {
            Target::Agency { .. } => Mutation::AgencyLifecycle,
            Target::Website { .. } => Mutation::WebsiteLifecycle,
        }
    }
}

impl From<&Agency> for Target {
    fn from(agency: &Agency) -> Self {
        Target::Agency {
            id: agency.id,
            name: agency.name.clone(),
        }
    }
}

impl From<&Site> for Target {
    fn from(site: &Site) -> Self {
        Target::Website {
            id: site.id,
            name: site.name.clone(),
            host: site.host.clone(),
        }
    }
}

/// Result of pressing confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Request succeeded; dialog closed.
    Completed,
    /// Request failed; dialog stays open showing the message.
    Failed(String),
    /// A request is already in flight or the dialog is closed; nothing sent.
    Ignored,
}

/// Confirmation dialog for one lifecycle action.
///
/// Invariant: at most one request per dialog is in flight. `begin` flips the
/// pending flag and hands out the single permit; every later `begin` returns
/// `None` until `finish` clears it.
#[derive(Debug, Clone)]
pub struct ActionDialog {
    target: Target,
    kind: LifecycleKind,
    open: bool,
    pending: bool,
    error: Option<String>,
}

/// Permit to send the request for a dialog. Obtained from `begin`.
#[derive(Debug)]
pub struct PendingAction {
    pub target: Target,
    pub kind: LifecycleKind,
}

impl ActionDialog {
    pub fn open(target: Target, kind: LifecycleKind) -> Self {
        ActionDialog {
            target,
            kind,
            open: true,
            pending: false,
            error: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn kind(&self) -> LifecycleKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn confirm_enabled(&self) -> bool {
        self.open && !self.pending
    }

    pub fn title(&self) -> String {
        let verb = match self.kind {
            LifecycleKind::Suspend => "Suspend",
            LifecycleKind::Reactivate => "Reactivate",
            LifecycleKind::Delete => "Delete",
        };
        format!("{} {}", verb, self.target.title_noun())
    }

    pub fn confirm_label(&self) -> String {
        if self.pending {
            "Processing...".to_string()
        } else {
            self.title()
        }
    }

    /// Consequence text shown under the title.
    pub fn description(&self) -> String {
        let noun = self.target.noun();
        match self.kind {
            LifecycleKind::Delete => format!(
                "Are you sure you want to delete this {}? This action cannot be undone and will permanently remove all associated data.",
                noun
            ),
            LifecycleKind::Suspend => format!(
                "Are you sure you want to suspend this {}? The {} will be temporarily disabled until reactivated.",
                noun, noun
            ),
            LifecycleKind::Reactivate => format!(
                "Are you sure you want to reactivate this {}? The {} will be enabled again with full access.",
                noun, noun
            ),
        }
    }

    pub fn style(&self) -> ButtonStyle {
        match self.kind {
            LifecycleKind::Delete => ButtonStyle::Destructive,
            _ => ButtonStyle::Default,
        }
    }

    /// Take the permit to send. `None` while pending or once closed.
    pub fn begin(&mut self) -> Option<PendingAction> {
        if !self.confirm_enabled() {
            return None;
        }
        self.pending = true;
        self.error = None;
        Some(PendingAction {
            target: self.target.clone(),
            kind: self.kind,
        })
    }

    /// Record the result of the request started by `begin`.
    pub fn finish(&mut self, result: Result<()>) -> DialogOutcome {
        self.pending = false;
        match result {
            Ok(()) => {
                self.open = false;
                DialogOutcome::Completed
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(message.clone());
                DialogOutcome::Failed(message)
            }
        }
    }

    /// Close without acting. Ignored while a request is pending.
    pub fn cancel(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.open = false;
        true
    }

    /// Full confirm: send the request, invalidate dependents on success.
    pub fn confirm<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
    ) -> Result<DialogOutcome> {
        let Some(action) = self.begin() else {
            return Ok(DialogOutcome::Ignored);
        };
        let result = execute(api, cache, &action);
        if let Err(Error::Unauthorized) = &result {
            // Session is gone; the dialog cannot be retried from here.
            self.pending = false;
            self.open = false;
            return Err(Error::Unauthorized);
        }
        Ok(self.finish(result))
    }
}

/// Send the request for a permit and invalidate on success.
pub fn execute<T: Transport>(
    api: &mut ApiClient<T>,
    cache: &mut QueryCache,
    action: &PendingAction,
) -> Result<()> {
    tracing::info!(
        action = %action.kind,
        target = action.target.noun(),
        id = action.target.id(),
        "lifecycle action"
    );
    api.lifecycle(&action.target, action.kind)?;
    cache.record(action.target.mutation());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency_target() -> Target {
        Target::Agency {
            id: 3,
            name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_delete_is_destructive() {
        let d = ActionDialog::open(agency_target(), LifecycleKind::Delete);
        assert_eq!(d.style(), ButtonStyle::Destructive);
        assert_eq!(d.title(), "Delete Agency");
        assert!(d.description().contains("cannot be undone"));

        let s = ActionDialog::open(agency_target(), LifecycleKind::Suspend);
        assert_eq!(s.style(), ButtonStyle::Default);
        let r = ActionDialog::open(agency_target(), LifecycleKind::Reactivate);
        assert_eq!(r.style(), ButtonStyle::Default);
    }

    #[test]
    fn test_single_permit_while_pending() {
        let mut d = ActionDialog::open(agency_target(), LifecycleKind::Delete);
        assert!(d.begin().is_some());
        assert!(d.is_pending());
        assert!(!d.confirm_enabled());
        assert_eq!(d.confirm_label(), "Processing...");
        assert!(d.begin().is_none());
        assert!(!d.cancel());
    }

    #[test]
    fn test_failure_keeps_dialog_open() {
        let mut d = ActionDialog::open(agency_target(), LifecycleKind::Suspend);
        d.begin().unwrap();
        let outcome = d.finish(Err(Error::Rejected("Agency has open invoices".to_string())));
        assert_eq!(outcome, DialogOutcome::Failed("Agency has open invoices".to_string()));
        assert!(d.is_open());
        assert!(!d.is_pending());
        assert_eq!(d.error(), Some("Agency has open invoices"));
        // retry allowed
        assert!(d.begin().is_some());
        assert!(d.error().is_none());
    }

    #[test]
    fn test_success_closes_dialog() {
        let mut d = ActionDialog::open(agency_target(), LifecycleKind::Reactivate);
        d.begin().unwrap();
        assert_eq!(d.finish(Ok(())), DialogOutcome::Completed);
        assert!(!d.is_open());
        assert!(d.begin().is_none());
    }

    #[test]
    fn test_website_target_text() {
        let target = Target::Website {
            id: 9,
            name: "Shop".to_string(),
            host: "shop.test".to_string(),
        };
        let d = ActionDialog::open(target, LifecycleKind::Suspend);
        assert_eq!(d.title(), "Suspend Website");
        assert!(d.description().contains("suspend this website"));
        assert_eq!(d.target().mutation(), Mutation::WebsiteLifecycle);
    }

    #[test]
    fn test_toggle_for() {
        assert_eq!(LifecycleKind::toggle_for(true), LifecycleKind::Suspend);
        assert_eq!(LifecycleKind::toggle_for(false), LifecycleKind::Reactivate);
    }
}
