use crate::api::{ApiClient, Transport};
use crate::cache::{Mutation, QueryCache};
use crate::error::Result;
use crate::state::{Agency, CreateAgencyPayload, Currency};
use crate::workflow::validation::validate_create_agency;

/// Registration form for a new agency with its initial allocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateAgencyForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Initial storage in MB
    pub storage: u64,
    pub tokens: u64,
    pub websites: u64,
    pub images: u64,
    pub amount: f64,
    pub currency: Currency,
    pub notes: Option<String>,
}

impl CreateAgencyForm {
    pub fn to_payload(&self, parent_user_id: u64) -> CreateAgencyPayload {
        CreateAgencyPayload {
            email: self.email.trim().to_string(),
            user_role: "Agency",
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            storage: self.storage,
            token_count: self.tokens,
            website_count: self.websites,
            image_count: self.images,
            amount: self.amount,
            currency: self.currency,
            parent_user_id,
            notes: self
                .notes
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        }
    }

    /// Validate, register under the signed-in operator, invalidate.
    pub fn submit<T: Transport>(
        &self,
        api: &mut ApiClient<T>,
        cache: &mut QueryCache,
    ) -> Result<Agency> {
        validate_create_agency(self)?;
        let parent = api.session().require_user()?.id;
        let payload = self.to_payload(parent);

        tracing::info!(name = %payload.name, "creating agency");
        let agency = api.create_agency(&payload)?;
        cache.record(Mutation::CreateAgency);
        Ok(agency)
    }
}
