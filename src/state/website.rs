use super::usage::{ResourceKind, ResourcePair};
use serde::{Deserialize, Serialize};

/// Storage plan assumed when the backend reports no storage total (50 GB).
pub const DEFAULT_PLAN_STORAGE_MB: i64 = 51_200;

/// Editor page opened when a site reports no home page.
pub const DEFAULT_HOME_PAGE_ID: u64 = 14;

/// A site owned by one of a tenant's customers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    #[serde(deserialize_with = "super::de_id")]
    pub id: u64,

    #[serde(rename = "websiteName", alias = "name", default)]
    pub name: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub home_page_id: Option<u64>,

    /// Per-site counters; older backends omit them.
    #[serde(default)]
    pub storage_used: Option<i64>,
    #[serde(default)]
    pub token_used: Option<i64>,
    #[serde(default)]
    pub image_used: Option<i64>,
}

impl Site {
    /// `https://<host>`, or the host unchanged when it already carries a
    /// scheme.
    pub fn public_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    /// A missing or zero home page id falls back to `DEFAULT_HOME_PAGE_ID`.
    pub fn home_page(&self) -> u64 {
        self.home_page_id
            .filter(|id| *id != 0)
            .unwrap_or(DEFAULT_HOME_PAGE_ID)
    }

    /// Page-builder edit link for the site's home page.
    pub fn editor_url(&self) -> String {
        format!(
            "{}/wp-admin/post.php?post={}&action=elementor",
            self.public_url(),
            self.home_page()
        )
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "suspended"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    #[serde(deserialize_with = "super::de_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSites {
    pub customer: Customer,
    #[serde(default)]
    pub sites: Vec<Site>,
}

/// Tenant-side quota summary (`agency_data`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantQuota {
    #[serde(default)]
    pub remaining_ai_token: i64,
    #[serde(default)]
    pub total_ai_token: i64,
    #[serde(default)]
    pub remaining_storage: i64,
    #[serde(default)]
    pub total_storage: Option<i64>,
    #[serde(default)]
    pub remaining_website_count: i64,
    #[serde(default)]
    pub total_website_count: i64,
    #[serde(default)]
    pub remaining_image_count: i64,
    #[serde(default)]
    pub total_images: i64,
}

impl TenantQuota {
    pub fn pair(&self, kind: ResourceKind) -> ResourcePair {
        match kind {
            ResourceKind::Storage => ResourcePair::new(
                self.remaining_storage,
                self.total_storage.unwrap_or(DEFAULT_PLAN_STORAGE_MB),
            ),
            ResourceKind::Tokens => {
                ResourcePair::new(self.remaining_ai_token, self.total_ai_token)
            }
            ResourceKind::Websites => {
                ResourcePair::new(self.remaining_website_count, self.total_website_count)
            }
            ResourceKind::Images => {
                ResourcePair::new(self.remaining_image_count, self.total_images)
            }
        }
    }
}

/// Payload of `GET /user/getCustomer/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerDashboard {
    #[serde(default)]
    pub agency_data: TenantQuota,
    #[serde(default)]
    pub customers: Vec<CustomerSites>,
}

impl CustomerDashboard {
    /// Every site across all customers, paired with its owner's name.
    pub fn sites(&self) -> impl Iterator<Item = (&Customer, &Site)> {
        self.customers
            .iter()
            .flat_map(|c| c.sites.iter().map(move |s| (&c.customer, s)))
    }

    pub fn find_site(&self, site_id: u64) -> Option<&Site> {
        self.sites().map(|(_, s)| s).find(|s| s.id == site_id)
    }
}
