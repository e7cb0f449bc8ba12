//! Tenant-side projects view: quota cards and the site list.

use crate::state::{CustomerDashboard, ResourceKind};
use serde::Serialize;

/// One summary card above the project list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaCard {
    pub title: &'static str,
    pub value: String,
    pub total: String,
}

impl QuotaCard {
    pub fn text(&self) -> String {
        format!("{}: {} / {}", self.title, self.value, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRow {
    pub site_id: u64,
    pub name: String,
    pub customer: String,
    pub status: &'static str,
    pub public_url: String,
    pub editor_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectsView {
    pub cards: Vec<QuotaCard>,
    pub projects: Vec<ProjectRow>,
}

/// MB to GB on a 1024 base with two decimals, as the tenant UI shows space.
fn gigabytes(mb: i64) -> String {
    format!("{:.2} GB", mb as f64 / 1024.0)
}

pub fn quota_cards(dashboard: &CustomerDashboard) -> Vec<QuotaCard> {
    let quota = &dashboard.agency_data;
    let websites = quota.pair(ResourceKind::Websites);
    let tokens = quota.pair(ResourceKind::Tokens);
    let storage = quota.pair(ResourceKind::Storage);
    let images = quota.pair(ResourceKind::Images);

    vec![
        QuotaCard {
            title: "Websites",
            value: websites.used().to_string(),
            total: websites.total.max(0).to_string(),
        },
        QuotaCard {
            title: "AI tokens",
            value: tokens.used().to_string(),
            total: tokens.total.max(0).to_string(),
        },
        QuotaCard {
            title: "Space used",
            value: gigabytes(storage.used()),
            total: gigabytes(storage.total.max(0)),
        },
        // Images are shown as what is left, not what is used.
        QuotaCard {
            title: "Image credits left",
            value: images.remaining.max(0).to_string(),
            total: images.total.max(0).to_string(),
        },
    ]
}

pub fn build(dashboard: &CustomerDashboard) -> ProjectsView {
    let projects = dashboard
        .sites()
        .map(|(customer, site)| ProjectRow {
            site_id: site.id,
            name: site.name.clone(),
            customer: customer.name.clone(),
            status: site.status_label(),
            public_url: site.public_url(),
            editor_url: site.editor_url(),
        })
        .collect();

    ProjectsView {
        cards: quota_cards(dashboard),
        projects,
    }
}
