pub mod envelope;
pub mod transport;

pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::state::{
    sort_newest_first, Agency, CreateAgencyPayload, CustomerDashboard, SystemStorage,
    TopUpPayload, TopUpRecord, User,
};
use crate::workflow::lifecycle::{LifecycleKind, Target};
use serde::{Deserialize, Serialize};

/// Paths that may legitimately answer 401 without ending the session.
const AUTH_PATHS: [&str; 4] = ["/user/adminLogin", "/user/login", "/user/getotp", "/auth/"];

pub fn is_auth_endpoint(path: &str) -> bool {
    AUTH_PATHS.iter().any(|p| path.contains(p))
}

#[derive(Debug, Serialize)]
struct LoginCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<User>,
}

/// Typed client for the platform API.
///
/// Owns the session so that every request carries the current bearer token
/// and a rejected token is cleared in one place.
pub struct ApiClient<T: Transport> {
    transport: T,
    session: Session,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, session: Session) -> Self {
        ApiClient { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn admin_id(&self) -> Result<u64> {
        Ok(self.session.require_user()?.id)
    }

    /// Send one request. A 401 from a non-auth path expires the session
    /// (which redirects to login once) and surfaces as `Unauthorized`.
    fn execute(
        &mut self,
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            bearer: self.session.token().map(str::to_string),
            path,
            body,
        };

        tracing::debug!(method = %request.method, path = %request.path, "request");
        let response = self.transport.send(&request)?;
        tracing::debug!(status = response.status, path = %request.path, "response");

        if response.status == 401 && !is_auth_endpoint(&request.path) {
            self.session.expire();
            return Err(Error::Unauthorized);
        }

        Ok(response)
    }

    fn json_body<B: Serialize>(body: &B) -> Result<serde_json::Value> {
        serde_json::to_value(body)
            .map_err(|e| Error::Decode(format!("Failed to encode request: {}", e)))
    }

    /// `POST /user/adminLogin`; on success the session is established.
    pub fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let body = Self::json_body(&LoginCredentials { email, password })?;
        let response = self.execute(Method::Post, "/user/adminLogin".to_string(), Some(body))?;

        if !response.is_success() {
            return Err(envelope::http_error(&response));
        }

        let login: LoginResponse =
            serde_json::from_str(&response.body).map_err(|e| Error::Decode(e.to_string()))?;

        if !login.status {
            let message = if login.message.trim().is_empty() {
                "Login failed. Please check your credentials.".to_string()
            } else {
                login.message
            };
            return Err(Error::Rejected(message));
        }

        let (token, user) = match (login.token, login.data) {
            (Some(token), Some(user)) if !token.is_empty() => (token, user),
            _ => return Err(Error::Decode("login response lacks token or user".to_string())),
        };

        self.session.establish(token, user.clone())?;
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()
    }

    /// `GET /user/getAgency/{adminId}`, newest first.
    pub fn list_agencies(&mut self) -> Result<Vec<Agency>> {
        let admin_id = self.admin_id()?;
        let response = self.execute(Method::Get, format!("/user/getAgency/{}", admin_id), None)?;
        let mut agencies: Vec<Agency> =
            envelope::decode(&response, "Failed to fetch agencies.")?;
        sort_newest_first(&mut agencies);
        Ok(agencies)
    }

    /// `POST /user/register`
    pub fn create_agency(&mut self, payload: &CreateAgencyPayload) -> Result<Agency> {
        let body = Self::json_body(payload)?;
        let response = self.execute(Method::Post, "/user/register".to_string(), Some(body))?;
        envelope::decode(&response, "Failed to create agency.")
    }

    /// `PUT /user/topup`
    pub fn top_up(&mut self, payload: &TopUpPayload) -> Result<Agency> {
        let body = Self::json_body(payload)?;
        let response = self.execute(Method::Put, "/user/topup".to_string(), Some(body))?;
        envelope::decode(&response, "Failed to top up resources.")
    }

    /// Suspend, reactivate or delete an agency or a website.
    pub fn lifecycle(&mut self, target: &Target, kind: LifecycleKind) -> Result<()> {
        let (method, path) = lifecycle_route(target, kind);
        let response = self.execute(method, path, None)?;
        let fallback = format!("Failed to {} {}.", kind.verb(), target.noun());
        envelope::decode_ack(&response, &fallback)
    }

    /// `GET /user/getAgencyHistory/{adminId}`
    pub fn top_up_history(&mut self) -> Result<Vec<TopUpRecord>> {
        let admin_id = self.admin_id()?;
        let response = self.execute(
            Method::Get,
            format!("/user/getAgencyHistory/{}", admin_id),
            None,
        )?;
        envelope::decode(&response, "Failed to fetch top-up history.")
    }

    /// `GET /user/systemStorage`
    pub fn system_storage(&mut self) -> Result<SystemStorage> {
        let response = self.execute(Method::Get, "/user/systemStorage".to_string(), None)?;
        envelope::decode(&response, "Failed to fetch system storage.")
    }

    /// `GET /user/getCustomer/{userId}`: a tenant's quota summary and sites.
    pub fn customer_dashboard(&mut self, user_id: u64) -> Result<CustomerDashboard> {
        let response = self.execute(Method::Get, format!("/user/getCustomer/{}", user_id), None)?;
        envelope::decode(&response, "Failed to fetch dashboard data.")
    }
}

fn lifecycle_route(target: &Target, kind: LifecycleKind) -> (Method, String) {
    let prefix = match target {
        Target::Agency { .. } => "/user",
        Target::Website { .. } => "/site",
    };
    let id = target.id();
    match kind {
        LifecycleKind::Delete => (Method::Delete, format!("{}/delete/{}", prefix, id)),
        LifecycleKind::Suspend => (Method::Delete, format!("{}/suspend/{}", prefix, id)),
        LifecycleKind::Reactivate => (Method::Put, format!("{}/active/{}", prefix, id)),
    }
}
