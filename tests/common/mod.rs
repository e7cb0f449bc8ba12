#![allow(dead_code)]

pub use agency_console::api::transport::scripted::ScriptedTransport;

use agency_console::api::ApiClient;
use agency_console::session::{Navigator, Session};
use agency_console::state::User;
use agency_console::storage::{MemorySessionStore, SessionStore, StoredSession};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Counts login redirects.
#[derive(Clone, Default)]
pub struct CountingNavigator(pub Rc<Cell<usize>>);

impl Navigator for CountingNavigator {
    fn redirect_to_login(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

pub fn admin() -> User {
    User {
        id: 1,
        name: "Operator".to_string(),
        email: "ops@platform.test".to_string(),
    }
}

pub fn stored_admin() -> StoredSession {
    StoredSession {
        token: "token-1".to_string(),
        user: admin(),
    }
}

/// Signed-in client over a scripted transport.
pub fn signed_in(transport: &ScriptedTransport) -> (ApiClient<ScriptedTransport>, Rc<Cell<usize>>) {
    signed_in_with(transport, Box::new(MemorySessionStore::with_session(stored_admin())))
}

pub fn signed_in_with(
    transport: &ScriptedTransport,
    store: Box<dyn SessionStore>,
) -> (ApiClient<ScriptedTransport>, Rc<Cell<usize>>) {
    let redirects = Rc::new(Cell::new(0));
    let session = Session::hydrate(store, Box::new(CountingNavigator(redirects.clone())))
        .expect("hydrate session");
    (ApiClient::new(transport.clone(), session), redirects)
}

pub fn agency_json(id: u64, name: &str, created_at: &str, remaining_storage: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@agency.test", name.to_lowercase()),
        "phone": "555-0100",
        "is_active": true,
        "created_at": created_at,
        "storage": remaining_storage,
        "total_storage": 100000,
        "token_count": 50000,
        "total_token_count": 100000,
        "website_count": 3,
        "total_website_count": 5,
        "image_count": 20,
        "total_image_count": 35
    })
}
