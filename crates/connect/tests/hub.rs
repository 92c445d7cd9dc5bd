// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Page-load scenarios against an in-process fake of the host platform API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::Barrier;

use omni_connect::api::types::Credentials;
use omni_connect::api::ApiClient;
use omni_connect::connection::ProviderState;
use omni_connect::error::{Failure, Notice};
use omni_connect::events::ConnectEvent;
use omni_connect::hub::{Hub, Screen};
use omni_connect::provider::ProviderKind;
use omni_connect::redirect::{Location, MemoryLocation};
use omni_connect::render::render;

const SESSION: &str = "/api/v1/auth/user/detail";
const LOGIN: &str = "/api/v1/auth/public/login";
const META_STATUS: &str = "/api/v1/connect/meta/user/status";
const META_BEGIN: &str = "/api/v1/connect/user/meta";
const META_DETAIL: &str = "/api/v1/connect/meta/user/detail";
const META_PAGES: &str = "/api/v1/connect/meta/page";
const GOOGLE_STATUS: &str = "/api/v1/connect/google/user/status";
const GOOGLE_DETAIL: &str = "/api/v1/connect/google/user/detail";
const GOOGLE_ACCOUNTS: &str = "/api/v1/connect/google/account";

const ADA: &str = r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com"}"#;
const ACTIVE: &str = r#"{"is_connected":true,"connection_status":"active","active_pages":1}"#;
const DISCONNECTED: &str = r#"{"is_connected":false}"#;
const TWO: &str = r#"{"accounts":[
    {"account_id":"a","account_name":"Alpha","is_active":false},
    {"account_id":"b","account_name":"Beta","is_active":true,"account_token":"tok-b"}
]}"#;

#[derive(Default)]
struct Fake {
    routes: HashMap<(String, String), (u16, String)>,
    calls: Vec<String>,
    bodies: Vec<(String, String)>,
    status_barrier: Option<Arc<Barrier>>,
}

struct FakeApi {
    state: Arc<Mutex<Fake>>,
    base: String,
}

impl FakeApi {
    async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(Fake::default()));
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { state, base: format!("http://{addr}") })
    }

    fn with<T>(&self, f: impl FnOnce(&mut Fake) -> T) -> T {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn respond(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.with(|fake| {
            fake.routes.insert((method.to_owned(), path.to_owned()), (status, body.to_owned()))
        });
        self
    }

    fn signed_in(&self) -> &Self {
        self.respond("GET", SESSION, 200, ADA)
    }

    fn calls(&self) -> Vec<String> {
        self.with(|fake| fake.calls.clone())
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn bodies(&self, call: &str) -> Vec<String> {
        self.with(|fake| {
            fake.bodies.iter().filter(|(c, _)| c == call).map(|(_, b)| b.clone()).collect()
        })
    }

    fn hub(&self, page: &str) -> anyhow::Result<Hub<MemoryLocation>> {
        self.hub_with(page, &[ProviderKind::Meta, ProviderKind::Google])
    }

    fn hub_with(&self, page: &str, kinds: &[ProviderKind]) -> anyhow::Result<Hub<MemoryLocation>> {
        let api = ApiClient::new(&self.base, None, Some(Duration::from_secs(10)));
        let location = MemoryLocation::new(Url::parse(page)?);
        Ok(Hub::new(api, kinds, location))
    }
}

async fn handle(
    State(state): State<Arc<Mutex<Fake>>>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    let call = format!("{method} {uri}");
    let path = uri.path().to_owned();
    let (barrier, response) = {
        let mut fake = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        fake.calls.push(call.clone());
        fake.bodies.push((format!("{method} {path}"), body));
        let barrier =
            if path.ends_with("/user/status") { fake.status_barrier.clone() } else { None };
        let response = fake.routes.get(&(method.to_string(), path)).cloned();
        (barrier, response)
    };

    if let Some(barrier) = barrier {
        if tokio::time::timeout(Duration::from_secs(3), barrier.wait()).await.is_err() {
            return (StatusCode::INTERNAL_SERVER_ERROR, "{}".to_owned());
        }
    }

    match response {
        Some((status, body)) => {
            (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
        }
        None => (StatusCode::NOT_FOUND, "{}".to_owned()),
    }
}

fn state_of(hub: &Hub<MemoryLocation>, kind: ProviderKind) -> Option<ProviderState> {
    hub.provider(kind).map(|p| p.state())
}

fn selection_of(hub: &Hub<MemoryLocation>, kind: ProviderKind) -> Vec<String> {
    hub.provider(kind)
        .map(|p| p.resources().selection().iter().cloned().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn no_session_shows_login_and_skips_providers() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.respond("GET", SESSION, 401, r#"{"message":"unauthorized"}"#);
    let mut hub = fake.hub("http://app.test/connect?code=abc&provider=meta")?;

    hub.load().await;

    assert_eq!(hub.screen(), Screen::Login);
    assert!(hub.session().is_none());
    assert_eq!(hub.location().navigated(), None);
    assert_eq!(fake.calls(), vec![format!("GET {SESSION}")]);
    assert!(render(&hub).contains("sign in required"));
    Ok(())
}

#[tokio::test]
async fn statuses_reconcile_concurrently() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, ACTIVE)
        .respond("GET", GOOGLE_STATUS, 200, ACTIVE)
        .respond("GET", META_PAGES, 200, TWO)
        .respond("GET", GOOGLE_ACCOUNTS, 200, r#"{"accounts":[]}"#);
    // Each status probe waits for the other; a sequential load would time out.
    fake.with(|f| f.status_barrier = Some(Arc::new(Barrier::new(2))));
    let mut hub = fake.hub("http://app.test/connect")?;

    hub.load().await;

    assert_eq!(hub.screen(), Screen::Hub);
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Manage));
    assert_eq!(state_of(&hub, ProviderKind::Google), Some(ProviderState::Manage));
    assert_eq!(selection_of(&hub, ProviderKind::Meta), ["b"]);

    let google = hub.provider(ProviderKind::Google);
    let notice = google.and_then(|p| p.resources().notice()).map(|n| n.message().to_owned());
    assert_eq!(notice.as_deref(), Some("No locations connected yet."));
    Ok(())
}

#[tokio::test]
async fn code_redirect_exchanges_once_and_selects_everything() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("POST", GOOGLE_DETAIL, 200, r#"{"google_user_name":"Ada L"}"#)
        .respond("POST", GOOGLE_ACCOUNTS, 200, TWO)
        .respond("GET", GOOGLE_STATUS, 200, ACTIVE)
        .respond("GET", META_STATUS, 200, DISCONNECTED);
    let mut hub = fake.hub("http://app.test/connect?code=one-time&provider=google")?;
    let mut events = hub.subscribe();

    hub.load().await;

    assert_eq!(hub.location().navigated(), None);
    assert_eq!(hub.location().href().to_string(), "http://app.test/connect");
    assert_eq!(fake.count(&format!("POST {GOOGLE_DETAIL}")), 1);
    assert_eq!(fake.count(&format!("POST {GOOGLE_DETAIL}?token=one-time")), 1);
    assert_eq!(fake.count(&format!("POST {META_DETAIL}")), 0);

    assert_eq!(state_of(&hub, ProviderKind::Google), Some(ProviderState::Success));
    assert_eq!(selection_of(&hub, ProviderKind::Google), ["a", "b"]);
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Idle));

    let snapshot = render(&hub);
    assert!(snapshot.contains("connected as Ada L"), "{snapshot}");
    assert!(snapshot.contains("[x] b Beta token=tok-b"), "{snapshot}");

    let mut saw_session = false;
    while let Ok(event) = events.try_recv() {
        if event == (ConnectEvent::SessionChanged { signed_in: true }) {
            saw_session = true;
        }
    }
    assert!(saw_session);

    // A second load on the same page is a no-op.
    let before = fake.calls().len();
    hub.load().await;
    assert_eq!(fake.calls().len(), before);
    Ok(())
}

#[tokio::test]
async fn error_redirect_never_exchanges() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond(
            "GET",
            META_STATUS,
            200,
            r#"{"is_connected":true,"connection_status":"needs_reauth","days_until_expiry":0}"#,
        )
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED);
    let mut hub = fake.hub("http://app.test/connect?error=access_denied&code=abc")?;

    hub.load().await;

    assert_eq!(fake.count(&format!("POST {META_DETAIL}")), 0);
    assert_eq!(fake.count(&format!("POST {GOOGLE_DETAIL}")), 0);
    assert_eq!(fake.count(&format!("GET {META_STATUS}")), 1);

    let meta = hub.provider(ProviderKind::Meta);
    assert_eq!(meta.map(|p| p.state()), Some(ProviderState::NeedsReauth));
    assert_eq!(meta.and_then(|p| p.notice()), Some(&Notice::AuthorisationCancelled));
    assert!(render(&hub).contains("Authorisation was cancelled."));
    assert_eq!(hub.location().href().to_string(), "http://app.test/connect");
    Ok(())
}

#[tokio::test]
async fn plain_load_never_exchanges() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, r#"{"is_connected":true,"connection_status":"revoked"}"#);
    let mut hub = fake.hub("http://app.test/connect?tab=1")?;

    hub.load().await;

    assert_eq!(fake.count(&format!("POST {META_DETAIL}")), 0);
    assert_eq!(fake.count(&format!("POST {GOOGLE_DETAIL}")), 0);
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Idle));
    assert_eq!(state_of(&hub, ProviderKind::Google), Some(ProviderState::Idle));
    assert_eq!(hub.location().href().to_string(), "http://app.test/connect?tab=1");
    Ok(())
}

#[tokio::test]
async fn expired_session_at_begin_connect_returns_to_login() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED)
        .respond("POST", META_BEGIN, 401, "{}");
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    assert_eq!(hub.screen(), Screen::Hub);

    let result = hub.connect(ProviderKind::Meta).await;

    assert_eq!(result, Err(Failure::ExpiredSession));
    assert_eq!(hub.screen(), Screen::Login);
    assert!(hub.session().is_none());
    assert_eq!(hub.login_notice(), Some(&Notice::SessionExpired));
    assert_ne!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Loading));
    assert_eq!(hub.location().navigated(), None);
    Ok(())
}

#[tokio::test]
async fn begin_connect_navigates_away() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED)
        .respond("POST", META_BEGIN, 200, r#"{"url":"https://www.facebook.com/dialog/oauth?x=1"}"#);
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    let mut events = hub.subscribe();

    let url = hub.connect(ProviderKind::Meta).await?;

    assert_eq!(url.as_str(), "https://www.facebook.com/dialog/oauth?x=1");
    assert_eq!(hub.location().navigated(), Some(&url));
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Loading));

    let mut navigated = None;
    while let Ok(event) = events.try_recv() {
        if let ConnectEvent::Navigate { url } = event {
            navigated = Some(url);
        }
    }
    assert_eq!(navigated.as_deref(), Some("https://www.facebook.com/dialog/oauth?x=1"));
    Ok(())
}

#[tokio::test]
async fn disconnect_clears_even_when_revoke_fails() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, ACTIVE)
        .respond("GET", META_PAGES, 200, TWO)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED)
        .respond("DELETE", META_DETAIL, 500, r#"{"message":"boom"}"#);
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Manage));

    hub.disconnect(ProviderKind::Meta).await?;

    assert_eq!(fake.count(&format!("DELETE {META_DETAIL}")), 1);
    let meta = hub.provider(ProviderKind::Meta);
    assert_eq!(meta.map(|p| p.state()), Some(ProviderState::Idle));
    assert!(meta.is_some_and(|p| p.status().is_none()));
    assert!(meta.is_some_and(|p| p.provider_user().is_none()));
    assert!(meta.is_some_and(|p| p.resources().accounts().is_empty()));
    assert!(selection_of(&hub, ProviderKind::Meta).is_empty());
    assert!(meta.is_some_and(|p| p.notice().is_none()));
    Ok(())
}

#[tokio::test]
async fn save_sends_selection_verbatim_and_keeps_it_on_failure() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED)
        .respond("GET", META_PAGES, 200, TWO)
        .respond("PATCH", META_PAGES, 200, "{}");
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;

    hub.manage(ProviderKind::Meta).await?;
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Manage));
    assert!(hub.toggle(ProviderKind::Meta, "a")?);
    assert!(!hub.toggle(ProviderKind::Meta, "unknown")?);
    hub.save(ProviderKind::Meta).await?;

    let patch = format!("PATCH {META_PAGES}");
    let sent: Vec<serde_json::Value> =
        fake.bodies(&patch).iter().filter_map(|b| serde_json::from_str(b).ok()).collect();
    assert_eq!(sent, vec![serde_json::json!({ "accountIds": ["b", "a"] })]);

    fake.respond("PATCH", META_PAGES, 500, "{}");
    assert!(!hub.toggle(ProviderKind::Meta, "b")?);
    assert!(hub.save(ProviderKind::Meta).await.is_err());
    assert_eq!(selection_of(&hub, ProviderKind::Meta), ["a"]);
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Manage));
    Ok(())
}

#[tokio::test]
async fn resync_seeds_from_server_activity() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, ACTIVE)
        .respond("GET", META_PAGES, 200, TWO)
        .respond("POST", META_PAGES, 200, TWO)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED);
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    hub.toggle(ProviderKind::Meta, "a")?;
    assert_eq!(selection_of(&hub, ProviderKind::Meta), ["b", "a"]);

    hub.resync(ProviderKind::Meta).await?;

    assert_eq!(selection_of(&hub, ProviderKind::Meta), ["b"]);
    Ok(())
}

#[tokio::test]
async fn login_then_reconcile() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.respond("GET", SESSION, 401, "{}")
        .respond("POST", LOGIN, 400, r#"{"message":"nope"}"#)
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED);
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    assert_eq!(hub.screen(), Screen::Login);

    let creds = Credentials::new("ada@example.com", "wrong");
    assert_eq!(hub.login(&creds).await, Err(Failure::IncorrectCredentials));
    assert_eq!(
        hub.login_notice().map(Notice::message),
        Some("Incorrect email or password.")
    );
    assert_eq!(hub.screen(), Screen::Login);

    fake.respond("POST", LOGIN, 200, ADA);
    hub.login(&Credentials::new("ada@example.com", "right")).await?;

    assert_eq!(hub.screen(), Screen::Hub);
    assert!(hub.login_notice().is_none());
    assert_eq!(fake.count(&format!("GET {META_STATUS}")), 1);
    assert_eq!(fake.count(&format!("GET {GOOGLE_STATUS}")), 1);
    assert!(render(&hub).contains("signed in as Ada Lovelace"));

    let sent = fake.bodies(&format!("POST {LOGIN}"));
    let last: Option<serde_json::Value> = sent.last().and_then(|b| serde_json::from_str(b).ok());
    assert_eq!(
        last,
        Some(serde_json::json!({ "Email": "ada@example.com", "Password": "right" }))
    );
    Ok(())
}

#[tokio::test]
async fn signed_out_operations_never_reach_the_api() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.respond("GET", SESSION, 401, "{}")
        .respond("DELETE", META_DETAIL, 200, "{}")
        .respond("POST", META_PAGES, 200, TWO)
        .respond("PATCH", META_PAGES, 200, "{}")
        .respond("POST", META_BEGIN, 200, r#"{"url":"https://www.facebook.com/dialog/oauth"}"#);
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    assert_eq!(hub.screen(), Screen::Login);

    assert_eq!(hub.disconnect(ProviderKind::Meta).await, Err(Failure::SignedOut));
    assert_eq!(hub.resync(ProviderKind::Meta).await, Err(Failure::SignedOut));
    assert_eq!(hub.save(ProviderKind::Meta).await, Err(Failure::SignedOut));
    assert_eq!(hub.manage(ProviderKind::Meta).await, Err(Failure::SignedOut));
    assert_eq!(hub.connect(ProviderKind::Meta).await, Err(Failure::SignedOut));
    assert_eq!(hub.toggle(ProviderKind::Meta, "a"), Err(Failure::SignedOut));
    assert_eq!(hub.back(ProviderKind::Meta), Err(Failure::SignedOut));

    assert_eq!(fake.calls(), vec![format!("GET {SESSION}")]);
    assert_eq!(hub.screen(), Screen::Login);
    assert_eq!(hub.location().navigated(), None);
    Ok(())
}

#[tokio::test]
async fn expired_session_blocks_later_operations() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("GET", META_STATUS, 200, DISCONNECTED)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED)
        .respond("POST", META_BEGIN, 401, "{}");
    let mut hub = fake.hub("http://app.test/")?;
    hub.load().await;
    assert_eq!(hub.connect(ProviderKind::Meta).await, Err(Failure::ExpiredSession));

    let before = fake.calls().len();
    assert_eq!(hub.disconnect(ProviderKind::Google).await, Err(Failure::SignedOut));
    assert_eq!(fake.calls().len(), before);
    Ok(())
}

#[tokio::test]
async fn code_for_disabled_provider_goes_to_primary() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond("POST", META_DETAIL, 200, r#"{"meta_user_name":"Ada"}"#)
        .respond("POST", META_PAGES, 200, TWO)
        .respond("GET", META_STATUS, 200, ACTIVE);
    let mut hub = fake.hub_with("http://app.test/?code=one&provider=google", &[ProviderKind::Meta])?;

    hub.load().await;

    assert_eq!(fake.count(&format!("POST {META_DETAIL}?token=one")), 1);
    assert_eq!(fake.count(&format!("POST {GOOGLE_DETAIL}")), 0);
    assert_eq!(state_of(&hub, ProviderKind::Meta), Some(ProviderState::Success));
    assert_eq!(hub.location().href().to_string(), "http://app.test/");
    Ok(())
}

#[tokio::test]
async fn numeric_provider_id_keeps_connection_active() -> anyhow::Result<()> {
    let fake = FakeApi::start().await?;
    fake.signed_in()
        .respond(
            "GET",
            META_STATUS,
            200,
            r#"{"is_connected":true,"connection_status":"active","meta_user_id":1234567890,"active_pages":-1}"#,
        )
        .respond("GET", META_PAGES, 200, r#"{"accounts":[{"account_id":99,"is_active":true},{"account_id":null}]}"#)
        .respond("GET", GOOGLE_STATUS, 200, DISCONNECTED);
    let mut hub = fake.hub("http://app.test/")?;

    hub.load().await;

    let meta = hub.provider(ProviderKind::Meta);
    assert_eq!(meta.map(|p| p.state()), Some(ProviderState::Manage));
    assert_eq!(
        meta.and_then(|p| p.status()).and_then(|s| s.provider_user_id.as_deref()),
        Some("1234567890")
    );
    assert_eq!(selection_of(&hub, ProviderKind::Meta), ["99"]);
    Ok(())
}
