// In-process stand-in for the Ably REST service
//
// Stores published messages per channel and serves history with Ably-style
// `Link` headers, so pagination can be exercised without network access.

#![allow(dead_code)]

use ably_rest::auth::AuthMode;
use ably_rest::http::{AblyHttpClient, HttpConfig};
use ably_rest::logging::{init_logging, LogConfig, LogLevel};
use ably_rest::{ClientOptions, RestChannel, RestClient};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

pub const TEST_KEY: &str = "fake.app:secret";
pub const TEST_TOKEN: &str = "test-token";

/// Channel whose history body is not JSON
pub const MALFORMED_CHANNEL: &str = "malformed";
/// Channel whose every request fails with a plain-text 500
pub const BROKEN_CHANNEL: &str = "broken";

const FIRST_TIMESTAMP: i64 = 1_700_000_000_000;

static LOGGING: Once = Once::new();

pub fn init_test_logging() {
    LOGGING.call_once(|| {
        init_logging(LogConfig::builder().level(LogLevel::Debug).build());
    });
}

/// A request as seen by the fake service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    channels: HashMap<String, Vec<Value>>,
    presence: HashMap<String, Vec<Value>>,
    requests: Vec<RecordedRequest>,
    next_timestamp: i64,
}

#[derive(Clone, Default)]
struct FakeState {
    inner: Arc<Mutex<Inner>>,
}

pub struct FakeAbly {
    addr: SocketAddr,
    state: FakeState,
}

impl FakeAbly {
    pub async fn start() -> Self {
        init_test_logging();

        let state = FakeState::default();
        state.inner.lock().unwrap().next_timestamp = FIRST_TIMESTAMP;

        let app = Router::new()
            .route("/time", get(time))
            .route("/channels/{channel}/messages", get(history).post(publish))
            .route("/channels/{channel}/presence", get(presence_get))
            .route("/channels/{channel}/presence/history", get(presence_history))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Options pointing at this service, authenticated with a token
    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            token: Some(TEST_TOKEN.to_string()),
            rest_host: Some(self.addr.ip().to_string()),
            port: Some(self.addr.port()),
            tls: false,
            ..Default::default()
        }
    }

    pub fn client(&self) -> RestClient {
        RestClient::new(self.options()).unwrap()
    }

    pub fn channel(&self, name: &str) -> RestChannel {
        self.client().channel(name).unwrap()
    }

    /// A basic-auth client; basic auth is refused over plain HTTP by
    /// `ClientOptions`, so the HTTP client is assembled directly.
    pub fn basic_client(&self, options: &ClientOptions) -> RestClient {
        let config = HttpConfig::builder().base_url(self.base_url()).build();
        let auth = AuthMode::api_key(TEST_KEY).unwrap();
        let http = AblyHttpClient::new(config, auth).unwrap();
        RestClient::from_http_client(http, options)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.inner.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    /// Raw stored messages, oldest first
    pub fn stored(&self, channel: &str) -> Vec<Value> {
        self.state
            .inner
            .lock()
            .unwrap()
            .channels
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed_presence(&self, channel: &str, events: Vec<Value>) {
        self.state
            .inner
            .lock()
            .unwrap()
            .presence
            .insert(channel.to_string(), events);
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    direction: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
    offset: Option<usize>,
}

fn record(
    state: &FakeState,
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: Option<Value>,
) {
    let headers = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    state.inner.lock().unwrap().requests.push(RecordedRequest {
        method,
        path,
        query,
        headers,
        body,
    });
}

/// Which client id the credentials carry, or an error response
fn authenticate(headers: &HeaderMap) -> Result<Option<String>, Response> {
    let engine = base64::engine::general_purpose::STANDARD;
    let expected_basic = format!("Basic {}", engine.encode(TEST_KEY));
    let expected_bearer = format!("Bearer {}", engine.encode(TEST_TOKEN));

    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match authorization {
        Some(value) if value == expected_basic => Ok(headers
            .get("x-ably-clientid")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| engine.decode(v).ok())
            .and_then(|v| String::from_utf8(v).ok())),
        Some(value) if value == expected_bearer => Ok(None),
        _ => Err(ably_error(StatusCode::UNAUTHORIZED, 40101, "Invalid credentials")),
    }
}

fn ably_error(status: StatusCode, code: u32, message: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("x-ably-errorcode", HeaderValue::from(code));
    let body = json!({
        "error": {"code": code, "statusCode": status.as_u16(), "message": message}
    });
    (status, headers, Json(body)).into_response()
}

fn query_map(raw: &Option<String>) -> HashMap<String, String> {
    raw.as_deref()
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

async fn time(State(state): State<FakeState>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/time".to_string(), HashMap::new(), &headers, None);
    Json(json!([FIRST_TIMESTAMP])).into_response()
}

async fn publish(
    State(state): State<FakeState>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let parsed: Option<Value> = serde_json::from_slice(&body).ok();
    record(
        &state,
        "POST",
        format!("/channels/{}/messages", channel),
        HashMap::new(),
        &headers,
        parsed.clone(),
    );

    let client_id = match authenticate(&headers) {
        Ok(client_id) => client_id,
        Err(response) => return response,
    };
    if channel == BROKEN_CHANNEL {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let messages = match parsed {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => return ably_error(StatusCode::BAD_REQUEST, 40001, "Invalid request body"),
    };

    let mut inner = state.inner.lock().unwrap();
    let mut stored = Vec::with_capacity(messages.len());
    for (index, mut message) in messages.into_iter().enumerate() {
        let timestamp = inner.next_timestamp;
        inner.next_timestamp += 1;

        let object = message.as_object_mut().unwrap();
        object
            .entry("id")
            .or_insert_with(|| json!(format!("srv{}:{}", timestamp, index)));
        object.insert("timestamp".to_string(), json!(timestamp));
        if let Some(client_id) = &client_id {
            object
                .entry("clientId")
                .or_insert_with(|| json!(client_id));
        }
        stored.push(message);
    }
    inner.channels.entry(channel).or_default().extend(stored);

    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn history(
    State(state): State<FakeState>,
    Path(channel): Path<String>,
    Query(query): Query<PageQuery>,
    axum::extract::RawQuery(raw): axum::extract::RawQuery,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "GET",
        format!("/channels/{}/messages", channel),
        query_map(&raw),
        &headers,
        None,
    );

    if let Err(response) = authenticate(&headers) {
        return response;
    }
    match channel.as_str() {
        MALFORMED_CHANNEL => return (StatusCode::OK, "this is not json").into_response(),
        BROKEN_CHANNEL => return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => {}
    }

    let items = state
        .inner
        .lock()
        .unwrap()
        .channels
        .get(&channel)
        .cloned()
        .unwrap_or_default();
    paginate(items, &query, "./messages")
}

async fn presence_get(
    State(state): State<FakeState>,
    Path(channel): Path<String>,
    axum::extract::RawQuery(raw): axum::extract::RawQuery,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "GET",
        format!("/channels/{}/presence", channel),
        query_map(&raw),
        &headers,
        None,
    );
    if let Err(response) = authenticate(&headers) {
        return response;
    }

    let members: Vec<Value> = state
        .inner
        .lock()
        .unwrap()
        .presence
        .get(&channel)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|event| event["action"] != json!(3))
        .collect();
    Json(members).into_response()
}

async fn presence_history(
    State(state): State<FakeState>,
    Path(channel): Path<String>,
    Query(query): Query<PageQuery>,
    axum::extract::RawQuery(raw): axum::extract::RawQuery,
    headers: HeaderMap,
) -> Response {
    record(
        &state,
        "GET",
        format!("/channels/{}/presence/history", channel),
        query_map(&raw),
        &headers,
        None,
    );
    if let Err(response) = authenticate(&headers) {
        return response;
    }

    let events = state
        .inner
        .lock()
        .unwrap()
        .presence
        .get(&channel)
        .cloned()
        .unwrap_or_default();
    paginate(events, &query, "./history")
}

/// Slice items the way Ably does and advertise `first`/`next` links.
///
/// `offset` plays the role of Ably's own opaque continuation values.
fn paginate(mut items: Vec<Value>, query: &PageQuery, resource: &str) -> Response {
    let limit = query.limit.unwrap_or(100);
    let direction = query.direction.clone().unwrap_or_else(|| "backwards".to_string());
    let offset = query.offset.unwrap_or(0);

    items.retain(|item| {
        let ts = item["timestamp"].as_i64().unwrap_or(0);
        query.start.map_or(true, |start| ts >= start) && query.end.map_or(true, |end| ts <= end)
    });
    if direction == "backwards" {
        items.reverse();
    }

    let total = items.len();
    let page: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();

    let mut base = vec![
        ("limit".to_string(), limit.to_string()),
        ("direction".to_string(), direction),
        ("format".to_string(), "json".to_string()),
    ];
    if let Some(start) = query.start {
        base.push(("start".to_string(), start.to_string()));
    }
    if let Some(end) = query.end {
        base.push(("end".to_string(), end.to_string()));
    }

    let link = |params: &[(String, String)], rel: &str| {
        let encoded = serde_urlencoded::to_string(params).unwrap();
        HeaderValue::from_str(&format!("<{}?{}>; rel=\"{}\"", resource, encoded, rel)).unwrap()
    };

    let mut headers = HeaderMap::new();
    headers.append(LINK, link(&base, "first"));
    if offset + limit < total {
        let mut next = base.clone();
        next.push(("offset".to_string(), (offset + limit).to_string()));
        headers.append(LINK, link(&next, "next"));
    }

    (StatusCode::OK, headers, Json(page)).into_response()
}
