//! REST Gateway
//!
//! Maps CRUD onto `{base}/{resource}` routes over an abstract transport.
//! The bearer credential is attached here and nowhere else.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Failure, Gateway, GatewayResult};
use crate::context::AuthContext;
use crate::schema::{Entity, EntityId};

// ========================
// Transport Abstraction
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Request/response exchange with the backend. Timeouts live here.
#[async_trait(?Send)]
pub trait Transport {
    /// `Err` only for failures with no HTTP response (network, TLS, ...)
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// `reqwest`-backed transport
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}

// ========================
// Gateway
// ========================

/// Collection endpoints answer either a bare payload or `{ "data": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

pub struct RestGateway<E, T> {
    base_url: String,
    auth: Rc<AuthContext>,
    transport: T,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, T: Transport> RestGateway<E, T> {
    pub fn new(base_url: impl Into<String>, auth: Rc<AuthContext>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            transport,
            _entity: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), E::schema().resource)
    }

    fn item_url(&self, id: EntityId) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    async fn call(
        &self,
        method: HttpMethod,
        url: String,
        payload: Option<&E>,
    ) -> GatewayResult<String> {
        let body = payload
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Failure::other(Some(format!("Could not encode request: {}", e))))?;
        let request = HttpRequest {
            method,
            url,
            bearer: self.auth.bearer().map(str::to_string),
            body,
        };
        log::debug!("[GATEWAY] {} {}", request.method, request.url);

        let response = self.transport.send(request).await.map_err(|e| {
            log::warn!("[GATEWAY] {} transport error: {}", E::schema().resource, e);
            Failure::other(Some(e))
        })?;

        if (200..300).contains(&response.status) {
            Ok(response.body)
        } else {
            log::warn!("[GATEWAY] {} answered {}", E::schema().resource, response.status);
            Err(Failure::from_status(response.status, error_message(&response.body)))
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> GatewayResult<T> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| Failure::other(Some(format!("Malformed response: {}", e))))
}

/// Server-provided message from an error body, if any
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
}

#[async_trait(?Send)]
impl<E: Entity, T: Transport> Gateway<E> for RestGateway<E, T> {
    async fn list(&self) -> GatewayResult<Vec<E>> {
        let body = self.call(HttpMethod::Get, self.collection_url(), None).await?;
        decode(&body)
    }

    async fn create(&self, payload: &E) -> GatewayResult<E> {
        let body = self.call(HttpMethod::Post, self.collection_url(), Some(payload)).await?;
        decode(&body)
    }

    async fn update(&self, id: EntityId, payload: &E) -> GatewayResult<E> {
        let body = self.call(HttpMethod::Put, self.item_url(id), Some(payload)).await?;
        decode(&body)
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.call(HttpMethod::Delete, self.item_url(id), None).await?;
        Ok(())
    }
}
