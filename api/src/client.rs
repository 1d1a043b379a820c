//! Blocking client for the configuration API.

use crate::wire::AddressWire;
use crate::wire::ErrorBody;
use crate::wire::ListResponse;
use crate::wire::TokenRequest;
use crate::wire::TokenResponse;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use scm_core::ConfigObject;
use scm_core::ObjectKind;
use scm_core::ObjectStore;
use scm_core::ScmCredentials;
use scm_core::objects::StoreError;
use scm_core::objects::StoreResult;
use std::time::Duration;

const ADDRESSES_PATH: &str = "/config/objects/v1/addresses";
const PAGE_LIMIT: u64 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ScmApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ScmApiClient {
    /// Build the HTTP client and exchange the client credentials for a bearer
    /// token. Fails fast on bad credentials.
    pub fn connect(credentials: &ScmCredentials) -> StoreResult<Self> {
        let http = build_http(credentials.verify_ssl)?;
        let token = fetch_token(&http, credentials)?;
        tracing::info!(base_url = %credentials.base_url, tsg_id = %credentials.tsg_id, "authenticated");
        Ok(Self {
            http,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Client with an already-issued token.
    pub fn with_token(
        base_url: impl Into<String>,
        token: impl Into<String>,
        verify_ssl: bool,
    ) -> StoreResult<Self> {
        Ok(Self {
            http: build_http(verify_ssl)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn collection_url(&self, kind: ObjectKind) -> String {
        match kind {
            ObjectKind::AddressObject => format!("{}{ADDRESSES_PATH}", self.base_url),
        }
    }

    fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::transport_with_source("request failed", e))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response))
        }
    }

    fn list_page(
        &self,
        kind: ObjectKind,
        folder: &str,
        name: Option<&str>,
        offset: u64,
    ) -> StoreResult<ListResponse<AddressWire>> {
        let mut query = vec![
            ("folder", folder.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }
        let response = self.send(self.http.get(self.collection_url(kind)).query(&query))?;
        response
            .json()
            .map_err(|e| StoreError::transport_with_source("malformed list response", e))
    }

    /// Raw record (with id) for (folder, name).
    fn find(&self, kind: ObjectKind, folder: &str, name: &str) -> StoreResult<Option<AddressWire>> {
        let page = match self.list_page(kind, folder, Some(name), 0) {
            Ok(page) => page,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        Ok(page.data.into_iter().find(|a| a.name == name))
    }

    fn find_id(&self, kind: ObjectKind, folder: &str, name: &str) -> StoreResult<String> {
        self.find(kind, folder, name)?
            .and_then(|wire| wire.id)
            .ok_or_else(|| StoreError::NotFound(format!("{kind} '{name}' not found in folder '{folder}'")))
    }
}

impl ObjectStore for ScmApiClient {
    fn create(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject> {
        let ConfigObject::Address(address) = object;
        let body = AddressWire::from_object(address, Some(folder));
        tracing::debug!(folder, name = %address.name, "POST address");
        let response = self.send(self.http.post(self.collection_url(object.kind())).json(&body))?;
        let created: AddressWire = response
            .json()
            .map_err(|e| StoreError::transport_with_source("malformed create response", e))?;
        Ok(ConfigObject::Address(created.into_object()?))
    }

    fn update(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject> {
        let ConfigObject::Address(address) = object;
        let id = self.find_id(object.kind(), folder, &address.name)?;
        let body = AddressWire::from_object(address, None);
        tracing::debug!(folder, name = %address.name, %id, "PUT address");
        let url = format!("{}/{id}", self.collection_url(object.kind()));
        let response = self.send(self.http.put(url).json(&body))?;
        let updated: AddressWire = response
            .json()
            .map_err(|e| StoreError::transport_with_source("malformed update response", e))?;
        Ok(ConfigObject::Address(updated.into_object()?))
    }

    fn get(
        &self,
        kind: ObjectKind,
        folder: &str,
        name: &str,
    ) -> StoreResult<Option<ConfigObject>> {
        self.find(kind, folder, name)?
            .map(|wire| wire.into_object().map(ConfigObject::Address))
            .transpose()
    }

    fn list(&self, kind: ObjectKind, folder: &str) -> StoreResult<Vec<ConfigObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.list_page(kind, folder, None, offset)?;
            let fetched = page.data.len() as u64;
            for wire in page.data {
                objects.push(ConfigObject::Address(wire.into_object()?));
            }
            offset += fetched;
            let exhausted = match page.total {
                Some(total) => offset >= total,
                None => fetched < PAGE_LIMIT,
            };
            if fetched == 0 || exhausted {
                break;
            }
        }
        Ok(objects)
    }

    fn delete(&self, kind: ObjectKind, folder: &str, name: &str) -> StoreResult<()> {
        let id = self.find_id(kind, folder, name)?;
        tracing::debug!(folder, name, %id, "DELETE address");
        let url = format!("{}/{id}", self.collection_url(kind));
        self.send(self.http.delete(url))?;
        Ok(())
    }
}

fn build_http(verify_ssl: bool) -> StoreResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(!verify_ssl)
        .build()
        .map_err(|e| StoreError::transport_with_source("failed to build HTTP client", e))
}

fn fetch_token(http: &Client, credentials: &ScmCredentials) -> StoreResult<String> {
    let request = TokenRequest {
        grant_type: "client_credentials",
        scope: format!("tsg_id:{}", credentials.tsg_id),
    };
    let response = http
        .post(&credentials.token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&request)
        .send()
        .map_err(|e| StoreError::transport_with_source("token request failed", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(StoreError::Authentication(format!(
            "token endpoint returned HTTP {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .map_err(|e| StoreError::transport_with_source("malformed token response", e))?;
    tracing::debug!(expires_in = ?token.expires_in, "access token issued");
    Ok(token.access_token)
}

fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.summary())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));
    classify_status(status, message)
}

pub(crate) fn classify_status(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Authentication(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(message)
        }
        _ => StoreError::transport(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            StoreError::Authentication(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::CONFLICT, String::new()),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, String::new()),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new()),
            StoreError::Transport { .. }
        ));
    }
}
