// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! HTTPS connector for the Reddit API.
//!
//! Service structures in this module provide a low-level way to interact
//! with the Reddit API over HTTPS, essentially a specialized HTTPS client
//! specifically for Reddit. Reddit's OAuth API requires a bearer token
//! even for read-only access, so a [`RedditService`] is created by
//! [connecting](RedditService::connect) with a set of app credentials.

use crate::auth::Credentials;
use crate::http::{HTTPClient, HTTPClientFactory, HTTPError, HTTPResult, build_url};
use hypertyper::{HTTPGet, IntoUrl};
use log::{debug, trace};
use reqwest::header;
use serde::Deserialize;

/// Endpoint that exchanges app credentials for an access token.
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Base URL for authenticated API requests.
pub const API_BASE: &str = "https://oauth.reddit.com";

/// A service for retrieving resources from Reddit.
///
/// Using this trait, clients can implement different ways of connecting
/// to the Reddit API, such as an actual connector for production code,
/// and a mocked connector for testing purposes.
pub trait Service {
    /// Performs a GET request for `resource` (a path relative to the API
    /// root, such as `r/rust/hot`) with the given query parameters and
    /// returns the raw JSON body.
    fn get_resource(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> impl Future<Output = HTTPResult<String>> + Send;
}

/// A service that contacts the Reddit API directly to retrieve information.
pub struct RedditService {
    client: HTTPClient,
    user_agent: String,
    token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,

    #[serde(default)]
    error: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> HTTPResult<String> {
        match (self.access_token, self.error) {
            (Some(token), _) if !token.is_empty() => Ok(token),
            (_, Some(error)) => Err(HTTPError::Token(error)),
            _ => Err(HTTPError::Token(String::from("no token in response"))),
        }
    }
}

impl RedditService {
    /// Obtains an app-only access token and returns a service that uses it.
    ///
    /// Fails with [`HTTPError::is_rejection()`] set if Reddit turns the
    /// credentials down.
    pub async fn connect(credentials: &Credentials) -> HTTPResult<Self> {
        let factory = HTTPClientFactory::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = factory.create();
        let user_agent = credentials.user_agent().to_string();

        debug!("Requesting access token from {TOKEN_URL}");
        let token = Self::request_token(&client, credentials).await?.into_token()?;
        Ok(Self {
            client,
            user_agent,
            token,
        })
    }

    async fn request_token(
        client: &HTTPClient,
        credentials: &Credentials,
    ) -> hypertyper::HTTPResult<TokenResponse> {
        let resp = client
            .post(TOKEN_URL)
            .header(header::USER_AGENT, credentials.user_agent())
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !resp.status().is_success() {
            debug!("Token request returned {}", resp.status());
            Err(hypertyper::HTTPError::Http(resp.status()))
        } else {
            Ok(resp.json::<TokenResponse>().await?)
        }
    }
}

impl HTTPGet for RedditService {
    /// Sends an authenticated GET request to a Reddit API endpoint and
    /// returns the raw body.
    async fn get<U>(&self, uri: U) -> hypertyper::HTTPResult<String>
    where
        U: IntoUrl + Send,
    {
        let resp = self
            .client
            .get(uri)
            .header(header::USER_AGENT, &self.user_agent)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            debug!("{} returned {}", resp.url(), resp.status());
            Err(hypertyper::HTTPError::Http(resp.status()))
        } else {
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .ok_or(hypertyper::HTTPError::MissingContentType)?
                .to_str()?;
            if !content_type.starts_with("application/json") {
                Err(hypertyper::HTTPError::UnexpectedContentType(
                    content_type.to_string(),
                ))
            } else {
                let body = resp.text().await?;
                trace!("{} bytes of JSON", body.len());
                Ok(body)
            }
        }
    }
}

impl Service for RedditService {
    async fn get_resource(&self, resource: &str, params: &[(&str, String)]) -> HTTPResult<String> {
        let url = build_url(API_BASE, resource, params)?;
        debug!("GET {url}");
        Ok(self.get(url.as_str()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_resource_urls_under_the_api_root() {
        let url = build_url(API_BASE, "r/rust/hot", &[("limit", String::from("25"))]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/r/rust/hot?limit=25");
    }

    #[test]
    fn it_reads_tokens() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "abc", "token_type": "bearer"}"#).unwrap();
        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert!(token.error.is_none());
    }

    #[test]
    fn it_reads_token_errors() {
        let token: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(token.access_token.is_none());
        assert_eq!(token.error.as_deref(), Some("invalid_grant"));
    }

    #[test]
    fn it_hands_out_tokens() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "abc", "expires_in": 86400}"#).unwrap();
        assert_eq!(token.into_token().unwrap(), "abc");
    }

    #[test]
    fn it_rejects_refused_tokens() {
        let token: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        let err = token.into_token().unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Could not obtain an access token: invalid_grant");
    }

    #[test]
    fn it_rejects_empty_tokens() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": ""}"#).unwrap();
        assert!(token.into_token().unwrap_err().is_rejection());
    }
}
