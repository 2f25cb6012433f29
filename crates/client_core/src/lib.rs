use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Company, NewProduct},
    error::{join_service_errors, ServiceError},
    protocol::{
        AddProductData, AddProductVariables, CreatedProduct, GetAllCompaniesData, GraphqlRequest,
        GraphqlResponse, NoVariables, ADD_PRODUCT_MUTATION, ADD_PRODUCT_OPERATION,
        GET_ALL_COMPANIES_OPERATION, GET_ALL_COMPANIES_QUERY,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("service rejected request: {}", join_service_errors(.0))]
    Service(Vec<ServiceError>),
    #[error("request timed out")]
    Timeout,
    #[error("failed to reach backend: {0}")]
    Connection(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("backend response carried neither data nor errors")]
    EmptyResponse,
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    /// The backend answered and listed errors, as opposed to the call itself
    /// failing.
    pub fn is_service_rejection(&self) -> bool {
        matches!(self, RemoteError::Service(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            RemoteError::Timeout
        } else if let Some(status) = value.status() {
            RemoteError::Status(status.as_u16())
        } else if value.is_decode() {
            RemoteError::Decode(value.to_string())
        } else if value.is_connect() {
            RemoteError::Connection(value.to_string())
        } else {
            RemoteError::Transport(value.to_string())
        }
    }
}

/// Backend calls the add-product screen depends on.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn create_product(&self, input: &NewProduct) -> Result<CreatedProduct, RemoteError>;
    async fn list_companies(&self) -> Result<Vec<Company>, RemoteError>;
}

/// Backend that is not configured. Every call fails with a transport error.
pub struct MissingRemoteService;

#[async_trait]
impl RemoteService for MissingRemoteService {
    async fn create_product(&self, _input: &NewProduct) -> Result<CreatedProduct, RemoteError> {
        Err(RemoteError::Transport("remote service is unavailable".into()))
    }

    async fn list_companies(&self) -> Result<Vec<Company>, RemoteError> {
        Err(RemoteError::Transport("remote service is unavailable".into()))
    }
}

/// Thin JSON-over-HTTP adapter for the inventory GraphQL endpoint.
pub struct GraphqlRemoteService {
    http: Client,
    endpoint: Url,
}

impl GraphqlRemoteService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid graphql endpoint '{endpoint}'"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn execute<V, T>(&self, request: GraphqlRequest<'_, V>) -> Result<T, RemoteError>
    where
        V: Serialize + Send + Sync,
        T: DeserializeOwned,
    {
        let operation = request.operation_name;
        debug!(operation, endpoint = %self.endpoint, "sending graphql request");
        let response: GraphqlResponse<T> = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response {
            GraphqlResponse { data: Some(data), errors } => {
                if !errors.is_empty() {
                    warn!(
                        operation,
                        errors = %join_service_errors(&errors),
                        "graphql response carried partial errors"
                    );
                }
                Ok(data)
            }
            GraphqlResponse { data: None, errors } if !errors.is_empty() => {
                Err(RemoteError::Service(errors))
            }
            GraphqlResponse { .. } => Err(RemoteError::EmptyResponse),
        }
    }
}

#[async_trait]
impl RemoteService for GraphqlRemoteService {
    async fn create_product(&self, input: &NewProduct) -> Result<CreatedProduct, RemoteError> {
        let data: AddProductData = self
            .execute(GraphqlRequest {
                query: ADD_PRODUCT_MUTATION,
                operation_name: ADD_PRODUCT_OPERATION,
                variables: AddProductVariables { product: input },
            })
            .await?;
        Ok(data.create_product)
    }

    async fn list_companies(&self) -> Result<Vec<Company>, RemoteError> {
        let data: GetAllCompaniesData = self
            .execute(GraphqlRequest {
                query: GET_ALL_COMPANIES_QUERY,
                operation_name: GET_ALL_COMPANIES_OPERATION,
                variables: NoVariables {},
            })
            .await?;
        Ok(data.get_all_companies)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
