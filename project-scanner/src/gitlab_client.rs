//! GraphQL client for the GitLab API.
//!
//! [`QueryClient`] executes exactly one GraphQL operation per call. Transport and protocol
//! failures never escape as panics; they come back as a [`TransportFailure`] so the pagination
//! loop can end a scan gracefully instead of aborting it.

use std::future::Future;

use custom_debug::CustomDebug;
use scanner_framework::config::Hidden;
use serde_json::Value;
use thegraph_graphql_http::{
    graphql::{Document, IntoDocument as _, IntoDocumentWithVariables},
    http_client::{ReqwestExt as _, ResponseError},
};
use url::Url;

use crate::{
    config::Config,
    errors::{ConfigError, TransportFailure},
    types::{Connection, Page, QueryDescriptor},
};

/// A client able to run GraphQL queries against the GitLab API.
pub trait QueryClient: Send + Sync {
    /// Execute a single operation and return the response's root `data` object.
    ///
    /// The operation name is only used for diagnostics.
    fn query(
        &self,
        operation_name: &str,
        body: &str,
        variables: Value,
    ) -> impl Future<Output = Result<Value, TransportFailure>> + Send;

    /// Run the descriptor's query and return its root object.
    ///
    /// When the root field holds a list, its first element is returned.
    fn fetch_one(
        &self,
        descriptor: &QueryDescriptor,
        variables: Value,
    ) -> impl Future<Output = Result<Option<Value>, TransportFailure>> + Send {
        async move {
            let data = self
                .query(&descriptor.instance, &descriptor.body, variables)
                .await?;
            let root = take_instance(data, &descriptor.instance)?;

            Ok(match root {
                Value::Array(items) => items.into_iter().next(),
                Value::Null => None,
                root => Some(root),
            })
        }
    }

    /// Run the descriptor's query and shape the connection under its root field into a [`Page`].
    fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
        variables: Value,
    ) -> impl Future<Output = Result<Page, TransportFailure>> + Send {
        async move {
            let data = self
                .query(&descriptor.instance, &descriptor.body, variables)
                .await?;
            let root = take_instance(data, &descriptor.instance)?;

            serde_json::from_value::<Connection>(root)
                .map(Page::from)
                .map_err(|err| TransportFailure::Decode(err.to_string()))
        }
    }
}

fn take_instance(mut data: Value, instance: &str) -> Result<Value, TransportFailure> {
    data.get_mut(instance)
        .map(Value::take)
        .ok_or_else(|| TransportFailure::MissingField(instance.to_string()))
}

/// A GraphQL document with its variables.
pub struct GraphQlRequest {
    pub document: String,
    pub variables: Value,
}

impl IntoDocumentWithVariables for GraphQlRequest {
    type Variables = Value;

    fn into_document_with_variables(self) -> (Document, Self::Variables) {
        (self.document.into_document(), self.variables)
    }
}

/// GitLab GraphQL API client.
#[derive(Clone, CustomDebug)]
pub struct GitlabClient {
    #[debug(skip)]
    http_client: reqwest::Client,
    #[debug(with = std::fmt::Display::fmt)]
    endpoint: Url,
    token: Hidden<String>,
}

impl GitlabClient {
    /// Create a client for the GitLab instance at `url`.
    ///
    /// Fails when `url` cannot serve as the base of the GraphQL endpoint.
    pub fn new(
        http_client: reqwest::Client,
        url: &Url,
        token: Hidden<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            http_client,
            endpoint: graphql_endpoint(url)?,
            token,
        })
    }

    /// Create a client, and its HTTP client, from the scanner configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Self::new(http_client, &config.gitlab_url, config.gitlab_token.clone())
    }

    /// The GraphQL endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl QueryClient for GitlabClient {
    async fn query(
        &self,
        operation_name: &str,
        body: &str,
        variables: Value,
    ) -> Result<Value, TransportFailure> {
        tracing::trace!(operation = operation_name, %variables, "sending GraphQL query");

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(self.token.as_str())
            .send_graphql::<Value>(GraphQlRequest {
                document: body.to_string(),
                variables,
            })
            .await;

        let result = match response {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(ResponseError::Empty)) => Err(TransportFailure::EmptyResponse),
            Ok(Err(ResponseError::Failure { errors })) => Err(TransportFailure::Response(
                errors.into_iter().map(|err| err.message).collect(),
            )),
            Err(err) => Err(TransportFailure::Request(err.to_string())),
        };

        if let Err(err) = &result {
            tracing::warn!(operation = operation_name, error = %err, "GraphQL query failed");
        }

        result
    }
}

/// Derive `<base>/api/graphql` from the instance URL.
fn graphql_endpoint(url: &Url) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    // `join` replaces the last path segment unless the path ends with a slash.
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join("api/graphql")
        .map_err(|err| invalid(&err.to_string()))
}
