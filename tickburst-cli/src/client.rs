//! HTTP client for the control plane under test.
//!
//! Every call goes through [`NoRetry`], so one attempt is one request on the wire.
use crate::error::{RemoteError, SetupError};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tickburst::{attempt_with, NoRetry, Operation};
use url::Url;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    items: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateNetworkBody<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    name: String,
}

#[derive(Debug)]
pub struct ControlPlaneClient {
    http: Client,
    base: Url,
    retry: NoRetry,
}

impl ControlPlaneClient {
    /// Build a client for `endpoint` and make sure something answers there.
    ///
    /// Any HTTP response counts as reachable; only transport failures are fatal.
    pub async fn connect(endpoint: &str) -> Result<Self, SetupError> {
        let client = Self::new(endpoint)?;
        client
            .http
            .get(client.base.clone())
            .send()
            .await
            .map_err(|source| SetupError::Unreachable {
                endpoint: endpoint.to_string(),
                source,
            })?;
        info!("Connected to {}", client.base);
        Ok(client)
    }

    pub fn new(endpoint: &str) -> Result<Self, SetupError> {
        let mut base = Url::parse(endpoint).map_err(|source| SetupError::Endpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SetupError::Client)?;

        Ok(Self {
            http,
            base,
            retry: NoRetry,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    pub async fn list_networks(&self) -> Result<Vec<String>, RemoteError> {
        let res = self.call(Method::GET, "service-networks", None).await?;
        Ok(res.json::<ListBody>().await?.items)
    }

    pub async fn list_services(&self) -> Result<Vec<String>, RemoteError> {
        let res = self.call(Method::GET, "services", None).await?;
        Ok(res.json::<ListBody>().await?.items)
    }

    pub async fn create_network(&self, name: &str) -> Result<String, RemoteError> {
        let body = CreateNetworkBody { name };
        let res = self
            .call(Method::POST, "service-networks", Some(&body))
            .await?;
        Ok(res.json::<CreatedBody>().await?.name)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&CreateNetworkBody<'_>>,
    ) -> Result<Response, RemoteError> {
        // The base always ends with '/', so joining a relative path cannot fail.
        let url = self.base.join(path).unwrap_or_else(|_| self.base.clone());

        attempt_with(&self.retry, || {
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }
            async move {
                let res = request.send().await?;
                if res.status().is_success() {
                    Ok(res)
                } else {
                    Err(api_error(res).await)
                }
            }
        })
        .await
    }
}

async fn api_error(res: Response) -> RemoteError {
    let status = res.status().as_u16();
    match res.json::<ErrorBody>().await {
        Ok(ErrorBody {
            code: Some(code),
            message,
        }) => RemoteError::Api {
            status,
            code,
            message: message.unwrap_or_default(),
        },
        _ => RemoteError::Unclassified { status },
    }
}

/// Names follow `<random>-throttle-test` so leftovers are easy to find and clean up.
pub fn network_name() -> String {
    format!("{}-throttle-test", rand::random::<u32>())
}

pub fn list_networks_op(client: Arc<ControlPlaneClient>) -> Operation {
    Operation::new(move || {
        let client = client.clone();
        async move { client.list_networks().await }
    })
}

pub fn list_services_op(client: Arc<ControlPlaneClient>) -> Operation {
    Operation::new(move || {
        let client = client.clone();
        async move { client.list_services().await }
    })
}

pub fn create_network_op(client: Arc<ControlPlaneClient>) -> Operation {
    Operation::new(move || {
        let client = client.clone();
        async move { client.create_network(&network_name()).await }
    })
}
