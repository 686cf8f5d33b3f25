//! Consul HTTP 客户端

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{HealthQuery, HealthResponse, RegistryClient};
use crate::config::{ClientOptions, MAX_WAIT_TIME};
use crate::discovery::instance::{CheckStatus, ServiceEntry};
use crate::error::{DiscoveryError, ErrorCode, InfraResultExt, Result};
use crate::registry::check::{CheckKind, format_interval};
use crate::registry::ServiceRegistration;

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul 客户端
pub struct ConsulClient {
    http_client: HttpClient,
    address: String,
    base_url: String,
    token: Option<String>,
    wait_time: Duration,
    request_timeout: Duration,
}

impl ConsulClient {
    /// 创建新的 Consul 客户端
    ///
    /// `address` 可以是 `host:port`，也可以带 `http://` 前缀。
    pub fn new(address: impl Into<String>, options: &ClientOptions, request_timeout: Duration) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(DiscoveryError::configuration("registry address is empty"));
        }
        // wait=0 会让注册中心退回到它自己的默认阻塞时长（5 分钟），超出客户端超时
        if options.interval.is_zero() {
            return Err(DiscoveryError::configuration("long-poll interval must be positive")
                .with_param("address", address));
        }

        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };

        let http_client = HttpClient::builder()
            .pool_max_idle_per_host(options.pool_size)
            .connect_timeout(request_timeout)
            .build()
            .or_code(ErrorCode::ClientBuildFailed, "Failed to build Consul HTTP client")?;

        Ok(Self {
            http_client,
            address,
            base_url,
            token: options.auth_pass.clone(),
            wait_time: options.interval.min(MAX_WAIT_TIME),
            request_timeout,
        })
    }

    /// 长轮询等待时长
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// 阻塞查询的超时：注册中心最多额外增加 wait/16 的抖动，再留出普通请求的余量
    fn blocking_timeout(&self) -> Duration {
        self.wait_time
            .saturating_add(self.wait_time / 16)
            .saturating_add(self.request_timeout)
    }

    async fn check_status(
        resp: Response,
        rejected: fn(String) -> DiscoveryError,
        action: &str,
    ) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(rejected(format!("{} rejected with status {}", action, status))
            .with_details(body)
            .with_param("status", status.as_u16().to_string()))
    }
}

impl fmt::Debug for ConsulClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulClient")
            .field("address", &self.address)
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("wait_time", &self.wait_time)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[async_trait]
impl RegistryClient for ConsulClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn health_service(&self, query: &HealthQuery) -> Result<HealthResponse> {
        let url = format!("{}/v1/health/service/{}", self.base_url, query.service);

        let mut params: Vec<(&str, String)> = vec![
            ("index", query.wait_index.to_string()),
            ("wait", format_interval(self.wait_time)),
        ];
        if query.passing_only {
            params.push(("passing", "true".to_string()));
        }
        if let Some(tag) = &query.tag {
            params.push(("tag", tag.clone()));
        }

        let resp = self
            .authorize(self.http_client.get(&url))
            .query(&params)
            .timeout(self.blocking_timeout())
            .send()
            .await
            .or_code(ErrorCode::PollFailed, "Failed to query service health from Consul")?;
        let resp = Self::check_status(resp, |reason| DiscoveryError::poll_rejected(reason), "Consul health query").await?;

        let index = resp
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                DiscoveryError::new(ErrorCode::PollDecodeFailed, "Consul response missing X-Consul-Index")
            })?;

        let body: Vec<ConsulHealthEntry> = resp
            .json()
            .await
            .or_code(ErrorCode::PollDecodeFailed, "Failed to parse Consul health response")?;

        let entries = body.into_iter().map(ServiceEntry::from).collect::<Vec<_>>();
        debug!(service = %query.service, index, instances = entries.len(), "Consul health query returned");

        Ok(HealthResponse { entries, index })
    }

    async fn register_service(&self, registration: &ServiceRegistration) -> Result<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);

        let check = match registration.check.kind {
            CheckKind::Protocol => ConsulCheck {
                Interval: registration.check.interval_string(),
                GRPC: Some(registration.check.target.clone()),
                HTTP: None,
            },
            CheckKind::Http => ConsulCheck {
                Interval: registration.check.interval_string(),
                GRPC: None,
                HTTP: Some(registration.check.target.clone()),
            },
        };

        let payload = ConsulService {
            ID: &registration.id,
            Name: &registration.name,
            Tags: &registration.tags,
            Address: &registration.address,
            Port: registration.port,
            Check: check,
        };

        let resp = self
            .authorize(self.http_client.put(&url))
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                DiscoveryError::registration_failed("Failed to register service with Consul")
                    .with_details(e.to_string())
            })?;
        Self::check_status(resp, |reason| DiscoveryError::registration_rejected(reason), "Consul service registration").await?;

        Ok(())
    }

    async fn deregister_service(&self, instance_id: &str) -> Result<()> {
        let url = format!("{}/v1/agent/service/deregister/{}", self.base_url, instance_id);

        let resp = self
            .authorize(self.http_client.put(&url))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                DiscoveryError::registration_failed("Failed to deregister service from Consul")
                    .with_details(e.to_string())
            })?;
        Self::check_status(resp, |reason| DiscoveryError::registration_rejected(reason), "Consul service deregistration").await?;

        Ok(())
    }
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct ConsulService<'a> {
    ID: &'a str,
    Name: &'a str,
    Tags: &'a [String],
    Address: &'a str,
    Port: u16,
    Check: ConsulCheck,
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct ConsulCheck {
    Interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    GRPC: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    HTTP: Option<String>,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulHealthEntry {
    #[serde(default)]
    Node: ConsulNode,
    Service: ConsulServiceResponse,
    #[serde(default)]
    Checks: Vec<ConsulCheckResponse>,
}

#[allow(non_snake_case)]
#[derive(Deserialize, Default)]
struct ConsulNode {
    #[serde(default)]
    Address: String,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulServiceResponse {
    #[serde(default)]
    ID: String,
    #[serde(default)]
    Service: String,
    #[serde(default)]
    Tags: Option<Vec<String>>,
    #[serde(default)]
    Address: String,
    Port: u16,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulCheckResponse {
    Status: String,
}

impl From<ConsulHealthEntry> for ServiceEntry {
    fn from(entry: ConsulHealthEntry) -> Self {
        let status = entry
            .Checks
            .iter()
            .map(|check| CheckStatus::from_wire(&check.Status))
            .max()
            .unwrap_or(CheckStatus::Passing);

        ServiceEntry {
            id: entry.Service.ID,
            service: entry.Service.Service,
            address: entry.Service.Address,
            node_address: entry.Node.Address,
            port: entry.Service.Port,
            tags: entry.Service.Tags.unwrap_or_default(),
            status,
        }
    }
}
