//! vast.ai API client implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::models::{
    CreateInstanceBody, CreateInstanceResponse, DeleteInstanceResponse, InstancesResponse,
    OffersResponse, PortBinding, RawInstance, RawOffer,
};
use super::query::build_offer_query;
use crate::config::VastConfig;
use crate::providers::traits::{
    CreatedInstance, GpuMarketplace, InstanceCreateOptions, Offer, OfferFilter, RunningInstance,
    VastError,
};

/// Access methods requested for every new instance.
const RUNTYPE: &str = "ssh ssh_direc ssh_proxy";

/// vast.ai marketplace client.
#[derive(Clone, Debug)]
pub struct Vast {
    /// HTTP client.
    client: Client,
    /// Credentials, API root and request policy.
    config: VastConfig,
}

impl Vast {
    /// Create a new vast.ai client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: VastConfig) -> Result<Self, VastError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.policy.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &VastConfig {
        &self.config
    }

    /// Build the full URL for `path`, appending `params` and the API key.
    ///
    /// Non-string parameter values are sent as JSON text.
    fn url(&self, path: &str, params: &[(&str, Value)]) -> Result<Url, VastError> {
        let mut url = Url::parse(&format!("{}{path}", self.config.base_url))
            .map_err(|e| VastError::Config(format!("Invalid API URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                match value {
                    Value::String(s) => query.append_pair(name, s),
                    other => query.append_pair(name, &other.to_string()),
                };
            }
            query.append_pair("api_key", &self.config.api_key);
        }

        Ok(url)
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, Value)],
    ) -> Result<T, VastError> {
        let url = self.url(path, params)?;
        debug!(path = %path, "GET request");

        let (_, text) = self.execute(self.client.get(url)).await?;
        Self::parse(&text)
    }

    /// Make an authenticated PUT request, returning the raw success body.
    async fn put<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, String), VastError> {
        let url = self.url(path, &[])?;
        debug!(path = %path, "PUT request");

        self.execute(self.client.put(url).json(body)).await
    }

    /// Make an authenticated DELETE request with an empty JSON body.
    async fn delete(&self, path: &str) -> Result<(StatusCode, String), VastError> {
        let url = self.url(path, &[])?;
        debug!(path = %path, "DELETE request");

        self.execute(
            self.client
                .delete(url)
                .json(&serde_json::Map::<String, Value>::new()),
        )
        .await
    }

    /// Send a request once and read its body, failing on non-2xx status.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String), VastError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok((status, text))
        } else {
            Err(VastError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Parse a JSON body into `T`.
    fn parse<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, VastError> {
        serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            VastError::MalformedResponse(e.to_string())
        })
    }

    /// Convert an API offer to our `Offer` type.
    fn to_offer(raw: RawOffer) -> Offer {
        Offer {
            id: raw.id,
            gpu_count: raw.num_gpus,
            hourly_price: raw.dph_total,
            score: raw.score,
            disk_gb: raw.disk_space,
            gpu_ram: raw.gpu_ram,
        }
    }

    /// Convert an API instance to our `RunningInstance` type.
    #[allow(clippy::cast_possible_truncation)]
    fn to_running_instance(raw: RawInstance) -> RunningInstance {
        let ssh_command = match (&raw.ssh_host, raw.ssh_port) {
            (Some(host), Some(port)) => Some(ssh_command(host, port)),
            _ => None,
        };

        let forwarded_ports = match (&raw.public_ipaddr, &raw.ports) {
            (Some(ip), Some(ports)) => forwarded_ports(ip, ports),
            _ => Vec::new(),
        };

        let started_at = raw
            .start_date
            .and_then(|secs| DateTime::<Utc>::from_timestamp_millis((secs * 1000.0) as i64));

        RunningInstance {
            id: raw.id,
            ssh_host: raw.ssh_host,
            ssh_port: raw.ssh_port,
            status: raw.status_msg,
            ssh_command,
            public_ip: raw.public_ipaddr,
            forwarded_ports,
            started_at,
        }
    }
}

/// SSH command for an instance's proxy endpoint.
#[must_use]
pub fn ssh_command(host: &str, port: u16) -> String {
    format!("ssh root@{host} -p {port}")
}

/// Describe forwarded ports as `{public_ip}:{host_port} -> {container_port}`.
///
/// Only the first host binding of each container port is used. Ports without
/// bindings are skipped.
#[must_use]
pub fn forwarded_ports(
    public_ip: &str,
    ports: &BTreeMap<String, Option<Vec<PortBinding>>>,
) -> Vec<String> {
    ports
        .iter()
        .filter_map(|(internal, bindings)| {
            bindings
                .as_ref()
                .and_then(|b| b.first())
                .map(|binding| format!("{public_ip}:{} -> {internal}", binding.host_port))
        })
        .collect()
}

#[async_trait]
impl GpuMarketplace for Vast {
    async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<Offer>, VastError> {
        let query = serde_json::to_value(build_offer_query(filter))
            .map_err(|e| VastError::Config(format!("Unserializable offer filter: {e}")))?;

        let response: OffersResponse = self.get("/bundles/", &[("q", query)]).await?;
        debug!(count = response.offers.len(), "Offers received");
        Ok(response.offers.into_iter().map(Self::to_offer).collect())
    }

    async fn create_instance(
        &self,
        offer_id: u64,
        options: InstanceCreateOptions,
    ) -> Result<CreatedInstance, VastError> {
        info!(offer_id, image = %options.docker_image, "Creating instance");

        let body = CreateInstanceBody {
            client_id: "me".to_string(),
            image: options.docker_image,
            env: options
                .docker_options
                .into_iter()
                .map(|option| (option, "1".to_string()))
                .collect(),
            args_str: String::new(),
            onstart: String::new(),
            runtype: RUNTYPE.to_string(),
            image_login: None,
            use_jupyter_lab: false,
            jupyter_dir: None,
            python_utf8: false,
            lang_utf8: false,
            disk: options.disk_space_gb,
        };

        let (status, text) = self.put(&format!("/asks/{offer_id}/"), &body).await?;
        let response: CreateInstanceResponse = Self::parse(&text)?;
        if !response.success {
            return Err(VastError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        info!(offer_id, contract_id = ?response.new_contract, "Instance created");
        Ok(CreatedInstance {
            contract_id: response.new_contract,
        })
    }

    async fn list_instances(&self) -> Result<Vec<RunningInstance>, VastError> {
        let response: InstancesResponse = self
            .get("/instances/", &[("owner", Value::from("me"))])
            .await?;
        Ok(response
            .instances
            .into_iter()
            .map(Self::to_running_instance)
            .collect())
    }

    async fn delete_instance(&self, id: u64) -> Result<(), VastError> {
        info!(instance_id = id, "Deleting instance");

        let (status, text) = self.delete(&format!("/instances/{id}/")).await?;
        if !text.trim().is_empty() {
            let response: DeleteInstanceResponse = Self::parse(&text)?;
            if !response.success {
                return Err(VastError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }
        }

        info!(instance_id = id, "Instance deleted");
        Ok(())
    }
}
