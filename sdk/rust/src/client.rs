use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One logical call through the gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCall {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Extra input fields; route parameters are filled from these.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl GatewayCall {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            version: None,
            fields: Map::new(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub verbs: Vec<String>,
    pub domain: Option<String>,
    pub uri: String,
    pub name: Option<String>,
    pub action: String,
    pub middleware: Vec<String>,
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
    endpoint: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: "gateway.do".to_string(),
        }
    }

    /// Use a gateway endpoint other than `gateway.do`.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_start_matches('/').to_string();
        self
    }

    /// POST a call to the gateway as JSON.
    pub async fn call(&self, call: &GatewayCall) -> Result<Response, reqwest::Error> {
        self.client
            .post(format!("{}/{}", self.base_url, self.endpoint))
            .json(call)
            .send()
            .await
    }

    /// Call and decode a JSON response, failing on non-success status.
    pub async fn call_json(&self, call: &GatewayCall) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self.call(call).await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Gateway returned error status {}: {}", status, text).into());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// List the route table through the admin API.
    pub async fn routes(&self, api_key: &str) -> Result<Vec<RouteSummary>, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/admin/routes", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Admin API returned error status {}", status).into());
        }
        Ok(resp.json().await?)
    }
}
