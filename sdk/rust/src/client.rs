use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Body of `/live` and `/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeStatus {
    #[serde(default)]
    pub live: Option<bool>,
    #[serde(default)]
    pub ready: Option<bool>,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub service: String,
    pub job_name: Option<String>,
    pub job_version: Option<String>,
    pub status: String,
    pub started_at: String,
    pub wrapper_version: String,
}

pub struct JobClient {
    client: Client,
    base_url: String,
}

impl JobClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Call the main action.
    pub async fn perform<B: Serialize, R: DeserializeOwned>(&self, body: &B) -> Result<R, ClientError> {
        self.post("/perform", body).await
    }

    /// POST to an endpoint under `/api/v1`.
    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ClientError> {
        let resp = self
            .client
            .post(self.api_url(path))
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    /// GET an endpoint under `/api/v1`.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let resp = self.client.get(self.api_url(path)).send().await?;
        decode(resp).await
    }

    /// Liveness probe. Non-200 answers are returned, not raised.
    pub async fn live(&self) -> Result<(StatusCode, ProbeStatus), ClientError> {
        self.probe("/live").await
    }

    /// Readiness probe. Non-200 answers are returned, not raised.
    pub async fn ready(&self) -> Result<(StatusCode, ProbeStatus), ClientError> {
        self.probe("/ready").await
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        decode(resp).await
    }

    /// Endpoint catalog.
    pub async fn endpoints(&self) -> Result<Vec<Value>, ClientError> {
        self.get("/endpoints").await
    }

    async fn probe(&self, path: &str) -> Result<(StatusCode, ProbeStatus), ClientError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.json::<ProbeStatus>().await?;
        Ok((status, body))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }
}

async fn decode<R: DeserializeOwned>(resp: Response) -> Result<R, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(format!("Job returned error status {}: {}", status, text).into());
    }

    Ok(serde_json::from_str::<R>(&text)?)
}
