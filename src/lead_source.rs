//! Remote lead query capability

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::errors::DashboardError;
use crate::types::{FilterState, Lead};

/// Parameters of one lead query. Only active filters are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub industry: Option<String>,
    pub min_size: Option<u64>,
    /// Ask the source for the enrichment fields (`quality`, `summary`)
    pub enrich: bool,
}

impl LeadQuery {
    /// Query for `filters`: empty industry and zero size are left out, and
    /// enrichment is always requested. Search text never reaches the source.
    pub fn from_filters(filters: &FilterState) -> Self {
        Self {
            industry: Some(filters.industry.clone()).filter(|i| !i.is_empty()),
            min_size: Some(filters.min_size).filter(|s| *s > 0),
            enrich: true,
        }
    }

    /// Query-string pairs in request order
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(industry) = &self.industry {
            pairs.push(("industry", industry.clone()));
        }
        if let Some(size) = self.min_size {
            pairs.push(("size", size.to_string()));
        }
        if self.enrich {
            pairs.push(("enrich", "true".to_string()));
        }
        pairs
    }
}

/// Anything that can answer a lead query
#[async_trait]
pub trait LeadSource: Send + Sync + 'static {
    async fn fetch(&self, query: &LeadQuery) -> Result<Vec<Lead>, DashboardError>;
}

/// Lead source backed by the HTTP lead API
#[derive(Debug, Clone)]
pub struct HttpLeadSource {
    client: reqwest::Client,
    url: String,
}

impl HttpLeadSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| DashboardError::Configuration(e.to_string()))?;
        Ok(Self::new(client, api.leads_url()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LeadSource for HttpLeadSource {
    async fn fetch(&self, query: &LeadQuery) -> Result<Vec<Lead>, DashboardError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&query.to_query_pairs())
            .send()
            .await
            .map_err(|e| DashboardError::from_reqwest(e, &self.url))?;

        let resp = resp
            .error_for_status()
            .map_err(|e| DashboardError::from_reqwest(e, &self.url))?;

        resp.json::<Vec<Lead>>()
            .await
            .map_err(|e| DashboardError::Decode {
                url: self.url.clone(),
                message: e.to_string(),
            })
    }
}
