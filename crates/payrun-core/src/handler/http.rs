//! HTTP client for the payroll backend.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};

use super::{ActionFailure, ActionHandler, ActionHandlers, ActionOutcome, ReportLink, Reporting};
use crate::{
    error::{CycleError, Result},
    models::{LogEntry, StepId, METADATA_ERRORS, METADATA_PROCESSED},
};

/// Step id to backend endpoint, in cycle order.
const STEP_ENDPOINTS: [(&str, &str); 8] = [
    ("incentive-validation", "/payroll/incentive/validate-final-type"),
    ("incentive-calculation", "/payroll/incentive/calculate"),
    ("performance-incentive", "/payroll/incentive/push-greythr"),
    ("arrears-deductions", "/payroll/arrears-deductions"),
    ("leave-requests", "/payroll/leave-requests/review"),
    ("lop-push", "/payroll/lop/push-greythr"),
    ("bank-transfer", "/payroll/bank-file-transfer"),
    ("salary-statement", "/payroll/salary-statement"),
];

/// Step id to report endpoint.
const REPORT_ENDPOINTS: [(&str, &str); 1] =
    [("incentive-calculation", "/payroll/incentive/report")];

/// Body returned by the step endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    report_url: Option<String>,
    #[serde(default)]
    processed: Option<u64>,
    #[serde(default)]
    errors: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// Client for the payroll backend.
///
/// One instance serves every step: [`PayrollApi::handlers`] hands out one
/// [`ActionHandler`] per step endpoint, all sharing the same connection pool.
#[derive(Debug, Clone)]
pub struct PayrollApi {
    client: Client,
    base_url: String,
}

impl PayrollApi {
    /// Creates a client for `base_url` (e.g. `https://payroll.internal/api`).
    ///
    /// # Errors
    ///
    /// Returns `CycleError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CycleError::Configuration {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One handler per payroll step.
    pub fn handlers(&self) -> ActionHandlers {
        STEP_ENDPOINTS
            .iter()
            .fold(ActionHandlers::new(), |handlers, (id, path)| {
                handlers.with(
                    *id,
                    Arc::new(StepEndpoint {
                        api: self.clone(),
                        path: *path,
                    }),
                )
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: &Value) -> std::result::Result<StepResponse, ActionFailure> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self.client.post(&url).json(body).send().await.map_err(transport)?;
        Self::handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, ActionFailure> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: Response,
    ) -> std::result::Result<T, ActionFailure> {
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            warn!("Payroll API answered {status}");
            return Err(ActionFailure::new(format!("API Error: {reason}")));
        }
        response
            .json()
            .await
            .map_err(|e| ActionFailure::new(format!("Invalid response from payroll API: {e}")))
    }
}

fn transport(e: reqwest::Error) -> ActionFailure {
    warn!("Payroll API request failed: {e}");
    ActionFailure::new(format!("Failed to reach payroll API: {e}"))
}

/// Handler posting `{month, ...payload}` to one step endpoint.
struct StepEndpoint {
    api: PayrollApi,
    path: &'static str,
}

#[async_trait]
impl ActionHandler for StepEndpoint {
    async fn execute(
        &self,
        month: &str,
        payload: Option<&Value>,
    ) -> std::result::Result<ActionOutcome, ActionFailure> {
        let mut body = Map::new();
        if let Some(Value::Object(fields)) = payload {
            body.extend(fields.clone());
        }
        body.insert("month".to_string(), json!(month));

        let response = self.api.post(self.path, &Value::Object(body)).await?;
        if response.success == Some(false) {
            return Err(ActionFailure::new(
                response
                    .message
                    .unwrap_or_else(|| "An error occurred while processing the step".to_string()),
            ));
        }

        let mut outcome = ActionOutcome::new(
            response
                .message
                .unwrap_or_else(|| "Step completed successfully".to_string()),
        );
        outcome.artifact_ref = response.report_url;
        if let Some(processed) = response.processed {
            outcome = outcome.with_metadata(METADATA_PROCESSED, format!("{processed} employees"));
        }
        if let Some(errors) = response.errors {
            outcome = outcome.with_metadata(METADATA_ERRORS, errors.to_string());
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Reporting for PayrollApi {
    async fn fetch_logs(&self, step_id: &StepId) -> std::result::Result<Vec<LogEntry>, ActionFailure> {
        let response: LogsResponse = self
            .get(&format!("/payroll/process/{step_id}/logs"), &[])
            .await?;
        Ok(response.logs)
    }

    async fn fetch_report(
        &self,
        step_id: &StepId,
        month: &str,
    ) -> std::result::Result<ReportLink, ActionFailure> {
        let Some((_, path)) = REPORT_ENDPOINTS
            .iter()
            .find(|(id, _)| *id == step_id.as_str())
        else {
            return Err(ActionFailure::new(format!("No report is available for step '{step_id}'")));
        };

        let response: StepResponse = self.get(path, &[("month", month)]).await?;
        Ok(ReportLink {
            message: response
                .message
                .unwrap_or_else(|| "Report is ready".to_string()),
            url: response.report_url,
        })
    }
}
