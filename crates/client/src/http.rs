//! REST client for the payroll endpoints.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use safra_core::advance::AdvanceSelection;
use safra_core::payroll::{PayrollAmounts, PayrollLineInput};
use safra_shared::types::{PayrollEntryId, PayrollId};

use crate::advances::{AdvanceSync, EntryAdvancesView};
use crate::error::ClientError;
use crate::rows::{EntryPatch, EntryView};

/// Bearer-token client for `/api`.
#[derive(Debug, Clone)]
pub struct FolhaClient {
    http: Client,
    base_url: String,
    token: String,
}

impl FolhaClient {
    /// Creates a client for a server root such as `https://folha.example.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().gzip(true).build()?;
        Ok(Self {
            http,
            base_url: format!("{}/api", base_url.trim_end_matches('/')),
            token: token.into(),
        })
    }

    /// Replaces the bearer token, e.g. after a refresh.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        read_body(response).await
    }

    /// Computes an entry with the server calculator without storing it.
    pub async fn preview(&self, input: &PayrollLineInput) -> Result<PayrollAmounts, ClientError> {
        self.send(self.request(Method::POST, "/arh/folhas/calculo").json(input))
            .await
    }

    /// Saves an entry edit and returns the recomputed entry.
    pub async fn update_entry(
        &self,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
        patch: &EntryPatch,
    ) -> Result<EntryView, ClientError> {
        let path = format!("/arh/folhas/{payroll_id}/lancamentos/{entry_id}");
        self.send(self.request(Method::PATCH, &path).json(patch))
            .await
            .inspect_err(|e| warn!(error = %e, entry_id = %entry_id, "Entry save failed"))
    }

    /// Finalizes a payroll and returns the updated header.
    pub async fn finalize(&self, payroll_id: PayrollId) -> Result<Value, ClientError> {
        let path = format!("/arh/folhas/{payroll_id}/finalizar");
        self.send(self.request(Method::POST, &path))
            .await
            .inspect_err(|e| warn!(error = %e, payroll_id = %payroll_id, "Finalize failed"))
    }
}

/// Decodes a success body or turns an error body into `ClientError::Api`.
async fn read_body<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    Err(api_error(status.as_u16(), &body))
}

fn api_error(status: u16, body: &Value) -> ClientError {
    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_owned);
    ClientError::Api {
        status,
        code: text("error").unwrap_or_else(|| "HTTP_ERROR".to_string()),
        message: text("message").unwrap_or_else(|| format!("HTTP {status}")),
    }
}

#[async_trait]
impl AdvanceSync for FolhaClient {
    async fn fetch(
        &self,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
    ) -> Result<EntryAdvancesView, ClientError> {
        let path = format!("/arh/folhas/{payroll_id}/lancamentos/{entry_id}/adiantamentos");
        self.send(self.request(Method::GET, &path)).await
    }

    async fn save(
        &self,
        payroll_id: PayrollId,
        entry_id: PayrollEntryId,
        selection: &AdvanceSelection,
    ) -> Result<EntryAdvancesView, ClientError> {
        let path = format!("/arh/folhas/{payroll_id}/lancamentos/{entry_id}/adiantamentos");
        self.send(self.request(Method::PATCH, &path).json(selection))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_base_url_is_normalized() {
        let client = FolhaClient::new("http://localhost:8080/", "t").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_api_error_reads_body() {
        let err = api_error(
            422,
            &json!({ "error": "FINALIZATION_BLOCKED", "message": "2 entries", "details": [] }),
        );
        assert!(matches!(
            err,
            ClientError::Api { status: 422, ref code, .. } if code == "FINALIZATION_BLOCKED"
        ));
    }

    #[test]
    fn test_api_error_without_body() {
        let err = api_error(502, &Value::Null);
        assert_eq!(err.to_string(), "HTTP 502 (HTTP_ERROR)");
    }

    #[test]
    fn test_selection_is_sent_whole() {
        let selection = AdvanceSelection::new(std::iter::empty(), dec!(50));
        let body = serde_json::to_value(&selection).unwrap();
        assert_eq!(body["installmentIds"], json!([]));
        assert_eq!(body["looseAmount"].as_f64(), Some(50.0));
    }
}
