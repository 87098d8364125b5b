//! # HTTP Calculation Service
//!
//! The production [`CalculationService`] implementation: a thin JSON
//! client over the ERP backend's calculation endpoint.
//!
//! Authentication context (bearer token, company code) is issued by the
//! surrounding application; this client only carries it on each call.
//!
//! ## Endpoints
//! - `POST {base}/calculate` - recalculation mode, returns totals
//! - `POST {base}/validate`  - validation mode, returns ok/rejection

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{CalcError, CalcResult};
use crate::service::{CalcRequest, CalcTotals, CalculationService};

// =============================================================================
// Response Envelope
// =============================================================================

/// The backend wraps both modes in one envelope shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

/// Placeholder payload for validation responses (no data block).
#[derive(Debug, Deserialize)]
struct NoData {}

// =============================================================================
// Client
// =============================================================================

/// reqwest-based calculation service client.
#[derive(Debug)]
pub struct HttpCalculationService {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    company_code: String,
}

impl HttpCalculationService {
    /// Creates a client for the calculation endpoint at `base_url`.
    ///
    /// `token` and `company_code` come from the host's session; they are
    /// attached to every request as `Authorization` and `X-Company`.
    pub fn new(base_url: &str, token: impl Into<String>, company_code: impl Into<String>) -> CalcResult<Self> {
        Ok(HttpCalculationService {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
            company_code: company_code.into(),
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        request: &CalcRequest,
    ) -> CalcResult<Envelope<T>> {
        let url = self.base_url.join(path)?;
        debug!(%url, lines = request.lines.len(), "Calling calculation service");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("X-Company", &self.company_code)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Envelope<T>>().await?)
    }

    fn rejection(envelope_message: Option<String>) -> CalcError {
        CalcError::Rejected {
            message: envelope_message
                .unwrap_or_else(|| "Calculation rejected by the server".to_string()),
        }
    }
}

#[async_trait]
impl CalculationService for HttpCalculationService {
    async fn recalculate(&self, request: &CalcRequest) -> CalcResult<CalcTotals> {
        let envelope: Envelope<CalcTotals> = self.post("calculate", request).await?;
        if !envelope.success {
            return Err(Self::rejection(envelope.message));
        }
        envelope.data.ok_or(CalcError::EmptyResponse)
    }

    async fn validate(&self, request: &CalcRequest) -> CalcResult<()> {
        let envelope: Envelope<NoData> = self.post("validate", request).await?;
        if !envelope.success {
            return Err(Self::rejection(envelope.message));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpCalculationService::new("not a url", "tok", "C01").unwrap_err();
        assert!(matches!(err, CalcError::InvalidUrl(_)));
    }

    #[test]
    fn test_envelope_deserializes() {
        let json = r#"{"success":false,"message":"Remaining total below minimum","data":null}"#;
        let envelope: Envelope<NoData> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(
            envelope.message.as_deref(),
            Some("Remaining total below minimum")
        );
    }

    #[test]
    fn test_totals_envelope_deserializes() {
        let json = r#"{
            "success": true,
            "message": null,
            "data": {
                "totalBeforeDiscount": "300",
                "discountAmount": "30",
                "discountAmountLocal": "60",
                "totalBeforeVat": "270",
                "vatBase": "270",
                "vatAmount": "27",
                "grandTotal": "297"
            }
        }"#;
        let envelope: Envelope<CalcTotals> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        let totals = envelope.data.unwrap();
        assert_eq!(totals.grand_total.to_string(), "297");
    }
}
