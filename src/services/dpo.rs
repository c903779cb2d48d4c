//! DPO payment gateway client.
//!
//! The gateway speaks XML over HTTP: `createToken` opens a transaction and
//! returns a redirect token, `verifyToken` reports whether the consumer
//! paid. Result code `000` is success and `900` means not-paid-yet;
//! everything else is a failure with an explanation.

use anyhow::{Context, Result};
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

use crate::domain::payments::{CreatePaymentRequest, PaymentStatus};
use crate::error::ApiError;

/// Client for the DPO gateway API.
#[derive(Clone)]
pub struct DpoClient {
    client: Client,
    base_url: String,
    company_token: String,
    service_type: String,
}

/// A created gateway transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DpoToken {
    pub trans_token: String,
    pub trans_ref: String,
    pub payment_url: String,
}

/// Outcome of a `verifyToken` call.
#[derive(Debug, Clone)]
pub struct DpoVerification {
    pub status: PaymentStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub transaction_amount: Option<String>,
    pub transaction_currency: Option<String>,
    pub explanation: Option<String>,
}

impl DpoClient {
    pub fn new(base_url: &str, company_token: &str, service_type: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            company_token: company_token.to_string(),
            service_type: service_type.to_string(),
        })
    }

    async fn post_xml(&self, request_name: &str, body: String) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, request_name);

        debug!(url = %url, request = request_name, "DPO request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "DPO request failed");
                ApiError::upstream(format!("Payment gateway unavailable: {}", e))
            })?;

        response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read DPO response");
            ApiError::upstream(format!("Invalid payment gateway response: {}", e))
        })
    }

    /// Open a transaction and return the token the consumer is redirected
    /// with.
    pub async fn create_token(&self, payment: &CreatePaymentRequest) -> Result<DpoToken, ApiError> {
        let service_date = Utc::now().format("%Y/%m/%d %H:%M").to_string();

        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<API3G>
  <CompanyToken>{company_token}</CompanyToken>
  <Request>createToken</Request>
  <Transaction>
    <PaymentAmount>{amount}</PaymentAmount>
    <PaymentCurrency>{currency}</PaymentCurrency>
    <CompanyRef>{reference}</CompanyRef>
    <RedirectURL>{redirect_url}</RedirectURL>
    <BackURL>{back_url}</BackURL>
    <CompanyRefUnique>0</CompanyRefUnique>
    <PTL>5</PTL>
  </Transaction>
  <Services>
    <Service>
      <ServiceType>{service_type}</ServiceType>
      <ServiceDescription>{description}</ServiceDescription>
      <ServiceDate>{service_date}</ServiceDate>
    </Service>
  </Services>
</API3G>"#,
            company_token = xml_escape(&self.company_token),
            amount = payment.amount,
            currency = xml_escape(&payment.currency),
            reference = xml_escape(&payment.reference),
            redirect_url = xml_escape(&payment.redirect_url),
            back_url = xml_escape(&payment.back_url),
            service_type = xml_escape(&self.service_type),
            description = xml_escape(&payment.description),
            service_date = service_date,
        );

        let response = self.post_xml("createToken", body).await?;
        parse_create_response(&response, &self.base_url)
    }

    /// Ask the gateway whether a transaction has been paid.
    pub async fn verify_token(&self, trans_token: &str) -> Result<DpoVerification, ApiError> {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<API3G>
  <CompanyToken>{company_token}</CompanyToken>
  <Request>verifyToken</Request>
  <TransactionToken>{trans_token}</TransactionToken>
</API3G>"#,
            company_token = xml_escape(&self.company_token),
            trans_token = xml_escape(trans_token),
        );

        let response = self.post_xml("verifyToken", body).await?;
        Ok(parse_verify_response(&response))
    }
}

/// Minimal XML text escaping for the request templates.
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// First text content of `tag` in a flat gateway response.
fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == tag.as_bytes() => {
                return reader
                    .read_text(e.name())
                    .ok()
                    .map(|text| text.into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn parse_create_response(xml: &str, base_url: &str) -> Result<DpoToken, ApiError> {
    let result = xml_text(xml, "Result")
        .ok_or_else(|| ApiError::upstream("Payment gateway returned no result code"))?;

    if result != "000" {
        let explanation = xml_text(xml, "ResultExplanation")
            .unwrap_or_else(|| "Unknown gateway error".to_string());
        return Err(ApiError::upstream(format!("DPO error: {}", explanation)));
    }

    let trans_token = xml_text(xml, "TransToken")
        .ok_or_else(|| ApiError::upstream("Gateway response missing TransToken"))?;
    let trans_ref = xml_text(xml, "TransRef")
        .ok_or_else(|| ApiError::upstream("Gateway response missing TransRef"))?;

    let payment_url = format!(
        "{}payv2.php?ID={}",
        base_url.replace("API/v6/", ""),
        trans_token
    );

    Ok(DpoToken {
        trans_token,
        trans_ref,
        payment_url,
    })
}

fn parse_verify_response(xml: &str) -> DpoVerification {
    let result = xml_text(xml, "Result").unwrap_or_default();

    match result.as_str() {
        // Transaction not paid yet
        "900" => DpoVerification {
            status: PaymentStatus::Pending,
            customer_name: None,
            customer_phone: None,
            transaction_amount: None,
            transaction_currency: None,
            explanation: None,
        },
        "000" => DpoVerification {
            status: PaymentStatus::Paid,
            customer_name: xml_text(xml, "CustomerName"),
            customer_phone: xml_text(xml, "CustomerPhone"),
            transaction_amount: xml_text(xml, "TransactionAmount"),
            transaction_currency: xml_text(xml, "TransactionCurrency"),
            explanation: None,
        },
        _ => DpoVerification {
            status: PaymentStatus::Failed,
            customer_name: None,
            customer_phone: None,
            transaction_amount: None,
            transaction_currency: None,
            explanation: xml_text(xml, "ResultExplanation"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "https://secure.3gdirectpay.com/API/v6/";

    #[test]
    fn create_response_yields_token_and_payment_url() {
        let xml = r#"<?xml version="1.0"?>
<API3G>
  <Result>000</Result>
  <ResultExplanation>Transaction created</ResultExplanation>
  <TransToken>ABC-123</TransToken>
  <TransRef>REF-9</TransRef>
</API3G>"#;

        let token = parse_create_response(xml, BASE_URL).unwrap();
        assert_eq!(token.trans_token, "ABC-123");
        assert_eq!(token.trans_ref, "REF-9");
        assert_eq!(
            token.payment_url,
            "https://secure.3gdirectpay.com/payv2.php?ID=ABC-123"
        );
    }

    #[test]
    fn create_failure_surfaces_explanation() {
        let xml = r#"<API3G>
  <Result>801</Result>
  <ResultExplanation>Request missing company token</ResultExplanation>
</API3G>"#;

        let err = parse_create_response(xml, BASE_URL).unwrap_err();
        assert!(err.to_string().contains("company token"));
    }

    #[test]
    fn verify_maps_result_codes() {
        let pending = parse_verify_response("<API3G><Result>900</Result></API3G>");
        assert_eq!(pending.status, PaymentStatus::Pending);

        let paid = parse_verify_response(
            r#"<API3G>
  <Result>000</Result>
  <TransactionToken>ABC-123</TransactionToken>
  <CustomerName>Neo M</CustomerName>
  <TransactionAmount>450.00</TransactionAmount>
  <TransactionCurrency>BWP</TransactionCurrency>
</API3G>"#,
        );
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.customer_name.as_deref(), Some("Neo M"));
        assert_eq!(paid.transaction_amount.as_deref(), Some("450.00"));

        let failed = parse_verify_response(
            "<API3G><Result>904</Result><ResultExplanation>Declined</ResultExplanation></API3G>",
        );
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert_eq!(failed.explanation.as_deref(), Some("Declined"));
    }

    #[test]
    fn escaping_covers_markup_characters() {
        assert_eq!(xml_escape("Fish & Chips <Ltd>"), "Fish &amp; Chips &lt;Ltd&gt;");
    }

    #[test]
    fn missing_tag_is_none() {
        assert_eq!(xml_text("<API3G><Result>000</Result></API3G>", "TransToken"), None);
    }
}
