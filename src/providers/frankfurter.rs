use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use super::util::with_retry;
use crate::core::rates::{Rate, RateProvider};

/// Exchange rate provider backed by the Frankfurter API.
pub struct FrankfurterProvider {
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    base: String,
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(
        name = "RateFetch",
        skip(self, codes),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str, codes: &[String]) -> Result<Vec<Rate>> {
        let fetched_at = Utc::now();
        let mut rates = vec![Rate::new(base, Decimal::ONE, fetched_at)];
        if codes.is_empty() {
            return Ok(rates);
        }

        let url = format!(
            "{}/v1/latest?base={}&symbols={}",
            self.base_url,
            base,
            codes.join(",")
        );
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder().user_agent("outlay/0.1").build()?;
        let response = with_retry(
            || async {
                client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<FrankfurterResponse>()
                    .await
            },
            3,
            500,
        )
        .await
        .context("Exchange rate request failed")?;
        debug!(
            "Received {} quotes for base {}",
            response.rates.len(),
            response.base
        );

        for code in codes {
            match response.rates.get(code) {
                Some(ratio) => rates.push(Rate::new(code.clone(), *ratio, fetched_at)),
                None => warn!("Provider returned no rate for {}", code),
            }
        }
        Ok(rates)
    }
}
