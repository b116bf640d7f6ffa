//! Narrative advice from an external provider, bounded by a timeout.
//!
//! Advice is informational only. Nothing on the financial path waits for
//! it, and every failure degrades to a fixed fallback message.

use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AdvisoryConfig;
use crate::core::services::DashboardSummary;
use crate::domain::{Amount, Loan, Member};

pub const FALLBACK_FINANCIAL_ADVICE: &str = "Gagal mendapatkan analisis AI saat ini.";
pub const FALLBACK_LOAN_RISK: &str = "Analisis risiko tidak tersedia.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("advice provider unavailable: {0}")]
    Unavailable(String),
    #[error("advice request failed: {0}")]
    Failed(String),
    #[error("advice request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("advice provider panicked")]
    Panicked,
}

/// Inputs for a loan risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanRiskRequest {
    pub member_name: String,
    pub member_balance: Amount,
    pub loan_amount: Amount,
    pub interest_rate: Decimal,
    pub tenure_months: u32,
}

impl LoanRiskRequest {
    pub fn for_loan(member: &Member, loan: &Loan) -> Self {
        Self {
            member_name: member.name.clone(),
            member_balance: member.balance,
            loan_amount: loan.principal,
            interest_rate: loan.interest_rate,
            tenure_months: loan.tenure_months,
        }
    }
}

/// Source of advisory text, typically a generative model behind an API.
pub trait AdviceProvider: Send + Sync {
    fn financial_advice(&self, summary: &DashboardSummary) -> Result<String, AdvisoryError>;
    fn loan_risk(&self, request: &LoanRiskRequest) -> Result<String, AdvisoryError>;
}

/// Provider returning fixed text.
#[derive(Debug, Clone, Default)]
pub struct StaticAdvice {
    pub financial: String,
    pub loan_risk: String,
}

impl AdviceProvider for StaticAdvice {
    fn financial_advice(&self, _summary: &DashboardSummary) -> Result<String, AdvisoryError> {
        Ok(self.financial.clone())
    }

    fn loan_risk(&self, _request: &LoanRiskRequest) -> Result<String, AdvisoryError> {
        Ok(self.loan_risk.clone())
    }
}

/// Provider for deployments without an advice backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAdvice;

impl AdviceProvider for UnavailableAdvice {
    fn financial_advice(&self, _summary: &DashboardSummary) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Unavailable("no provider configured".into()))
    }

    fn loan_risk(&self, _request: &LoanRiskRequest) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Unavailable("no provider configured".into()))
    }
}

/// Runs provider calls on a worker thread and never returns an error.
#[derive(Clone)]
pub struct AdvisoryService {
    provider: Arc<dyn AdviceProvider>,
    timeout: Duration,
    financial_fallback: String,
    loan_risk_fallback: String,
}

impl AdvisoryService {
    pub fn new(provider: Arc<dyn AdviceProvider>, config: &AdvisoryConfig) -> Self {
        Self {
            provider,
            timeout: Duration::from_millis(config.timeout_ms),
            financial_fallback: config.financial_fallback.clone(),
            loan_risk_fallback: config.loan_risk_fallback.clone(),
        }
    }

    pub fn financial_advice(&self, summary: &DashboardSummary) -> String {
        let summary = summary.clone();
        self.run("financial_advice", &self.financial_fallback, move |provider| {
            provider.financial_advice(&summary)
        })
    }

    pub fn loan_risk(&self, request: &LoanRiskRequest) -> String {
        let request = request.clone();
        self.run("loan_risk", &self.loan_risk_fallback, move |provider| {
            provider.loan_risk(&request)
        })
    }

    /// Fire-and-forget variant; `callback` receives the advice or the fallback.
    pub fn financial_advice_with<F>(&self, summary: DashboardSummary, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        let service = self.clone();
        thread::spawn(move || callback(service.financial_advice(&summary)))
    }

    pub fn loan_risk_with<F>(&self, request: LoanRiskRequest, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        let service = self.clone();
        thread::spawn(move || callback(service.loan_risk(&request)))
    }

    fn run<F>(&self, operation: &'static str, fallback: &str, job: F) -> String
    where
        F: FnOnce(&dyn AdviceProvider) -> Result<String, AdvisoryError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let spawned = thread::Builder::new()
            .name(format!("advisory-{operation}"))
            .spawn(move || {
                // The receiver is gone once the caller timed out.
                let _ = tx.send(job(provider.as_ref()));
            });
        if let Err(err) = spawned {
            warn!(operation, %err, "could not start advisory worker");
            return fallback.to_string();
        }
        let outcome = match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(AdvisoryError::TimedOut(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(AdvisoryError::Panicked),
        };
        match outcome {
            Ok(text) => {
                debug!(operation, chars = text.len(), "advice received");
                text
            }
            Err(err) => {
                warn!(operation, %err, "advice unavailable, using fallback");
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowAdvice(Duration);

    impl AdviceProvider for SlowAdvice {
        fn financial_advice(&self, _summary: &DashboardSummary) -> Result<String, AdvisoryError> {
            thread::sleep(self.0);
            Ok("terlambat".into())
        }

        fn loan_risk(&self, _request: &LoanRiskRequest) -> Result<String, AdvisoryError> {
            panic!("provider bug");
        }
    }

    fn config(timeout_ms: u64) -> AdvisoryConfig {
        AdvisoryConfig {
            timeout_ms,
            ..AdvisoryConfig::default()
        }
    }

    fn request() -> LoanRiskRequest {
        LoanRiskRequest {
            member_name: "Siti Aminah".into(),
            member_balance: 1_000_000,
            loan_amount: 50_000_000,
            interest_rate: Decimal::from(10),
            tenure_months: 24,
        }
    }

    #[test]
    fn provider_text_is_passed_through() {
        let provider = StaticAdvice {
            financial: "Likuiditas sehat.".into(),
            loan_risk: "Risiko rendah.".into(),
        };
        let service = AdvisoryService::new(Arc::new(provider), &config(1_000));
        assert_eq!(
            service.financial_advice(&DashboardSummary::default()),
            "Likuiditas sehat."
        );
        assert_eq!(service.loan_risk(&request()), "Risiko rendah.");
    }

    #[test]
    fn errors_fall_back() {
        let service = AdvisoryService::new(Arc::new(UnavailableAdvice), &config(1_000));
        assert_eq!(
            service.financial_advice(&DashboardSummary::default()),
            FALLBACK_FINANCIAL_ADVICE
        );
        assert_eq!(service.loan_risk(&request()), FALLBACK_LOAN_RISK);
    }

    #[test]
    fn timeouts_and_panics_fall_back() {
        let service = AdvisoryService::new(
            Arc::new(SlowAdvice(Duration::from_millis(500))),
            &config(20),
        );
        assert_eq!(
            service.financial_advice(&DashboardSummary::default()),
            FALLBACK_FINANCIAL_ADVICE
        );
        assert_eq!(service.loan_risk(&request()), FALLBACK_LOAN_RISK);
    }

    #[test]
    fn callback_variant_delivers_result() {
        let service = AdvisoryService::new(Arc::new(UnavailableAdvice), &config(1_000));
        let (tx, rx) = mpsc::channel();
        service
            .loan_risk_with(request(), move |text| tx.send(text).unwrap())
            .join()
            .unwrap();
        assert_eq!(rx.recv().unwrap(), FALLBACK_LOAN_RISK);
    }
}
