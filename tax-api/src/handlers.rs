//! Request handlers.
//!
//! Each handler takes a raw body and returns a status and a JSON body.
//! Failures never leak detail to the caller: the cause is logged and the
//! response carries a fixed message with status 500.

use serde::Serialize;
use serde_json::{Value, json};
use tax_core::calculations::{
    DueDateRule, ScheduleError, TaxEngine, quarterly_due_dates_with_rule,
};
use tax_core::{BracketTableProvider, QuarterPeriod, TableError, TaxCalculationResult, TaxTables};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{AppConfig, ConfigError};
use crate::request::{CalculateRequest, QuarterlyRequest, RequestError};

pub const CALCULATE_FAILED: &str = "Failed to calculate taxes";
pub const QUARTERLY_FAILED: &str = "Failed to build quarterly schedule";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Everything a handler needs. Built once and shared by reference.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub tables: TaxTables,
    pub engine: TaxEngine,
    /// Used when a request names no year.
    pub default_year: i32,
    pub due_date_rule: DueDateRule,
}

impl ApiContext {
    pub fn new(
        tables: TaxTables,
        default_year: i32,
    ) -> Self {
        Self {
            tables,
            engine: TaxEngine::default(),
            default_year,
            due_date_rule: DueDateRule::default(),
        }
    }

    pub fn with_due_date_rule(
        mut self,
        rule: DueDateRule,
    ) -> Self {
        self.due_date_rule = rule;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.tax_tables()?, config.tax.year)
            .with_due_date_rule(config.tax.due_date_rule))
    }

    /// Resolves the table for a request and runs the engine.
    pub fn calculate(
        &self,
        request: &CalculateRequest,
    ) -> Result<TaxCalculationResult, ApiError> {
        let tax_year = request.tax_year.unwrap_or(self.default_year);
        let input = request.input();
        let table = self.tables.lookup(input.filing_status, tax_year)?;
        debug!(tax_year, filing_status = %input.filing_status, "calculating");
        Ok(self.engine.calculate(&input, table).normalized())
    }

    pub fn quarterly(
        &self,
        request: &QuarterlyRequest,
    ) -> Result<[QuarterPeriod; 4], ApiError> {
        let year = request.year.unwrap_or(self.default_year);
        Ok(quarterly_due_dates_with_rule(year, self.due_date_rule)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        Ok(Self {
            status: 200,
            body: serde_json::to_value(value)?,
        })
    }

    fn failure(message: &str) -> Self {
        Self {
            status: 500,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

fn respond<T: Serialize>(
    result: Result<T, ApiError>,
    failure: &'static str,
) -> ApiResponse {
    match result.and_then(|value| ApiResponse::ok(&value)) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "{failure}");
            ApiResponse::failure(failure)
        }
    }
}

/// Handles a calculation request body.
pub fn handle_calculate(
    ctx: &ApiContext,
    body: &str,
) -> ApiResponse {
    let result = serde_json::from_str::<Value>(body)
        .map_err(ApiError::from)
        .and_then(|value| Ok(CalculateRequest::from_json(&value)?))
        .and_then(|request| ctx.calculate(&request));
    respond(result, CALCULATE_FAILED)
}

/// Handles a quarterly schedule request body. An empty body asks for the
/// default year.
pub fn handle_quarterly(
    ctx: &ApiContext,
    body: &str,
) -> ApiResponse {
    let result = if body.trim().is_empty() {
        Ok(QuarterlyRequest::default())
    } else {
        serde_json::from_str::<Value>(body)
            .map_err(ApiError::from)
            .and_then(|value| Ok(QuarterlyRequest::from_json(&value)?))
    }
    .and_then(|request| ctx.quarterly(&request));
    respond(result, QUARTERLY_FAILED)
}
