//! Financial aggregator - read-only income reports for the treasurer

use crate::error::BusinessResult;
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::{resolve_range, summarize, CoreError, FinancialReport, PaidLine, ReportType};
use barangay_persistence::ReceiptRepo;
use chrono::{Days, NaiveDate, Utc};

pub struct FinanceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FinanceService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Report for `report_type`; explicit dates override the default window
    /// only when both are given.
    pub async fn report(
        &self,
        report_type: ReportType,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> BusinessResult<FinancialReport> {
        let today = Utc::now().date_naive();
        let (start, end) = resolve_range(report_type, start_date, end_date, today)?;
        self.report_between(report_type, start, end).await
    }

    /// Report over paid receipts with `start <= paid date <= end`
    pub async fn report_between(
        &self,
        report_type: ReportType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BusinessResult<FinancialReport> {
        let from = start.and_time(chrono::NaiveTime::MIN).and_utc();
        let until = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CoreError::InvalidDate(end.to_string()))?
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let rows = ReceiptRepo::paid_lines(self.ctx.pool(), from, until)
            .await
            .context("Failed to load paid receipts")?;
        let lines = rows
            .iter()
            .map(|row| row.to_paid_line())
            .collect::<Result<Vec<PaidLine>, _>>()
            .context("Corrupt paid receipt row")?;

        let summary = summarize(&lines);
        tracing::debug!(
            report_type = report_type.as_str(),
            %start,
            %end,
            receipts = lines.len(),
            total = %summary.total_income,
            "Financial report computed"
        );

        Ok(FinancialReport {
            report_type,
            start_date: start,
            end_date: end,
            summary,
        })
    }
}
