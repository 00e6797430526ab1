//! # Finance Module
//!
//! Pure reducers behind the treasurer's financial report: default date
//! windows per report type and the income breakdown over paid receipts.

use crate::document::DocumentType;
use crate::error::{CoreError, CoreResult};
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Report window kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Monthly,
    Quarterly,
    Annual,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Monthly => "monthly",
            ReportType::Quarterly => "quarterly",
            ReportType::Annual => "annual",
        }
    }

    /// Unrecognized values fall back to monthly.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "quarterly" => ReportType::Quarterly,
            "annual" => ReportType::Annual,
            _ => ReportType::Monthly,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive `(start, end)` window for a report type relative to `today`.
///
/// - monthly: first..last day of the current month
/// - quarterly: the current 3-month block (Jan-Mar, Apr-Jun, ...)
/// - annual: Jan 1..Dec 31
pub fn default_date_range(today: NaiveDate, report_type: ReportType) -> (NaiveDate, NaiveDate) {
    let month_start = today - Days::new(u64::from(today.day0()));
    let (start, span) = match report_type {
        ReportType::Monthly => (month_start, 1),
        ReportType::Quarterly => (month_start - Months::new(today.month0() % 3), 3),
        ReportType::Annual => (month_start - Months::new(today.month0()), 12),
    };
    let end = start + Months::new(span) - Days::new(1);
    (start, end)
}

/// Parse a `YYYY-MM-DD` query parameter
pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

/// Resolve the report window: explicit dates win only when both are given.
pub fn resolve_range(
    report_type: ReportType,
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> CoreResult<(NaiveDate, NaiveDate)> {
    let start = start.filter(|s| !s.trim().is_empty());
    let end = end.filter(|s| !s.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => {
            let (start, end) = (parse_date(start)?, parse_date(end)?);
            if start > end {
                return Err(CoreError::ValidationError(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
            Ok((start, end))
        }
        _ => Ok(default_date_range(today, report_type)),
    }
}

/// One paid receipt joined with its request's price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidLine {
    pub document_type: DocumentType,
    pub amount: Decimal,
}

/// Income for one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    pub document_type: DocumentType,
    pub category: String,
    pub amount: Decimal,
    /// Share of total income, 2 decimal places; 0 when total is 0
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub breakdown: Vec<BreakdownEntry>,
}

/// A summary over a concrete window, as shown and exported to the treasurer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialReport {
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub summary: FinancialSummary,
}

/// Reduce paid lines into total + breakdown sorted by amount descending.
pub fn summarize(lines: &[PaidLine]) -> FinancialSummary {
    let mut per_type: BTreeMap<DocumentType, Decimal> = BTreeMap::new();
    for line in lines {
        *per_type.entry(line.document_type).or_insert(Decimal::ZERO) += line.amount;
    }
    let total_income: Decimal = per_type.values().copied().sum();

    let mut breakdown: Vec<BreakdownEntry> = per_type
        .into_iter()
        .map(|(document_type, amount)| {
            let percent = if total_income.is_zero() {
                Decimal::ZERO
            } else {
                (amount / total_income * Decimal::ONE_HUNDRED).round_dp(2)
            };
            BreakdownEntry {
                document_type,
                category: document_type.label().to_string(),
                amount,
                percent,
            }
        })
        .collect();

    // stable sort keeps document-type order among equal amounts
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));

    FinancialSummary {
        total_income,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(doc: DocumentType) -> PaidLine {
        PaidLine {
            document_type: doc,
            amount: doc.price(),
        }
    }

    #[test]
    fn test_quarterly_range_mid_may() {
        let range = default_date_range(date(2024, 5, 15), ReportType::Quarterly);
        assert_eq!(range, (date(2024, 4, 1), date(2024, 6, 30)));
    }

    #[test]
    fn test_quarterly_range_last_quarter() {
        let range = default_date_range(date(2023, 11, 2), ReportType::Quarterly);
        assert_eq!(range, (date(2023, 10, 1), date(2023, 12, 31)));
    }

    #[test]
    fn test_monthly_range_leap_february() {
        let range = default_date_range(date(2024, 2, 10), ReportType::Monthly);
        assert_eq!(range, (date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[test]
    fn test_annual_range() {
        let range = default_date_range(date(2024, 7, 31), ReportType::Annual);
        assert_eq!(range, (date(2024, 1, 1), date(2024, 12, 31)));
    }

    #[test]
    fn test_unknown_report_type_is_monthly() {
        assert_eq!(ReportType::parse("weekly"), ReportType::Monthly);
        assert_eq!(ReportType::parse("Quarterly"), ReportType::Quarterly);
    }

    #[test]
    fn test_resolve_range_needs_both_dates() {
        let today = date(2024, 5, 15);
        let only_start = resolve_range(ReportType::Annual, Some("2024-01-05"), None, today).unwrap();
        assert_eq!(only_start, (date(2024, 1, 1), date(2024, 12, 31)));

        let explicit =
            resolve_range(ReportType::Annual, Some("2024-03-01"), Some("2024-03-15"), today)
                .unwrap();
        assert_eq!(explicit, (date(2024, 3, 1), date(2024, 3, 15)));

        assert!(resolve_range(ReportType::Monthly, Some("2024-03-40"), Some("2024-04-01"), today)
            .is_err());
        assert!(resolve_range(ReportType::Monthly, Some("2024-05-01"), Some("2024-04-01"), today)
            .is_err());
    }

    #[test]
    fn test_summarize_breakdown() {
        let lines = vec![
            line(DocumentType::BusinessPermit),
            line(DocumentType::BarangayClearance),
            line(DocumentType::BarangayClearance),
            line(DocumentType::IndigencyCertificate),
        ];
        let summary = summarize(&lines);

        assert_eq!(summary.total_income, dec!(300));
        assert_eq!(summary.breakdown.len(), 3);
        assert_eq!(summary.breakdown[0].document_type, DocumentType::BusinessPermit);
        assert_eq!(summary.breakdown[0].percent, dec!(66.67));
        assert_eq!(summary.breakdown[1].amount, dec!(100));
        assert_eq!(summary.breakdown[1].percent, dec!(33.33));
        assert_eq!(summary.breakdown[2].percent, dec!(0));

        let total: Decimal = summary.breakdown.iter().map(|e| e.percent).sum();
        assert!((total - dec!(100)).abs() <= dec!(0.05));
    }

    #[test]
    fn test_summarize_zero_total() {
        let summary = summarize(&[line(DocumentType::IndigencyCertificate)]);
        assert_eq!(summary.total_income, dec!(0));
        assert!(summary.breakdown.iter().all(|e| e.percent.is_zero()));

        let empty = summarize(&[]);
        assert!(empty.breakdown.is_empty());
    }
}
