//! Financial report as exportable table data

use crate::exporters::ReportData;
use barangay_core::FinancialReport;
use chrono::{DateTime, Utc};

/// One breakdown row per document type
#[derive(Debug, Clone)]
pub struct FinancialReportData {
    title: String,
    report: FinancialReport,
    generated_at: DateTime<Utc>,
}

impl FinancialReportData {
    pub fn new(report: FinancialReport) -> Self {
        let title = format!(
            "Barangay Financial Report ({}) {} to {}",
            report.report_type, report.start_date, report.end_date
        );
        Self {
            title,
            report,
            generated_at: Utc::now(),
        }
    }

    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Suggested download name, e.g. `financial-report-quarterly-2024-04-01.csv`
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "financial-report-{}-{}.{}",
            self.report.report_type, self.report.start_date, extension
        )
    }
}

impl ReportData for FinancialReportData {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        ["Document Type", "Category", "Amount", "Percent"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.report
            .summary
            .breakdown
            .iter()
            .map(|entry| {
                vec![
                    entry.document_type.as_str().to_string(),
                    entry.category.clone(),
                    entry.amount.to_string(),
                    format!("{:.2}", entry.percent),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("Report Type".to_string(), self.report.report_type.to_string()),
            ("Start Date".to_string(), self.report.start_date.to_string()),
            ("End Date".to_string(), self.report.end_date.to_string()),
            ("Total Income".to_string(), self.report.summary.total_income.to_string()),
            ("Generated At".to_string(), self.generated_at.to_rfc3339()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::{CsvExporter, MarkdownExporter, ReportExporter};
    use barangay_core::{summarize, DocumentType, PaidLine, ReportType};
    use chrono::NaiveDate;

    fn report() -> FinancialReport {
        let lines: Vec<PaidLine> = [
            DocumentType::BusinessPermit,
            DocumentType::BarangayClearance,
            DocumentType::IndigencyCertificate,
        ]
        .into_iter()
        .map(|document_type| PaidLine {
            document_type,
            amount: document_type.price(),
        })
        .collect();
        FinancialReport {
            report_type: ReportType::Quarterly,
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            summary: summarize(&lines),
        }
    }

    #[test]
    fn test_csv_rows_sorted_by_amount() {
        let data = FinancialReportData::new(report());
        let output = CsvExporter::new().export(&data);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Document Type,Category,Amount,Percent");
        assert!(lines[1].starts_with("business-permit,"));
        assert!(lines[1].ends_with(",200,80.00"));
        assert!(lines[3].ends_with(",0,0.00"));
        assert_eq!(data.file_name("csv"), "financial-report-quarterly-2024-04-01.csv");
    }

    #[test]
    fn test_markdown_summary() {
        let data = FinancialReportData::new(report());
        let output = MarkdownExporter::new().export(&data);
        assert!(output.contains("- **Total Income**: 250"));
        assert!(output.contains("(quarterly) 2024-04-01 to 2024-06-30"));
    }
}
