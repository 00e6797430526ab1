//! # Barangay Reports
//!
//! Export of the treasurer's financial report.
//!
//! ## Exporters
//!
//! - [`CsvExporter`] - one row per document type, quoted where needed
//! - [`JsonExporter`] - title, summary and rows (pretty or compact)
//! - [`MarkdownExporter`] - summary list plus a breakdown table
//!
//! ## Example
//!
//! ```rust,ignore
//! use barangay_reports::{ExportFormat, FinancialReportData};
//!
//! let data = FinancialReportData::new(report);
//! let format = ExportFormat::parse("csv").unwrap();
//! let body = format.exporter().export(&data);
//! ```

pub mod exporters;
pub mod financial;

pub use exporters::{CsvExporter, ExportFormat, JsonExporter, MarkdownExporter, ReportData, ReportExporter};
pub use financial::FinancialReportData;
