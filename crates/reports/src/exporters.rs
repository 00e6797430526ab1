//! Report exporters - CSV, JSON, Markdown

/// Renders [`ReportData`] into one document format
pub trait ReportExporter: Send + Sync {
    fn export(&self, report: &dyn ReportData) -> String;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Content-Type of the exported document
    fn mime_type(&self) -> &'static str;
}

/// Tabular view of a report
pub trait ReportData {
    fn title(&self) -> &str;

    fn headers(&self) -> Vec<String>;

    fn rows(&self) -> Vec<Vec<String>>;

    /// Key/value lines printed above the table
    fn summary(&self) -> Vec<(String, String)>;
}

/// Formats accepted by `?format=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "markdown" | "md" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn exporter(&self) -> Box<dyn ReportExporter> {
        match self {
            ExportFormat::Csv => Box::new(CsvExporter::new()),
            ExportFormat::Json => Box::new(JsonExporter::new()),
            ExportFormat::Markdown => Box::new(MarkdownExporter::new()),
        }
    }
}

// ============================================================================
// CSV Exporter
// ============================================================================

pub struct CsvExporter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    fn field(&self, raw: &str) -> String {
        let needs_quotes = raw.contains(self.delimiter) || raw.contains(['"', '\n', '\r']);
        if needs_quotes {
            format!("\"{}\"", raw.replace('"', "\"\""))
        } else {
            raw.to_string()
        }
    }

    fn line(&self, fields: &[String]) -> String {
        let mut line = fields
            .iter()
            .map(|f| self.field(f))
            .collect::<Vec<_>>()
            .join(&self.delimiter.to_string());
        line.push('\n');
        line
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();
        if self.include_header {
            output.push_str(&self.line(&report.headers()));
        }
        for row in report.rows() {
            output.push_str(&self.line(&row));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}

// ============================================================================
// JSON Exporter
// ============================================================================

pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let headers = report.headers();
        let rows: Vec<serde_json::Value> = report
            .rows()
            .into_iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter().map(serde_json::Value::String))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();
        let summary: serde_json::Map<String, serde_json::Value> = report
            .summary()
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::String(value)))
            .collect();

        let document = serde_json::json!({
            "title": report.title(),
            "summary": summary,
            "rows": rows,
        });

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        // a Value built from strings always serializes
        rendered.unwrap_or_default()
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

// ============================================================================
// Markdown Exporter
// ============================================================================

pub struct MarkdownExporter {
    include_summary: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_summary: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    fn cell(raw: &str) -> String {
        raw.replace('|', "\\|").replace('\n', " ")
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = format!("# {}\n\n", report.title());

        if self.include_summary {
            for (key, value) in report.summary() {
                output.push_str(&format!("- **{}**: {}\n", key, value));
            }
            output.push('\n');
        }

        let headers = report.headers();
        if headers.is_empty() {
            return output;
        }
        let row_line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));

        output.push_str(&row_line(headers.iter().map(|h| Self::cell(h)).collect()));
        output.push_str(&row_line(headers.iter().map(|_| "---".to_string()).collect()));
        let rows = report.rows();
        if rows.is_empty() {
            output.push_str(&row_line(
                std::iter::once("_no paid receipts_".to_string())
                    .chain(std::iter::repeat(String::new()).take(headers.len() - 1))
                    .collect(),
            ));
        }
        for row in rows {
            output.push_str(&row_line(row.iter().map(|c| Self::cell(c)).collect()));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}
