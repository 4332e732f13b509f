//! Report materialization to CSV text and an HTML table fragment.
//!
//! Both renderers are pure; writing the file and sending the mail are the
//! caller's concern.

use super::filter::ReportRow;

/// Column headers, in display order.
pub const REPORT_HEADERS: [&str; 6] = [
    "Display Name",
    "UPN",
    "Email",
    "Sign-In Status",
    "Department",
    "Job Title",
];

/// Deterministic file name for the CSV download.
pub const REPORT_FILE_NAME: &str = "Users_Without_Manager_Report.csv";

/// Render rows as CSV text: one header line plus one line per row.
///
/// Fields containing a comma, quote, or line break are quoted and embedded
/// quotes doubled.
pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    lines.push(csv_line(&REPORT_HEADERS));
    for row in rows {
        lines.push(csv_line(&row.cells()));
    }

    lines.join("\n")
}

fn csv_line(cells: &[&str; 6]) -> String {
    cells
        .iter()
        .map(|cell| csv_field(cell))
        .collect::<Vec<_>>()
        .join(",")
}

/// Characters that force a field to be quoted.
const QUOTE_TRIGGERS: &[char] = &[',', '"', '\n', '\r'];

fn csv_field(value: &str) -> String {
    if value.contains(QUOTE_TRIGGERS) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render rows as a well-formed HTML `<table>` fragment for the mail body.
///
/// Every cell is escaped; directory-sourced strings are untrusted.
pub fn to_email_html(rows: &[ReportRow]) -> String {
    let mut html = String::from("<table border=\"1\">\n<thead>\n<tr>");
    for header in REPORT_HEADERS {
        html.push_str("<th>");
        html.push_str(&escape_html(header));
        html.push_str("</th>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>");
        for cell in row.cells() {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
