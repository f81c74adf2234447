//! Report renderers: colored terminal summary, plain text and HTML

use colored::Colorize;
use ddllint_core::{Finding, Report, Severity};

/// Print the colored summary to stdout
pub fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "DDL Analysis Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if let Some(source) = &report.source {
        println!("Source: {}", source);
    }
    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Tables checked: {}", report.summary.tables_checked);
    println!("  Total findings: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", format!("{}", report.summary.info).blue());
    println!();

    if report.findings.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Findings:".bold());
        for finding in &report.findings {
            let severity_str = match finding.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warning => "WARN".yellow().bold(),
                Severity::Info => "INFO".blue(),
            };

            println!("  [{}] {}: {}", severity_str, finding.code, finding.message);
            if let Some(location) = location(finding) {
                println!("    at {}", location);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Uncolored text report, for writing to a file
pub fn generate_text_report(report: &Report) -> String {
    let mut text = String::new();

    text.push_str("DDL Analysis Report\n");
    text.push_str(&format!("{}\n\n", "=".repeat(60)));
    if let Some(source) = &report.source {
        text.push_str(&format!("Source: {}\n", source));
    }
    text.push_str(&format!("Version: {}\n", report.version));
    text.push_str(&format!("Timestamp: {}\n\n", report.timestamp));

    text.push_str(&format!("Tables checked: {}\n", report.summary.tables_checked));
    text.push_str(&format!(
        "Errors: {}  Warnings: {}  Info: {}\n\n",
        report.summary.errors, report.summary.warnings, report.summary.info
    ));

    if report.findings.is_empty() {
        text.push_str("No issues found!\n");
    }
    for finding in &report.findings {
        text.push_str(&format!(
            "[{}] {}: {}\n",
            finding.severity.to_string().to_uppercase(),
            finding.code,
            finding.message
        ));
        if let Some(location) = location(finding) {
            text.push_str(&format!("    at {}\n", location));
        }
    }

    text
}

/// Standalone HTML page with one color-coded entry per finding
pub fn generate_html_report(report: &Report) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>DDL Analysis Report</title>\n");
    html.push_str("<style>\n");
    html.push_str("body { font-family: sans-serif; margin: 2em; }\n");
    html.push_str(".finding { margin: 0.4em 0; }\n");
    for severity in [Severity::Error, Severity::Warning, Severity::Info] {
        html.push_str(&format!(".{} {{ color: {}; }}\n", severity, html_color(severity)));
    }
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<h1>DDL Analysis Report</h1>\n");
    if let Some(source) = &report.source {
        html.push_str(&format!("<p><strong>Source:</strong> {}</p>\n", escape_html(source)));
    }
    html.push_str(&format!("<p><strong>Timestamp:</strong> {}</p>\n", escape_html(&report.timestamp)));

    html.push_str("<h2>Summary</h2>\n<ul>\n");
    html.push_str(&format!("<li>Tables checked: {}</li>\n", report.summary.tables_checked));
    html.push_str(&format!("<li class=\"error\">Errors: {}</li>\n", report.summary.errors));
    html.push_str(&format!("<li class=\"warning\">Warnings: {}</li>\n", report.summary.warnings));
    html.push_str(&format!("<li class=\"info\">Info: {}</li>\n", report.summary.info));
    html.push_str("</ul>\n");

    html.push_str("<h2>Findings</h2>\n");
    if report.findings.is_empty() {
        html.push_str("<p>No issues found!</p>\n");
    }
    for finding in &report.findings {
        let at = location(finding)
            .map(|l| format!(" <em>at {}</em>", escape_html(&l)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<p class=\"finding {}\"><strong>{}</strong> <code>{}</code> {}{}</p>\n",
            finding.severity,
            finding.severity.to_string().to_uppercase(),
            finding.code,
            escape_html(&finding.message),
            at
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn html_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "red",
        Severity::Warning => "orange",
        Severity::Info => "blue",
    }
}

fn location(finding: &Finding) -> Option<String> {
    match (&finding.table, &finding.column) {
        (Some(table), Some(column)) => Some(format!("{}.{}", table, column)),
        (Some(table), None) => Some(table.clone()),
        _ => None,
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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
