//! HTML for the form and results pages

use std::fmt::Write as _;

use crate::api::session::Flash;
use crate::domain::{ConstraintAnalysis, SolveReport};

pub const FORM_PAGE: &str = include_str!("../../assets/form.html");

const STYLE: &str = "body { font-family: sans-serif; margin: 2rem; } \
table { border-collapse: collapse; margin-bottom: 1.5rem; } \
td, th { border: 1px solid #ccc; padding: 0.3rem 0.7rem; text-align: right; } \
th { background: #f0f0f0; } td.name { text-align: left; } \
.error { color: #a00; font-weight: bold; } .binding { color: #060; }";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Up to four decimals, trailing zeros dropped, no negative zero
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "&ndash;".to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>{}</style>\n</head>\n<body>\n<main>\n{}\n<p><a href=\"/\">New problem</a></p>\n</main>\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn analysis_rows(rows: &[ConstraintAnalysis]) -> String {
    let mut html = String::new();
    for row in rows {
        let _ = writeln!(
            html,
            "<tr{}><td class=\"name\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            if row.binding { " class=\"binding\"" } else { "" },
            escape(&row.name),
            format_number(row.activity),
            escape(&row.operator.to_string()),
            format_number(row.rhs),
            format_number(row.slack),
            optional_number(row.shadow_price),
        );
    }
    html
}

fn report_body(report: &SolveReport) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<h1>Results for '{}'</h1>\n<p>Status: <strong>{}</strong></p>",
        escape(&report.problem_name),
        report.status
    );

    if let Some(objective) = report.objective_value {
        let _ = writeln!(
            html,
            "<p>Optimal objective value ({}): <strong>{}</strong></p>",
            report.sense,
            format_number(objective)
        );
    }

    if !report.variables.is_empty() {
        html.push_str("<h2>Decision variables</h2>\n<table>\n<tr><th>Variable</th><th>Value</th></tr>\n");
        for var in &report.variables {
            let _ = writeln!(
                html,
                "<tr><td class=\"name\">{}</td><td>{}</td></tr>",
                escape(&var.name),
                optional_number(var.value)
            );
        }
        html.push_str("</table>\n");
    }

    if !report.constraints_analysis.is_empty() {
        html.push_str(
            "<h2>Sensitivity analysis</h2>\n<table>\n<tr><th>Constraint</th><th>Activity</th>\
             <th></th><th>RHS</th><th>Slack</th><th>Shadow price</th></tr>\n",
        );
        html.push_str(&analysis_rows(&report.constraints_analysis));
        html.push_str("</table>\n");
    }

    if let Some(plot) = &report.plot {
        let _ = writeln!(
            html,
            "<h2>Feasible region</h2>\n<img alt=\"Feasible region of {}\" src=\"{}\">",
            escape(&report.problem_name),
            plot.data_uri
        );
    }

    if !report.status.is_optimal() {
        html.push_str("<p>No optimal solution was found for this problem.</p>\n");
    }

    html
}

pub fn results_page(flash: Option<&Flash>) -> String {
    match flash {
        Some(Flash::Results(report)) => layout(
            &format!("Results - {}", report.problem_name),
            &report_body(report),
        ),
        Some(Flash::Error(message)) => layout(
            "Results - error",
            &format!("<h1>Results</h1>\n<p class=\"error\">{}</p>", escape(message)),
        ),
        None => layout(
            "Results",
            "<h1>Results</h1>\n<p>There are no results to show. Submit a problem first.</p>",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Operator, Plot, Sense, SolveStatus, VariableValue};

    fn report() -> SolveReport {
        SolveReport {
            problem_name: "Wyndor".to_string(),
            sense: Sense::Maximize,
            status: SolveStatus::Optimal,
            objective_value: Some(36.0),
            variables: vec![
                VariableValue { name: "x".to_string(), value: Some(2.0) },
                VariableValue { name: "y".to_string(), value: Some(6.0) },
            ],
            constraints_analysis: vec![ConstraintAnalysis {
                name: "Constraint_3".to_string(),
                operator: Operator::Le,
                rhs: 18.0,
                activity: 18.0,
                slack: 0.0,
                shadow_price: Some(1.0),
                binding: true,
            }],
            plot: Some(Plot {
                svg: "<svg/>".to_string(),
                data_uri: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
            }),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"a\" & 'b'</b>"), "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(36.0), "36");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.333333), "0.3333");
        assert_eq!(format_number(-0.00001), "0");
        assert_eq!(format_number(-2.25), "-2.25");
    }

    #[test]
    fn test_results_page_with_report() {
        let html = results_page(Some(&Flash::Results(Box::new(report()))));
        assert!(html.contains("Results for 'Wyndor'"));
        assert!(html.contains("<strong>Optimal</strong>"));
        assert!(html.contains("<strong>36</strong>"));
        assert!(html.contains("Constraint_3"));
        assert!(html.contains("&lt;="));
        assert!(html.contains("src=\"data:image/svg+xml;base64,PHN2Zy8+\""));
    }

    #[test]
    fn test_results_page_error_and_empty() {
        let html = results_page(Some(&Flash::Error("bad <input>".to_string())));
        assert!(html.contains("class=\"error\">bad &lt;input&gt;"));

        let html = results_page(None);
        assert!(html.contains("no results to show"));
    }

    #[test]
    fn test_form_page_field_names() {
        for field in ["problem_name", "objective_type", "var_name_", "var_type_", "obj_coef_", "_rhs", "_op", "_coef_"] {
            assert!(FORM_PAGE.contains(field), "form page lacks {}", field);
        }
    }
}
