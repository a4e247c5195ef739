//! Server-rendered mission dashboard.
//!
//! One static HTML page: summary counts plus the settlement-score table.
//! Values are HTML-escaped; no template engine, no client-side state.

use mctl_core::ledger::SummaryCounts;
use mctl_core::scoring::ScoredEnvelope;

/// Renders the dashboard page.
#[must_use]
pub fn render(counts: &SummaryCounts, rows: &[ScoredEnvelope]) -> String {
    let mut table_rows = String::new();
    for row in rows {
        let envelope = &row.envelope;
        table_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&envelope.mission_id),
            escape_html(&envelope.event_type),
            escape_html(&envelope.status),
            escape_html(&envelope.proof_ref),
            row.tier,
            row.score,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Mission Ledger</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }}
.counts span {{ margin-right: 1.5rem; }}
</style>
</head>
<body>
<h1>Mission Ledger</h1>
<p class="counts">
<span>total: <strong>{total}</strong></span>
<span>ok: <strong>{ok}</strong></span>
<span>fail: <strong>{fail}</strong></span>
</p>
<table>
<thead>
<tr><th>mission</th><th>event</th><th>status</th><th>proof</th><th>tier</th><th>score</th></tr>
</thead>
<tbody>
{table_rows}</tbody>
</table>
</body>
</html>
"#,
        total = counts.total,
        ok = counts.ok,
        fail = counts.fail,
    )
}

/// Escapes text for safe interpolation into HTML.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
