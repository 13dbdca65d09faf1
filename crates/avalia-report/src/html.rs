//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use avalia_core::exam::format_remaining;
use avalia_core::i18n::{lookup, Locale, TranslationKey};
use avalia_core::model::{Rating, Trend};
use avalia_core::report::{EvaluationReport, ExamReport};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn html_lang(locale: Locale) -> &'static str {
    match locale {
        Locale::Pt => "pt-BR",
        Locale::En => "en",
    }
}

fn head(html: &mut String, locale: Locale, title: &str) {
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n",
        html_lang(locale)
    ));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>AVALIA+ | {}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn raw_json<T: serde::Serialize>(html: &mut String, value: &T) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>JSON</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(value)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");
}

fn rating_class(rating: Rating) -> &'static str {
    match rating {
        Rating::VeryLow => "very-low",
        Rating::NeedsImprovement => "needs-improvement",
        Rating::Good => "good",
        Rating::Excellent => "excellent",
    }
}

fn trend_badge(trend: Trend, locale: Locale) -> String {
    let (class, arrow) = match trend {
        Trend::Improved => ("improved", "▲"),
        Trend::Maintained => ("maintained", "■"),
        Trend::Declined => ("declined", "▼"),
        Trend::New => ("new", "●"),
    };
    format!(
        "<span class=\"badge {}\">{} {}</span>",
        class,
        arrow,
        html_escape(trend.label(locale))
    )
}

/// Generate an HTML performance report for one student.
pub fn generate_evaluation_html(report: &EvaluationReport) -> String {
    let locale = report.locale;
    let t = |key: &str| html_escape(lookup(key, locale));
    let mut html = String::new();

    head(&mut html, locale, &report.student.name);

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", t("eval.performanceReport")));
    html.push_str(&format!(
        "<p class=\"meta\"><strong>{}</strong> | {} | {} | {}</p>\n",
        html_escape(&report.student.name),
        html_escape(&report.student.id),
        html_escape(&report.student.class),
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    html.push_str("</header>\n");

    let summary = &report.summary;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<div class=\"card\"><span class=\"label\">{}</span><span class=\"value\">{}</span><span class=\"unit\">/ 4.0</span></div>\n",
        t("dashboard.average"),
        summary.average
    ));
    html.push_str(&format!(
        "<div class=\"card improved\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>\n",
        t("eval.improved"),
        summary.improved
    ));
    html.push_str(&format!(
        "<div class=\"card declined\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>\n",
        t("eval.declined"),
        summary.declined
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"criteria\">\n");
    html.push_str(&format!("<h2>{}</h2>\n", t("eval.evolutionTrend")));
    for line in &summary.criteria {
        html.push_str("<div class=\"criterion\">\n");
        html.push_str(&format!(
            "<div class=\"criterion-head\"><h3>{}</h3>{}</div>\n",
            html_escape(line.criterion.label(locale)),
            trend_badge(line.trend, locale)
        ));
        html.push_str(&format!(
            "<p class=\"desc\">{}</p>\n",
            html_escape(lookup(line.criterion.description_key(), locale))
        ));
        html.push_str(&format!(
            "<p class=\"rating\">{} {}",
            line.rating.glyph(),
            html_escape(line.rating.label(locale))
        ));
        if let Some(prior) = line.prior {
            html.push_str(&format!(
                " <span class=\"prior\">({}: {} {})</span>",
                t("eval.previous"),
                prior.glyph(),
                html_escape(prior.label(locale))
            ));
        }
        html.push_str("</p>\n");
        html.push_str(&format!(
            "<div class=\"progress\"><div class=\"bar {}\" style=\"width: {:.0}%\"></div></div>\n",
            rating_class(line.rating),
            line.percentage
        ));
        if !line.comment.trim().is_empty() {
            html.push_str(&format!(
                "<blockquote>{}</blockquote>\n",
                html_escape(&line.comment)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</section>\n");

    let bars: Vec<(String, f64)> = summary
        .criteria
        .iter()
        .map(|c| (c.criterion.label(locale).to_string(), c.percentage / 100.0))
        .collect();
    if !bars.is_empty() {
        html.push_str(&generate_bar_chart(&bars));
    }

    raw_json(&mut html, report);

    html.push_str("</body>\n</html>");
    html
}

/// Generate an HTML result report for one exam.
pub fn generate_exam_html(report: &ExamReport) -> String {
    let locale = report.locale;
    let t = |key: &str| html_escape(lookup(key, locale));
    let stats = &report.statistics;
    let mut html = String::new();

    head(&mut html, locale, &report.exam.title);

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.exam.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} – {} | {} min | {} × {}</p>\n",
        html_escape(&report.exam.subject),
        report.exam.start_date,
        report.exam.end_date,
        report.exam.duration_minutes,
        report.exam.question_count,
        t("sim.question")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<div class=\"card\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>\n",
        t("sim.participants"),
        stats.participants
    ));
    html.push_str(&format!(
        "<div class=\"card\"><span class=\"label\">{}</span><span class=\"value\">{}</span><span class=\"unit\">/ 10</span></div>\n",
        t("sim.classAverage"),
        stats.class_average
    ));
    html.push_str(&format!(
        "<div class=\"card\"><span class=\"label\">{}</span><span class=\"value\">{:.1}%</span></div>\n",
        t("sim.successRate"),
        stats.success_rate * 100.0
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str(&format!("<h2>{}</h2>\n", t("sim.score")));
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str(&format!(
        "<thead><tr><th onclick=\"sortTable(0)\">{}</th><th onclick=\"sortTable(1)\">{}</th><th onclick=\"sortTable(2)\">{}</th><th onclick=\"sortTable(3)\">{}</th></tr></thead>\n",
        t("sim.student"),
        t("sim.score"),
        t("sim.questionsAnswered"),
        t("sim.timeRemaining")
    ));
    html.push_str("<tbody>\n");
    for (i, r) in report.results.iter().enumerate() {
        let class = if r.fraction >= 0.7 {
            "pass"
        } else if r.fraction >= 0.5 {
            "warn"
        } else {
            "fail"
        };
        let remaining = report
            .remaining_seconds
            .get(i)
            .map(|s| format_remaining(*s))
            .unwrap_or_else(|| "-".into());
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}/10</td><td>{}/{}</td><td>{}</td></tr>\n",
            class,
            html_escape(&r.student_id),
            r.grade,
            r.answered,
            r.total,
            remaining
        ));
    }
    html.push_str("</tbody></table>\n");

    if !report.ungraded.is_empty() {
        html.push_str("<ul class=\"ungraded\">\n");
        for u in &report.ungraded {
            html.push_str(&format!(
                "<li><strong>{}</strong>: {}</li>\n",
                html_escape(&u.student_id),
                html_escape(&u.reason)
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    let bars: Vec<(String, f64)> = stats
        .per_question
        .iter()
        .map(|q| (q.question_id.clone(), q.correct_rate))
        .collect();
    if !bars.is_empty() {
        html.push_str("<section class=\"questions\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", t("sim.successRate")));
        html.push_str(&generate_bar_chart(&bars));
        html.push_str("</section>\n");
    }

    raw_json(&mut html, report);

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write a student performance report to a file.
pub fn write_evaluation_html(report: &EvaluationReport, path: &Path) -> Result<()> {
    write_file(path, &generate_evaluation_html(report))
}

/// Write an exam result report to a file.
pub fn write_exam_html(report: &ExamReport, path: &Path) -> Result<()> {
    write_file(path, &generate_exam_html(report))
}

fn write_file(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bars for `(label, fraction)` pairs, fractions in `[0, 1]`.
fn generate_bar_chart(bars: &[(String, f64)]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, fraction)) in bars.iter().enumerate() {
        let fraction = fraction.clamp(0.0, 1.0);
        let y = i * (bar_height + padding) + padding;
        let width = (fraction * max_width as f64) as usize;

        let color = if fraction >= 0.75 {
            "#22c55e"
        } else if fraction >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            fraction * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --muted: #6b7280; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .desc, .unit, .label, .prior { color: var(--muted); }
.dashboard { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 10rem; display: flex; flex-direction: column; }
.card .value { font-size: 2rem; font-weight: bold; }
.card.improved .value { color: #16a34a; }
.card.declined .value { color: #dc2626; }
.criterion { border: 1px solid var(--border); border-radius: 8px; padding: 1rem; margin: 1rem 0; }
.criterion-head { display: flex; justify-content: space-between; align-items: center; }
.criterion h3 { margin: 0; }
.badge { border-radius: 999px; padding: 0.2rem 0.7rem; font-size: 0.8rem; }
.badge.improved { background: var(--pass); }
.badge.maintained { background: var(--border); }
.badge.declined { background: var(--fail); }
.badge.new { background: #dbeafe; color: #1e3a8a; }
.progress { height: 0.6rem; background: var(--border); border-radius: 999px; overflow: hidden; }
.progress .bar { height: 100%; }
.bar.very-low { background: #ef4444; }
.bar.needs-improvement { background: #eab308; }
.bar.good { background: #3b82f6; }
.bar.excellent { background: #22c55e; }
blockquote { margin: 0.8rem 0 0; padding-left: 0.8rem; border-left: 3px solid var(--border); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
