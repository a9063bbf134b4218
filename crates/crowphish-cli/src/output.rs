//! Terminal output formatting.

use colored::{Color, ColoredString, Colorize};
use crowphish_core::config::API_KEY_VAR;
use crowphish_core::{AnalysisResult, Indicator, Severity, TriageError, Verdict};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::commands::analyze::PreflightError;

const ALIAS: &str = "S.H. CROW";

/// Width of the severity column, borders excluded.
const SEVERITY_WIDTH: usize = 12;

/// Color of the verdict panel.
pub fn verdict_color(verdict: &Verdict) -> Color {
    match verdict {
        Verdict::ConfirmedPhish => Color::Red,
        Verdict::Suspicious => Color::Yellow,
        Verdict::Safe | Verdict::Other(_) => Color::Green,
    }
}

/// Color of a severity cell.
pub fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::High | Severity::Critical => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low | Severity::Other(_) => Color::Green,
    }
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
        .clamp(40, 100)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Word-wrap a line to a visual width. Lines that already fit are kept as is.
fn wrap_visual(s: &str, max_width: usize) -> Vec<String> {
    if UnicodeWidthStr::width(s) <= max_width {
        return vec![s.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in s.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let needed = if current.is_empty() { word_width } else { current_width + 1 + word_width };

        if needed <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_width = needed;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        // Hard-break words longer than a whole line.
        for ch in word.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    // Whitespace-only input still occupies one line.
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Drop terminal control characters from model-supplied text.
///
/// Newlines survive so panels can keep paragraphs; tabs become spaces.
fn sanitize(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

fn paint(text: &str, color: Option<Color>, bold: bool) -> ColoredString {
    let styled = match color {
        Some(c) => text.color(c),
        None => text.normal(),
    };
    if bold {
        styled.bold()
    } else {
        styled
    }
}

fn paint_line(text: &str, line: &PanelLine) -> ColoredString {
    let styled = paint(text, line.color, line.bold);
    if line.dim {
        styled.dimmed()
    } else {
        styled
    }
}

/// One line of panel content.
struct PanelLine {
    text: String,
    color: Option<Color>,
    bold: bool,
    dim: bool,
}

impl PanelLine {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None, bold: false, dim: false }
    }

    fn styled(text: impl Into<String>, color: Color, bold: bool) -> Self {
        Self { text: text.into(), color: Some(color), bold, dim: false }
    }

    fn dimmed(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None, bold: false, dim: true }
    }
}

/// Draw a rounded box with an optional centered title.
fn render_panel(title: Option<&str>, lines: &[PanelLine], border: Color, width: usize, centered: bool) -> String {
    let inner = width.saturating_sub(4).max(1);
    let rule = width.saturating_sub(2).max(1);
    let mut out = String::new();

    let top = match title {
        Some(t) => {
            let label = format!(" {} ", t);
            let label_width = UnicodeWidthStr::width(label.as_str());
            if label_width >= rule {
                "─".repeat(rule)
            } else {
                let left = (rule - label_width) / 2;
                let right = rule - label_width - left;
                format!("{}{}{}", "─".repeat(left), label, "─".repeat(right))
            }
        }
        None => "─".repeat(rule),
    };
    out.push_str(&format!("{}\n", format!("╭{}╮", top).color(border)));

    let edge = "│".color(border);
    for line in lines {
        let wrapped = if line.text.is_empty() {
            vec![String::new()]
        } else {
            line.text
                .split('\n')
                .flat_map(|part| wrap_visual(part, inner))
                .collect()
        };

        for chunk in wrapped {
            let chunk_width = UnicodeWidthStr::width(chunk.as_str());
            let slack = inner.saturating_sub(chunk_width);
            let (left, right) = if centered { (slack / 2, slack - slack / 2) } else { (0, slack) };
            out.push_str(&format!(
                "{} {}{}{} {}\n",
                edge,
                " ".repeat(left),
                paint_line(&chunk, line),
                " ".repeat(right),
                edge
            ));
        }
    }

    out.push_str(&format!("{}\n", format!("╰{}╯", "─".repeat(rule)).color(border)));
    out
}

/// Verdict and threat score panel.
pub fn render_verdict_panel(result: &AnalysisResult, width: usize) -> String {
    let color = verdict_color(&result.verdict);
    let lines = [
        PanelLine::styled(format!("VERDICT: {}", sanitize(result.verdict.label())), color, true),
        PanelLine::styled(format!("THREAT SCORE: {}/100", result.confidence_score), color, true),
    ];
    render_panel(Some("🔍 Analysis Results"), &lines, color, width, false)
}

/// Table of observed indicators, one row per indicator.
pub fn render_indicator_table(indicators: &[Indicator], width: usize) -> String {
    // "│ " + severity + " │ " + indicator + " │"
    let indicator_width = width.saturating_sub(SEVERITY_WIDTH + 7).max(10);
    let sev_rule = "─".repeat(SEVERITY_WIDTH + 2);
    let ind_rule = "─".repeat(indicator_width + 2);
    let edge = "│".dimmed();
    let mut out = String::new();

    let title = "Observed Indicators";
    let table_width = SEVERITY_WIDTH + indicator_width + 7;
    let title_pad = table_width.saturating_sub(title.len()) / 2;
    out.push_str(&format!("{}{}\n", " ".repeat(title_pad), title.italic()));

    out.push_str(&format!("{}\n", format!("┌{}┬{}┐", sev_rule, ind_rule).dimmed()));
    out.push_str(&format!(
        "{} {} {} {} {}\n",
        edge,
        pad_right_colored("Severity", SEVERITY_WIDTH, Some(Color::Yellow), true),
        edge,
        pad_right_colored("Indicator", indicator_width, Some(Color::Yellow), true),
        edge
    ));
    out.push_str(&format!("{}\n", format!("├{}┼{}┤", sev_rule, ind_rule).dimmed()));

    for item in indicators {
        let sev_color = severity_color(&item.severity);
        let severity_lines = wrap_visual(&sanitize(item.severity.label()).replace('\n', " "), SEVERITY_WIDTH);
        let indicator_lines = wrap_visual(&sanitize(&item.indicator).replace('\n', " "), indicator_width);
        let height = severity_lines.len().max(indicator_lines.len());

        for i in 0..height {
            let severity_cell = match severity_lines.get(i) {
                Some(chunk) => pad_right_colored(chunk, SEVERITY_WIDTH, Some(sev_color), false),
                None => " ".repeat(SEVERITY_WIDTH),
            };
            let indicator_cell = match indicator_lines.get(i) {
                Some(chunk) => pad_right_colored(chunk, indicator_width, None, false),
                None => " ".repeat(indicator_width),
            };
            out.push_str(&format!(
                "{} {} {} {} {}\n",
                edge, severity_cell, edge, indicator_cell, edge
            ));
        }
    }

    out.push_str(&format!("{}\n", format!("└{}┴{}┘", sev_rule, ind_rule).dimmed()));
    out
}

/// Paint the text and pad it with unstyled spaces up to `width`.
fn pad_right_colored(text: &str, width: usize, color: Option<Color>, bold: bool) -> String {
    let padded = pad_right(text, width);
    let fill = &padded[text.len()..];
    format!("{}{}", paint(text, color, bold), fill)
}

/// Analyst notes panel with the explanation text.
pub fn render_explanation_panel(explanation: &str, width: usize) -> String {
    let lines = [PanelLine::plain(sanitize(explanation))];
    render_panel(Some("📝 Analyst Notes"), &lines, Color::Blue, width, false)
}

/// Full report: verdict panel, indicator table, analyst notes.
pub fn render_report(result: &AnalysisResult, width: usize) -> String {
    let mut out = render_verdict_panel(result, width);
    out.push_str(&render_indicator_table(&result.indicators, width));
    out.push_str(&render_explanation_panel(&result.explanation, width));
    out
}

/// Print the full report to stdout.
pub fn print_report(result: &AnalysisResult) {
    print!("{}", render_report(result, term_width()));
}

/// Print the startup banner.
pub fn print_banner() {
    let lines = [
        PanelLine::styled(format!("🛡️  {} CYBER DEFENSE SYSTEMS 🛡️", ALIAS), Color::Yellow, true),
        PanelLine::dimmed(format!("Phishing Triage & Intelligence Agent v{}", env!("CARGO_PKG_VERSION"))),
    ];
    print!("{}", render_panel(None, &lines, Color::Yellow, term_width(), true));
}

/// User-facing text for why the run could not start.
pub fn preflight_message(err: &PreflightError) -> String {
    match err {
        PreflightError::MissingCredential => format!(
            "{}\n\nTo fix this, run this command in your terminal:\n{}\n",
            "❌ CRITICAL ERROR: API Key missing.".red().bold(),
            format!("export {}='your_actual_api_key_here'", API_KEY_VAR).yellow().bold()
        ),
        PreflightError::InvalidConfig(msg) => {
            format!("{} {}", "❌ Configuration Error:".red().bold(), msg)
        }
        PreflightError::MissingImage => format!(
            "{} You must provide an image path.\n👉 {} crowphish {}",
            "❌ Usage Error:".red().bold(),
            "Correct Command:".yellow(),
            "/path/to/image.jpg".italic()
        ),
    }
}

/// Print why the run could not start.
pub fn print_preflight_error(err: &PreflightError) {
    eprintln!("{}", preflight_message(err));
}

/// User-facing text for a failed triage run.
pub fn failure_message(err: &TriageError) -> String {
    match err {
        TriageError::FileNotFound { path } => format!(
            "{} Could not find file: {}",
            "❌ Error:".red().bold(),
            path.display().to_string().underline()
        ),
        other => format!("{} {}", "❌ System Error:".red().bold(), other),
    }
}

/// Print a failed triage run.
pub fn print_failure(err: &TriageError) {
    eprintln!("{}", failure_message(err));
}
