//! Terminal rendering of analysis reports.

use labelscan_core::AnalysisReport;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Columns a string occupies; Hangul and other East Asian wide glyphs take two.
pub fn display_width(s: &str) -> usize {
    strip_ansi(s)
        .chars()
        .map(|c| match c {
            '\u{1100}'..='\u{115F}'
            | '\u{2E80}'..='\u{A4CF}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF00}'..='\u{FF60}'
            | '\u{FFE0}'..='\u{FFE6}' => 2,
            _ => 1,
        })
        .sum()
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// Left-aligned table with a bold header row.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let pad = |cell: &str, width: usize| {
        format!("{cell}{}", " ".repeat(width.saturating_sub(display_width(cell))))
    };
    let line = |cells: Vec<String>| format!("  {}", cells.join("  ").trim_end());

    let mut out = String::new();
    let header: Vec<String> = headers.iter().zip(&widths).map(|(h, w)| pad(h, *w)).collect();
    out.push_str(&format!("{BOLD}{}{RESET}\n", line(header)));
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    out.push('\n');
    for row in rows {
        let cells = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        out.push_str(&line(cells));
        out.push('\n');
    }
    out
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Human-readable report: nutrients, allergens, translation, warnings.
pub fn render_report(report: &AnalysisReport, color: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("{BOLD}Nutrients{RESET}\n"));
    if report.nutrients().is_empty() {
        out.push_str(&format!("  {DIM}none found{RESET}\n"));
    } else {
        let rows: Vec<Vec<String>> = report
            .nutrients()
            .values()
            .map(|r| {
                vec![
                    r.field.to_string(),
                    format!("{} {}", format_value(r.value), r.unit.symbol()),
                    r.raw_span.clone(),
                ]
            })
            .collect();
        out.push_str(&render_table(&["FIELD", "VALUE", "SOURCE"], &rows));
    }

    out.push_str(&format!("\n{BOLD}Allergens{RESET}\n"));
    if report.allergens().is_empty() {
        out.push_str(&format!("  {DIM}no mentions{RESET}\n"));
    } else {
        let rows: Vec<Vec<String>> = report
            .allergens()
            .values()
            .map(|a| {
                let status = if a.present {
                    format!("{RED}present{RESET}")
                } else {
                    format!("{GREEN}absent{RESET}")
                };
                vec![a.category.to_string(), status, a.raw_span.clone()]
            })
            .collect();
        out.push_str(&render_table(&["CATEGORY", "STATUS", "SOURCE"], &rows));
    }

    if let Some(translation) = report.translation() {
        out.push_str(&format!("\n{BOLD}Translation{RESET}\n  {translation}\n"));
    }

    if !report.warnings().is_empty() {
        out.push_str(&format!("\n{YELLOW}{BOLD}Warnings{RESET}\n"));
        for warning in report.warnings() {
            out.push_str(&format!("  {CYAN}-{RESET} {warning}\n"));
        }
    }

    if color {
        out
    } else {
        strip_ansi(&out)
    }
}
