//! Terminal output utilities: notes and table rendering.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Colors are off for `NO_COLOR`, dumb terminals, and when `TERM` is unset
/// without `COLORTERM`.
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match std::env::var("TERM") {
        Ok(term) => term != "dumb",
        Err(_) => std::env::var_os("COLORTERM").is_some(),
    }
}

/// Remove `ESC ... m` sequences.
pub fn strip_ansi(s: &str) -> String {
    let mut parts = s.split('\x1b');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        if let Some(end) = part.find('m') {
            out.push_str(&part[end + 1..]);
        }
    }
    out
}

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Warn,
    Error,
    Success,
}

impl Tone {
    /// Symbol, plain-text label and ANSI color.
    fn style(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Tone::Info => ("ℹ", "INFO", "\x1b[36m"),
            Tone::Warn => ("⚠", "WARN", "\x1b[33m"),
            Tone::Error => ("✗", "ERROR", "\x1b[31m"),
            Tone::Success => ("✓", "OK", "\x1b[32m"),
        }
    }
}

fn format_note(tone: Tone, msg: &str, color: bool) -> String {
    let (symbol, label, ansi) = tone.style();
    if color {
        format!("{ansi}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{label}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    println!("{}", format_note(Tone::Info, msg, supports_color()));
}

pub fn note_warn(msg: &str) {
    println!("{}", format_note(Tone::Warn, msg, supports_color()));
}

/// Errors go to stderr.
pub fn note_error(msg: &str) {
    eprintln!("{}", format_note(Tone::Error, msg, supports_color()));
}

pub fn note_success(msg: &str) {
    println!("{}", format_note(Tone::Success, msg, supports_color()));
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// A left-aligned table column.
pub struct Column {
    pub header: String,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            max_width: None,
        }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Render a table with given columns and rows. Cells wider than a column's
/// `max_width` are cut with `…`.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().take(num_cols).enumerate() {
            let w = visible_width(cell);
            let w = columns[i].max_width.map_or(w, |max| w.min(max));
            widths[i] = widths[i].max(w);
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i]))
        .collect();
    let (bold, reset) = if supports_color() { (BOLD, RESET) } else { ("", "") };
    out.push_str(&format!("{bold}  {}{reset}\n", header_cells.join("  ").trim_end()));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(&truncate(cell, widths[i]), widths[i])
            })
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }

    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn truncate(s: &str, width: usize) -> String {
    if visible_width(s) <= width {
        return s.to_string();
    }
    let plain = strip_ansi(s);
    let kept: String = plain.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn pad_cell(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_width(s));
    format!("{s}{}", " ".repeat(pad))
}
