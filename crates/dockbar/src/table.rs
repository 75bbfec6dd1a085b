use dockbar_core::CandidateWindow;

/// One printable window row.
pub struct WindowRow {
    pub display: String,
    pub app: String,
    pub title: String,
    pub state: &'static str,
    pub tier: String,
}

fn state_label(minimized: bool, is_main: bool) -> &'static str {
    match (minimized, is_main) {
        (true, _) => "minimized",
        (false, true) => "main",
        (false, false) => "visible",
    }
}

impl From<&CandidateWindow> for WindowRow {
    fn from(candidate: &CandidateWindow) -> Self {
        Self {
            display: candidate.display_id.to_string(),
            app: candidate.owner_app_name.clone(),
            title: candidate.title.clone(),
            state: state_label(candidate.minimized, candidate.is_main),
            tier: candidate.identity_tier.to_string(),
        }
    }
}

pub struct TableFormatter {
    display_width: usize,
    app_width: usize,
    title_width: usize,
    state_width: usize,
    tier_width: usize,
}

impl TableFormatter {
    pub fn new(rows: &[WindowRow]) -> Self {
        let app_width = rows
            .iter()
            .map(|r| r.app.chars().count())
            .max()
            .unwrap_or(12)
            .clamp(3, 24);
        let title_width = rows
            .iter()
            .map(|r| r.title.chars().count())
            .max()
            .unwrap_or(20)
            .clamp(5, 50);

        Self {
            display_width: 10,
            app_width,
            title_width,
            state_width: 9,
            tier_width: 11,
        }
    }

    pub fn print_table(&self, rows: &[WindowRow]) {
        println!("{}", self.border('┌', '┬', '┐'));
        println!(
            "{}",
            self.row("Display", "App", "Title", "State", "Identity")
        );
        println!("{}", self.border('├', '┼', '┤'));
        for row in rows {
            println!(
                "{}",
                self.row(&row.display, &row.app, &row.title, row.state, &row.tier)
            );
        }
        println!("{}", self.border('└', '┴', '┘'));
    }

    fn widths(&self) -> [usize; 5] {
        [
            self.display_width,
            self.app_width,
            self.title_width,
            self.state_width,
            self.tier_width,
        ]
    }

    fn border(&self, left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = self.widths().iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(&mid.to_string()), right)
    }

    fn row(&self, display: &str, app: &str, title: &str, state: &str, tier: &str) -> String {
        let cells = [display, app, title, state, tier];
        let padded: Vec<String> = cells
            .iter()
            .zip(self.widths())
            .map(|(cell, width)| truncate(cell, width))
            .collect();
        format!("│ {} │", padded.join(" │ "))
    }
}

/// Truncate a string to a maximum display width, adding "..." if truncated.
///
/// Uses character count (not byte count) to safely handle UTF-8 strings
/// including emoji and multi-byte characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        format!("{:<width$}", s, width = max_len)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_len)
    }
}
