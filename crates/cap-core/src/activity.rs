//! Activity-log logic that does not touch the database: tab action
//! patterns, the free-text search predicate, and CSV export.

use chrono::{NaiveDate, SecondsFormat};

use crate::entities::ActivityEntry;
use crate::enums::ActivityTab;

/// Fixed CSV header row.
pub const CSV_HEADERS: [&str; 7] = [
    "Timestamp",
    "User",
    "Action",
    "Entity Type",
    "Entity ID",
    "Status",
    "Details",
];

/// A case-insensitive match on the `action` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPattern {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl ActionPattern {
    /// Whether `action` matches, ignoring ASCII case.
    #[must_use]
    pub fn matches(self, action: &str) -> bool {
        let action = action.to_ascii_lowercase();
        match self {
            Self::Prefix(p) => action.starts_with(p),
            Self::Suffix(s) => action.ends_with(s),
        }
    }

    /// SQL `LIKE` pattern with `\` as the escape character. `_` and `%` in
    /// the literal part are escaped so they match themselves.
    #[must_use]
    pub fn like_pattern(self) -> String {
        match self {
            Self::Prefix(p) => format!("{}%", escape_like(p)),
            Self::Suffix(s) => format!("%{}", escape_like(s)),
        }
    }
}

fn escape_like(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const AUTH_PATTERNS: &[ActionPattern] = &[ActionPattern::Prefix("auth_")];

const DATA_PATTERNS: &[ActionPattern] = &[
    ActionPattern::Suffix("_investors"),
    ActionPattern::Suffix("_subscriptions"),
    ActionPattern::Suffix("_token_allocations"),
    ActionPattern::Suffix("_projects"),
];

const ADMIN_PATTERNS: &[ActionPattern] = &[
    ActionPattern::Suffix("_user_roles"),
    ActionPattern::Suffix("_rules"),
    ActionPattern::Suffix("_permissions"),
];

/// Patterns a tab applies to `action`; an entry must match at least one.
/// `All` has none and matches everything.
#[must_use]
pub const fn tab_patterns(tab: ActivityTab) -> &'static [ActionPattern] {
    match tab {
        ActivityTab::All => &[],
        ActivityTab::Auth => AUTH_PATTERNS,
        ActivityTab::Data => DATA_PATTERNS,
        ActivityTab::Admin => ADMIN_PATTERNS,
    }
}

/// Whether `action` belongs to `tab`.
#[must_use]
pub fn tab_matches(tab: ActivityTab, action: &str) -> bool {
    let patterns = tab_patterns(tab);
    patterns.is_empty() || patterns.iter().any(|p| p.matches(action))
}

/// Case-insensitive substring search across the searched text fields:
/// user email, user id, action, entity type, entity id and details.
/// An empty needle matches every entry.
#[must_use]
pub fn matches_search(entry: &ActivityEntry, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [
        entry.user_email.as_deref(),
        entry.user_id.as_deref(),
        Some(entry.action.as_str()),
        entry.entity_type.as_deref(),
        entry.entity_id.as_deref(),
        entry.details.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep only the entries matching `needle`.
#[must_use]
pub fn filter_search(entries: Vec<ActivityEntry>, needle: &str) -> Vec<ActivityEntry> {
    entries
        .into_iter()
        .filter(|entry| matches_search(entry, needle))
        .collect()
}

/// Quote a CSV field if it contains a comma, a double quote or a newline.
#[must_use]
pub fn escape_csv_field(field: Option<&str>) -> String {
    let Some(s) = field else {
        return String::new();
    };
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render entries as CSV with the fixed header. Returns an empty string
/// when there is nothing to export.
#[must_use]
pub fn export_csv(entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for entry in entries {
        let timestamp = entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let row = [
            timestamp,
            escape_csv_field(entry.user_email.as_deref()),
            escape_csv_field(Some(&entry.action)),
            escape_csv_field(entry.entity_type.as_deref()),
            escape_csv_field(entry.entity_id.as_deref()),
            escape_csv_field(Some(entry.status.as_str())),
            escape_csv_field(entry.details.as_deref()),
        ];
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Download name for an export taken on `date`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("activity_logs_{}.csv", date.format("%Y-%m-%d"))
}

/// `create_investor` → `Create Investor`.
#[must_use]
pub fn format_action_type(action: &str) -> String {
    let mut out = String::with_capacity(action.len());
    let mut at_word_start = true;
    for c in action.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
