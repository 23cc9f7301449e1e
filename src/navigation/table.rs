//! Phrase-to-route matching
//!
//! A transcript matches an entry when, lower-cased, it contains any of the
//! entry's phrases as a substring. Entries are scanned in table order and the
//! first match wins. Substring containment means "lab" also matches
//! "labelled"; that is the established behavior and is kept.

use serde::Deserialize;

/// One route and the phrases that select it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub phrases: Vec<String>,
}

impl RouteEntry {
    /// Entry with lower-cased, de-duplicated, non-empty phrases
    #[must_use]
    pub fn new<I, S>(path: &str, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if !phrase.is_empty() && !normalized.contains(&phrase) {
                normalized.push(phrase);
            }
        }

        Self {
            path: path.to_string(),
            phrases: normalized,
        }
    }

    /// Whether a lower-cased transcript mentions any phrase
    fn matches(&self, transcript: &str) -> bool {
        self.phrases.iter().any(|p| transcript.contains(p.as_str()))
    }
}

/// Result of routing a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Matched(String),
    Unmatched,
}

/// Ordered voice route table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        // Phrases may come from config files; normalize them the same way.
        let entries = entries
            .into_iter()
            .map(|e| RouteEntry::new(&e.path, &e.phrases))
            .collect();
        Self { entries }
    }

    /// Table used by the floating voice button
    #[must_use]
    pub fn floating_assistant() -> Self {
        Self::new(vec![
            RouteEntry::new("/", ["home", "main page", "start"]),
            RouteEntry::new("/dashboard", ["dashboard", "overview"]),
            RouteEntry::new("/prescriptions", ["prescription", "medicine", "medication"]),
            RouteEntry::new("/lab-tests", ["lab tests", "lab", "labs", "blood test"]),
            RouteEntry::new("/reminders", ["reminder", "alarm"]),
            RouteEntry::new("/exercises", ["exercise", "workout", "yoga", "posture"]),
            RouteEntry::new("/profile", ["profile", "account", "my details"]),
        ])
    }

    /// Table used by the page-level navigation helper
    #[must_use]
    pub fn navigation_assistant() -> Self {
        Self::new(vec![
            RouteEntry::new("/dashboard", ["dashboard", "overview", "summary"]),
            RouteEntry::new(
                "/prescriptions",
                ["prescriptions", "prescription", "medicines", "upload prescription"],
            ),
            RouteEntry::new("/lab-tests", ["lab tests", "lab test", "lab", "labs", "book test"]),
            RouteEntry::new("/reminders", ["reminders", "reminder", "schedule"]),
            RouteEntry::new("/exercises", ["exercises", "exercise", "workout", "physiotherapy"]),
            RouteEntry::new("/profile", ["profile", "settings", "account"]),
            RouteEntry::new("/", ["home", "start page"]),
        ])
    }

    /// Entries in matching order
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a transcript against the table
    #[must_use]
    pub fn route(&self, transcript: &str) -> RouteOutcome {
        let transcript = transcript.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.matches(&transcript))
            .map_or(RouteOutcome::Unmatched, |e| {
                RouteOutcome::Matched(e.path.clone())
            })
    }

    /// First phrase of up to `limit` entries, for guidance messages
    #[must_use]
    pub fn example_commands(&self, limit: usize) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.phrases.first())
            .take(limit)
            .map(|p| format!("\"go to {p}\""))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_are_normalized() {
        let entry = RouteEntry::new("/x", ["  Lab Tests ", "lab tests", "", "LAB"]);
        assert_eq!(entry.phrases, ["lab tests", "lab"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let table = RouteTable::new(vec![RouteEntry::new("/reminders", ["reminder"])]);
        assert_eq!(
            table.route("Show my REMINDERS"),
            RouteOutcome::Matched("/reminders".to_string())
        );
    }

    #[test]
    fn substring_false_positive_is_kept() {
        let table = RouteTable::new(vec![RouteEntry::new("/lab-tests", ["lab"])]);
        assert_eq!(
            table.route("I labelled this"),
            RouteOutcome::Matched("/lab-tests".to_string())
        );
    }

    #[test]
    fn empty_table_never_matches() {
        assert_eq!(RouteTable::default().route("home"), RouteOutcome::Unmatched);
    }

    #[test]
    fn builtin_tables_agree_on_common_commands() {
        for table in [RouteTable::floating_assistant(), RouteTable::navigation_assistant()] {
            assert_eq!(
                table.route("open my prescriptions"),
                RouteOutcome::Matched("/prescriptions".to_string())
            );
            assert_eq!(
                table.route("take me to the lab tests"),
                RouteOutcome::Matched("/lab-tests".to_string())
            );
            assert_eq!(table.route("what's for dinner"), RouteOutcome::Unmatched);
        }
    }

    #[test]
    fn examples_use_first_phrase() {
        let table = RouteTable::navigation_assistant();
        assert_eq!(
            table.example_commands(2),
            ["\"go to dashboard\"", "\"go to prescriptions\""]
        );
    }
}
