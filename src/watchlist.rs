// src/watchlist.rs
// User-tracked topic names. Uniqueness is case-insensitive, insertion
// order is preserved for display and for request building.

/// Ordered set of watched topic names.
///
/// All operations are total; nothing here fails. Callers that observe a
/// `true` return from [`track`](Self::track) / [`untrack`](Self::untrack)
/// are expected to start a new configuration epoch (the engine does).
#[derive(Debug, Default, Clone)]
pub struct WatchRegistry {
    names: Vec<String>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `false` (no-op) for empty/whitespace input or
    /// a case-insensitive duplicate; the stored entry keeps the trimmed
    /// casing the user typed.
    pub fn track(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.names.push(trimmed.to_string());
        true
    }

    /// Remove the entry matching `name` case-insensitively. Returns
    /// `false` when nothing matched.
    pub fn untrack(&mut self, name: &str) -> bool {
        let target = name.trim();
        let before = self.names.len();
        self.names.retain(|n| !n.eq_ignore_ascii_case(target));
        self.names.len() != before
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Insertion-ordered snapshot for display and request building.
    pub fn list(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
