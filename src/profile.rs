const MAX_ADVENTURE_ENTRIES: usize = 5;
const RECENT_ADVENTURE_ENTRIES: usize = 3;

/// What we know about the learner: a name and the adventure they told us about.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub name: String,
    pub adventure: Vec<String>,
}

impl Profile {
    pub fn new(name: String) -> Self {
        Self {
            name,
            adventure: Vec::new(),
        }
    }

    /// Remembers another line of the adventure, forgetting the oldest ones.
    pub fn add_adventure(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.adventure.push(line.to_string());
        if self.adventure.len() > MAX_ADVENTURE_ENTRIES {
            let extra = self.adventure.len() - MAX_ADVENTURE_ENTRIES;
            self.adventure.drain(..extra);
        }
    }

    pub fn recent_adventure(&self) -> Option<String> {
        if self.adventure.is_empty() {
            return None;
        }
        let start = self.adventure.len().saturating_sub(RECENT_ADVENTURE_ENTRIES);
        Some(self.adventure[start..].join(" "))
    }
}
