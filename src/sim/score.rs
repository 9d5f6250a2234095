/// Per-level best scores.
///
/// A cleared level banks the seconds left on the clock; only the best
/// run per level is kept. Stored as key-value lines in `scores.dat`:
///
///   level_0=42
///   level_1=17

use std::collections::HashMap;
use std::path::PathBuf;

const SCORES_FILE: &str = "scores.dat";

#[derive(Debug, Default)]
pub struct HighScores {
    entries: HashMap<usize, u32>,
}

impl HighScores {
    /// Load scores from disk; a missing or unreadable file is an empty
    /// table, not an error.
    pub fn load() -> Self {
        let candidates = [score_path(), PathBuf::from(SCORES_FILE)];
        for path in &candidates {
            if let Ok(content) = std::fs::read_to_string(path) {
                return HighScores { entries: parse_scores(&content) };
            }
        }
        HighScores::default()
    }

    pub fn best(&self, level: usize) -> Option<u32> {
        self.entries.get(&level).copied()
    }

    /// Record a cleared-level score. Returns true (and persists) only
    /// when it beats the stored best.
    pub fn record(&mut self, level: usize, score: u32) -> bool {
        if !self.is_better(level, score) {
            return false;
        }
        self.entries.insert(level, score);
        if let Err(e) = self.save() {
            eprintln!("Warning: {e}");
        }
        true
    }

    fn is_better(&self, level: usize, score: u32) -> bool {
        self.entries.get(&level).map_or(true, |&b| score > b)
    }

    fn save(&self) -> Result<(), String> {
        std::fs::write(score_path(), serialize_scores(&self.entries))
            .map_err(|e| format!("could not write {SCORES_FILE}: {e}"))
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize_scores(entries: &HashMap<usize, u32>) -> String {
    let mut keys: Vec<usize> = entries.keys().copied().collect();
    keys.sort_unstable();
    let mut out = String::new();
    for k in keys {
        out.push_str(&format!("level_{}={}\n", k, entries[&k]));
    }
    out
}

fn parse_scores(content: &str) -> HashMap<usize, u32> {
    let mut entries = HashMap::new();
    for line in content.lines() {
        let Some(rest) = line.trim().strip_prefix("level_") else { continue };
        let Some((level, score)) = rest.split_once('=') else { continue };
        if let (Ok(level), Ok(score)) = (level.trim().parse(), score.trim().parse()) {
            entries.insert(level, score);
        }
    }
    entries
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn score_path() -> PathBuf {
    save_dir().join(SCORES_FILE)
}

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let test_path = parent.join(".write_test_gridworm");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/gridworm) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridworm");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_text() {
        let mut entries = HashMap::new();
        entries.insert(0, 42);
        entries.insert(3, 17);
        let text = serialize_scores(&entries);
        assert_eq!(parse_scores(&text), entries);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let parsed = parse_scores("level_0=10\ngarbage\nlevel_x=5\nlevel_2=abc\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get(&0), Some(&10));
    }

    #[test]
    fn only_strictly_better_scores_count() {
        let mut hs = HighScores::default();
        hs.entries.insert(1, 30);
        assert!(!hs.is_better(1, 20));
        assert!(!hs.is_better(1, 30));
        assert!(hs.is_better(1, 45));
        assert!(hs.is_better(2, 1)); // unseen level always counts
    }
}