//! Progress lines: short human-readable summaries of backend activity shown
//! while a request is in flight.

use std::collections::HashMap;
use std::collections::VecDeque;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Only the most recent lines are kept; the final transcript never needs
/// them, they exist to answer "what is happening now".
pub const MAX_PROGRESS_LINES: usize = 5;

/// Icon for steps with no more specific mapping.
pub const DEFAULT_ICON: &str = "🤖";

/// Fixed icon lookup for known sub-agent display names.
static AGENT_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Query Refinement Agent", "🔍"),
        ("Database Agent", "🗄️"),
        ("QuickSight Agent", "📊"),
        ("Visualization Agent", "📊"),
    ])
});

/// Look up the presentation icon for an agent display name.
pub fn agent_icon(display_name: &str) -> &'static str {
    AGENT_ICONS.get(display_name).copied().unwrap_or(DEFAULT_ICON)
}

/// One short line summarizing the latest backend activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressLine {
    pub icon: String,
    pub text: String,
}

impl ProgressLine {
    pub fn new(icon: &str, text: impl Into<String>) -> Self {
        Self {
            icon: icon.to_string(),
            text: text.into(),
        }
    }
}

/// Bounded buffer of progress lines.
///
/// Pushing beyond [`MAX_PROGRESS_LINES`] silently drops the oldest line.
#[derive(Debug, Clone, Default)]
pub struct ProgressBuffer {
    lines: VecDeque<ProgressLine>,
}

impl ProgressBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, dropping the oldest when the buffer is full.
    pub fn push(&mut self, line: ProgressLine) {
        if self.lines.len() == MAX_PROGRESS_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressLine> {
        self.lines.iter()
    }

    /// Owned copy of the current lines, oldest first.
    pub fn snapshot(&self) -> Vec<ProgressLine> {
        self.lines.iter().cloned().collect()
    }
}
