/// Ordered list of submitted prompts with relative-position recall.
/// Navigation never removes entries; submitting a new prompt resets the
/// recall cursor.
#[derive(Default)]
pub struct PromptHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted prompt if it's new and reset navigation state.
    pub fn record(&mut self, text: &str) {
        if self.entries.last().map(String::as_str) != Some(text) {
            self.entries.push(text.to_string());
        }
        self.cursor = None;
    }

    /// Step back toward the oldest prompt. Stays on the oldest entry once
    /// reached.
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = match self.cursor {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    /// Step forward toward the most recent prompt. Walking past the newest
    /// entry leaves recall and returns None.
    pub fn next(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(i) if i + 1 >= self.entries.len() => {
                self.cursor = None;
                None
            }
            Some(i) => {
                self.cursor = Some(i + 1);
                self.entries.get(i + 1).map(String::as_str)
            }
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
