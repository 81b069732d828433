/// Which voice reference, if any, is playing. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playback {
    current: Option<String>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting the playing URL stops it; any other URL replaces it.
    /// Returns whether something is playing afterwards.
    pub fn select(&mut self, url: &str) -> bool {
        if self.current.as_deref() == Some(url) {
            self.current = None;
        } else {
            self.current = Some(url.to_string());
        }
        self.current.is_some()
    }

    /// The audio element for `url` reached its end.
    pub fn finished(&mut self, url: &str) {
        if self.current.as_deref() == Some(url) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_playing(&self, url: &str) -> bool {
        self.current.as_deref() == Some(url)
    }

    pub fn button_label(&self, url: &str) -> &'static str {
        if self.is_playing(url) {
            "⏸️ Pause"
        } else {
            "▶️ Play"
        }
    }
}
