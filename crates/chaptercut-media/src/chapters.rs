//! Named chapter markers of one episode.
//!
//! Chapters are kept in probe order with a stable synthetic id; the title is
//! only a display attribute used to resolve skip ranges. The total duration
//! is carried alongside and answers to the reserved name [`END_CHAPTER`].

/// Reserved name that always resolves to the episode's total duration.
pub const END_CHAPTER: &str = "End";

/// Stable identifier of a chapter within its [`ChapterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterId(pub u32);

/// A single chapter marker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    /// Start time in seconds.
    pub start: f64,
}

/// Ordered chapter list of one episode plus its total duration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterSet {
    chapters: Vec<Chapter>,
    duration: f64,
}

impl ChapterSet {
    /// Create an empty set for an episode of the given duration.
    pub fn new(duration: f64) -> Self {
        Self {
            chapters: Vec::new(),
            duration,
        }
    }

    /// Build from `(title, start)` pairs in probe order.
    ///
    /// Missing or blank titles are synthesized from the 1-based ordinal.
    pub fn from_starts<I, S>(starts: I, duration: f64) -> Self
    where
        I: IntoIterator<Item = (Option<S>, f64)>,
        S: Into<String>,
    {
        let mut set = Self::new(duration);
        for (title, start) in starts {
            set.push(title.map(Into::into), start);
        }
        set
    }

    /// Append a chapter, returning its id.
    pub fn push(&mut self, title: Option<String>, start: f64) -> ChapterId {
        let id = ChapterId(self.chapters.len() as u32);
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => synthesized_title(self.chapters.len() + 1),
        };
        self.chapters.push(Chapter { id, title, start });
        id
    }

    /// Total duration in seconds (the `End` sentinel).
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn get(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.get(id.0 as usize)
    }

    /// Resolve a chapter name to its timestamp in seconds.
    ///
    /// `End` always resolves to the total duration. Duplicate titles resolve
    /// to the first chapter carrying that title.
    pub fn resolve(&self, name: &str) -> Option<f64> {
        if name == END_CHAPTER {
            return Some(self.duration);
        }
        self.chapters
            .iter()
            .find(|c| c.title == name)
            .map(|c| c.start)
    }

    /// Latest chapter start, if any.
    pub fn last_start(&self) -> Option<f64> {
        self.chapters.iter().map(|c| c.start).reduce(f64::max)
    }

    /// Titles in order, followed by the `End` sentinel.
    pub fn names(&self) -> Vec<&str> {
        self.chapters
            .iter()
            .map(|c| c.title.as_str())
            .chain(std::iter::once(END_CHAPTER))
            .collect()
    }
}

/// Title given to a chapter the probe reported without one.
pub fn synthesized_title(ordinal: usize) -> String {
    format!("Chapter_{:02}", ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChapterSet {
        ChapterSet::from_starts(
            vec![
                (Some("Intro"), 0.0),
                (Some("Opening"), 30.0),
                (None, 120.0),
                (Some("Opening"), 600.0),
            ],
            1400.0,
        )
    }

    #[test]
    fn test_end_resolves_to_duration() {
        assert_eq!(sample().resolve("End"), Some(1400.0));
    }

    #[test]
    fn test_missing_title_is_synthesized_from_ordinal() {
        let set = sample();
        assert_eq!(set.chapters()[2].title, "Chapter_03");
        assert_eq!(set.resolve("Chapter_03"), Some(120.0));
    }

    #[test]
    fn test_duplicate_titles_keep_distinct_ids() {
        let set = sample();
        assert_eq!(set.chapters()[1].id, ChapterId(1));
        assert_eq!(set.chapters()[3].id, ChapterId(3));
        assert_eq!(set.resolve("Opening"), Some(30.0));
        assert_eq!(set.get(ChapterId(3)).map(|c| c.start), Some(600.0));
    }

    #[test]
    fn test_unknown_name_does_not_resolve() {
        assert_eq!(sample().resolve("Ending"), None);
    }

    #[test]
    fn test_names_end_with_sentinel() {
        let set = sample();
        let names = set.names();
        assert_eq!(names.first(), Some(&"Intro"));
        assert_eq!(names.last(), Some(&END_CHAPTER));
    }

    #[test]
    fn test_last_start() {
        assert_eq!(sample().last_start(), Some(600.0));
        assert_eq!(ChapterSet::new(10.0).last_start(), None);
    }
}
