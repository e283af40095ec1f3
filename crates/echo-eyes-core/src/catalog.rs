//! Static feed and anomaly event catalogs.
//!
//! Both catalogs are loaded once at startup from JSON files and are
//! immutable for the life of the process. An empty catalog is valid: the
//! scheduler still runs and [`check_startup_data`] reports the condition
//! so it can be logged.

use std::collections::BTreeSet;
use std::path::Path;

use echo_eyes_types::{AnomalyEvent, Feed, FeedId, UNKNOWN_LOCATION};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;

/// Errors that can occur when loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON of the expected shape.
    #[error("failed to parse catalog JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Two feed records share an id.
    #[error("duplicate feed id {id} in feed catalog")]
    DuplicateFeedId {
        /// The repeated id.
        id: FeedId,
    },
}

/// A catalog that loaded with zero entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupDataEmpty {
    /// The feed catalog is empty; every tick will carry no frames.
    Feeds,
    /// The event catalog is empty; anomalies cannot select an event.
    Events,
}

impl core::fmt::Display for StartupDataEmpty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Feeds => f.write_str("feed catalog is empty"),
            Self::Events => f.write_str("event catalog is empty"),
        }
    }
}

/// Report which catalogs are empty.
pub fn check_startup_data(feeds: &FeedCatalog, events: &EventCatalog) -> Vec<StartupDataEmpty> {
    let mut empty = Vec::new();
    if feeds.is_empty() {
        empty.push(StartupDataEmpty::Feeds);
    }
    if events.is_empty() {
        empty.push(StartupDataEmpty::Events);
    }
    empty
}

/// The feed file may be a bare array or wrapped as `{"feeds": [...]}`,
/// the same shape `GET /api/feeds` returns.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedFile {
    Bare(Vec<Feed>),
    Wrapped { feeds: Vec<Feed> },
}

/// Ordered list of feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCatalog {
    feeds: Vec<Feed>,
}

impl FeedCatalog {
    /// Build a catalog from feed records, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateFeedId`] if two records share an
    /// id, since each id gets exactly one frame per tick.
    pub fn new(feeds: Vec<Feed>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = feeds.iter().find(|f| !seen.insert(f.id)) {
            return Err(CatalogError::DuplicateFeedId { id: dup.id });
        }
        Ok(Self { feeds })
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or any
    /// error [`FeedCatalog::parse`] returns.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = read(path)?;
        Self::parse(&contents)
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] if the text does not parse, or
    /// [`CatalogError::DuplicateFeedId`] if an id repeats.
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        let feeds = match serde_json::from_str(json)? {
            FeedFile::Bare(feeds) | FeedFile::Wrapped { feeds } => feeds,
        };
        Self::new(feeds)
    }

    /// All feeds in catalog order.
    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Number of feeds.
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Whether the catalog has no feeds.
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Feed count as reported in the observer handshake.
    pub fn feed_count(&self) -> u32 {
        u32::try_from(self.feeds.len()).unwrap_or(u32::MAX)
    }

    /// Resolve a feed's location, or [`UNKNOWN_LOCATION`] if the feed is
    /// not in the catalog.
    pub fn location_of(&self, id: FeedId) -> &str {
        self.feeds
            .iter()
            .find(|f| f.id == id)
            .map_or(UNKNOWN_LOCATION, |f| f.location.as_str())
    }
}

/// Ordered list of anomaly event descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<AnomalyEvent>,
}

impl EventCatalog {
    /// Build a catalog from event records.
    pub const fn new(events: Vec<AnomalyEvent>) -> Self {
        Self { events }
    }

    /// Load a catalog from a JSON array file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read or
    /// [`CatalogError::Json`] if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = read(path)?;
        Self::parse(&contents)
    }

    /// Parse a catalog from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] if the text does not parse.
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            events: serde_json::from_str(json)?,
        })
    }

    /// All events in catalog order.
    pub fn events(&self) -> &[AnomalyEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Select one event uniformly at random. `None` when empty.
    pub fn choose(&self, rng: &mut impl Rng) -> Option<&AnomalyEvent> {
        self.events.choose(rng)
    }
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn parses_bare_feed_array() {
        let catalog =
            FeedCatalog::parse(r#"[{"id":1,"location":"Lobby"},{"id":2,"location":"Dock"}]"#)
                .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.feed_count(), 2);
        assert_eq!(catalog.feeds()[1].location, "Dock");
    }

    #[test]
    fn parses_wrapped_feed_list() {
        let catalog = FeedCatalog::parse(r#"{"feeds":[{"id":7,"location":"Roof"}]}"#).unwrap();
        assert_eq!(catalog.location_of(FeedId(7)), "Roof");
    }

    #[test]
    fn location_resolves_by_id_with_unknown_fallback() {
        let catalog = FeedCatalog::new(vec![Feed {
            id: FeedId(1),
            location: String::from("Lobby"),
        }])
        .unwrap();
        assert_eq!(catalog.location_of(FeedId(1)), "Lobby");
        assert_eq!(catalog.location_of(FeedId(2)), UNKNOWN_LOCATION);
    }

    #[test]
    fn duplicate_feed_ids_are_rejected() {
        let err = FeedCatalog::parse(
            r#"[{"id":1,"location":"A"},{"id":2,"location":"B"},{"id":1,"location":"C"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateFeedId { id } if id == FeedId(1)));
        assert!(err.to_string().contains("duplicate feed id 1"));
    }

    #[test]
    fn malformed_catalog_is_a_json_error() {
        assert!(matches!(
            FeedCatalog::parse(r#"[{"id":"one"}]"#),
            Err(CatalogError::Json { .. })
        ));
        assert!(matches!(EventCatalog::parse("{"), Err(CatalogError::Json { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FeedCatalog::from_file(Path::new("/nonexistent/feeds.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/feeds.json"));
    }

    #[test]
    fn choose_from_empty_catalog_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(EventCatalog::default().choose(&mut rng).is_none());
    }

    #[test]
    fn choose_eventually_covers_every_event() {
        let catalog = EventCatalog::parse(r#"[{"desc":"a"},{"desc":"b"},{"desc":"c"}]"#).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let seen: BTreeSet<String> = (0..200)
            .filter_map(|_| catalog.choose(&mut rng).map(|e| e.desc.clone()))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn startup_check_reports_each_empty_catalog() {
        let feeds = FeedCatalog::default();
        let events = EventCatalog::default();
        assert_eq!(
            check_startup_data(&feeds, &events),
            vec![StartupDataEmpty::Feeds, StartupDataEmpty::Events]
        );

        let feeds = FeedCatalog::parse(r#"[{"id":1,"location":"Lobby"}]"#).unwrap();
        assert_eq!(check_startup_data(&feeds, &events), vec![StartupDataEmpty::Events]);
    }
}
