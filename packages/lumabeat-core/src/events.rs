//! Playback events emitted by the media-player watcher.
//!
//! Every qualifying bus signal is converted into a [`PlaybackEvent`];
//! consecutive structurally-equal events are suppressed by [`EventDeduper`]
//! before they reach the coordinator.

/// Playback state of the watched media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Music is playing.
    Playing,
    /// Playback is paused.
    Paused,
    /// Playback is stopped (also used for unknown status strings).
    Stopped,
}

impl PlaybackStatus {
    /// Maps an MPRIS `PlaybackStatus` string to a typed status.
    ///
    /// Only `Playing` affects the visualizer, so unknown strings collapse
    /// into `Stopped`.
    #[must_use]
    pub fn from_mpris(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }

    /// Whether this status counts as actively playing.
    #[must_use]
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// A de-duplicated change notification about player status and track.
///
/// Either field may be absent when the underlying signal carried no change
/// for that property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackEvent {
    /// New playback status, if the signal carried one.
    pub status: Option<PlaybackStatus>,
    /// Display text for the current track, if the signal carried metadata.
    pub text: Option<String>,
}

/// Formats track metadata as the display text `"artist1 & artist2 - title"`.
#[must_use]
pub fn format_track_text(artists: &[String], title: &str) -> String {
    format!("{} - {}", artists.join(" & "), title)
}

/// Suppresses consecutive duplicate events.
///
/// Events are compared by full structural equality; a change in any field
/// makes the event pass through again.
#[derive(Debug, Default)]
pub struct EventDeduper {
    last: Option<PlaybackEvent>,
}

impl EventDeduper {
    /// Creates a deduper that passes the first event through unconditionally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the event if it differs from the previously accepted one.
    pub fn accept(&mut self, event: PlaybackEvent) -> Option<PlaybackEvent> {
        if self.last.as_ref() == Some(&event) {
            return None;
        }
        self.last = Some(event.clone());
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(text: &str) -> PlaybackEvent {
        PlaybackEvent {
            status: Some(PlaybackStatus::Playing),
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn identical_consecutive_events_are_suppressed() {
        let mut dedup = EventDeduper::new();
        assert!(dedup.accept(playing("a - b")).is_some());
        assert!(dedup.accept(playing("a - b")).is_none());
        assert!(dedup.accept(playing("a - b")).is_none());
    }

    #[test]
    fn text_only_change_still_emits() {
        let mut dedup = EventDeduper::new();
        assert!(dedup.accept(playing("a - b")).is_some());
        assert!(dedup.accept(playing("a - c")).is_some());
    }

    #[test]
    fn duplicate_after_a_change_emits_again() {
        let mut dedup = EventDeduper::new();
        assert!(dedup.accept(playing("a - b")).is_some());
        assert!(dedup.accept(playing("a - c")).is_some());
        assert!(dedup.accept(playing("a - b")).is_some());
        assert!(dedup.accept(playing("a - b")).is_none());
    }

    #[test]
    fn empty_events_deduplicate_too() {
        let mut dedup = EventDeduper::new();
        assert!(dedup.accept(PlaybackEvent::default()).is_some());
        assert!(dedup.accept(PlaybackEvent::default()).is_none());
    }

    #[test]
    fn unknown_status_strings_map_to_stopped() {
        assert_eq!(PlaybackStatus::from_mpris("Playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::from_mpris("Paused"), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::from_mpris("Stopped"), PlaybackStatus::Stopped);
        assert_eq!(PlaybackStatus::from_mpris("Buffering"), PlaybackStatus::Stopped);
        assert!(!PlaybackStatus::from_mpris("Buffering").is_playing());
    }

    #[test]
    fn track_text_joins_artists_with_ampersands() {
        let artists = vec!["First".to_string(), "Second".to_string()];
        assert_eq!(format_track_text(&artists, "Song"), "First & Second - Song");
        assert_eq!(format_track_text(&[], "Song"), " - Song");
    }
}
