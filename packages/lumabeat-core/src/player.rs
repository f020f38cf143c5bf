//! Media-player watcher.
//!
//! Subscribes once, at construction, to `PropertiesChanged` signals from the
//! watched MPRIS player on the session bus, converts them into
//! [`PlaybackEvent`]s, de-duplicates, and hands survivors to the coordinator
//! over a capacity-1 channel.

use std::collections::HashMap;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zbus::zvariant::OwnedValue;
use zbus::{Connection, MessageStream, MessageType};

use crate::events::{format_track_text, EventDeduper, PlaybackEvent, PlaybackStatus};
use crate::protocol_constants::{
    MPRIS_OBJECT_PATH, MPRIS_PLAYER_INTERFACE, PLAYBACK_EVENT_CHANNEL_CAPACITY,
};

/// Errors that can occur while setting up the bus subscription.
///
/// Both are bootstrap errors: without the subscription the daemon cannot
/// track playback, so startup aborts.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Could not connect to the session bus.
    #[error("connect session bus: {0}")]
    Connect(#[source] zbus::Error),

    /// Could not install the signal match rule.
    #[error("subscribe to player signals: {0}")]
    Subscribe(#[source] zbus::Error),
}

/// Watches one media player's playback signals on the session bus.
///
/// Single watcher lifetime, single closer: the background loop runs until
/// [`PlayerWatcher::close`] is called (or the parent token is cancelled),
/// then drops the event sender and the bus connection, in that order.
pub struct PlayerWatcher {
    events: Option<mpsc::Receiver<PlaybackEvent>>,
    cancel: CancellationToken,
}

impl PlayerWatcher {
    /// Connects to the session bus and starts the signal loop.
    ///
    /// `player_bus` is the player's well-known bus name
    /// (e.g. `org.mpris.MediaPlayer2.spotify`). The watcher's lifetime is
    /// tied to a child of `parent_cancel`.
    ///
    /// # Errors
    ///
    /// Returns a [`WatcherError`] if the bus connection or the match-rule
    /// installation fails.
    pub async fn connect(
        player_bus: &str,
        parent_cancel: &CancellationToken,
    ) -> Result<Self, WatcherError> {
        let conn = Connection::session().await.map_err(WatcherError::Connect)?;

        let dbus = zbus::fdo::DBusProxy::new(&conn)
            .await
            .map_err(WatcherError::Connect)?;
        let rule = format!(
            "type='signal',interface='org.freedesktop.DBus.Properties',\
             member='PropertiesChanged',path='{MPRIS_OBJECT_PATH}',sender='{player_bus}'"
        );
        dbus.add_match(&rule)
            .await
            .map_err(|e| WatcherError::Subscribe(e.into()))?;

        log::info!("[player] watching {player_bus}");

        let (tx, rx) = mpsc::channel(PLAYBACK_EVENT_CHANNEL_CAPACITY);
        let cancel = parent_cancel.child_token();
        tokio::spawn(run_signal_loop(conn, tx, cancel.clone()));

        Ok(Self {
            events: Some(rx),
            cancel,
        })
    }

    /// Takes the event receiver. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<PlaybackEvent>> {
        self.events.take()
    }

    /// Stops the signal loop, closing the output channel and the bus
    /// connection.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Consumes raw bus messages until cancelled or the stream ends.
async fn run_signal_loop(
    conn: Connection,
    events: mpsc::Sender<PlaybackEvent>,
    cancel: CancellationToken,
) {
    let mut stream = MessageStream::from(&conn);
    let mut dedup = EventDeduper::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = stream.next() => {
                let message = match next {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        log::error!("[player] signal stream: {e}");
                        break;
                    }
                    None => break,
                };
                let Some(event) = playback_event_from_message(&message) else {
                    continue;
                };
                if let Some(event) = dedup.accept(event) {
                    tracing::debug!(?event, "playback event");
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    log::info!("[player] signal loop stopped");
    // `events` drops here, closing the output channel before the bus
    // connection goes down with `conn`.
}

/// Converts a qualifying `PropertiesChanged` signal into an event.
///
/// Signals for interfaces other than the MPRIS player interface are
/// discarded.
fn playback_event_from_message(message: &zbus::Message) -> Option<PlaybackEvent> {
    let header = message.header().ok()?;
    if !matches!(header.message_type(), Ok(MessageType::Signal)) {
        return None;
    }
    let member = header.member().ok().flatten()?;
    if member.as_str() != "PropertiesChanged" {
        return None;
    }

    let (interface, changed, _invalidated): (String, HashMap<String, OwnedValue>, Vec<String>) =
        message.body().ok()?;
    if interface != MPRIS_PLAYER_INTERFACE {
        return None;
    }
    Some(playback_event_from_properties(&changed))
}

/// Extracts status and track text from the changed-properties map.
fn playback_event_from_properties(changed: &HashMap<String, OwnedValue>) -> PlaybackEvent {
    let mut event = PlaybackEvent::default();

    if let Some(value) = changed.get("PlaybackStatus") {
        if let Some(status) = value.downcast_ref::<str>() {
            event.status = Some(PlaybackStatus::from_mpris(status));
        }
    }

    if let Some(value) = changed.get("Metadata") {
        if let Ok(metadata) = HashMap::<String, OwnedValue>::try_from(value.clone()) {
            let artists = metadata
                .get("xesam:artist")
                .and_then(|v| Vec::<String>::try_from(v.clone()).ok())
                .unwrap_or_default();
            let title = metadata
                .get("xesam:title")
                .and_then(|v| v.downcast_ref::<str>())
                .unwrap_or_default();
            event.text = Some(format_track_text(&artists, title));
        }
    }

    event
}
