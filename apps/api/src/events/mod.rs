//! Notification channel — typed activity/progress events pushed to dashboard
//! clients over WebSocket.
//!
//! Publishing is fire-and-forget: business logic hands an event to the sink
//! and moves on. A dead or lagging client can never fail a scoring operation.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Connected {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Activity {
        event_type: String,
        message: String,
        data: Value,
        timestamp: DateTime<Utc>,
    },
    Progress {
        phase: String,
        /// 0.0 to 1.0
        progress: f64,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
    StatsUpdate {
        stats: Value,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn activity(event_type: &str, message: impl Into<String>, data: Value) -> Self {
        Event::Activity {
            event_type: event_type.to_string(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn progress(phase: &str, progress: f64, message: impl Into<String>) -> Self {
        Event::Progress {
            phase: phase.to_string(),
            progress,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn stats(stats: Value) -> Self {
        Event::StatsUpdate {
            stats,
            timestamp: Utc::now(),
        }
    }
}

/// Injected publish interface. Implementations must never block or fail the
/// caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

/// Fans events out to every connected WebSocket client via a broadcast
/// channel. Slow clients lag and get skipped rather than applying
/// backpressure to the pipeline.
pub struct WsBroadcaster {
    tx: broadcast::Sender<Event>,
}

impl WsBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl EventSink for WsBroadcaster {
    fn publish(&self, event: Event) {
        // Err means no client is connected right now; that is fine.
        let _ = self.tx.send(event);
    }
}

/// GET /ws — upgrade and stream events until the client disconnects.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| client_loop(socket, rx))
}

async fn client_loop(mut socket: WebSocket, mut rx: broadcast::Receiver<Event>) {
    let hello = Event::Connected {
        message: "WebSocket connection established".to_string(),
        timestamp: Utc::now(),
    };
    if send_event(&mut socket, &hello).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Clients only send keepalive pings; ignore the content.
                Some(Ok(_)) => {}
                _ => {
                    debug!("WebSocket client disconnected");
                    break;
                }
            },
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &Event) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => socket.send(Message::Text(text)).await,
        Err(e) => {
            warn!("Failed to serialize event: {e}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_event_shape() {
        let event = Event::activity(
            "analysis_complete",
            "Analyzed Jane Doe: Tier 1, Score 92",
            json!({"proposal_id": "abc", "tier": 1, "score": 92}),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "activity");
        assert_eq!(value["event_type"], "analysis_complete");
        assert_eq!(value["data"]["tier"], 1);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_progress_event_shape() {
        let event = Event::progress("analysis", 0.5, "Analyzed 2/4 proposals");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["phase"], "analysis");
        assert_eq!(value["progress"], 0.5);
    }

    #[test]
    fn test_error_event_shape() {
        let value = serde_json::to_value(Event::error("Analysis failed")).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "Analysis failed");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let broadcaster = WsBroadcaster::new(16);
        // Must not panic or error with zero receivers.
        broadcaster.publish(Event::error("nobody is listening"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let broadcaster = WsBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();
        broadcaster.publish(Event::progress("analysis", 1.0, "done"));

        match rx.recv().await.unwrap() {
            Event::Progress { progress, .. } => assert_eq!(progress, 1.0),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
