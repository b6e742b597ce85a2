//! 变更通知 (Server-Sent Events)
//!
//! `GET /api/events` (管理员)：每次写操作产生一条 [`SyncPayload`]，
//! SSE 事件名为资源类型，事件 id 为该资源的版本号。

use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use shared::SyncPayload;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", get(events))
}

fn to_event(payload: &SyncPayload) -> Option<Event> {
    match Event::default()
        .event(payload.resource.as_str())
        .id(payload.version.to_string())
        .json_data(payload)
    {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(resource = %payload.resource, "Failed to encode sync event: {}", e);
            None
        }
    }
}

/// 订阅者落后超过通道容量时跳过丢失的消息继续推送
fn sync_stream(rx: Receiver<SyncPayload>) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    if let Some(event) = to_event(&payload) {
                        return Some((Ok(event), rx));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

async fn events(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("Event subscriber connected");
    Sse::new(sync_stream(state.subscribe())).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::broadcast;

    fn payload(version: u64) -> SyncPayload {
        SyncPayload {
            resource: "order".into(),
            version,
            action: "created".into(),
            id: "1".into(),
            data: None,
        }
    }

    #[tokio::test]
    async fn test_stream_yields_published_events() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = Box::pin(sync_stream(rx));

        tx.send(payload(1)).unwrap();
        tx.send(payload(2)).unwrap();
        drop(tx);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_survives_lag() {
        let (tx, rx) = broadcast::channel(2);
        let mut stream = Box::pin(sync_stream(rx));

        for v in 1..=5 {
            tx.send(payload(v)).unwrap();
        }
        drop(tx);

        let mut received = 0;
        while stream.next().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 2);
    }
}
