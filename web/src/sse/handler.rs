use crate::error::Result as WebResult;
use crate::extractors::current_session::CurrentSession;
use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use events::{Channel, Event};
use futures::Stream;
use log::*;
use service::AppState;
use sse::Subscription;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Open an event stream for the logged-in browser.
///
/// Subscribes to every change channel and keeps the response open until the
/// browser goes away or the server shuts down. Dropping the response body drops
/// the subscription, which releases it from the broadcaster.
#[utoipa::path(
    get,
    path = "/sse",
    responses(
        (status = 200, description = "Stream of change notifications", content_type = "text/event-stream", body = String),
        (status = 307, description = "No valid session, redirecting to /login"),
        (status = 503, description = "Event broker unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    CurrentSession(session): CurrentSession,
    State(app_state): State<AppState>,
) -> WebResult<Response> {
    let channels = Channel::ALL.map(|channel| channel.as_str());
    let subscription = app_state.pubsub.subscribe(&channels).await?;

    info!(
        "SSE connection {} opened for user {}",
        subscription.id().as_str(),
        session.user_id
    );

    let stream = relay(
        subscription,
        app_state.shutdown.clone(),
        app_state.config.sse_keepalive(),
    );

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Frames written to one connection, in order: every event received on
/// `subscription`, a `ping` whenever `keepalive` passes, and a final `close` once
/// `shutdown` is cancelled.
pub(crate) fn relay(
    mut subscription: Subscription,
    shutdown: CancellationToken,
    keepalive: Duration,
) -> impl Stream<Item = Result<Vec<u8>, Infallible>> {
    stream! {
        let mut ping = interval_at(Instant::now() + keepalive, keepalive);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sending close to SSE connection {}", subscription.id().as_str());
                    Event::close()
                }
                received = subscription.recv() => match received {
                    Some(event) => event,
                    None => {
                        debug!("Broadcaster closed SSE connection {}", subscription.id().as_str());
                        break;
                    }
                },
                _ = ping.tick() => Event::ping(),
            };

            let mut frame = Vec::new();
            if let Err(e) = event.write(&mut frame) {
                warn!("Dropping SSE connection {}: {e}", subscription.id().as_str());
                break;
            }
            trace!(
                "Relaying {} event to SSE connection {}",
                event.event,
                subscription.id().as_str()
            );
            yield Ok(frame);

            if event.is_close() {
                break;
            }
        }
    }
}
