//! Relay tunnel, agent side
//!
//! Dials the control plane, introduces the agent with a `Hello` frame and
//! answers every `ExecuteRequest` with an `ExecuteResponse` carrying the same
//! correlation id. Requests are handled concurrently; answers are queued and
//! written by a single outbound loop.
//!
//! Reconnects with capped exponential backoff after any failure. Every new
//! stream starts without correlation state.

use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt, future};
use runway_core::relay::{AgentInbound, AgentOutbound, ExecuteRequest, ExecuteResponse};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::handler::RequestHandler;

const OUTBOUND_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("failed to connect to control plane: {0}")]
    Connect(String),

    #[error("relay transport error: {0}")]
    Transport(String),

    #[error("malformed relay frame: {0}")]
    Protocol(String),
}

/// Capped exponential backoff
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the delay to wait now and doubles the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Keeps a relay stream to the control plane open until `shutdown` fires
pub async fn run(config: &Config, handler: Arc<dyn RequestHandler>, shutdown: CancellationToken) {
    let mut backoff = Backoff::new(config.reconnect_delay, config.max_reconnect_delay);

    while !shutdown.is_cancelled() {
        tracing::info!(url = %config.control_plane_url, "Connecting to control plane");

        match connect(&config.control_plane_url).await {
            Ok((stream, sink)) => {
                tracing::info!(agent_id = %config.agent_id, "Relay stream connected");
                backoff.reset();

                match run_session(&config.agent_id, stream, sink, handler.clone(), &shutdown).await
                {
                    Ok(()) => tracing::warn!("Relay stream ended"),
                    Err(e) => tracing::error!(error = %e, "Relay stream failed"),
                }
            }
            Err(e) => tracing::error!(error = %e, "Connection failed"),
        }

        let delay = backoff.next_delay();
        tracing::info!(delay_secs = delay.as_secs_f64(), "Reconnecting");
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!("Relay tunnel stopped");
}

type FrameStream = std::pin::Pin<Box<dyn Stream<Item = Result<AgentInbound, TunnelError>> + Send>>;
type FrameSink = std::pin::Pin<Box<dyn Sink<AgentOutbound, Error = TunnelError> + Send>>;

async fn connect(url: &str) -> Result<(FrameStream, FrameSink), TunnelError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| TunnelError::Connect(e.to_string()))?;
    let (sink, stream) = socket.split();

    let stream = stream.filter_map(|message| future::ready(decode(message)));
    let sink = sink
        .sink_map_err(|e| TunnelError::Transport(e.to_string()))
        .with(|frame| future::ready(encode(frame)));

    Ok((Box::pin(stream), Box::pin(sink)))
}

fn decode(
    message: Result<Message, tungstenite::Error>,
) -> Option<Result<AgentInbound, TunnelError>> {
    match message {
        Ok(Message::Text(text)) => Some(
            serde_json::from_str(text.as_str()).map_err(|e| TunnelError::Protocol(e.to_string())),
        ),
        Ok(Message::Binary(bytes)) => {
            Some(serde_json::from_slice(&bytes).map_err(|e| TunnelError::Protocol(e.to_string())))
        }
        Ok(Message::Close(frame)) => {
            tracing::info!(?frame, "Control plane closed WebSocket");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(TunnelError::Transport(e.to_string()))),
    }
}

fn encode(frame: AgentOutbound) -> Result<Message, TunnelError> {
    serde_json::to_string(&frame)
        .map(Message::text)
        .map_err(|e| TunnelError::Protocol(e.to_string()))
}

/// Serves one relay stream
///
/// Sends the handshake, then handles requests until the stream ends, the
/// sink fails or `shutdown` fires. Requests still being handled when the
/// stream ends are not answered.
pub async fn run_session<St, Si>(
    agent_id: &str,
    mut stream: St,
    mut sink: Si,
    handler: Arc<dyn RequestHandler>,
    shutdown: &CancellationToken,
) -> Result<(), TunnelError>
where
    St: Stream<Item = Result<AgentInbound, TunnelError>> + Unpin,
    Si: Sink<AgentOutbound, Error = TunnelError> + Unpin + Send + 'static,
{
    sink.send(AgentOutbound::Hello {
        agent_id: agent_id.to_string(),
    })
    .await?;

    let closed = shutdown.child_token();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let pump = tokio::spawn(pump_outbound(rx, sink, closed.clone()));

    let outcome = loop {
        let frame = tokio::select! {
            _ = closed.cancelled() => break Ok(()),
            frame = stream.next() => frame,
        };

        match frame {
            None => break Ok(()),
            Some(Ok(AgentInbound::Execute(request))) => {
                spawn_request(request, handler.clone(), tx.clone());
            }
            Some(Err(TunnelError::Protocol(e))) => {
                tracing::warn!(error = %e, "Dropping malformed frame");
            }
            Some(Err(e)) => break Err(e),
        }
    };

    closed.cancel();
    let pumped = pump
        .await
        .map_err(|e| TunnelError::Transport(format!("outbound loop panicked: {e}")))?;

    outcome.and(pumped)
}

fn spawn_request(
    request: ExecuteRequest,
    handler: Arc<dyn RequestHandler>,
    outbound: mpsc::Sender<AgentOutbound>,
) {
    let ExecuteRequest {
        correlation_id,
        options,
    } = request;
    tracing::info!(%correlation_id, script_id = %options.script_id, "Received execute request");

    tokio::spawn(async move {
        let result = handler.handle(options).await;
        let response = AgentOutbound::Executed(ExecuteResponse {
            correlation_id,
            result,
        });
        if outbound.send(response).await.is_err() {
            tracing::warn!(%correlation_id, "Stream closed before the response could be sent");
        }
    });
}

async fn pump_outbound<Si>(
    mut outbound: mpsc::Receiver<AgentOutbound>,
    mut sink: Si,
    closed: CancellationToken,
) -> Result<(), TunnelError>
where
    Si: Sink<AgentOutbound, Error = TunnelError> + Unpin,
{
    let result = loop {
        let frame = tokio::select! {
            _ = closed.cancelled() => break Ok(()),
            frame = outbound.recv() => frame,
        };
        let Some(frame) = frame else {
            break Ok(());
        };
        if let Err(e) = sink.send(frame).await {
            break Err(e);
        }
    };

    closed.cancel();
    let _ = sink.close().await;
    result
}
