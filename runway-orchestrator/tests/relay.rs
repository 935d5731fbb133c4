use std::pin::Pin;
use std::time::Duration;

use assert_matches::assert_matches;
use futures::channel::mpsc;
use futures::{Sink, SinkExt, StreamExt};
use runway_core::dto::execution::RunRequest;
use runway_core::relay::{
    AgentInbound, AgentOutbound, ExecuteResponse, FailureKind, RelayFailure, RelayResult,
    RelayedRun,
};
use runway_orchestrator::relay::{RelayError, RelayHub};

type Outbound = mpsc::UnboundedSender<Result<AgentOutbound, RelayError>>;
type Inbound = mpsc::UnboundedReceiver<AgentInbound>;
type BoxSink = Pin<Box<dyn Sink<AgentInbound, Error = RelayError> + Send>>;

/// In-memory agent end of a relay stream
struct FakeAgent {
    outbound: Outbound,
    inbound: Inbound,
}

impl FakeAgent {
    fn send(&self, frame: AgentOutbound) {
        self.outbound.unbounded_send(Ok(frame)).unwrap();
    }

    fn hello(&self, agent_id: &str) {
        self.send(AgentOutbound::Hello {
            agent_id: agent_id.to_string(),
        });
    }

    async fn next_request(&mut self) -> runway_core::relay::ExecuteRequest {
        match self.inbound.next().await {
            Some(AgentInbound::Execute(request)) => request,
            None => panic!("relay stream closed"),
        }
    }

    fn answer(&self, correlation_id: uuid::Uuid, message: &str) {
        self.send(AgentOutbound::Executed(ExecuteResponse {
            correlation_id,
            result: failure(message),
        }));
    }
}

fn failure(message: &str) -> RelayResult {
    RelayResult::Failure(RelayFailure {
        kind: FailureKind::Conflict,
        message: message.to_string(),
    })
}

fn run(script_id: &str) -> RelayedRun {
    RelayedRun {
        script_id: script_id.to_string(),
        request: RunRequest::new("run-1"),
    }
}

fn hub() -> RelayHub {
    RelayHub::new(Duration::from_secs(30), Duration::from_secs(1))
}

/// Connects a fake agent to the hub and returns it with the session task
fn connect(hub: &RelayHub) -> (FakeAgent, tokio::task::JoinHandle<Result<(), RelayError>>) {
    let (outbound, stream) = mpsc::unbounded();
    let (sink, inbound) = mpsc::unbounded::<AgentInbound>();
    let sink: BoxSink = Box::pin(sink.sink_map_err(|e| RelayError::Transport(e.to_string())));

    let hub = hub.clone();
    let session = tokio::spawn(async move { hub.accept(stream, sink).await });

    (FakeAgent { outbound, inbound }, session)
}

async fn wait_for_agent(hub: &RelayHub, agent_id: &str) {
    for _ in 0..200 {
        if hub.agents().await.iter().any(|a| a == agent_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("agent {agent_id} never registered");
}

#[tokio::test]
async fn test_concurrent_requests_are_matched_by_correlation_id() {
    let hub = hub();
    let (mut agent, _session) = connect(&hub);
    agent.hello("edge-1");
    wait_for_agent(&hub, "edge-1").await;

    let callers: Vec<_> = (0..8)
        .map(|i| {
            let hub = hub.clone();
            tokio::spawn(async move {
                let script_id = format!("script-{i}");
                let result = hub.execute("edge-1", run(&script_id)).await;
                (script_id, result)
            })
        })
        .collect();

    let mut requests = Vec::new();
    for _ in 0..8 {
        requests.push(agent.next_request().await);
    }

    // Answer in reverse arrival order
    for request in requests.iter().rev() {
        agent.answer(request.correlation_id, &request.options.script_id);
    }

    for caller in callers {
        let (script_id, result) = caller.await.unwrap();
        assert_eq!(result.unwrap(), failure(&script_id));
    }
}

#[tokio::test]
async fn test_dropped_stream_fails_outstanding_requests() {
    let hub = hub();
    let (mut agent, session) = connect(&hub);
    agent.hello("edge-1");
    wait_for_agent(&hub, "edge-1").await;

    let first = tokio::spawn({
        let hub = hub.clone();
        async move { hub.execute("edge-1", run("script-a")).await }
    });
    let second = tokio::spawn({
        let hub = hub.clone();
        async move { hub.execute("edge-1", run("script-b")).await }
    });

    agent.next_request().await;
    agent.next_request().await;

    let FakeAgent {
        outbound,
        mut inbound,
    } = agent;
    drop(outbound);

    assert_matches!(first.await.unwrap(), Err(RelayError::SessionLost(_)));
    assert_matches!(second.await.unwrap(), Err(RelayError::SessionLost(_)));
    assert!(session.await.unwrap().is_ok());

    // Nothing is resent
    assert!(inbound.next().await.is_none());
    assert!(hub.agents().await.is_empty());
    assert_matches!(
        hub.execute("edge-1", run("script-c")).await,
        Err(RelayError::AgentNotConnected(_))
    );
}

#[tokio::test]
async fn test_first_frame_must_be_hello() {
    let hub = hub();
    let (agent, session) = connect(&hub);

    agent.answer(uuid::Uuid::new_v4(), "too early");

    assert_matches!(session.await.unwrap(), Err(RelayError::Handshake(_)));
    assert!(hub.agents().await.is_empty());
}

#[tokio::test]
async fn test_reconnect_replaces_previous_session() {
    let hub = hub();
    let (mut old, old_session) = connect(&hub);
    old.hello("edge-1");
    wait_for_agent(&hub, "edge-1").await;

    let stranded = tokio::spawn({
        let hub = hub.clone();
        async move { hub.execute("edge-1", run("script-a")).await }
    });
    old.next_request().await;

    let (mut new, _new_session) = connect(&hub);
    new.hello("edge-1");

    assert_matches!(stranded.await.unwrap(), Err(RelayError::SessionLost(_)));
    assert!(old_session.await.unwrap().is_ok());
    assert_eq!(hub.agents().await, vec!["edge-1".to_string()]);

    let relayed = tokio::spawn({
        let hub = hub.clone();
        async move { hub.execute("edge-1", run("script-b")).await }
    });
    let request = new.next_request().await;
    assert_eq!(request.options.script_id, "script-b");
    new.answer(request.correlation_id, "fresh");
    assert_eq!(relayed.await.unwrap().unwrap(), failure("fresh"));
}
