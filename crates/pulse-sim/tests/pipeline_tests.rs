//! End-to-end pipeline tests
//!
//! Wires the simulated backend, the connection manager and the dashboard
//! actor together and drives them on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use pulse_engine::{
    run_connection_manager, run_dashboard_actor, Backoff, CaptureState, ConnectionConfig,
    Dashboard, DashboardConfig, DashboardEvent, DashboardInput, DashboardView, NotificationKind,
    UserAction,
};
use pulse_sim::{
    run_traffic_generator, GeneratorConfig, Operation, SimTransport, SimulatedBackend,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Pipeline {
    backend: SimulatedBackend,
    transport: SimTransport,
    input_tx: mpsc::Sender<DashboardInput>,
    event_rx: mpsc::Receiver<DashboardEvent>,
    view_rx: watch::Receiver<DashboardView>,
    actor: JoinHandle<Dashboard<SimulatedBackend>>,
    _stop_generator: oneshot::Sender<()>,
}

/// Start everything; `refused` connection attempts fail before the first success
fn start(refused: u32) -> Pipeline {
    let backend = SimulatedBackend::new();
    let transport = SimTransport::new(backend.clone());
    transport.fail_next_connects(refused);

    let dashboard = Dashboard::new(Arc::new(backend.clone()), DashboardConfig::default());
    let (input_tx, input_rx) = mpsc::channel(1024);
    let (event_tx, event_rx) = mpsc::channel(256);
    let (view_tx, view_rx) = watch::channel(dashboard.view());
    let actor = tokio::spawn(run_dashboard_actor(dashboard, input_rx, event_tx, view_tx));

    let config = ConnectionConfig {
        url: "ws://sim/ws".into(),
        backoff: Backoff::Fixed { delay_ms: 3000 },
    };
    tokio::spawn(run_connection_manager(
        transport.clone(),
        config,
        input_tx.clone(),
    ));

    let (stop_generator, shutdown) = oneshot::channel();
    tokio::spawn(run_traffic_generator(
        backend.clone(),
        GeneratorConfig { rate: 10.0, seed: 3 },
        shutdown,
    ));

    Pipeline {
        backend,
        transport,
        input_tx,
        event_rx,
        view_rx,
        actor,
        _stop_generator: stop_generator,
    }
}

async fn wait_view(
    rx: &mut watch::Receiver<DashboardView>,
    predicate: impl FnMut(&DashboardView) -> bool,
) -> DashboardView {
    rx.wait_for(predicate).await.unwrap().clone()
}

async fn user(p: &Pipeline, action: UserAction) {
    p.input_tx.send(DashboardInput::User(action)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn capture_streams_packets_and_stats() {
    let mut p = start(0);
    wait_view(&mut p.view_rx, |v| v.connected).await;

    user(&p, UserAction::CreateSession { name: "Pipeline".into() }).await;
    user(&p, UserAction::StartCapture).await;

    let view = wait_view(&mut p.view_rx, |v| v.buffered >= 20 && v.headline.total_packets != "0").await;
    assert_eq!(view.capture_state, CaptureState::Capturing);
    assert!(!view.protocol_chart.is_empty());
    assert!(!view.top_sources.is_empty());
    assert!(view.traffic.iter().any(|b| b.height_percent > 0.0));
    assert_eq!(view.session.unwrap().name, "Pipeline");

    // Stopping halts the stream
    user(&p, UserAction::StopCapture).await;
    wait_view(&mut p.view_rx, |v| v.capture_state == CaptureState::Stopped).await;
    // Let frames published before the stop drain through
    tokio::time::sleep(Duration::from_secs(1)).await;
    let settled = p.view_rx.borrow().buffered;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(p.view_rx.borrow().buffered, settled);

    p.input_tx.send(DashboardInput::Shutdown).await.unwrap();
    p.actor.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropped_channel_reconnects_after_delay() {
    let mut p = start(0);
    wait_view(&mut p.view_rx, |v| v.connected).await;
    assert_eq!(p.backend.subscriber_count(), 1);

    p.transport.disconnect_all();
    let lost_at = Instant::now();
    wait_view(&mut p.view_rx, |v| !v.connected).await;

    wait_view(&mut p.view_rx, |v| v.connected).await;
    assert!(Instant::now() - lost_at >= Duration::from_secs(3));
    assert_eq!(p.backend.subscriber_count(), 1);

    let events: Vec<_> = std::iter::from_fn(|| p.event_rx.try_recv().ok()).collect();
    let changes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            DashboardEvent::ConnectionChanged { connected } => Some(*connected),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![true, false, true]);
}

#[tokio::test(start_paused = true)]
async fn refused_connections_retry_until_success() {
    let start_time = Instant::now();
    let mut p = start(2);

    wait_view(&mut p.view_rx, |v| v.connected).await;
    assert!(Instant::now() - start_time >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn injected_start_failure_is_reported() {
    let mut p = start(0);
    p.backend.fail_next(Operation::Start, 1);

    user(&p, UserAction::CreateSession { name: "Flaky".into() }).await;
    user(&p, UserAction::StartCapture).await;
    p.input_tx.send(DashboardInput::Shutdown).await.unwrap();
    let dashboard = p.actor.await.unwrap();

    assert_eq!(dashboard.capture_state(), CaptureState::SessionCreated);
    assert!(p.backend.capturing_session().is_none());

    let errors: Vec<_> = std::iter::from_fn(|| p.event_rx.try_recv().ok())
        .filter_map(|e| match e {
            DashboardEvent::Notification(n) if n.kind == NotificationKind::Error => {
                Some(n.description)
            }
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec!["Failed to start packet capture"]);
}
