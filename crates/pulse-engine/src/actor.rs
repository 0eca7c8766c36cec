//! Dashboard actor
//!
//! All dashboard state lives in one task. Channel traffic, user actions and
//! the capture-duration ticker are consumed from a single queue in FIFO
//! order; the resulting view is published on a `watch` channel and
//! notifications go out on an `mpsc` channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_engine::{run_dashboard_actor, Dashboard, DashboardConfig};
//! use tokio::sync::{mpsc, watch};
//!
//! let dashboard = Dashboard::new(api, DashboardConfig::default());
//! let (input_tx, input_rx) = mpsc::channel(1024);
//! let (event_tx, event_rx) = mpsc::channel(64);
//! let (view_tx, view_rx) = watch::channel(dashboard.view());
//!
//! tokio::spawn(run_dashboard_actor(dashboard, input_rx, event_tx, view_tx));
//! ```

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::dashboard::Dashboard;
use crate::events::{DashboardEvent, DashboardInput};
use crate::session::SessionApi;
use crate::view::DashboardView;

/// Inputs applied before the view is republished
const MAX_BATCH: usize = 256;

/// Capture-duration tick period
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Wait for the next tick, or forever when the ticker is disarmed
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Arm the ticker when capture runs, drop it when it stops
fn sync_ticker(ticker: &mut Option<Interval>, wanted: bool) {
    match (ticker.is_some(), wanted) {
        (false, true) => {
            let mut new = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            new.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(new);
            debug!("Duration ticker armed");
        }
        (true, false) => {
            *ticker = None;
            debug!("Duration ticker disarmed");
        }
        _ => {}
    }
}

/// Run the dashboard actor until `Shutdown` or until every input sender is gone
///
/// Returns the dashboard so callers can inspect the final state.
pub async fn run_dashboard_actor<A: SessionApi>(
    mut dashboard: Dashboard<A>,
    mut input_rx: mpsc::Receiver<DashboardInput>,
    event_tx: mpsc::Sender<DashboardEvent>,
    view_tx: watch::Sender<DashboardView>,
) -> Dashboard<A> {
    info!("Dashboard actor started");
    let mut ticker: Option<Interval> = None;
    view_tx.send_replace(dashboard.view());

    'outer: loop {
        let first = tokio::select! {
            input = input_rx.recv() => match input {
                Some(input) => input,
                None => break,
            },
            _ = next_tick(&mut ticker) => DashboardInput::TimerTick,
        };

        // Drain whatever else is already queued so a burst costs one view
        let mut batch = vec![first];
        while batch.len() < MAX_BATCH {
            match input_rx.try_recv() {
                Ok(input) => batch.push(input),
                Err(_) => break,
            }
        }

        for input in batch {
            if matches!(input, DashboardInput::Shutdown) {
                view_tx.send_replace(dashboard.view());
                break 'outer;
            }

            let now = Instant::now().into_std();
            for event in dashboard.handle(input, now).await {
                let _ = event_tx.send(event).await;
            }
            sync_ticker(&mut ticker, dashboard.needs_ticks());
        }

        view_tx.send_replace(dashboard.view());
    }

    info!("Dashboard actor stopped");
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardConfig;
    use crate::events::{NotificationKind, UserAction};
    use crate::session::CaptureState;
    use crate::test_support::FakeApi;
    use chrono::Utc;
    use pulse_protocol::PacketRecord;
    use std::sync::Arc;

    struct Harness {
        input_tx: mpsc::Sender<DashboardInput>,
        event_rx: mpsc::Receiver<DashboardEvent>,
        view_rx: watch::Receiver<DashboardView>,
        actor: tokio::task::JoinHandle<Dashboard<FakeApi>>,
        api: Arc<FakeApi>,
    }

    fn spawn_actor() -> Harness {
        let api = Arc::new(FakeApi::default());
        let dashboard = Dashboard::new(Arc::clone(&api), DashboardConfig::default());
        let (input_tx, input_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(dashboard.view());
        let actor = tokio::spawn(run_dashboard_actor(dashboard, input_rx, event_tx, view_tx));
        Harness {
            input_tx,
            event_rx,
            view_rx,
            actor,
            api,
        }
    }

    async fn send(h: &Harness, input: DashboardInput) {
        h.input_tx.send(input).await.unwrap();
    }

    #[tokio::test]
    async fn test_packets_show_up_in_view() {
        let mut h = spawn_actor();

        for id in ["a", "b"] {
            let packet = PacketRecord::new(id, Utc::now(), "10.0.0.1", "10.0.0.2", "TCP", 64);
            send(&h, DashboardInput::PacketArrived(packet)).await;
        }

        let view = h
            .view_rx
            .wait_for(|v| v.rows.len() == 2)
            .await
            .unwrap()
            .clone();
        assert_eq!(view.rows[0].id.as_str(), "b");
        assert_eq!(view.rows[0].position, 1);
        assert_eq!(view.buffered, 2);

        send(&h, DashboardInput::Shutdown).await;
        let dashboard = h.actor.await.unwrap();
        assert_eq!(dashboard.buffer().len(), 2);
    }

    #[tokio::test]
    async fn test_connection_events_are_deduplicated() {
        let mut h = spawn_actor();

        send(&h, DashboardInput::ChannelUp).await;
        send(&h, DashboardInput::ChannelUp).await;
        send(
            &h,
            DashboardInput::ChannelLost {
                attempt: 1,
                retry_in: Duration::from_secs(3),
            },
        )
        .await;
        send(&h, DashboardInput::Shutdown).await;
        let dashboard = h.actor.await.unwrap();
        assert!(!dashboard.is_connected());

        let mut events = Vec::new();
        while let Ok(event) = h.event_rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                DashboardEvent::ConnectionChanged { connected: true },
                DashboardEvent::ConnectionChanged { connected: false },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_runs_only_while_capturing() {
        let mut h = spawn_actor();

        send(&h, DashboardInput::User(UserAction::CreateSession { name: "Lab".into() })).await;
        send(&h, DashboardInput::User(UserAction::StartCapture)).await;

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(h.view_rx.borrow().elapsed, "00:00:03");
        assert_eq!(h.view_rx.borrow().capture_state, CaptureState::Capturing);

        send(&h, DashboardInput::User(UserAction::StopCapture)).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.view_rx.borrow().elapsed, "00:00:03");
        assert!(!h.view_rx.borrow().can_stop);
        assert!(h.view_rx.borrow().can_start);

        send(&h, DashboardInput::Shutdown).await;
        h.actor.await.unwrap();
        assert_eq!(h.api.calls(), 3);

        let titles: Vec<_> = std::iter::from_fn(|| h.event_rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::Notification(n) => Some(n.title),
                _ => None,
            })
            .collect();
        assert_eq!(
            titles,
            vec!["Session Created", "Capture Started", "Capture Stopped"]
        );
    }

    #[tokio::test]
    async fn test_failed_start_reports_error() {
        let mut h = spawn_actor();
        send(&h, DashboardInput::User(UserAction::CreateSession { name: "Lab".into() })).await;
        h.view_rx.wait_for(|v| v.can_start).await.unwrap();

        h.api.set_failing(true);
        send(&h, DashboardInput::User(UserAction::StartCapture)).await;
        send(&h, DashboardInput::Shutdown).await;
        let dashboard = h.actor.await.unwrap();
        assert_eq!(dashboard.capture_state(), CaptureState::SessionCreated);

        let errors: Vec<_> = std::iter::from_fn(|| h.event_rx.try_recv().ok())
            .filter_map(|e| match e {
                DashboardEvent::Notification(n) if n.kind == NotificationKind::Error => {
                    Some(n.description)
                }
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec!["Failed to start packet capture"]);
    }
}
