//! Wiring between the UI thread and the dashboard tasks
//!
//! The UI only ever holds the three channel ends in [`Pipeline`]; the
//! dashboard actor, the connection manager and (in simulation mode) the
//! traffic generator run on the tokio runtime.

use std::sync::Arc;

use chrono::Local;
use pulse_engine::{
    run_connection_manager, run_dashboard_actor, ConnectionConfig, Dashboard, DashboardConfig,
    DashboardEvent, DashboardInput, DashboardView, Endpoint, SessionApi, Transport, UserAction,
};
use pulse_sim::{run_traffic_generator, GeneratorConfig, SimTransport, SimulatedBackend};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

use crate::error::StartupError;
use crate::http_api::HttpApi;
use crate::settings::Settings;
use crate::ws_transport::WsTransport;

/// Input queue depth; packet bursts wait here while the actor catches up
const INPUT_QUEUE: usize = 4096;

/// Outgoing event queue depth
const EVENT_QUEUE: usize = 256;

/// Channel address used in simulation mode (only shown in logs)
const SIM_CHANNEL_URL: &str = "sim://local/ws";

/// The UI's handles on a running dashboard
pub struct Pipeline {
    /// Dashboard input queue
    pub input_tx: mpsc::Sender<DashboardInput>,
    /// Notifications and state changes
    pub event_rx: mpsc::Receiver<DashboardEvent>,
    /// Latest published view
    pub view_rx: watch::Receiver<DashboardView>,
    /// Stops the simulated traffic generator when dropped
    _generator_stop: Option<oneshot::Sender<()>>,
}

/// Name given to the session created at startup
pub fn startup_session_name() -> String {
    format!("Session {}", Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p"))
}

/// Start the dashboard against the backend chosen in `settings`
pub fn launch(handle: &Handle, settings: &Settings) -> Result<Pipeline, StartupError> {
    let dashboard_config = settings.dashboard_config();

    if settings.simulate {
        let backend = SimulatedBackend::new();
        let transport = SimTransport::new(backend.clone());
        let connection = ConnectionConfig {
            url: SIM_CHANNEL_URL.to_string(),
            backoff: settings.reconnect,
        };

        let (generator_stop, shutdown) = oneshot::channel();
        let generator = GeneratorConfig {
            rate: settings.simulated_rate,
            ..GeneratorConfig::default()
        };
        handle.spawn(run_traffic_generator(backend.clone(), generator, shutdown));

        info!("Using simulated backend");
        let mut pipeline = spawn(
            handle,
            Arc::new(backend),
            transport,
            connection,
            dashboard_config,
        );
        pipeline._generator_stop = Some(generator_stop);
        Ok(pipeline)
    } else {
        let endpoint = Endpoint::from_origin(&settings.effective_origin())?;
        let api = HttpApi::new(endpoint.clone(), settings.request_timeout())
            .map_err(StartupError::Client)?;
        let connection = ConnectionConfig {
            url: endpoint.channel_url(),
            backoff: settings.reconnect,
        };

        info!("Using capture server at {}", endpoint.origin());
        Ok(spawn(
            handle,
            Arc::new(api),
            WsTransport,
            connection,
            dashboard_config,
        ))
    }
}

fn spawn<A: SessionApi, T: Transport>(
    handle: &Handle,
    api: Arc<A>,
    transport: T,
    connection: ConnectionConfig,
    config: DashboardConfig,
) -> Pipeline {
    let dashboard = Dashboard::new(api, config);
    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
    let (view_tx, view_rx) = watch::channel(dashboard.view());

    handle.spawn(async move {
        let dashboard = run_dashboard_actor(dashboard, input_rx, event_tx, view_tx).await;
        info!(
            "Dashboard actor exited with {} buffered packet(s)",
            dashboard.buffer().len()
        );
    });
    handle.spawn(run_connection_manager(
        transport,
        connection,
        input_tx.clone(),
    ));

    // The queue is empty, so this cannot be full
    let _ = input_tx.try_send(DashboardInput::User(UserAction::CreateSession {
        name: startup_session_name(),
    }));

    Pipeline {
        input_tx,
        event_rx,
        view_rx,
        _generator_stop: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_session_name() {
        let name = startup_session_name();
        assert!(name.starts_with("Session "));
        assert!(name.ends_with("AM") || name.ends_with("PM"));
    }

    #[tokio::test]
    async fn test_simulated_launch_creates_session() {
        let settings = Settings {
            simulate: true,
            ..Settings::default()
        };
        let mut pipeline = launch(&Handle::current(), &settings).unwrap();

        pipeline
            .view_rx
            .wait_for(|view| view.session.is_some())
            .await
            .unwrap();
        let view = pipeline.view_rx.borrow().clone();
        assert!(view.can_start);
        assert!(view.session.unwrap().name.starts_with("Session "));
    }

    #[tokio::test]
    async fn test_bad_origin_is_rejected() {
        let settings = Settings {
            server_origin: "ftp://capture.lan".into(),
            ..Settings::default()
        };
        // An env override would mask the configured origin
        if std::env::var(crate::settings::ORIGIN_ENV).is_ok() {
            return;
        }
        assert!(matches!(
            launch(&Handle::current(), &settings),
            Err(StartupError::Origin(_))
        ));
    }
}
