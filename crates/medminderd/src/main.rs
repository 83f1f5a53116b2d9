//! medminderd - The medminder background service
//!
//! This is the main entry point for the medminderd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Core engine
//! - Audio alerts (Linux)
//! - IPC server

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use medminder_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Response, ResponsePayload,
};
use medminder_config::load_config_or_default;
use medminder_core::{CoreEngine, CoreError, CoreEvent, EngineOptions};
use medminder_host_api::{
    AlertPlayer, AlertSound, AudioHandle, HostCapabilities, NoHaptics, VibrationPattern,
};
use medminder_host_linux::LinuxHost;
use medminder_ipc::{IpcServer, ServerMessage};
use medminder_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use medminder_util::{default_config_path, ClientId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// medminderd - Medication reminder service
#[derive(Parser, Debug)]
#[command(name = "medminderd")]
#[command(about = "Medication reminder service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/medminder/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set MEDMINDER_SOCKET env var)
    #[arg(short, long, env = "MEDMINDER_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set MEDMINDER_DATA_DIR env var)
    #[arg(short, long, env = "MEDMINDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// State shared by the event loop handlers
struct Shared {
    engine: Mutex<CoreEngine>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
    alerts: AlertPlayer,
    capabilities: HostCapabilities,
    haptics_enabled: bool,
}

/// Main service state
struct Service {
    shared: Arc<Shared>,
    poll_interval: Duration,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            seed_medicines = config.seed_medicines.len(),
            "Configuration loaded"
        );

        let mut settings = config.service;

        // Determine paths
        if let Some(socket) = &args.socket {
            settings.socket_path = socket.clone();
        }
        if let Some(data_dir) = &args.data_dir {
            settings.data_dir = data_dir.clone();
        }

        // Create data directory
        std::fs::create_dir_all(&settings.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", settings.data_dir))?;

        // Initialize store
        let db_path = settings.database_path();
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Initialize core engine
        let mut engine = CoreEngine::new(
            store.clone(),
            EngineOptions {
                sound_enabled: settings.sound_enabled,
                respect_date_range: settings.respect_date_range,
            },
        );
        engine.seed(config.seed_medicines, medminder_util::now().date_naive());

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted {
            medicine_count: engine.medicines().len(),
        }))?;

        // Probe the host once; the audio output itself is created on first alert
        let host = tokio::task::spawn_blocking(LinuxHost::probe)
            .await
            .context("Host probe failed")?;
        let capabilities = host.capabilities();
        if capabilities.can_play_audio() {
            info!(audio = ?capabilities.audio, "Audio alerts available");
        } else {
            warn!(audio = ?capabilities.audio, "No sound backend detected, alerts will be silent");
        }

        let audio = Arc::new(AudioHandle::new(host.audio_factory()));
        let alerts = AlertPlayer::new(audio, Arc::new(NoHaptics));

        // Initialize IPC server
        let mut ipc = IpcServer::new(&settings.socket_path);
        ipc.start().await?;

        info!(socket_path = %settings.socket_path.display(), "IPC server started");

        Ok(Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                ipc: Arc::new(ipc),
                store,
                alerts,
                capabilities,
                haptics_enabled: settings.haptics_enabled,
            }),
            poll_interval: settings.poll_interval,
        })
    }

    async fn run(self) -> Result<()> {
        let shared = self.shared;

        // Get channels
        let mut ipc_messages = shared
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        // Spawn IPC accept task
        let ipc_accept = shared.ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        // Main event loop. The first tick fires immediately, so doses already
        // due at startup are evaluated without waiting a full interval.
        let mut poll_timer = tokio::time::interval(self.poll_interval);

        info!(poll_interval = ?self.poll_interval, "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                // Poll timer - re-evaluate notifications
                _ = poll_timer.tick() => {
                    Self::evaluate(&shared, &medminder_util::now()).await;
                }

                // IPC messages
                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&shared, msg, &medminder_util::now()).await;
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down medminderd");

        shared.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        shared.alerts.audio().dispose();

        // Log shutdown
        if let Err(e) = shared
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        shared.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    /// Run the notification trigger and dispatch whatever it produced
    async fn evaluate(shared: &Shared, now: &DateTime<Local>) {
        let events = {
            let mut engine = shared.engine.lock().await;
            engine.tick(now)
        };

        for event in events {
            Self::handle_core_event(shared, event, now).await;
        }
    }

    async fn handle_core_event(shared: &Shared, event: CoreEvent, now: &DateTime<Local>) {
        match event {
            CoreEvent::NotificationTriggered { notification } => {
                if shared.haptics_enabled {
                    shared.alerts.vibrate(VibrationPattern::dose_due());
                }

                shared
                    .ipc
                    .broadcast_event(Event::new(EventPayload::NotificationTriggered {
                        notification_id: notification.id,
                        dose: notification.dose,
                    }));
            }

            CoreEvent::NotificationRetired {
                notification_id,
                reason,
            } => {
                shared
                    .ipc
                    .broadcast_event(Event::new(EventPayload::NotificationRetired {
                        notification_id,
                        reason,
                    }));
            }

            CoreEvent::AlertRequested { sound, replay } => {
                debug!(?sound, replay, "Playing alert");
                shared.alerts.play(sound);
            }

            CoreEvent::DayRolledOver { date } => {
                debug!(date = %date, "Broadcasting state for new day");
                let state = {
                    let engine = shared.engine.lock().await;
                    engine.get_state(now)
                };
                shared
                    .ipc
                    .broadcast_event(Event::new(EventPayload::StateChanged(state)));
            }
        }
    }

    async fn handle_ipc_message(shared: &Shared, msg: ServerMessage, now: &DateTime<Local>) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let mutation = request.command.is_mutation();

                let response = Self::handle_command(
                    shared,
                    &client_id,
                    request.request_id,
                    request.command,
                    now,
                )
                .await;

                let _ = shared.ipc.send_response(&client_id, response).await;

                // Anything that changes medicines, the log, dismissals or the
                // sound flag is reflected in notifications right away
                if mutation {
                    Self::evaluate(shared, now).await;
                }
            }

            ServerMessage::ClientConnected { client_id, info } => {
                info!(client_id = %client_id, uid = ?info.uid, "Client connected");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
            }
        }
    }

    async fn handle_command(
        shared: &Shared,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
        now: &DateTime<Local>,
    ) -> Response {
        match command {
            Command::GetState => {
                let state = shared.engine.lock().await.get_state(now);
                Response::success(request_id, ResponsePayload::State(state))
            }

            Command::ListMedicines => {
                let medicines = shared.engine.lock().await.medicines().to_vec();
                Response::success(request_id, ResponsePayload::Medicines { medicines })
            }

            Command::AddMedicine { medicine } => {
                let mut engine = shared.engine.lock().await;
                match engine.add_medicine(medicine, now) {
                    Ok(medicine) => {
                        shared
                            .ipc
                            .broadcast_event(Event::new(EventPayload::MedicinesChanged {
                                added: Some(medicine.id.clone()),
                                removed: None,
                                medicine_count: engine.medicines().len(),
                            }));
                        Response::success(request_id, ResponsePayload::MedicineAdded(medicine))
                    }
                    Err(e) => core_error_response(request_id, e),
                }
            }

            Command::DeleteMedicine { medicine_id } => {
                let mut engine = shared.engine.lock().await;
                match engine.delete_medicine(&medicine_id) {
                    Ok(_) => {
                        shared
                            .ipc
                            .broadcast_event(Event::new(EventPayload::MedicinesChanged {
                                added: None,
                                removed: Some(medicine_id.clone()),
                                medicine_count: engine.medicines().len(),
                            }));
                        Response::success(
                            request_id,
                            ResponsePayload::MedicineDeleted { medicine_id },
                        )
                    }
                    Err(e) => core_error_response(request_id, e),
                }
            }

            Command::UpcomingDoses { limit } => {
                let doses = shared.engine.lock().await.upcoming(now, limit);
                Response::success(request_id, ResponsePayload::Upcoming { doses })
            }

            Command::TodayDoses => {
                let doses = shared.engine.lock().await.today_doses(now);
                Response::success(request_id, ResponsePayload::Doses { doses })
            }

            Command::TakeDose { medicine_id, time } => {
                let result = {
                    let mut engine = shared.engine.lock().await;
                    engine
                        .record_taken(&medicine_id, time, now)
                        .map(|entry| (entry, engine.sound_enabled()))
                };
                match result {
                    Ok((entry, sound_enabled)) => {
                        Self::dose_taken_feedback(shared, &entry, sound_enabled);
                        Response::success(request_id, ResponsePayload::DoseTaken(entry))
                    }
                    Err(e) => core_error_response(request_id, e),
                }
            }

            Command::TakeFromNotification { notification_id } => {
                let result = {
                    let mut engine = shared.engine.lock().await;
                    engine
                        .take_from_notification(&notification_id, now)
                        .map(|entry| (entry, engine.sound_enabled()))
                };
                match result {
                    Ok((entry, sound_enabled)) => {
                        Self::dose_taken_feedback(shared, &entry, sound_enabled);
                        Response::success(request_id, ResponsePayload::DoseTaken(entry))
                    }
                    Err(e) => core_error_response(request_id, e),
                }
            }

            Command::DismissNotification { notification_id } => {
                match shared
                    .engine
                    .lock()
                    .await
                    .dismiss_notification(&notification_id, now)
                {
                    Ok(()) => {
                        Response::success(request_id, ResponsePayload::Dismissed { notification_id })
                    }
                    Err(e) => core_error_response(request_id, e),
                }
            }

            Command::ReplayAlert => {
                let event = shared.engine.lock().await.replay_alert();
                Self::handle_core_event(shared, event, now).await;
                Response::success(request_id, ResponsePayload::AlertReplayed)
            }

            Command::SetSoundEnabled { enabled } => {
                let changed = shared.engine.lock().await.set_sound_enabled(enabled);
                if changed {
                    shared
                        .ipc
                        .broadcast_event(Event::new(EventPayload::SoundSettingChanged { enabled }));
                }
                Response::success(request_id, ResponsePayload::SoundEnabled { enabled })
            }

            Command::LogForDate { date } => {
                let date = date.unwrap_or_else(|| now.date_naive());
                let entries = shared.engine.lock().await.log_for_date(date);
                Response::success(request_id, ResponsePayload::Log { entries })
            }

            Command::SubscribeEvents => {
                // Subscribers start from a full snapshot
                let state = shared.engine.lock().await.get_state(now);
                shared
                    .ipc
                    .broadcast_event(Event::new(EventPayload::StateChanged(state)));

                Response::success(
                    request_id,
                    ResponsePayload::Subscribed {
                        client_id: client_id.clone(),
                    },
                )
            }

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                let store_healthy = shared.engine.lock().await.store_healthy();
                let health = HealthStatus {
                    live: true,
                    ready: true,
                    store_healthy,
                    audio_available: shared.capabilities.can_play_audio(),
                };
                Response::success(request_id, ResponsePayload::Health(health))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }

    /// Broadcast a recorded dose and play the confirmation feedback
    fn dose_taken_feedback(
        shared: &Shared,
        entry: &medminder_api::LogEntry,
        sound_enabled: bool,
    ) {
        if sound_enabled {
            shared.alerts.play(AlertSound::Success);
        }
        if shared.haptics_enabled {
            shared.alerts.vibrate(VibrationPattern::dose_taken());
        }

        shared
            .ipc
            .broadcast_event(Event::new(EventPayload::DoseTaken {
                entry: entry.clone(),
            }));
    }
}

fn core_error_response(request_id: u64, error: CoreError) -> Response {
    let code: ErrorCode = error.code();
    Response::error(request_id, ErrorInfo::new(code, error.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = medminder_util::is_mock_time_active(),
        "medminderd starting"
    );

    // Create and run the service
    let service = Service::new(&args).await?;
    service.run().await
}
