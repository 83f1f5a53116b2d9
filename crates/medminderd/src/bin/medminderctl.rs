//! medminderctl - command-line client for medminderd
//!
//! Sends one command over the service socket and prints the response as
//! JSON. `watch` subscribes and prints events until interrupted.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medminder_api::{Command, Frequency, NewMedicine, ResponseResult};
use medminder_ipc::IpcClient;
use medminder_util::{default_socket_path, MedicineId, NotificationId, TimeOfDay};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "medminderctl", version, about = "Control a running medminderd")]
struct Cli {
    /// Socket path (or set MEDMINDER_SOCKET env var)
    #[arg(short, long, env = "MEDMINDER_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the full service state
    State,
    /// List registered medicines
    List,
    /// Register a medicine
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        dosage: String,
        /// once_daily, twice_daily, three_times_daily, four_times_daily or as_needed
        #[arg(long)]
        frequency: Frequency,
        /// Daily slot time as HH:MM; repeat once per slot
        #[arg(long = "time")]
        times: Vec<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a medicine
    Delete { medicine_id: String },
    /// Doses still ahead today
    Upcoming {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Every dose scheduled today with its status
    Today,
    /// Mark a dose as taken
    Take {
        medicine_id: String,
        /// Scheduled slot, HH:MM
        time: TimeOfDay,
    },
    /// Take the dose behind a notification (e.g. "<medicine-id>-08:00")
    TakeNotification { notification_id: NotificationId },
    /// Dismiss the current instance of a notification
    Dismiss { notification_id: NotificationId },
    /// Play the alarm again
    Replay,
    /// Turn automatic alert sounds on or off
    Sound {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Adherence log for a date (default: today)
    Log {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Service health
    Health,
    /// Check that the service answers
    Ping,
    /// Print events as they happen
    Watch,
}

impl Action {
    fn into_command(self) -> Command {
        match self {
            Action::State => Command::GetState,
            Action::List => Command::ListMedicines,
            Action::Add {
                name,
                dosage,
                frequency,
                times,
                start_date,
                end_date,
                notes,
                color,
            } => Command::AddMedicine {
                medicine: NewMedicine {
                    name,
                    dosage,
                    frequency,
                    times,
                    start_date,
                    end_date,
                    notes,
                    color,
                },
            },
            Action::Delete { medicine_id } => Command::DeleteMedicine {
                medicine_id: MedicineId::new(medicine_id),
            },
            Action::Upcoming { limit } => Command::UpcomingDoses { limit },
            Action::Today => Command::TodayDoses,
            Action::Take { medicine_id, time } => Command::TakeDose {
                medicine_id: MedicineId::new(medicine_id),
                time,
            },
            Action::TakeNotification { notification_id } => {
                Command::TakeFromNotification { notification_id }
            }
            Action::Dismiss { notification_id } => {
                Command::DismissNotification { notification_id }
            }
            Action::Replay => Command::ReplayAlert,
            Action::Sound { enabled } => Command::SetSoundEnabled { enabled },
            Action::Log { date } => Command::LogForDate { date },
            Action::Health => Command::GetHealth,
            Action::Ping => Command::Ping,
            Action::Watch => Command::SubscribeEvents,
        }
    }
}

async fn watch(client: IpcClient) -> Result<()> {
    let mut events = client.subscribe().await.context("Failed to subscribe")?;
    loop {
        let event = events.next().await?;
        println!("{}", serde_json::to_string(&event)?);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut client = IpcClient::connect(&cli.socket)
        .await
        .with_context(|| format!("Failed to connect to medminderd at {:?}", cli.socket))?;

    if matches!(cli.command, Action::Watch) {
        return watch(client).await;
    }

    let response = client.send(cli.command.into_command()).await?;
    match response.result {
        ResponseResult::Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        ResponseResult::Err(e) => bail!("{:?}: {}", e.code, e.message),
    }
}
