use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use coachBooker::config::BookingSettings;
use coachBooker::error::BookingError;
use coachBooker::events::queue::ModalEvent;
use coachBooker::models::session::{Counterpart, default_session_name};
use coachBooker::models::time_window::{TimeOfDay, TimeWindow, time_options};
use coachBooker::service::backend_service::{BackendService, BookingBackend};
use coachBooker::service::booking_flow::BookingModal;
use inquire::{Confirm, MultiSelect, Select, Text};
use tokio::sync::mpsc;
use tracing::warn;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "coach-booker", about = "Book coaching sessions with friends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List friends who are free for a window
    Available {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        start: TimeOfDay,
        #[arg(long)]
        end: TimeOfDay,
    },
    /// Book a session without prompting
    Book {
        #[arg(long)]
        coach_id: String,
        #[arg(long)]
        coach_name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        start: TimeOfDay,
        #[arg(long)]
        end: TimeOfDay,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_delimiter = ',')]
        invite: Vec<String>,
    },
    /// Book a session interactively
    BookPrompt {
        #[arg(long)]
        coach_id: String,
        #[arg(long)]
        coach_name: String,
    },
    /// Print the selectable start and end times
    Slots,
}

pub async fn cli(settings: BookingSettings) -> ExitCode {
    // Fine to exit here on bad arguments
    let cli = Cli::parse();
    let backend: Arc<dyn BookingBackend> = match BackendService::from_settings(&settings) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            eprintln!("Failed to set up backend client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Available { date, start, end } => {
            list_available(&settings, backend.as_ref(), TimeWindow::new(date, start, end)).await
        }
        Commands::Book {
            coach_id,
            coach_name,
            date,
            start,
            end,
            name,
            invite,
        } => {
            let coach = Counterpart {
                id: coach_id,
                name: coach_name,
            };
            book(&settings, backend, coach, TimeWindow::new(date, start, end), name, invite).await
        }
        Commands::BookPrompt {
            coach_id,
            coach_name,
        } => {
            let coach = Counterpart {
                id: coach_id,
                name: coach_name,
            };
            book_from_prompt(&settings, backend, coach).await
        }
        Commands::Slots => {
            for slot in time_options() {
                println!("{}", slot);
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn list_available(
    settings: &BookingSettings,
    backend: &dyn BookingBackend,
    window: TimeWindow,
) -> CliResult {
    window.validate(settings.today(), settings.min_session_minutes)?;
    let resolved = window.resolve_for_session(settings.timezone, settings.min_session_minutes)?;
    let actor_id = settings.actor_id.as_deref().ok_or(BookingError::NotSignedIn)?;
    let friends = backend.available_collaborators(actor_id, &resolved).await?;
    if friends.is_empty() {
        println!("No friends are free between {} and {} on {}", window.start, window.end, window.date);
    }
    for friend in friends {
        println!("{}\t{}", friend.id, friend.name);
    }
    Ok(())
}

async fn book(
    settings: &BookingSettings,
    backend: Arc<dyn BookingBackend>,
    coach: Counterpart,
    window: TimeWindow,
    name: Option<String>,
    invite: Vec<String>,
) -> CliResult {
    let (mut modal, mut events) = BookingModal::open(settings, coach, backend).await;
    modal.set_date(window.date).await;
    modal.set_start(window.start).await;
    modal.set_end(window.end).await;
    if let Some(err) = modal.validation_error() {
        return Err(err.into());
    }

    let snapshot = modal.wait_for_availability().await;
    if let Some(err) = snapshot.error {
        println!("{}", err);
    }
    for friend_id in invite.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !modal.toggle_collaborator(friend_id).await {
            warn!(friend_id, "friend is not free for this window, not inviting");
            println!("{} is not free for this window and was not invited", friend_id);
        }
    }
    if let Some(name) = name {
        modal.set_display_name(&name);
    }

    submit_and_report(&mut modal, &mut events).await
}

async fn book_from_prompt(
    settings: &BookingSettings,
    backend: Arc<dyn BookingBackend>,
    coach: Counterpart,
) -> CliResult {
    let coach_name = coach.name.clone();
    let (mut modal, mut events) = BookingModal::open(settings, coach, backend).await;

    let today = settings.today().to_string();
    let date: NaiveDate = Text::new("Session date (YYYY-MM-DD):")
        .with_default(&today)
        .prompt()?
        .trim()
        .parse()?;
    modal.set_date(date).await;

    let options = time_options();
    let window = modal.selector().window();
    let start = Select::new("Start time:", options.clone())
        .with_starting_cursor(options.iter().position(|t| *t == window.start).unwrap_or(0))
        .prompt()?;
    modal.set_start(start).await;
    let end = Select::new("End time:", options.clone())
        .with_starting_cursor(options.iter().position(|t| *t == window.end).unwrap_or(0))
        .prompt()?;
    modal.set_end(end).await;

    if let Some(err) = modal.validation_error() {
        modal.close().await;
        return Err(err.into());
    }

    println!("Checking which friends are free...");
    let snapshot = modal.wait_for_availability().await;
    if let Some(err) = &snapshot.error {
        println!("{}", err);
    }
    if snapshot.collaborators.is_empty() {
        println!("No friends are free for this window.");
    } else {
        let chosen = MultiSelect::new("Invite friends:", snapshot.collaborators.clone()).prompt()?;
        for friend in chosen {
            modal.toggle_collaborator(&friend.id).await;
        }
    }

    let name = Text::new("Session name:")
        .with_default(&default_session_name(&coach_name))
        .prompt()?;
    modal.set_display_name(&name);

    if !Confirm::new("Book this session?").with_default(true).prompt()? {
        modal.close().await;
        println!("Booking cancelled.");
        return Ok(());
    }

    submit_and_report(&mut modal, &mut events).await
}

async fn submit_and_report(
    modal: &mut BookingModal,
    events: &mut mpsc::Receiver<ModalEvent>,
) -> CliResult {
    match modal.submit().await {
        Ok(created) => {
            if !matches!(events.try_recv(), Ok(ModalEvent::Closed { booked: true, .. })) {
                warn!("booking finished without a close signal");
            }
            match created.id {
                Some(id) => println!("Session booked ({}).", id),
                None => println!("Session booked."),
            }
            Ok(())
        }
        Err(err) => Err(err.user_message().into()),
    }
}
