use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    settings::CONFIG_FILE_NAME, ClientSettings, FileSessionStore, GuestSessionController,
    HttpGuestApi, Page, SessionError, SessionState,
};
use tracing_subscriber::EnvFilter;

type Controller = GuestSessionController<FileSessionStore, HttpGuestApi>;

#[derive(Parser, Debug)]
#[command(about = "Answer a wedding invitation from the terminal")]
struct Cli {
    /// API root, e.g. http://127.0.0.1:5000/api
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    session_file: Option<PathBuf>,
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show whether a guest session is stored.
    Status,
    Login {
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        password: String,
    },
    /// Print the RSVP form as loaded from the server.
    Show,
    /// Edit the RSVP and send it. Omitted fields keep their current value.
    Submit {
        #[arg(long)]
        modification: Option<String>,
        #[arg(long)]
        food_requirements: Option<String>,
        #[arg(long)]
        accommodation: Option<bool>,
        #[arg(long)]
        passage: Option<bool>,
        #[arg(long)]
        confirmed: Option<bool>,
    },
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = ClientSettings::load(&cli.config, cli.api_url, cli.session_file);
    let api = HttpGuestApi::new(&settings.api_base_url)?;
    let store = FileSessionStore::new(&settings.session_file);
    let mut controller = GuestSessionController::new(store, api);

    let state = controller.determine_session_state().await;

    match cli.command {
        Command::Status => match controller.session() {
            Some(session) => println!(
                "signed in as {} (guest {})",
                session.user_name, session.guest_id
            ),
            None => println!("not signed in"),
        },
        Command::Login {
            user_name,
            password,
        } => {
            controller.login(&user_name, &password).await?;
            print_page(&controller);
        }
        Command::Show => {
            require_session(state, &controller)?;
            load_record(&mut controller).await?;
            print_page(&controller);
        }
        Command::Submit {
            modification,
            food_requirements,
            accommodation,
            passage,
            confirmed,
        } => {
            require_session(state, &controller)?;
            load_record(&mut controller).await?;

            let form = controller.rsvp_form_mut();
            if let Some(v) = modification {
                form.modification = v;
            }
            if let Some(v) = food_requirements {
                form.food_requirements = v;
            }
            if let Some(v) = accommodation {
                form.needs_accommodation = v;
            }
            if let Some(v) = passage {
                form.needs_passage = v;
            }
            if let Some(v) = confirmed {
                form.confirmed = v;
            }

            controller.submit_rsvp().await?;
            if controller.page().confirmation.open {
                println!("Thank you, your answer has been saved.");
                controller.close_confirmation();
            }
        }
        Command::Logout => {
            controller.logout()?;
            println!("signed out");
        }
    }

    Ok(())
}

fn require_session(state: SessionState, controller: &Controller) -> Result<()> {
    if state == SessionState::Authenticated {
        return Ok(());
    }
    match &controller.page().login.error {
        Some(error) => bail!("not signed in: {error}"),
        None => bail!("not signed in; run `rsvp login` first"),
    }
}

/// Spends the manual retries when the page-load fetch failed with a transient error.
async fn load_record(controller: &mut Controller) -> Result<()> {
    while controller.page().rsvp.invitees().is_none() {
        match controller.retry_fetch_guest_record().await {
            Ok(()) => break,
            Err(SessionError::Fetch(failure)) if !failure.is_unauthorized() => {
                eprintln!("guest record unavailable ({failure}), retrying");
            }
            Err(SessionError::RetryExhausted(limit)) => {
                bail!("guest record still unavailable after {limit} retries")
            }
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

fn print_page(controller: &Controller) {
    let page: &Page = controller.page();
    if page.login.visible {
        println!("not signed in");
        if let Some(error) = &page.login.error {
            println!("  error: {error}");
        }
        return;
    }

    let form = &page.rsvp;
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    if let Some(session) = controller.session() {
        println!("guest: {}", session.user_name);
    }
    match form.invitees() {
        Some(count) => println!("invitees: {count} (read-only)"),
        None => println!("invitees: unknown"),
    }
    println!("modification: {}", form.modification);
    println!("food requirements: {}", form.food_requirements);
    println!("{} needs accommodation", check(form.needs_accommodation));
    println!("{} needs passage", check(form.needs_passage));
    println!("{} attending", check(form.confirmed));
    if let Some(error) = &form.error {
        println!("error: {error}");
    }
}
