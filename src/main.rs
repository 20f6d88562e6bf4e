use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedSender;

mod app;
mod config;
mod form;
mod handler;
mod logging;
mod recommend;
mod state;
mod tui;
mod ui;

use app::App;
use config::{Config, ENDPOINT_ENV};
use form::{Field, FormState};
use logging::LogTarget;
use recommend::RecommendClient;
use state::ResultState;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "linkup")]
#[command(about = "Find who to meet: send your profile to a LinkUp service and get introductions")]
struct Cli {
    /// Recommendation service base URL (overrides LINKUP_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive form (default)
    Tui,
    /// Submit a profile once and print the recommendations
    Recommend {
        /// Your name
        #[arg(short, long)]
        name: Option<String>,
        /// Skills, comma separated
        #[arg(short, long)]
        skills: Option<String>,
        /// Goals, comma separated
        #[arg(short, long)]
        goals: Option<String>,
        /// Work experience, comma separated
        #[arg(short, long)]
        work_experience: Option<String>,
        /// Recent posts, comma separated
        #[arg(short, long)]
        posts: Option<String>,
    },
    /// List the profiles known to the service
    Profiles,
    /// Show or update the saved configuration
    Config {
        /// Endpoint to save as the default
        #[arg(long)]
        set_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    let log_result = match command {
        Commands::Tui => logging::init(LogTarget::File, "info"),
        _ => logging::init(LogTarget::Stderr, "warn"),
    };
    if let Err(e) = log_result {
        eprintln!("warning: logging disabled: {e}");
    }

    // A broken config file must not lock out `config --set-endpoint`
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config file");
        Config::default()
    });
    let env_endpoint = std::env::var(ENDPOINT_ENV).ok();
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref(), env_endpoint.as_deref());
    let client = RecommendClient::new(&endpoint, config.request_timeout())?;
    tracing::info!(%endpoint, "using recommendation service");

    match command {
        Commands::Tui => run_tui(client).await,
        Commands::Recommend {
            name,
            skills,
            goals,
            work_experience,
            posts,
        } => {
            let mut form = FormState::default();
            for (field, value) in [
                (Field::Name, name),
                (Field::Skills, skills),
                (Field::Goals, goals),
                (Field::WorkExperience, work_experience),
                (Field::Posts, posts),
            ] {
                if let Some(value) = value {
                    form.set(field, value);
                }
            }
            recommend_once(&client, &form).await
        }
        Commands::Profiles => list_profiles(&client).await,
        Commands::Config { set_endpoint } => show_config(&config, &endpoint, set_endpoint),
    }
}

async fn run_tui(client: RecommendClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();
    let mut app = App::new(client);

    let result = event_loop(&mut terminal, &mut events, &mut app, &tx).await;

    app.shutdown();
    tui::restore()?;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    events: &mut EventHandler,
    app: &mut App,
    tx: &UnboundedSender<AppEvent>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, tx),
            None => break,
        }
    }
    Ok(())
}

async fn recommend_once(client: &RecommendClient, form: &FormState) -> Result<()> {
    let missing = form.missing_required();
    if !missing.is_empty() {
        let names: Vec<String> = missing
            .iter()
            .map(|f| format!("--{}", flag_name(*f)))
            .collect();
        bail!("missing required field(s): {}", names.join(", "));
    }

    let result = ResultState::from_outcome(client.recommend(&form.to_request()).await);
    if let ResultState::Error(message) = &result {
        bail!("{}", message);
    }

    for line in ui::result_lines(&result) {
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        println!("{}", text);
    }
    Ok(())
}

fn flag_name(field: Field) -> &'static str {
    match field {
        Field::Name => "name",
        Field::Skills => "skills",
        Field::Goals => "goals",
        Field::WorkExperience => "work-experience",
        Field::Posts => "posts",
    }
}

async fn list_profiles(client: &RecommendClient) -> Result<()> {
    let profiles = client.list_profiles().await?;

    if profiles.is_empty() {
        println!("No profiles available at {}", client.base_url());
        return Ok(());
    }

    for profile in profiles {
        println!("{}. {}", profile.id, profile.name);
        if !profile.skills.is_empty() {
            println!("  skills: {}", profile.skills.join(", "));
        }
        if !profile.goals.is_empty() {
            println!("  goals:  {}", profile.goals.join(", "));
        }
        if !profile.work_experience.is_empty() {
            println!("  work:   {}", profile.work_experience.join(", "));
        }
        if let Some(post) = profile.posts.first() {
            println!("  latest post: {}", post);
        }
    }
    Ok(())
}

fn show_config(config: &Config, endpoint: &str, set_endpoint: Option<String>) -> Result<()> {
    if let Some(endpoint) = set_endpoint {
        Config::save_endpoint(&endpoint)?;
        println!("Saved endpoint: {}", endpoint);
        return Ok(());
    }

    println!("Config file: {}", Config::get_config_path()?.display());
    for line in config_summary(config, endpoint) {
        println!("{}", line);
    }
    if let Ok(path) = logging::log_path() {
        println!("Log file:    {}", path.display());
    }
    Ok(())
}

/// Settings as the client actually uses them, after flag and env overrides.
fn config_summary(config: &Config, endpoint: &str) -> Vec<String> {
    let timeout = match config.request_timeout_secs {
        Some(secs) => format!("{}s", secs),
        None => "none".to_string(),
    };
    vec![
        format!("Endpoint:    {}", endpoint),
        format!("Timeout:     {}", timeout),
    ]
}
