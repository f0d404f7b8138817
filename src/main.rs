//! teamanalyzer-cli
//!
//! Command-line front end over the client runtime. Every invocation is its
//! own session: pass `--email`/`--password` to log in first, otherwise the
//! calls run as a guest.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use teamanalyzer_client::api::CreateSurveyRequest;
use teamanalyzer_client::config::{load_config, ClientConfig};
use teamanalyzer_client::observability::init_logging;
use teamanalyzer_client::ApiClient;

#[derive(Parser)]
#[command(name = "teamanalyzer-cli")]
#[command(about = "Command-line client for the team analyzer API", long_about = None)]
struct Cli {
    /// TOML config file; defaults plus API_BASE otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Log in with these credentials before running the command.
    #[arg(long, requires = "password")]
    email: Option<String>,

    #[arg(long, requires = "email")]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the current user
    Login,
    /// Show the current user (guest if not logged in)
    Me,
    /// Survey operations
    #[command(subcommand)]
    Survey(SurveyCommand),
    /// Team operations
    #[command(subcommand)]
    Teams(TeamsCommand),
    /// List my open survey tokens
    Tokens,
}

#[derive(Subcommand)]
enum SurveyCommand {
    /// Fetch a survey by id
    Get { id: String },
    /// Aggregated results of a survey
    Results { id: String },
    /// Create a survey for a team (exactly five questions)
    Create {
        #[arg(long)]
        team_id: String,
        #[arg(long)]
        title: String,
        #[arg(long = "question", num_args = 5, required = true)]
        questions: Vec<String>,
    },
    /// Issue anonymous invite tokens
    Tokens {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Download link for the results export
    DownloadLink { id: String },
}

#[derive(Subcommand)]
enum TeamsCommand {
    /// Teams I belong to
    Mine {
        /// Include teams I do not lead
        #[arg(long)]
        all: bool,
    },
    /// All teams (admin)
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(url) = &cli.url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.observability.log_level)?;

    let client = ApiClient::builder(config).build()?;

    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        client.login(email, password).await?;
    }

    match cli.command {
        Commands::Login => {
            if cli.email.is_none() {
                return Err("login requires --email and --password".into());
            }
            print_json(&client.me().await?)?;
        }
        Commands::Me => match client.me_anonymous_ok().await? {
            Some(me) => print_json(&me)?,
            None => println!("guest"),
        },
        Commands::Survey(command) => match command {
            SurveyCommand::Get { id } => match client.get_survey(&id).await? {
                Some(survey) => print_json(&survey)?,
                None => println!("survey requires a signed-in user"),
            },
            SurveyCommand::Results { id } => print_json(&client.get_survey_results(&id).await?)?,
            SurveyCommand::Create { team_id, title, questions } => {
                let request = CreateSurveyRequest {
                    team_id,
                    title,
                    questions,
                };
                print_json(&client.create_survey(&request).await?)?;
            }
            SurveyCommand::Tokens { id, count } => print_json(&client.issue_survey_tokens(&id, count).await?)?,
            SurveyCommand::DownloadLink { id } => println!("{}", client.get_results_download_link(&id).await?),
        },
        Commands::Teams(command) => match command {
            TeamsCommand::Mine { all } => print_json(&client.my_teams(!all).await?)?,
            TeamsCommand::List => print_json(&client.list_teams_admin().await?)?,
        },
        Commands::Tokens => print_json(&client.list_my_open_tokens().await?)?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
