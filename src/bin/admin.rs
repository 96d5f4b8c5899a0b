//! MyRatingIs admin CLI
//!
//! Operator commands that run directly against the database:
//!
//! ```text
//! mri-admin report <project-id>
//! mri-admin claim --user <user-id> --guest <guest-id>
//! mri-admin create-project --owner <user-id> --title "My app"
//! mri-admin token --user <user-id> [--email a@b.c] [--expires-in 3600]
//! ```
//!
//! Environment variables:
//!   MONGODB_URI - MongoDB connection URI (default: mongodb://localhost:27017)
//!   MONGODB_DB - database name (default: myratingis)
//!   JWT_SECRET - signing secret, `token` only

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use myratingis_api::auth::JwtValidator;
use myratingis_api::db::schemas::ProjectDoc;
use myratingis_api::db::{MongoClient, MongoStore};
use myratingis_api::services::{build_feedback_report, claim_guest_records};

#[derive(Parser, Debug)]
#[command(name = "mri-admin")]
#[command(about = "Operator tools for the MyRatingIs database")]
#[command(version)]
struct Cli {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "myratingis")]
    mongodb_db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the feedback report of a project as JSON
    Report { project_id: String },

    /// Move a guest's ratings and comments onto an account
    Claim {
        #[arg(long)]
        user: String,
        #[arg(long)]
        guest: String,
    },

    /// Create an empty project owned by a user
    CreateProject {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        title: String,
    },

    /// Mint an access token for local testing
    Token {
        #[arg(long)]
        user: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "3600")]
        expires_in: u64,
        #[arg(long, env = "JWT_SECRET")]
        jwt_secret: String,
        #[arg(long, env = "JWT_AUDIENCE", default_value = "authenticated")]
        jwt_audience: String,
    },
}

async fn open_store(cli: &Cli) -> anyhow::Result<MongoStore> {
    let client = MongoClient::new(&cli.mongodb_uri, &cli.mongodb_db)
        .await
        .with_context(|| format!("connecting to {}", cli.mongodb_uri))?;
    Ok(MongoStore::new(&client).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Report { project_id } => {
            let store = open_store(&cli).await?;
            let stats = build_feedback_report(&store, project_id).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Claim { user, guest } => {
            let store = open_store(&cli).await?;
            let outcome = claim_guest_records(&store, user, guest).await?;
            println!(
                "merged {} (reassigned {}, discarded {}, failed {}), comments moved {}",
                outcome.merged_count(),
                outcome.reassigned,
                outcome.discarded,
                outcome.failed,
                outcome.comments
            );
        }
        Command::CreateProject { owner, title } => {
            let store = open_store(&cli).await?;
            let id = uuid::Uuid::new_v4().to_string();
            store.insert_project(&ProjectDoc::new(&id, owner, title)).await?;
            println!("{}", id);
        }
        Command::Token {
            user,
            email,
            expires_in,
            jwt_secret,
            jwt_audience,
        } => {
            let jwt = JwtValidator::new(jwt_secret.clone(), jwt_audience.clone())?;
            println!("{}", jwt.generate_token(user, email.clone(), *expires_in)?);
        }
    }

    Ok(())
}
