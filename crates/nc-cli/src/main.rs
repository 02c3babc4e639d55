//! `ncops` administration tool
//!
//! Applies migrations and manages accounts out of band. Provisioned accounts
//! have no password until the owner completes first login.

use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use nc_audit::AuditService;
use nc_core::config::AppConfig;
use nc_core::types::Role;
use nc_db::{Database, DatabaseConfig, Stores, UserFilter};
use nc_models::{NewUser, User};
use nc_notifications::{DisabledEmailSender, Notifier};
use nc_services::{ServiceContext, UserService};

#[derive(Debug, Parser)]
#[command(name = "ncops")]
#[command(about = "Administration tool for NC Ops")]
#[command(version)]
struct Cli {
    /// Database connection URL, overrides the configured one
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Create an account in first-login state
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// nc or management
        #[arg(long, default_value = "management")]
        role: Role,
    },

    /// Disable an account; its sessions stop working at the next request
    Deactivate {
        #[arg(long)]
        email: String,
    },

    /// List accounts
    List {
        #[arg(long)]
        role: Option<Role>,

        /// Include deactivated accounts
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let db_config = match cli.database_url {
        Some(url) => DatabaseConfig::with_url(url),
        None => DatabaseConfig::from(&config),
    };
    let db = Database::connect(&db_config)
        .await
        .context("failed to connect to database")?;

    let result = match cli.command {
        Commands::Migrate => {
            db.migrate().await.context("migration failed")?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::User(command) => {
            let users = user_service(&db, Arc::new(config));
            run_user_command(&users, command).await
        }
    };

    db.close().await;
    result
}

fn user_service(db: &Database, config: Arc<AppConfig>) -> UserService {
    let stores = Stores::postgres(db);
    let audit = Arc::new(AuditService::new(stores.audit.clone()));
    let notifier = Notifier::new(Arc::new(DisabledEmailSender), &config.email, audit.clone());
    UserService::new(ServiceContext::new(stores, audit, notifier, config))
}

async fn run_user_command(users: &UserService, command: UserCommand) -> anyhow::Result<()> {
    match command {
        UserCommand::Add { email, name, role } => {
            let user = users.provision(NewUser { email, name, role }).await?;
            println!(
                "Created {} ({}) as {}; password is set at first login",
                user.email, user.name, user.role
            );
        }
        UserCommand::Deactivate { email } => {
            let user = users.deactivate(&email).await?;
            println!("Deactivated {}", user.email);
        }
        UserCommand::List { role, all } => {
            let filter = UserFilter {
                role,
                active: if all { None } else { Some(true) },
            };
            let list = users.all(&filter).await?;
            if list.is_empty() {
                println!("No users");
            }
            for user in &list {
                println!("{}", format_user(user));
            }
        }
    }
    Ok(())
}

fn format_user(user: &User) -> String {
    let state = if !user.active {
        "inactive"
    } else if user.must_set_password {
        "pending first login"
    } else {
        "active"
    };
    format!(
        "{:>5}  {:<10}  {:<32}  {}  [{}]",
        user.id.unwrap_or_default(),
        user.role.as_str(),
        user.email,
        user.name,
        state
    )
}
