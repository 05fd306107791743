//! Student Activity Center server
//!
//! Serves the REST API, runs migrations, and provides small ops commands.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sac_api::{ApiServer, ApiServerConfig};
use sac_db::entities::user;
use sac_mailer::{LogTransport, Mailer};

/// Student Activity Center platform server
#[derive(Parser, Debug)]
#[command(name = "sac-server")]
#[command(about = "Student Activity Center - registration, submissions, evaluations")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run migrations and serve the REST API
    #[command(long_about = r#"
Run pending migrations and start the API server.

EXAMPLES:
  # Serve against a local SQLite file
  sac-server serve --database-url "sqlite://sac.db?mode=rwc" \
    --jwt-secret $SAC_JWT_SECRET

  # Serve against PostgreSQL on all interfaces
  sac-server serve --database-url postgres://sac:secret@db/sac \
    --bind 0.0.0.0:8080 --jwt-secret $SAC_JWT_SECRET

ENVIRONMENT VARIABLES:
  SAC_DATABASE_URL        Database connection string
  SAC_BIND_ADDR           Address to bind (default 127.0.0.1:8080)
  SAC_JWT_SECRET          Token signing secret
  SAC_INSTITUTION_DOMAIN  Email domain for derived student addresses
  SAC_ADMISSION_YEARS     Accepted enrollment-year prefixes (comma-separated)
    "#)]
    Serve {
        /// Database connection string
        #[arg(long, env = "SAC_DATABASE_URL")]
        database_url: String,

        /// Address to bind the API server
        #[arg(long, env = "SAC_BIND_ADDR", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Token signing secret
        #[arg(long, env = "SAC_JWT_SECRET")]
        jwt_secret: String,

        /// Session token lifetime in minutes
        #[arg(long, env = "SAC_SESSION_TTL_MINUTES", default_value = "30")]
        session_ttl_minutes: i64,

        /// Email domain for derived student addresses
        #[arg(
            long,
            env = "SAC_INSTITUTION_DOMAIN",
            default_value = "university.edu"
        )]
        institution_domain: String,

        /// Accepted enrollment-year prefixes, comma-separated
        #[arg(long, env = "SAC_ADMISSION_YEARS", default_value = "22,23,24,25")]
        admission_years: String,

        /// Disable CORS (enabled by default for development)
        #[arg(long)]
        no_cors: bool,
    },

    /// Run pending migrations and exit
    Migrate {
        /// Database connection string
        #[arg(long, env = "SAC_DATABASE_URL")]
        database_url: String,
    },

    /// Create an admin account
    CreateAdmin {
        /// Database connection string
        #[arg(long, env = "SAC_DATABASE_URL")]
        database_url: String,

        /// Admin username
        #[arg(long)]
        username: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Admin email
        #[arg(long)]
        email: String,

        /// Initial password
        #[arg(long, env = "SAC_ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).init();

    info!(
        "sac-server {} ({} built {})",
        env!("GIT_TAG"),
        env!("GIT_HASH"),
        env!("BUILD_TIME")
    );

    match cli.command {
        Commands::Serve {
            database_url,
            bind,
            jwt_secret,
            session_ttl_minutes,
            institution_domain,
            admission_years,
            no_cors,
        } => {
            let db = sac_db::connect(&database_url)
                .await
                .context("failed to connect to the database")?;
            sac_db::migrate(&db).await.context("migrations failed")?;
            info!("database ready");

            let mailer = Mailer::start(db.clone(), Arc::new(LogTransport));

            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: !no_cors,
                jwt_secret,
                session_ttl_minutes,
                institution_domain,
                admission_year_prefixes: admission_years
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
            };

            let server = ApiServer::new(config, db, mailer);
            server.start().await?;
        }

        Commands::Migrate { database_url } => {
            let db = sac_db::connect(&database_url)
                .await
                .context("failed to connect to the database")?;
            sac_db::migrate(&db).await.context("migrations failed")?;
            info!("migrations applied");
        }

        Commands::CreateAdmin {
            database_url,
            username,
            name,
            email,
            password,
        } => {
            let db = sac_db::connect(&database_url)
                .await
                .context("failed to connect to the database")?;
            sac_db::migrate(&db).await.context("migrations failed")?;

            if user::Entity::find_by_id(username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                anyhow::bail!("account {} already exists", username);
            }

            let hash = sac_auth::hash_credential(&password)
                .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;

            user::ActiveModel {
                username: Set(username.clone()),
                role: Set(user::UserRole::Admin),
                name: Set(name),
                email: Set(email),
                password_hash: Set(hash),
                must_change_password: Set(false),
                is_active: Set(true),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            }
            .insert(&db)
            .await
            .context("failed to create admin account")?;

            info!("admin account {} created", username);
        }
    }

    Ok(())
}
