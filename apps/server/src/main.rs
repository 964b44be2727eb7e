use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tutorhub_config::{load as load_config, AppConfig};
use tutorhub_gateway::{create_router, GatewayState};
use tutorhub_runtime::{telemetry, BackendServices};

mod commands;

#[derive(Parser)]
#[command(name = "tutorhub-server")]
#[command(about = "TutorHub backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a course
    CreateCourse {
        /// Course id used in URLs, e.g. `algebra-1`
        id: String,
        /// Display name
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a course together with its files
    DeleteCourse { id: String },
    /// Make an existing account an active admin
    PromoteAdmin { email: String },
    /// Print users, courses and waitlist entries
    DumpData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::CreateCourse {
            id,
            name,
            description,
        } => {
            let services = connect(&config).await?;
            let course = commands::create_course(&services, &id, &name, &description).await?;
            println!("Created course {} ({})", course.id, course.name);
            Ok(())
        }
        Commands::DeleteCourse { id } => {
            let services = connect(&config).await?;
            commands::delete_course(&services, &id).await?;
            println!("Deleted course {id}");
            Ok(())
        }
        Commands::PromoteAdmin { email } => {
            let services = connect(&config).await?;
            let user = commands::promote_admin(&services, &email).await?;
            println!("{} ({}) is now an admin", user.email, user.public_id);
            Ok(())
        }
        Commands::DumpData => {
            let services = connect(&config).await?;
            commands::dump_data(&services, &mut std::io::stdout().lock()).await
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("starting TutorHub backend");

    let address = format!("{}:{}", config.http.address, config.http.port);
    let services = connect(&config).await?;
    let state = GatewayState::new(services, config);
    let app = create_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(tutorhub_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}
