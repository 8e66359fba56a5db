use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_client::api::{fetch_positions, JobApplication};
use interview_client::draft_store::DraftSlot;
use interview_client::endpoint::Channel;
use interview_client::router::Navigation;
use interview_client::upload::{stage_resume, submit_pending_resume};
use interview_client::{Config, Session};

#[derive(Parser)]
#[command(author, version, about = "AI interview client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Stage a résumé file locally, replacing any staged one
    Save { path: PathBuf },
    /// Show the staged résumé, optionally writing its bytes to `out`
    Load { out: Option<PathBuf> },
    /// Drop the staged résumé
    Clear,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the bearer token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the token and the staged résumé
    Logout,
    /// List open positions and their interviewers
    Positions,
    /// List past interview records
    Records,
    /// Print the WebSocket URL for a channel (interview | video)
    WsUrl { channel: Channel },
    #[command(subcommand)]
    /// Manage the staged résumé
    Draft(DraftCommands),
    /// Upload the staged résumé with the job details
    Submit {
        #[arg(long)]
        job_name: String,
        #[arg(long, default_value = "")]
        job_desc: String,
        #[arg(long, default_value = "")]
        company_name: String,
        #[arg(long, default_value = "")]
        company_desc: String,
        #[arg(long, default_value = "")]
        resume_text: String,
    },
    /// Resolve a route through the navigation guard
    Navigate { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("interview_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Interview client v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut session = Session::open(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            match session.login(&username, &password).await? {
                Navigation::Arrived(route) => println!("logged in; now at {}", route.full_path),
                Navigation::NotFound(path) => println!("logged in; no route for {path}"),
            }
        }

        Commands::Logout => {
            session.logout().await?;
            println!("logged out");
        }

        Commands::Positions => {
            for position in fetch_positions(session.api()).await? {
                println!("#{:<4} {}", position.id, position.position_name);
                for interviewer in &position.interviewers {
                    println!(
                        "      - #{:<4} {} {}",
                        interviewer.id,
                        interviewer.name,
                        interviewer.title.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::Records => {
            for record in session.api().records().await? {
                println!(
                    "#{:<4} {} position={} interviewer={}",
                    record.id,
                    record.time,
                    record.position_name.as_deref().unwrap_or("?"),
                    record.interviewer_name.as_deref().unwrap_or("?")
                );
            }
        }

        Commands::WsUrl { channel } => {
            println!("{}", session.endpoints().resolve(channel)?);
        }

        Commands::Draft(draft_cmd) => match draft_cmd {
            DraftCommands::Save { path } => {
                let artifact = stage_resume(session.drafts(), &path).await?;
                println!("staged {} ({} bytes)", artifact.file_name, artifact.data.len());
            }
            DraftCommands::Load { out } => match session.drafts().load().await? {
                Some(artifact) => {
                    println!(
                        "{} ({}, {} bytes, saved {})",
                        artifact.file_name,
                        artifact.media_type,
                        artifact.data.len(),
                        artifact.saved_at
                    );
                    if let Some(out) = out {
                        tokio::fs::write(&out, &artifact.data)
                            .await
                            .with_context(|| format!("Failed to write {}", out.display()))?;
                    }
                }
                None => println!("no staged résumé"),
            },
            DraftCommands::Clear => {
                session.drafts().clear().await?;
                println!("cleared");
            }
        },

        Commands::Submit {
            job_name,
            job_desc,
            company_name,
            company_desc,
            resume_text,
        } => {
            let job = JobApplication {
                job_name,
                job_desc,
                company_name,
                company_desc,
                resume_text,
            };
            let receipt = submit_pending_resume(session.api(), session.drafts(), &job).await?;
            println!(
                "{} ({})",
                receipt.message.as_deref().unwrap_or("submitted"),
                receipt.status.as_deref().unwrap_or("unknown")
            );
        }

        Commands::Navigate { path } => match session.navigator().navigate(&path) {
            Navigation::Arrived(route) => println!("{}", route.full_path),
            Navigation::NotFound(path) => println!("no route for {path}"),
        },
    }

    Ok(())
}
