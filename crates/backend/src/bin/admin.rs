// =============================================================================
// Somoco Backend - Admin Tool
// =============================================================================
// Credential helpers and CMS maintenance:
// - hash-password / generate-password print `.env` lines. The base64 form
//   survives shells and dotenv loaders that expand `$`.
// - rotate-password writes a new hash to the CMS credential document.
// - migrate-keys adds missing `_key` values to stored vehicles.
// =============================================================================

use std::io::{self, BufRead};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Parser, Subcommand};
use somoco_backend::auth::{generate_password, hash_password, GENERATED_PASSWORD_LEN};
use somoco_backend::cms::{self, DocumentStore};
use somoco_backend::config::CmsConfig;
use somoco_backend::maintenance;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "somoco-admin")]
#[command(about = "Somoco EV admin credential and CMS maintenance tool")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a password (read from --password, $ADMIN_PASSWORD or stdin)
    HashPassword {
        #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Generate a random password and its hash
    GeneratePassword {
        #[arg(short, long, default_value_t = GENERATED_PASSWORD_LEN)]
        length: usize,
    },
    /// Replace the admin password stored in the CMS
    RotatePassword {
        /// Use this password instead of generating one
        #[arg(short, long)]
        password: Option<String>,
        /// Print the new credentials without writing them
        #[arg(long, visible_alias = "print-only")]
        dry_run: bool,
        /// Print the plaintext password
        #[arg(long)]
        show_plain: bool,
    },
    /// Add missing `_key` values to every vehicle's parameters and images
    MigrateKeys {
        /// Report the vehicles that need keys without patching them
        #[arg(long)]
        dry_run: bool,
    },
}

fn print_env_lines(hash: &str) {
    println!("ADMIN_PASSWORD_HASH='{hash}'");
    println!("ADMIN_PASSWORD_HASH_B64={}", STANDARD.encode(hash.as_bytes()));
}

fn open_store() -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("crates/backend/.env");
    }
    let config = CmsConfig::from_env()?;
    Ok(cms::store_from_config(&config)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::HashPassword { password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    let mut line = String::new();
                    io::stdin().lock().read_line(&mut line)?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            if password.is_empty() {
                return Err("password must not be empty".into());
            }
            print_env_lines(&hash_password(&password)?);
        }
        Command::GeneratePassword { length } => {
            if length < 8 {
                return Err("length must be at least 8".into());
            }
            let password = generate_password(length);
            println!("# password: {password}");
            print_env_lines(&hash_password(&password)?);
        }
        Command::RotatePassword {
            password,
            dry_run,
            show_plain,
        } => {
            let password = password
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| generate_password(GENERATED_PASSWORD_LEN));
            let store = open_store()?;
            let credentials = maintenance::rotate_password(store.as_ref(), &password, dry_run).await?;

            if dry_run {
                println!("--- DRY RUN (no changes written) ---");
            } else {
                println!("Admin password rotated successfully.");
            }
            if show_plain {
                println!("New password: {password}");
            } else {
                println!("New password: (hidden) use --show-plain to reveal");
            }
            if let Some(hash) = credentials.password_hash.as_deref() {
                print_env_lines(hash);
            }
        }
        Command::MigrateKeys { dry_run } => {
            let store = open_store()?;
            let report = maintenance::migrate_keys(store.as_ref(), dry_run).await?;
            let verb = if dry_run { "Would update" } else { "Updated" };
            println!(
                "Migration complete! {verb} {} of {} vehicles.",
                report.updated.len(),
                report.checked
            );
        }
    }

    Ok(())
}
