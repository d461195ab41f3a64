use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, LedgerSource, NewProfile, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "recycle_admin")]
#[command(about = "Admin utilities for the recycling rewards service")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./recycle.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Points(Points),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a profile. Prompts for the password unless `--no-password`.
    Create(UserCreateArgs),
    /// List profiles, newest first.
    List(UserListArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    CentreStaff,
    Recycler,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Role::Admin,
            RoleArg::CentreStaff => Role::CentreStaff,
            RoleArg::Recycler => Role::Recycler,
        }
    }
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    /// Display name. For centre staff this is the centre name.
    #[arg(long)]
    name: Option<String>,
    #[arg(long, value_enum, default_value = "recycler")]
    role: RoleArg,
    /// Create a profile that cannot log in.
    #[arg(long)]
    no_password: bool,
}

#[derive(Args, Debug)]
struct UserListArgs {
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
}

#[derive(Args, Debug)]
struct Points {
    #[command(subcommand)]
    command: PointsCommand,
}

#[derive(Subcommand, Debug)]
enum PointsCommand {
    /// Append a manual ledger entry.
    Adjust(PointsAdjustArgs),
    /// Print the balance and ledger of a profile.
    Show(PointsShowArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Recycling,
    Adjustment,
}

impl From<SourceArg> for LedgerSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Recycling => LedgerSource::Recycling,
            SourceArg::Adjustment => LedgerSource::Adjustment,
        }
    }
}

#[derive(Args, Debug)]
struct PointsAdjustArgs {
    /// Profile id or member code.
    #[arg(long)]
    user: String,
    /// Signed number of points, e.g. `50` or `-20`.
    #[arg(long, allow_hyphen_values = true)]
    change: i64,
    #[arg(long, value_enum, default_value = "recycling")]
    source: SourceArg,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Args, Debug)]
struct PointsShowArgs {
    /// Profile id or member code.
    #[arg(long)]
    user: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.chars().count() < MIN_PASSWORD_LEN {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print(format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters.\r\n"
                ))
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Accept either a profile id or a member code.
async fn resolve_profile_id(
    engine: &Engine,
    user: &str,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    match engine.profile(user).await {
        Ok(profile) => Ok(profile.id),
        Err(engine::EngineError::KeyNotFound(_)) => Ok(engine.lookup_recycler(user).await?.id),
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = if args.no_password {
                None
            } else {
                Some(prompt_password_twice()?)
            };

            let profile = match engine
                .create_profile(NewProfile {
                    email: args.email.clone(),
                    password,
                    full_name: args.name,
                    role: args.role.into(),
                })
                .await
            {
                Ok(profile) => profile,
                Err(engine::EngineError::ExistingKey(_)) => {
                    eprintln!("profile already exists: {}", args.email);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!(
                "created {}: {} (id {}, member code {})",
                profile.role.as_str(),
                profile.email,
                profile.id,
                profile.public_id
            );
        }
        Command::User(User {
            command: UserCommand::List(args),
        }) => {
            for profile in engine.list_profiles(args.role.map(Role::from)).await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    profile.id,
                    profile.public_id,
                    profile.role.as_str(),
                    profile.email,
                    profile.full_name.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Points(Points {
            command: PointsCommand::Adjust(args),
        }) => {
            let user_id = resolve_profile_id(&engine, &args.user).await?;
            let entry = engine
                .adjust_points(
                    &user_id,
                    args.change,
                    args.source.into(),
                    args.reason.as_deref(),
                )
                .await?;
            let balance = engine.balance(&user_id).await?;
            println!(
                "recorded {:+} ({}) for {user_id}; balance is now {balance}",
                entry.change,
                entry.source.as_str()
            );
        }
        Command::Points(Points {
            command: PointsCommand::Show(args),
        }) => {
            let user_id = resolve_profile_id(&engine, &args.user).await?;
            let entries = engine.ledger(&user_id).await?;
            println!("balance: {}", engine::balance_of(&entries));
            for entry in entries {
                println!(
                    "{}\t{:+}\t{}\t{}",
                    entry.created_at.to_rfc3339(),
                    entry.change,
                    entry.source.as_str(),
                    entry.reason.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
