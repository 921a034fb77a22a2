use std::{error::Error, io::Write};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{ClassType, Engine, EngineError, MessageSource, MoneyCents};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "bilancio_admin")]
#[command(about = "Admin utilities for Bilancio (bootstrap users, periods, wallets)")]
struct Cli {
    /// Optional settings file path (TOML).
    #[arg(long)]
    config: Option<String>,

    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Period(Period),
    Wallet(Wallet),
    Report(Report),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    display_name: String,
}

#[derive(Args, Debug)]
struct Period {
    #[command(subcommand)]
    command: PeriodCommand,
}

#[derive(Subcommand, Debug)]
enum PeriodCommand {
    Open(PeriodOpenArgs),
    Close(PeriodCloseArgs),
    List,
}

#[derive(Args, Debug)]
struct PeriodOpenArgs {
    #[arg(long)]
    identification: String,
    #[arg(long)]
    starts_on: NaiveDate,
    #[arg(long)]
    ends_on: NaiveDate,
}

#[derive(Args, Debug)]
struct PeriodCloseArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create(WalletCreateArgs),
    Adjust(WalletAdjustArgs),
    List,
}

#[derive(Args, Debug)]
struct WalletCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Opening balance, for example `120.00` or `-10.50`.
    #[arg(long, default_value = "0.00")]
    opening_balance: MoneyCents,
}

#[derive(Args, Debug)]
struct WalletAdjustArgs {
    #[arg(long)]
    id: Uuid,
    /// The new balance the wallet should show.
    #[arg(long)]
    balance: MoneyCents,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    DailyUse(DailyUseArgs),
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct DailyUseArgs {
    #[arg(long)]
    period_id: Uuid,
    /// Direction to report, `in` or `out`.
    #[arg(long, value_parser = parse_direction)]
    direction: ClassType,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[arg(long)]
    period_id: Uuid,
}

fn parse_direction(raw: &str) -> Result<ClassType, String> {
    match raw {
        "in" | "revenues" => Ok(ClassType::In),
        "out" | "expenses" => Ok(ClassType::Out),
        other => Err(format!("unsupported direction: {other}")),
    }
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
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
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

/// Prints the violation text for an engine error and exits non-zero.
fn bail(messages: &MessageSource, err: &EngineError) -> ! {
    eprintln!("{}", messages.describe(err));
    std::process::exit(1);
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut settings = settings::load(cli.config.as_deref())?;
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bilancio_admin={level},engine={level}",
            level = settings.log
        ))
        .init();

    let messages = match settings.messages.as_deref() {
        Some(path) => MessageSource::from_file(path)?,
        None => MessageSource::default(),
    };

    let db = connect_db(&settings.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            match engine
                .create_user(&args.username, &args.display_name, &password)
                .await
            {
                Ok(user) => println!("created user: {}", user.username),
                Err(err) => bail(&messages, &err),
            }
        }
        Command::Period(Period {
            command: PeriodCommand::Open(args),
        }) => {
            match engine
                .open_financial_period(&args.identification, args.starts_on, args.ends_on)
                .await
            {
                Ok(period) => {
                    println!("opened financial period: {} ({})", period.identification, period.id)
                }
                Err(err) => bail(&messages, &err),
            }
        }
        Command::Period(Period {
            command: PeriodCommand::Close(args),
        }) => match engine.close_financial_period(args.id).await {
            Ok(period) => println!("closed financial period: {}", period.identification),
            Err(err) => bail(&messages, &err),
        },
        Command::Period(Period {
            command: PeriodCommand::List,
        }) => match engine.list_financial_periods(None).await {
            Ok(periods) => {
                for period in periods {
                    let state = if period.closed { "closed" } else { "open" };
                    println!(
                        "{}  {} .. {}  [{state}]  {}",
                        period.identification, period.starts_on, period.ends_on, period.id
                    );
                }
            }
            Err(err) => bail(&messages, &err),
        },
        Command::Wallet(Wallet {
            command: WalletCommand::Create(args),
        }) => {
            match engine
                .save_wallet(
                    &args.name,
                    args.description.as_deref(),
                    args.opening_balance.cents(),
                )
                .await
            {
                Ok(wallet) => println!("created wallet: {} ({})", wallet.name, wallet.id),
                Err(err) => bail(&messages, &err),
            }
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Adjust(args),
        }) => {
            match engine
                .adjust_wallet_balance(args.id, args.balance.cents(), args.reason.as_deref())
                .await
            {
                Ok(change) => println!(
                    "adjusted wallet balance: {} to {}",
                    MoneyCents::new(change.old_balance),
                    MoneyCents::new(change.new_balance)
                ),
                Err(err) => bail(&messages, &err),
            }
        }
        Command::Wallet(Wallet {
            command: WalletCommand::List,
        }) => match engine.list_wallets(None).await {
            Ok(wallets) => {
                for wallet in wallets {
                    let blocked = if wallet.blocked { "  (blocked)" } else { "" };
                    println!(
                        "{}  {}{blocked}  {}",
                        wallet.name,
                        MoneyCents::new(wallet.balance),
                        wallet.id
                    );
                }
            }
            Err(err) => bail(&messages, &err),
        },
        Command::Report(Report {
            command: ReportCommand::DailyUse(args),
        }) => match engine.daily_use(args.period_id, args.direction).await {
            Ok(usage) => {
                for day in usage {
                    println!("{}  {}", day.due_date, MoneyCents::new(day.total));
                }
            }
            Err(err) => bail(&messages, &err),
        },
        Command::Report(Report {
            command: ReportCommand::Summary(args),
        }) => match engine.period_summary(args.period_id).await {
            Ok(summary) => {
                println!("open movements: {}", summary.open_movements);
                println!("paid movements: {}", summary.paid_movements);
                println!("revenues:       {}", MoneyCents::new(summary.revenues));
                println!("expenses:       {}", MoneyCents::new(summary.expenses));
                println!("balance:        {}", MoneyCents::new(summary.balance()));
            }
            Err(err) => bail(&messages, &err),
        },
    }

    Ok(())
}
