use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use coursegate::nav::{NavError, RouteTarget};
use coursegate::net::config::{
    API_BASE_VAR, API_TARGET_VAR, ApiConfig, CONNECT_TIMEOUT_VAR, ConfigError, REQUEST_TIMEOUT_VAR,
};
use coursegate::session::store::FileStore;
use coursegate::{ApiError, AppState, Role};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("[{code}] {0}", code = .0.error_code())]
    Api(#[from] ApiError),
    #[error(transparent)]
    Nav(#[from] NavError),
    #[error("not signed in; run `coursegate login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "coursegate", about = "Course platform session and access-control CLI")]
struct Cli {
    /// API root; relative roots are served from `--api-target`.
    /// Defaults to `COURSEGATE_API_BASE`, then `/api`.
    #[arg(long)]
    api_base: Option<String>,

    /// Defaults to `COURSEGATE_API_TARGET`, then `http://localhost:1010`.
    #[arg(long)]
    api_target: Option<String>,

    /// Defaults to `COURSEGATE_REQUEST_TIMEOUT_MS`, then 10000.
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    /// Defaults to `COURSEGATE_CONNECT_TIMEOUT_MS`, then 5000.
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Directory holding the persisted session.
    #[arg(long, env = "COURSEGATE_STORE_DIR", default_value = ".coursegate")]
    store_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login(CredentialArgs),
    /// Create an account. Does not sign in.
    Register(CredentialArgs),
    ResetPassword(ResetCommand),
    /// Forget the persisted session.
    Logout,
    /// Show the current session.
    Whoami,
    /// Resolve a page path for the current session.
    Navigate { path: String },
    /// List the route table.
    Routes,
    /// Authenticated GET against an API path.
    Get { path: String },
    /// Authenticated POST of a JSON body to an API path.
    Post {
        path: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "COURSEGATE_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    role: Role,
}

#[derive(Args, Debug)]
struct ResetCommand {
    #[command(subcommand)]
    command: ResetSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResetSubcommand {
    /// Change the password using the current one.
    Old {
        #[arg(long)]
        email: String,
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
    },
    /// Change the password using an emailed verification code.
    Code {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        role: Role,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ApiConfig::from_vars(|key| cli.api_var(key).or_else(|| std::env::var(key).ok()))?;
    let store = Arc::new(FileStore::in_dir(&cli.store_dir));
    let app = AppState::new(&config, store)?;

    run(&app, cli.command).await
}

async fn run(app: &AppState, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login(args) => {
            let session = app.auth.login(&args.email, &args.password, args.role).await?;
            println!("signed in as {} ({})", session.username, session.role);
            let home = app.router.navigate(session.role.home_path())?;
            println!("home: {}", home.path);
            Ok(())
        }
        Command::Register(args) => {
            app.auth.register(&args.email, &args.password, args.role).await?;
            println!("registered {}; sign in with `coursegate login`", args.email);
            Ok(())
        }
        Command::ResetPassword(reset) => run_reset(app, reset).await,
        Command::Logout => {
            app.auth.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let session = app.session.snapshot().ok_or(CliError::NotSignedIn)?;
            println!("{} <{}> {}", session.username, session.email, session.role);
            Ok(())
        }
        Command::Navigate { path } => {
            let nav = app.router.navigate(&path)?;
            if nav.redirected() {
                println!("{} -> {} ({})", nav.requested, nav.path, nav.route);
            } else {
                println!("{} ({})", nav.path, nav.route);
            }
            for (name, value) in &nav.params {
                println!("  {name} = {value}");
            }
            Ok(())
        }
        Command::Routes => {
            for route in app.router.table().routes() {
                println!("{:<48} {:<18} {}", route.pattern, route.name, describe_target(route.target));
            }
            Ok(())
        }
        Command::Get { path } => {
            let json: Value = app.http.get_json(&path).await?;
            print_json(&json)
        }
        Command::Post { path, data } => {
            let body = serde_json::from_str::<Value>(&data)?;
            let json: Value = app.http.post_json(&path, &body).await?;
            print_json(&json)
        }
    }
}

async fn run_reset(app: &AppState, reset: ResetCommand) -> Result<(), CliError> {
    match reset.command {
        ResetSubcommand::Old { email, old_password, new_password } => {
            app.auth.reset_password_by_old(&email, &old_password, &new_password).await?;
            println!("password changed");
            Ok(())
        }
        ResetSubcommand::Code { email, code, new_password, role } => {
            let ack = app.auth.reset_password_by_code(&email, &code, &new_password, role).await?;
            print_json(&ack)
        }
    }
}

impl Cli {
    /// Flag value standing in for an API environment variable.
    fn api_var(&self, key: &str) -> Option<String> {
        match key {
            API_BASE_VAR => self.api_base.clone(),
            API_TARGET_VAR => self.api_target.clone(),
            REQUEST_TIMEOUT_VAR => self.request_timeout_ms.map(|ms| ms.to_string()),
            CONNECT_TIMEOUT_VAR => self.connect_timeout_ms.map(|ms| ms.to_string()),
            _ => None,
        }
    }
}

fn describe_target(target: RouteTarget) -> String {
    match target {
        RouteTarget::Redirect(to) => format!("redirect {to}"),
        RouteTarget::Page(access) => match (access.requires_auth, access.role) {
            (_, Some(role)) => format!("{role} only"),
            (true, None) => "signed in".to_owned(),
            (false, None) => "public".to_owned(),
        },
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
