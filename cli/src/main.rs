use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use visitdesk::app::Adapters;
use visitdesk::config::ConfigError;
use visitdesk::routes::RouteError;
use visitdesk::{ApiError, ClientConfig, VisitDesk};

mod adapters;
mod commands;

use adapters::{FileStore, ReqwestTransport, TerminalNavigator, TerminalNotifier};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("route table rejected: {0}")]
    Routes(#[from] RouteError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid filter `{0}`; expected key=value")]
    InvalidFilter(String),
    #[error("not signed in; run `visitdesk login` first")]
    NotSignedIn,
    #[error("could not write {path}: {source}")]
    Write { path: String, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "visitdesk", about = "Customer visit management terminal client")]
struct Cli {
    /// Origin prepended to a relative API base path.
    #[arg(long, env = "VISITDESK_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// API base path or URL; overrides the configured default.
    #[arg(long, env = "VISITDESK_BASE_URL")]
    base_url: Option<String>,

    /// JSON file holding the credential and cached profile between runs.
    #[arg(long, env = "VISITDESK_STATE_FILE", default_value = ".visitdesk/state.json")]
    state_file: PathBuf,

    /// Answer yes to confirmation prompts.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long, env = "VISITDESK_USERNAME")]
        username: String,
        #[arg(long, env = "VISITDESK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = false)]
        remember: bool,
    },
    Logout,
    Whoami,
    Customers(CustomersCommand),
    Visits(VisitsCommand),
    Schools(SchoolsCommand),
    Departments(DepartmentsCommand),
    Users(UsersCommand),
    Analytics(AnalyticsCommand),
    Routes(RoutesCommand),
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    size: Option<u32>,
    #[arg(long)]
    keyword: Option<String>,
    /// Extra query parameter as key=value; repeatable.
    #[arg(long = "filter")]
    filters: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    list: ListArgs,
    /// Output file; defaults to the server-provided filename.
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Operations every record resource supports.
#[derive(Subcommand, Debug)]
enum RecordSubcommand {
    List(ListArgs),
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
    BatchDelete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct CustomersCommand {
    #[command(subcommand)]
    command: CustomersSubcommand,
}

#[derive(Subcommand, Debug)]
enum CustomersSubcommand {
    #[command(flatten)]
    Record(RecordSubcommand),
    Search {
        keyword: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
    },
}

#[derive(Args, Debug)]
struct VisitsCommand {
    #[command(subcommand)]
    command: VisitsSubcommand,
}

#[derive(Subcommand, Debug)]
enum VisitsSubcommand {
    #[command(flatten)]
    Record(RecordSubcommand),
    ByCustomer {
        customer_id: i64,
    },
}

#[derive(Args, Debug)]
struct SchoolsCommand {
    #[command(subcommand)]
    command: SchoolsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SchoolsSubcommand {
    #[command(flatten)]
    Record(RecordSubcommand),
    Tree,
    Departments {
        school_id: i64,
    },
}

#[derive(Args, Debug)]
struct DepartmentsCommand {
    #[command(subcommand)]
    command: DepartmentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DepartmentsSubcommand {
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    #[command(flatten)]
    Record(RecordSubcommand),
    Status {
        id: i64,
        status: i64,
    },
    ResetPassword {
        id: i64,
        #[arg(long, env = "VISITDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    ByRole {
        role: String,
    },
}

#[derive(Args, Debug)]
struct AnalyticsCommand {
    #[command(subcommand)]
    command: AnalyticsSubcommand,
}

#[derive(Subcommand, Debug)]
enum AnalyticsSubcommand {
    Overview(ListArgs),
    Statistics(ListArgs),
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct RoutesCommand {
    #[command(subcommand)]
    command: RoutesSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoutesSubcommand {
    /// Print the navigation menu, optionally filtered by role.
    Menu {
        #[arg(long)]
        role: Option<String>,
    },
    Breadcrumb {
        path: String,
    },
    /// Run the navigation guard for `path` against the stored session.
    Check {
        path: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.server, cli.base_url.as_deref())?;
    let navigator = Rc::new(TerminalNavigator::default());
    let adapters = Adapters {
        transport: Rc::new(ReqwestTransport::new(reqwest::Client::builder().build()?)),
        storage: Rc::new(FileStore::new(&cli.state_file)),
        notifier: Rc::new(TerminalNotifier::new(cli.yes)),
        navigator: navigator.clone(),
    };
    let desk = VisitDesk::new(config, adapters)?;

    commands::run(&desk, &navigator, cli.command).await
}

fn load_config(server: &str, base_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = base_url {
        base_url.clone_into(&mut config.base_url);
    }
    config.base_url = absolute_base(server, &config.base_url);
    Ok(config)
}

/// A relative base path (`/api`) is resolved against `server`; absolute
/// URLs are used as given.
fn absolute_base(server: &str, base_url: &str) -> String {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        return base_url.to_owned();
    }
    let server = server.trim_end_matches('/');
    let path = base_url.trim_start_matches('/');
    if path.is_empty() { server.to_owned() } else { format!("{server}/{path}") }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
