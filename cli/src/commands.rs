//! Command execution against a wired [`VisitDesk`].
//!
//! SYSTEM CONTEXT
//! ==============
//! Every command except `login`, `logout` and the offline route views first
//! restores the stored session the way the browser does at page load.
//! Results go to stdout as pretty JSON; notices go to stderr through the
//! terminal notifier.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use visitdesk::VisitDesk;
use visitdesk::api::{Credentials, ListQuery, Resource};
use visitdesk::net::{Blob, Envelope};
use visitdesk::routes::guard::GuardOutcome;
use visitdesk::routes::{Crumb, MenuItem};

use crate::adapters::TerminalNavigator;
use crate::{
    AnalyticsSubcommand, CliError, Command, CustomersSubcommand, DepartmentsSubcommand, ExportArgs, ListArgs,
    RecordSubcommand, RoutesSubcommand, SchoolsSubcommand, UsersSubcommand, VisitsSubcommand,
};

pub async fn run(desk: &VisitDesk, navigator: &TerminalNavigator, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password, remember } => {
            let credentials = Credentials { remember_me: remember, ..Credentials::new(username, password) };
            let profile = desk.session().login(&credentials).await?;
            print_json(&profile)
        }
        Command::Logout => {
            desk.session().init();
            desk.session().logout().await;
            Ok(())
        }
        Command::Whoami => {
            require_session(desk).await?;
            let session = desk.session().snapshot();
            print_json(&session.user())
        }
        Command::Customers(cmd) => {
            require_session(desk).await?;
            let customers = desk.customers();
            match cmd.command {
                CustomersSubcommand::Record(record) => run_record(&customers.resource(), "customers", record).await,
                CustomersSubcommand::Search { keyword, page, size } => {
                    print_envelope(customers.search(&keyword, page, size).await?)
                }
            }
        }
        Command::Visits(cmd) => {
            require_session(desk).await?;
            let visits = desk.visits();
            match cmd.command {
                VisitsSubcommand::Record(record) => run_record(&visits.resource(), "visits", record).await,
                VisitsSubcommand::ByCustomer { customer_id } => print_envelope(visits.by_customer(customer_id).await?),
            }
        }
        Command::Schools(cmd) => {
            require_session(desk).await?;
            let schools = desk.schools();
            match cmd.command {
                SchoolsSubcommand::Record(record) => run_record(&schools.resource(), "schools", record).await,
                SchoolsSubcommand::Tree => print_envelope(schools.tree().await?),
                SchoolsSubcommand::Departments { school_id } => print_envelope(schools.departments(school_id).await?),
            }
        }
        Command::Departments(cmd) => {
            require_session(desk).await?;
            let departments = desk.departments();
            match cmd.command {
                DepartmentsSubcommand::Create { data } => print_envelope(departments.create(&parse_body(&data)?).await?),
                DepartmentsSubcommand::Update { id, data } => {
                    print_envelope(departments.update(id, &parse_body(&data)?).await?)
                }
                DepartmentsSubcommand::Delete { id } => print_envelope(departments.delete(id).await?),
            }
        }
        Command::Users(cmd) => {
            require_session(desk).await?;
            let users = desk.users();
            match cmd.command {
                // Users strip blank passwords on update; route that one through them.
                UsersSubcommand::Record(RecordSubcommand::Update { id, data }) => {
                    print_envelope(users.update(id, &parse_body(&data)?).await?)
                }
                UsersSubcommand::Record(record) => run_record(&users.resource(), "users", record).await,
                UsersSubcommand::Status { id, status } => print_envelope(users.set_status(id, status).await?),
                UsersSubcommand::ResetPassword { id, password } => {
                    print_envelope(users.reset_password(id, &password).await?)
                }
                UsersSubcommand::ByRole { role } => print_envelope(users.by_role(&role).await?),
            }
        }
        Command::Analytics(cmd) => {
            require_session(desk).await?;
            let analytics = desk.analytics();
            match cmd.command {
                AnalyticsSubcommand::Overview(args) => print_envelope(analytics.overview(&build_query(args)?).await?),
                AnalyticsSubcommand::Statistics(args) => {
                    print_envelope(analytics.statistics(&build_query(args)?).await?)
                }
                AnalyticsSubcommand::Export(args) => {
                    let out = args.out.clone();
                    let blob = analytics.export(&build_query(args.list)?).await?;
                    save_blob(&blob, out, "analysis")
                }
            }
        }
        Command::Routes(cmd) => run_routes(desk, navigator, cmd.command).await,
    }
}

async fn run_record(resource: &Resource<'_>, noun: &str, command: RecordSubcommand) -> Result<(), CliError> {
    match command {
        RecordSubcommand::List(args) => print_envelope(resource.list(&build_query(args)?).await?),
        RecordSubcommand::Get { id } => print_envelope(resource.get(id).await?),
        RecordSubcommand::Create { data } => print_envelope(resource.create(&parse_body(&data)?).await?),
        RecordSubcommand::Update { id, data } => print_envelope(resource.update(id, &parse_body(&data)?).await?),
        RecordSubcommand::Delete { id } => print_envelope(resource.delete(id).await?),
        RecordSubcommand::BatchDelete { ids } => print_envelope(resource.batch_delete(&ids).await?),
        RecordSubcommand::Export(ExportArgs { list, out }) => {
            let blob = resource.export(&build_query(list)?).await?;
            save_blob(&blob, out, noun)
        }
    }
}

async fn run_routes(desk: &VisitDesk, navigator: &TerminalNavigator, command: RoutesSubcommand) -> Result<(), CliError> {
    match command {
        RoutesSubcommand::Menu { role } => {
            print!("{}", render_menu(&desk.routes().menu_for_role(role.as_deref())));
            Ok(())
        }
        RoutesSubcommand::Breadcrumb { path } => {
            println!("{}", render_breadcrumb(&desk.routes().breadcrumb(&path)));
            Ok(())
        }
        RoutesSubcommand::Check { path } => {
            desk.start().await;
            let outcome = desk.navigate(&path).await;
            println!("{}", describe_outcome(&outcome));
            tracing::debug!(location = ?navigator.location(), "guard settled");
            Ok(())
        }
    }
}

async fn require_session(desk: &VisitDesk) -> Result<(), CliError> {
    desk.start().await;
    if desk.session().is_authenticated() { Ok(()) } else { Err(CliError::NotSignedIn) }
}

// =============================================================================
// INPUT
// =============================================================================

fn build_query(args: ListArgs) -> Result<ListQuery, CliError> {
    let mut query = ListQuery { page: args.page, size: args.size, ..ListQuery::default() };
    if let Some(keyword) = args.keyword.as_deref() {
        query = query.keyword(keyword);
    }
    for raw in &args.filters {
        let (key, value) = parse_filter(raw)?;
        query = query.filter(key, value);
    }
    Ok(query)
}

/// `key=value`; the value is taken as JSON when it parses, else as text.
fn parse_filter(raw: &str) -> Result<(&str, Value), CliError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CliError::InvalidFilter(raw.to_owned()));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidFilter(raw.to_owned()));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key, value))
}

fn parse_body(data: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(data)?)
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn print_envelope<T: Serialize>(envelope: Envelope<T>) -> Result<(), CliError> {
    if let Some(message) = envelope.message.as_deref().filter(|m| !m.is_empty()) {
        tracing::debug!(code = envelope.code, %message, "reply");
    }
    print_json(&envelope.data)
}

fn save_blob(blob: &Blob, out: Option<PathBuf>, noun: &str) -> Result<(), CliError> {
    let path = export_path(out, blob.filename.as_deref(), noun);
    fs::write(&path, &blob.bytes)
        .map_err(|source| CliError::Write { path: path.display().to_string(), source })?;
    eprintln!("wrote {} bytes to {}", blob.bytes.len(), path.display());
    Ok(())
}

/// Explicit `--out`, else the server's filename (without directories), else
/// `<noun>-export.xlsx`.
fn export_path(out: Option<PathBuf>, server_name: Option<&str>, noun: &str) -> PathBuf {
    if let Some(out) = out {
        return out;
    }
    server_name
        .and_then(|name| Path::new(name).file_name())
        .map_or_else(|| PathBuf::from(format!("{noun}-export.xlsx")), PathBuf::from)
}

fn render_menu(items: &[MenuItem]) -> String {
    let mut out = String::new();
    render_menu_into(&mut out, items, 0);
    out
}

fn render_menu_into(out: &mut String, items: &[MenuItem], depth: usize) {
    for item in items {
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{indent}{}  {}", item.title, item.path);
        render_menu_into(out, &item.children, depth + 1);
    }
}

fn render_breadcrumb(crumbs: &[Crumb]) -> String {
    crumbs.iter().map(|crumb| crumb.title.as_str()).collect::<Vec<_>>().join(" > ")
}

fn describe_outcome(outcome: &GuardOutcome) -> String {
    match outcome {
        GuardOutcome::Proceed { path, title } => format!("proceed {path} ({title})"),
        GuardOutcome::Redirect { to, notice: Some(notice) } => format!("redirect {to}: {notice}"),
        GuardOutcome::Redirect { to, notice: None } => format!("redirect {to}"),
    }
}
