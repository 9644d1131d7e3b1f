use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use solidify::services::admin::AdminResource;
use solidify::stores::auth::Registration;
use solidify::stores::carbon::CarbonStore;
use solidify::types::{CarbonEntryInput, GoalInput, SustainabilityLevel};
use solidify::{ActionResult, ApiError, ClientConfig, FileStore, MemoryStore, Solidify, TokenStore};
use tracing_subscriber::EnvFilter;

/// How often `chat watch` prints from the store; the poller itself runs on
/// the configured message interval.
const WATCH_PRINT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Action(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("could not read {path}: {source}")]
    ReadData { path: String, source: std::io::Error },
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Parser, Debug)]
#[command(name = "solidify", about = "Solidify carbon-tracking API CLI")]
struct Cli {
    /// Overrides `SOLIDIFY_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SOLIDIFY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SOLIDIFY_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        confirm: Option<String>,
        #[arg(long)]
        organization: Option<String>,
    },
    Logout,
    Me,
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        /// Defaults to `--new`.
        #[arg(long)]
        confirm: Option<String>,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: Option<String>,
    },
    Carbon(CarbonCommand),
    News(NewsCommand),
    Knowledge(KnowledgeCommand),
    Library(LibraryCommand),
    Orgs(OrgsCommand),
    Chat(ChatCommand),
    Courses(CoursesCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct CarbonCommand {
    #[command(subcommand)]
    command: CarbonSubcommand,
}

#[derive(Args, Debug)]
struct EntryArgs {
    #[arg(long = "type")]
    entry_type: String,
    #[arg(long)]
    quantity: f64,
    /// Defaults to the built-in unit for known types.
    #[arg(long)]
    unit: Option<String>,
    /// ISO date, e.g. 2026-03-01.
    #[arg(long)]
    date: String,
    #[arg(long)]
    description: Option<String>,
}

impl EntryArgs {
    fn into_input(self) -> CarbonEntryInput {
        let unit = self.unit.unwrap_or_else(|| {
            CarbonStore::preview(&self.entry_type, 0.0)
                .entry_type
                .map_or_else(String::new, |t| t.unit().to_owned())
        });
        CarbonEntryInput {
            entry_type: self.entry_type,
            quantity: self.quantity,
            unit,
            date: self.date,
            description: self.description,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CarbonSubcommand {
    List {
        /// Also print totals computed from the built-in factors.
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    Add(EntryArgs),
    Update {
        id: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    Delete {
        id: String,
    },
    Dashboard,
    Roadmap,
    Goals,
    AddGoal {
        #[arg(long)]
        title: String,
        #[arg(long)]
        target_percent: f64,
        #[arg(long)]
        baseline_year: u32,
        #[arg(long)]
        target_year: u32,
    },
    Factors,
    /// Local estimate only; nothing is sent.
    Estimate {
        #[arg(long = "type")]
        entry_type: String,
        #[arg(long)]
        quantity: f64,
    },
}

#[derive(Args, Debug)]
struct NewsCommand {
    #[command(subcommand)]
    command: NewsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NewsSubcommand {
    List,
    Show { id: String },
}

#[derive(Args, Debug)]
struct KnowledgeCommand {
    #[command(subcommand)]
    command: KnowledgeSubcommand,
}

#[derive(Subcommand, Debug)]
enum KnowledgeSubcommand {
    List,
    Show { id: String },
    Search { query: String },
}

#[derive(Args, Debug)]
struct LibraryCommand {
    #[command(subcommand)]
    command: LibrarySubcommand,
}

#[derive(Subcommand, Debug)]
enum LibrarySubcommand {
    List {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        level: Option<u8>,
    },
}

#[derive(Args, Debug)]
struct OrgsCommand {
    #[command(subcommand)]
    command: OrgsSubcommand,
}

#[derive(Subcommand, Debug)]
enum OrgsSubcommand {
    List {
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        level: Option<u8>,
    },
    Show {
        id: String,
    },
    Users {
        id: String,
    },
    Connect {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    Conversations,
    Start {
        #[arg(required = true)]
        participants: Vec<String>,
        #[arg(long)]
        name: Option<String>,
    },
    Messages {
        conversation_id: String,
    },
    Send {
        conversation_id: String,
        content: String,
    },
    /// Print new messages as they arrive until interrupted.
    Watch {
        conversation_id: String,
    },
}

#[derive(Args, Debug)]
struct CoursesCommand {
    #[command(subcommand)]
    command: CoursesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CoursesSubcommand {
    List,
    Show { id: String },
    Progress { id: String },
    Complete { id: String, module_id: String },
    Leaderboard,
}

#[derive(Args, Debug)]
struct AdminCommand {
    /// courses, library, news, knowledge or organizations.
    resource: AdminResource,

    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    List,
    Create {
        /// JSON object, or `@path` to read it from a file.
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url);
    }
    let storage: Arc<dyn TokenStore> = match &config.session_file {
        Some(path) => Arc::new(FileStore::new(path)),
        None => {
            tracing::warn!("no home directory; session will not persist");
            Arc::new(MemoryStore::new())
        }
    };
    let app = Solidify::new(&config, storage)?;

    match cli.command {
        Command::Login { email, password } => {
            ensure(app.auth.login(&email, &password).await)?;
            let state = app.auth.snapshot().await;
            let name = state.user.map_or_else(|| email.clone(), |u| u.name);
            println!("logged in as {name}");
            Ok(())
        }
        Command::Register { name, email, password, confirm, organization } => {
            let form = Registration {
                name,
                email,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
                organization_name: organization,
            };
            print_message(ensure(app.auth.register(&form).await)?, "registered");
            Ok(())
        }
        Command::Logout => {
            ensure(app.auth.logout().await)?;
            println!("logged out");
            Ok(())
        }
        Command::Me => {
            ensure(app.auth.load_user().await)?;
            print_json(&app.auth.snapshot().await.user)
        }
        Command::ChangePassword { current, new, confirm } => {
            let confirm = confirm.unwrap_or_else(|| new.clone());
            print_message(ensure(app.auth.change_password(&current, &new, &confirm).await)?, "password changed");
            Ok(())
        }
        Command::ForgotPassword { email } => {
            print_message(ensure(app.auth.forgot_password(&email).await)?, "reset email requested");
            Ok(())
        }
        Command::ResetPassword { token, new, confirm } => {
            let confirm = confirm.unwrap_or_else(|| new.clone());
            print_message(ensure(app.auth.reset_password(&token, &new, &confirm).await)?, "password reset");
            Ok(())
        }
        Command::Carbon(carbon) => run_carbon(&app, carbon).await,
        Command::News(news) => run_news(&app, news).await,
        Command::Knowledge(knowledge) => run_knowledge(&app, knowledge).await,
        Command::Library(library) => run_library(&app, library).await,
        Command::Orgs(orgs) => run_orgs(&app, orgs).await,
        Command::Chat(chat) => run_chat(&app, chat).await,
        Command::Courses(courses) => run_courses(&app, courses).await,
        Command::Admin(admin) => run_admin(&app, admin).await,
    }
}

async fn run_carbon(app: &Solidify, carbon: CarbonCommand) -> Result<(), CliError> {
    let store = &app.carbon;
    match carbon.command {
        CarbonSubcommand::List { summary } => {
            ensure(store.load_entries().await)?;
            print_json(&store.snapshot().await.entries.data)?;
            if summary {
                print_json(&store.local_summary().await)?;
            }
            Ok(())
        }
        CarbonSubcommand::Add(entry) => {
            print_message(ensure(store.add_entry(&entry.into_input()).await)?, "entry added");
            Ok(())
        }
        CarbonSubcommand::Update { id, entry } => {
            print_message(ensure(store.update_entry(&id, &entry.into_input()).await)?, "entry updated");
            Ok(())
        }
        CarbonSubcommand::Delete { id } => {
            print_message(ensure(store.delete_entry(&id).await)?, "entry deleted");
            Ok(())
        }
        CarbonSubcommand::Dashboard => {
            ensure(store.load_dashboard().await)?;
            print_json(&store.snapshot().await.dashboard.data)
        }
        CarbonSubcommand::Roadmap => {
            ensure(store.load_roadmap().await)?;
            print_json(&store.snapshot().await.roadmap.data)
        }
        CarbonSubcommand::Goals => {
            ensure(store.load_goals().await)?;
            print_json(&store.snapshot().await.goals.data)
        }
        CarbonSubcommand::AddGoal { title, target_percent, baseline_year, target_year } => {
            let input = GoalInput { title, target_reduction_percent: target_percent, baseline_year, target_year };
            print_message(ensure(store.add_goal(&input).await)?, "goal created");
            Ok(())
        }
        CarbonSubcommand::Factors => {
            ensure(store.load_factors().await)?;
            print_json(&store.snapshot().await.factors.data)
        }
        CarbonSubcommand::Estimate { entry_type, quantity } => {
            let estimate = CarbonStore::preview(&entry_type, quantity);
            if estimate.factor.is_none() {
                return Err(CliError::NotFound(format!("no built-in factor for {entry_type}")));
            }
            print_json(&estimate)
        }
    }
}

async fn run_news(app: &Solidify, news: NewsCommand) -> Result<(), CliError> {
    match news.command {
        NewsSubcommand::List => {
            ensure(app.news.load_articles().await)?;
            print_json(&app.news.snapshot().await.articles.data)
        }
        NewsSubcommand::Show { id } => {
            ensure(app.news.open(&id).await)?;
            print_json(&app.news.snapshot().await.selected.data)
        }
    }
}

async fn run_knowledge(app: &Solidify, knowledge: KnowledgeCommand) -> Result<(), CliError> {
    let store = &app.knowledge;
    match knowledge.command {
        KnowledgeSubcommand::List => {
            ensure(store.load_articles().await)?;
            print_json(&store.snapshot().await.articles.data)
        }
        KnowledgeSubcommand::Show { id } => {
            ensure(store.open(&id).await)?;
            print_json(&store.snapshot().await.selected.data)
        }
        KnowledgeSubcommand::Search { query } => {
            ensure(store.search(&query).await)?;
            print_json(&store.snapshot().await.articles.data)
        }
    }
}

async fn run_library(app: &Solidify, library: LibraryCommand) -> Result<(), CliError> {
    match library.command {
        LibrarySubcommand::List { level } => {
            ensure(app.library.load_resources().await)?;
            let state = app.library.snapshot().await;
            match level {
                Some(tier) => print_json(&state.for_level(SustainabilityLevel::from_tier(i64::from(tier)))),
                None => print_json(&state.resources.data),
            }
        }
    }
}

async fn run_orgs(app: &Solidify, orgs: OrgsCommand) -> Result<(), CliError> {
    let store = &app.organizations;
    match orgs.command {
        OrgsSubcommand::List { filter, level } => {
            ensure(store.load_organizations().await)?;
            let state = store.snapshot().await;
            let level = level.map(|tier| SustainabilityLevel::from_tier(i64::from(tier)));
            print_json(&state.filter(&filter, level))
        }
        OrgsSubcommand::Show { id } => {
            ensure(store.open(&id).await)?;
            print_json(&store.snapshot().await.selected.data)
        }
        OrgsSubcommand::Users { id } => {
            ensure(store.load_members(&id).await)?;
            print_json(&store.snapshot().await.members.data)
        }
        OrgsSubcommand::Connect { id } => {
            let message = ensure(store.connect(&id).await)?;
            print_message(message, "connected");
            if let Some(conversation) = store.snapshot().await.connection {
                println!("conversation: {}", conversation.id);
            }
            Ok(())
        }
    }
}

async fn run_chat(app: &Solidify, chat: ChatCommand) -> Result<(), CliError> {
    let store = &app.chat;
    match chat.command {
        ChatSubcommand::Conversations => {
            ensure(store.load_conversations().await)?;
            let state = store.snapshot().await;
            let me = app.http.storage().user().map(|u| u.id);
            for conversation in &state.conversations.data {
                let unread = if conversation.unread_count > 0 {
                    format!(" ({} unread)", conversation.unread_count)
                } else {
                    String::new()
                };
                println!("{}  {}{unread}", conversation.id, conversation.display_name(me.as_deref()));
            }
            Ok(())
        }
        ChatSubcommand::Start { participants, name } => {
            ensure(store.start_conversation(&participants, name.as_deref()).await)?;
            if let Some(id) = store.snapshot().await.active {
                println!("conversation: {id}");
            }
            Ok(())
        }
        ChatSubcommand::Messages { conversation_id } => {
            ensure(store.open(&conversation_id).await)?;
            print_json(&store.snapshot().await.messages.data)
        }
        ChatSubcommand::Send { conversation_id, content } => {
            ensure(store.open(&conversation_id).await)?;
            ensure(store.send(&content).await)?;
            println!("sent");
            Ok(())
        }
        ChatSubcommand::Watch { conversation_id } => watch_chat(app, &conversation_id).await,
    }
}

async fn watch_chat(app: &Solidify, conversation_id: &str) -> Result<(), CliError> {
    let store = &app.chat;
    ensure(store.open(conversation_id).await)?;

    let mut seen = HashSet::new();
    let _poller = store.poll_messages();
    tick_until(tokio::signal::ctrl_c(), WATCH_PRINT_INTERVAL, async || {
        let state = store.snapshot().await;
        for message in state.messages.data {
            if seen.insert(message.id.clone()) {
                let sender = message.sender_name.unwrap_or(message.sender_id);
                println!("[{}] {sender}: {}", message.created_at, message.content);
            }
        }
        if let Some(error) = state.messages.error {
            tracing::warn!(%error, "message refresh failed");
        }
    })
    .await;
    Ok(())
}

/// Run `tick` every `period` until `shutdown` resolves.
///
/// `shutdown` is created once and polled across iterations, so a signal that
/// arrives while `tick` is running ends the loop as soon as it returns.
async fn tick_until<S: Future>(shutdown: S, period: Duration, mut tick: impl AsyncFnMut()) {
    let mut ticker = tokio::time::interval(period);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return,
            _ = ticker.tick() => tick().await,
        }
    }
}

async fn run_courses(app: &Solidify, courses: CoursesCommand) -> Result<(), CliError> {
    let store = &app.courses;
    match courses.command {
        CoursesSubcommand::List => {
            ensure(store.load_courses().await)?;
            print_json(&store.snapshot().await.courses.data)
        }
        CoursesSubcommand::Show { id } => {
            ensure(store.open(&id).await)?;
            print_json(&store.snapshot().await.selected.data)
        }
        CoursesSubcommand::Progress { id } => {
            ensure(store.load_progress(&id).await)?;
            print_json(&store.snapshot().await.progress.get(&id))
        }
        CoursesSubcommand::Complete { id, module_id } => {
            print_message(ensure(store.complete_module(&id, &module_id).await)?, "module completed");
            Ok(())
        }
        CoursesSubcommand::Leaderboard => {
            ensure(store.load_leaderboard().await)?;
            print_json(&store.snapshot().await.leaderboard.data)
        }
    }
}

async fn run_admin(app: &Solidify, admin: AdminCommand) -> Result<(), CliError> {
    let store = &app.admin;
    let resource = admin.resource;
    match admin.command {
        AdminSubcommand::List => {
            ensure(store.load_records(resource).await)?;
            print_json(&store.snapshot().await.records(resource))
        }
        AdminSubcommand::Create { data } => {
            let record = read_data(&data)?;
            print_message(ensure(store.create(resource, record).await)?, "created");
            Ok(())
        }
        AdminSubcommand::Update { id, data } => {
            let record = read_data(&data)?;
            print_message(ensure(store.update(resource, &id, record).await)?, "updated");
            Ok(())
        }
        AdminSubcommand::Delete { id } => {
            print_message(ensure(store.delete(resource, &id).await)?, "deleted");
            Ok(())
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn ensure(result: ActionResult) -> Result<Option<String>, CliError> {
    if result.success {
        Ok(result.message)
    } else {
        Err(CliError::Action(result.message.unwrap_or_else(|| "request failed".to_owned())))
    }
}

fn print_message(message: Option<String>, fallback: &str) {
    println!("{}", message.as_deref().unwrap_or(fallback));
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `--data` accepts inline JSON or `@path`.
fn read_data(raw: &str) -> Result<Value, CliError> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|source| CliError::ReadData { path: path.to_owned(), source })?,
        None => raw.to_owned(),
    };
    Ok(serde_json::from_str(&text)?)
}
