//!
//! lostfound CLI
//! -------------
//! Command-line front end for the lost-and-found API. Runs one command per
//! invocation, or an interactive interpreter with `--repl`. The session is
//! persisted between runs in the store file (see `--store`).

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, EnvFilter};

use lostfound::api::{
    ClaimDecision, CreateFoundItemRequest, CreateLostItemRequest, ItemFilter, ItemKind, ItemStatus, LostFoundApi,
    SubmitClaimRequest, UpdateUserRequest,
};
use lostfound::cli::{self, print_table};
use lostfound::client::{ApiClient, HttpTransport, LogNavigator, Notifier, StderrNotifier, Transport};
use lostfound::config::{parse_flag_value, ClientConfig};
use lostfound::error::{AppError, AppResult};
use lostfound::identity::{AuthApi, LoginRequest, RegisterRequest, RemoteAuthApi, SessionManager};
use lostfound::storage::{FileStore, KeyValueStore, MemoryStore};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [global flags] <command> [args]\n  {program} [global flags] --repl\n\nGlobal flags:\n  --api <url>              API base url (env: LOSTFOUND_API_URL, default http://localhost:3000/api/v1)\n  --asset-url <url>        Origin for relative image paths (env: LOSTFOUND_ASSET_URL)\n  --store <path>           Session file (env: LOSTFOUND_STORE, default .lostfound/session.json)\n  --config <file>          JSON config file\n  --refresh-mode <mode>    per_request | single_flight (env: LOSTFOUND_REFRESH_MODE)\n  --timeout <secs>         Request timeout (env: LOSTFOUND_TIMEOUT_SECS)\n  --ephemeral              Keep the session in memory only\n  --repl                   Start interactive mode\n  -h, --help               Show this help\n\nCommands:\n  login <email> <password>\n  register <request.json>\n  logout\n  whoami\n  items [--status OPEN|CLAIMED|RESOLVED] [--type LOST|FOUND]\n  item <id>\n  report-lost <request.json>\n  report-found <request.json>\n  categories\n  locations\n  upload <file>\n  claim <request.json>\n  claims <item-id>\n  decide <claim-id> approve|reject\n  profile [--name <name>] [--phone <phone>]\n  assets\n  help | quit (repl only)\n\nLogging: RUST_LOG=lostfound=debug {program} items"
    );
}

struct App {
    session: Arc<SessionManager>,
    api: LostFoundApi,
    navigator: Arc<LogNavigator>,
}

fn build_app(cfg: &ClientConfig, ephemeral: bool) -> AppResult<App> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(cfg.request_timeout())?);
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(&cfg.store_path))
    };
    let navigator = Arc::new(LogNavigator::new());
    let auth: Arc<dyn AuthApi> = Arc::new(RemoteAuthApi::new(cfg.api_base_url.clone(), transport.clone(), notifier.clone()));
    let session = Arc::new(
        SessionManager::new(auth, store, navigator.clone()).with_login_route(cfg.login_route.clone()),
    );
    let client = ApiClient::with_session(transport, session.clone(), notifier, cfg.refresh_mode);
    Ok(App { session, api: LostFoundApi::new(client, cfg.clone()), navigator })
}

fn read_json<T: DeserializeOwned>(path: &str) -> AppResult<T> {
    let bytes = std::fs::read(path).map_err(|e| AppError::user("read_file", format!("{}: {}", path, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::user("bad_json", format!("{}: {}", path, e)))
}

fn arg<'a>(words: &'a [String], i: usize, what: &str) -> AppResult<&'a str> {
    words
        .get(i)
        .map(String::as_str)
        .ok_or_else(|| AppError::user("missing_argument", format!("{} is required", what)))
}

fn print_json<T: serde::Serialize>(v: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

async fn run_command(app: &App, words: &[String]) -> AppResult<()> {
    let Some(cmd) = words.first() else { return Ok(()) };
    match cmd.as_str() {
        "login" => {
            let req = LoginRequest::new(arg(words, 1, "email")?, arg(words, 2, "password")?);
            let resp = app.session.login(&req).await?;
            println!("logged in as {}", cli::describe_user(Some(&resp.user)));
        }
        "register" => {
            let req: RegisterRequest = read_json(arg(words, 1, "request file")?)?;
            let resp = app.session.register(&req).await?;
            println!("registered {}", cli::describe_user(Some(&resp.user)));
        }
        "logout" => {
            app.session.logout();
            println!("logged out");
        }
        "whoami" => println!("{}", cli::describe_user(app.session.current_user().as_ref())),
        "items" => {
            let filter = ItemFilter {
                status: parse_flag_value(words, "--status").map(|s| ItemStatus::parse(&s)).transpose()?,
                kind: parse_flag_value(words, "--type").map(|s| ItemKind::parse(&s)).transpose()?,
            };
            let items = app.api.list_items(&filter).await?;
            print_table(&cli::ITEM_COLS, &cli::item_rows(&items));
        }
        "item" => {
            let item = app.api.get_item(arg(words, 1, "item id")?).await?;
            print_json(&item)?;
            println!("image: {}", app.api.image_url(item.image_url.as_deref()));
        }
        "report-lost" => {
            let req: CreateLostItemRequest = read_json(arg(words, 1, "request file")?)?;
            let item = app.api.report_lost(&req).await?;
            println!("reported lost item {}", item.id);
        }
        "report-found" => {
            let req: CreateFoundItemRequest = read_json(arg(words, 1, "request file")?)?;
            let item = app.api.report_found(&req).await?;
            println!("reported found item {}", item.id);
        }
        "categories" => print_table(&cli::CATEGORY_COLS, &cli::category_rows(&app.api.categories().await?)),
        "locations" => print_table(&cli::LOCATION_COLS, &cli::location_rows(&app.api.campus_locations().await?)),
        "upload" => {
            let up = app.api.upload_file(Path::new(arg(words, 1, "file")?)).await?;
            println!("{}", up.url);
        }
        "claim" => {
            let req: SubmitClaimRequest = read_json(arg(words, 1, "request file")?)?;
            let claim = app.api.submit_claim(&req).await?;
            println!("claim {} is {}", claim.id, claim.status.as_wire());
        }
        "claims" => {
            let claims = app.api.claims_for_item(arg(words, 1, "item id")?).await?;
            print_table(&cli::CLAIM_COLS, &cli::claim_rows(&claims));
        }
        "decide" => {
            let decision = ClaimDecision::parse(arg(words, 2, "decision")?)?;
            app.api.decide_claim(arg(words, 1, "claim id")?, decision).await?;
            println!("claim {} {}", words[1], decision.status().as_wire().to_lowercase());
        }
        "profile" => {
            let req = UpdateUserRequest { name: parse_flag_value(words, "--name"), phone: parse_flag_value(words, "--phone") };
            let user = app.api.update_profile(&req).await?;
            println!("{}", cli::describe_user(Some(&user)));
        }
        "assets" => print_table(&cli::ASSET_COLS, &cli::asset_rows(&app.api.my_assets().await?)),
        other => return Err(AppError::user("unknown_command", format!("unknown command '{}'", other))),
    }
    Ok(())
}

/// Report a failed command. HTTP and network failures were already shown by the
/// error stage of the pipeline; only local failures and 401s need a line here.
fn report(app: &App, err: &AppError) {
    if err.is_unauthorized() {
        eprintln!("not authorized: {}", err.message());
    } else if err.status().is_none() {
        eprintln!("error: {}", err);
    }
    if let Some(route) = app.navigator.take_pending() {
        eprintln!("session ended ({}); log in again with `login <email> <password>`", route);
    }
}

async fn repl(app: &App) -> Result<()> {
    let mut rx = app.session.subscribe();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let user = rx.borrow_and_update().clone();
            println!("[session] {}", cli::describe_user(user.as_ref()));
        }
    });

    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        let line = match rl.readline("lostfound> ") {
            Ok(l) => l,
            Err(rustyline::error::ReadlineError::Interrupted) | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let Some(first) = words.first() else { continue };
        let _ = rl.add_history_entry(line.as_str());
        match first.as_str() {
            "quit" | "exit" => break,
            "help" => print_usage("lostfound"),
            _ => {
                if let Err(e) = run_command(app, &words).await {
                    report(app, &e);
                }
            }
        }
    }
    watcher.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut globals: Vec<String> = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut config_file: Option<PathBuf> = None;
    let mut ephemeral = false;
    let mut interactive = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" | "--asset-url" | "--store" | "--refresh-mode" | "--timeout" => {
                if i + 1 >= args.len() {
                    eprintln!("{} requires a value", args[i]);
                    print_usage(&program);
                    std::process::exit(2);
                }
                globals.push(args[i].clone());
                globals.push(args[i + 1].clone());
                i += 2;
                continue;
            }
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("--config requires a path");
                    std::process::exit(2);
                }
                config_file = Some(PathBuf::from(&args[i + 1]));
                i += 2;
                continue;
            }
            "--ephemeral" => ephemeral = true,
            "--repl" => interactive = true,
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            _ => words.push(args[i].clone()),
        }
        i += 1;
    }

    let mut cfg = ClientConfig::load(config_file.as_deref())?;
    cfg.apply_args(&globals)?;
    tracing::debug!(target: "lostfound", "api={} store={} refresh_mode={:?}", cfg.api_base_url, cfg.store_path.display(), cfg.refresh_mode);

    let app = build_app(&cfg, ephemeral)?;

    if interactive {
        return repl(&app).await;
    }
    if words.is_empty() {
        print_usage(&program);
        std::process::exit(2);
    }
    if let Err(e) = run_command(&app, &words).await {
        report(&app, &e);
        std::process::exit(1);
    }
    Ok(())
}
