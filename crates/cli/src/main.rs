use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use metahint_engine::MetaSession;
use metahint_protocol::{ActiveScopeSet, Coordinates, GeoRefinement, LocationId, Scope};
use metahint_resolver::{
    decode_location_id, extract_current_round, is_competitive_url, retry_until_some, GameRef,
    LockEvent, RetryPolicy,
};
use metahint_sync::{
    draft_issue_url, resolve_token, settings_path, GithubContentsStore, HintDraft, LocationLink,
    RemoteConfig, Settings, SyncClient, CONFIG_DIR_ENV, TOKEN_ENV,
};
use serde_json::{json, Value};
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

mod data;
mod render;
mod replay;

#[derive(Parser)]
#[command(name = "metahint")]
#[command(about = "Community location hints for the panorama on screen", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Settings directory (overrides METAHINT_CONFIG_DIR)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(flatten)]
    remote: RemoteArgs,
}

/// Overrides for where the community documents live.
#[derive(Args)]
struct RemoteArgs {
    /// Repository owner (overrides METAHINT_OWNER)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name (overrides METAHINT_REPO)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Branch holding the documents (overrides METAHINT_BRANCH)
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Path of the hint document inside the repository
    #[arg(long, global = true)]
    hints_path: Option<String>,

    /// Path of the location document inside the repository
    #[arg(long, global = true)]
    locations_path: Option<String>,

    /// Contents API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Raw content base URL
    #[arg(long, global = true)]
    raw_base: Option<String>,
}

impl RemoteArgs {
    fn resolve(&self) -> RemoteConfig {
        let mut config = RemoteConfig::from_env();
        let overrides = [
            (&self.owner, &mut config.owner),
            (&self.repo, &mut config.repo),
            (&self.branch, &mut config.branch),
            (&self.hints_path, &mut config.hints_path),
            (&self.locations_path, &mut config.locations_path),
            (&self.api_base, &mut config.api_base),
            (&self.raw_base, &mut config.raw_base),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a raw panorama identifier
    Decode(DecodeArgs),

    /// Extract the current location identifier from a round or game payload
    Extract(ExtractArgs),

    /// Show exact and predicted hints for a location
    Show(ShowArgs),

    /// Feed a JSON-lines event log through a session and print each view
    Replay(ReplayArgs),

    /// Submit a new hint linked to a location
    Add(AddArgs),

    /// Link existing hints to a location
    Link(LinkArgs),

    /// Edit the scopes used for predicted hints
    Scopes(ScopesArgs),

    /// Persist or clear the write token
    Settings(SettingsArgs),
}

#[derive(Args)]
struct DecodeArgs {
    /// Raw identifier, hex-encoded or already canonical
    raw: String,
}

#[derive(Args)]
struct ExtractArgs {
    /// Inline JSON payload (mutually exclusive with --file; stdin when neither)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to a file containing the payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Page URL the payload belongs to
    #[arg(long)]
    url: Option<String>,

    /// Keep re-reading --file until an identifier shows up (10 x 500 ms)
    #[arg(long)]
    retry: bool,
}

/// Geographic context known for the location.
#[derive(Args)]
struct ContextArgs {
    /// Latitude in decimal degrees
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    road: Option<String>,

    /// Display address
    #[arg(long)]
    address: Option<String>,
}

impl ContextArgs {
    fn coordinates(&self) -> Result<Option<Coordinates>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
                .map(Some)
                .with_context(|| format!("Coordinates out of range: {lat}, {lng}")),
            _ => Ok(None),
        }
    }

    fn refinement(&self) -> GeoRefinement {
        GeoRefinement {
            address: self.address.clone(),
            country: self.country.clone(),
            region: self.region.clone(),
            road: self.road.clone(),
        }
    }

    fn location_link(&self, id: LocationId) -> Result<LocationLink> {
        Ok(LocationLink {
            id,
            coordinates: self.coordinates()?,
            country: self.country.clone(),
            region: self.region.clone(),
            road: self.road.clone(),
        })
    }
}

/// Local document files instead of the remote feed.
#[derive(Args)]
struct DataArgs {
    /// Hint document (JSON array)
    #[arg(long, requires = "locations_file")]
    hints_file: Option<PathBuf>,

    /// Location document (JSON object)
    #[arg(long, requires = "hints_file")]
    locations_file: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Location identifier (raw or canonical)
    #[arg(long)]
    id: String,

    #[command(flatten)]
    context: ContextArgs,

    /// Active scopes for predictions (defaults to the saved set)
    #[arg(long = "scope", value_name = "SCOPE", value_delimiter = ',')]
    scopes: Vec<Scope>,

    #[command(flatten)]
    data: DataArgs,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON-lines event log
    #[arg(long)]
    events: PathBuf,

    #[command(flatten)]
    data: DataArgs,

    /// Output one JSON object per event
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AddArgs {
    /// Location identifier the hint is seen at
    #[arg(long)]
    id: String,

    #[arg(long)]
    title: String,

    #[arg(long)]
    description: String,

    /// Tag (repeatable or comma-separated)
    #[arg(long = "tag", value_delimiter = ',')]
    tags: Vec<String>,

    #[arg(long)]
    scope: Option<Scope>,

    #[arg(long)]
    image_url: Option<String>,

    #[command(flatten)]
    context: ContextArgs,

    /// Write token (overrides METAHINT_TOKEN and saved settings)
    #[arg(long)]
    token: Option<String>,
}

#[derive(Args)]
struct LinkArgs {
    /// Location identifier
    #[arg(long)]
    id: String,

    /// Hint id to link (repeatable)
    #[arg(long = "hint", required = true, value_delimiter = ',')]
    hints: Vec<String>,

    #[command(flatten)]
    context: ContextArgs,

    /// Write token (overrides METAHINT_TOKEN and saved settings)
    #[arg(long)]
    token: Option<String>,
}

#[derive(Args)]
struct ScopesArgs {
    #[arg(long, value_name = "SCOPE", value_delimiter = ',')]
    enable: Vec<Scope>,

    #[arg(long, value_name = "SCOPE", value_delimiter = ',')]
    disable: Vec<Scope>,

    /// Re-enable every scope before applying --enable/--disable
    #[arg(long)]
    reset: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SettingsArgs {
    /// Save a write token
    #[arg(long, conflicts_with = "clear_token")]
    token: Option<String>,

    /// Forget the saved write token
    #[arg(long)]
    clear_token: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    if let Some(dir) = &cli.config_dir {
        env::set_var(CONFIG_DIR_ENV, dir);
    }

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::Extract(_) | Commands::Add(_) => true,
        Commands::Show(args) => args.json,
        Commands::Replay(args) => args.json,
        Commands::Scopes(args) => args.json,
        Commands::Settings(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if !cli.verbose {
        builder.filter_module("reqwest", log::LevelFilter::Warn);
        builder.filter_module("hyper_util", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let remote = cli.remote.resolve();

    match cli.command {
        Commands::Decode(args) => run_decode(&args)?,
        Commands::Extract(args) => run_extract(args).await?,
        Commands::Show(args) => run_show(args, &remote).await?,
        Commands::Replay(args) => replay::run(&args.events, &args.data, &remote, args.json).await?,
        Commands::Add(args) => run_add(args, &remote).await?,
        Commands::Link(args) => run_link(args, &remote).await?,
        Commands::Scopes(args) => run_scopes(args).await?,
        Commands::Settings(args) => run_settings(args).await?,
    }

    Ok(())
}

fn canonical_id(raw: &str) -> Result<LocationId> {
    decode_location_id(raw.trim())
        .map(LocationId::new)
        .context("Location identifier is empty")
}

fn run_decode(args: &DecodeArgs) -> Result<()> {
    let id = canonical_id(&args.raw)?;
    println!("{id}");
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let stdin_text = if args.json.is_none() && args.file.is_none() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        Some(text)
    } else {
        None
    };

    let policy = if args.retry && args.file.is_some() {
        RetryPolicy::default()
    } else {
        RetryPolicy::once()
    };
    let args_ref = &args;
    let stdin_ref = stdin_text.as_deref();
    let round = retry_until_some(policy, |attempt| async move {
        match read_payload(args_ref, stdin_ref).await {
            Ok(payload) => extract_current_round(&payload),
            Err(err) => {
                log::debug!("Attempt {attempt}: {err:#}");
                None
            }
        }
    })
    .await;

    let found = round.is_some();
    let mut output = json!({ "round": round });
    if let Some(url) = &args.url {
        let competitive = is_competitive_url(url);
        if competitive {
            log::warn!("Competitive page: hints are not meant to be shown here");
        }
        output["page"] = json!({
            "competitive": competitive,
            "api_path": GameRef::from_url(url).map(|game| game.api_path()),
        });
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !found {
        anyhow::bail!("No location identifier in payload");
    }
    Ok(())
}

async fn read_payload(args: &ExtractArgs, stdin: Option<&str>) -> Result<Value> {
    let text = match (&args.json, &args.file, stdin) {
        (Some(inline), _, _) => inline.clone(),
        (None, Some(path), _) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None, Some(text)) => text.to_string(),
        (None, None, None) => anyhow::bail!("No payload given"),
    };
    serde_json::from_str(&text).context("Payload is not valid JSON")
}

async fn run_show(args: ShowArgs, remote: &RemoteConfig) -> Result<()> {
    let active_scopes = if args.scopes.is_empty() {
        load_settings().await?.active_scopes
    } else {
        args.scopes.iter().copied().collect()
    };
    let mut session = MetaSession::new(active_scopes);
    data::load_into(&mut session, &args.data, remote).await?;

    let id = canonical_id(&args.id)?;
    if let LockEvent::Rejected { .. } = session.observe_location_id(id.clone()) {
        anyhow::bail!("Location identifier {id} is too short to be real");
    }
    if let Some(coords) = args.context.coordinates()? {
        session.set_coordinates(coords);
    }
    let refinement = args.context.refinement();
    if refinement != GeoRefinement::default() {
        if let Some(ticket) = session.begin_refinement() {
            session.apply_refinement(&ticket, &refinement);
        }
    }

    render::print_view(&session.view(), args.json)
}

async fn run_add(args: AddArgs, remote: &RemoteConfig) -> Result<()> {
    let location = args.context.location_link(canonical_id(&args.id)?)?;
    let draft = HintDraft {
        title: args.title,
        description: args.description,
        image_url: args.image_url,
        tags: args.tags,
        scope: args.scope,
        country: args.context.country.clone(),
        region: args.context.region.clone(),
        road: args.context.road.clone(),
    };

    let Some(token) = write_token(args.token.as_deref()).await? else {
        let url = draft_issue_url(remote, &draft, &location)?;
        eprintln!(
            "No write token configured. Open this URL to submit the hint as a community contribution:"
        );
        println!("{}", serde_json::to_string_pretty(&json!({ "issue_url": url }))?);
        return Ok(());
    };

    let client = SyncClient::new(GithubContentsStore::new(remote.clone(), token)?, remote);
    let record = match client.submit_hint(&draft, &location).await {
        Ok(record) => record,
        Err(err) => {
            if let Some(hint_id) = err.unlinked_hint() {
                anyhow::bail!(
                    "{err}. Do not add it again; link it with `metahint link --id {} --hint {hint_id}`",
                    location.id
                );
            }
            if err.is_conflict() {
                anyhow::bail!("{err}. Someone else committed first; run the command again");
            }
            return Err(err).context("Failed to submit hint");
        }
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_link(args: LinkArgs, remote: &RemoteConfig) -> Result<()> {
    let location = args.context.location_link(canonical_id(&args.id)?)?;
    let token = write_token(args.token.as_deref()).await?.context(
        "A write token is required to link hints (use --token, METAHINT_TOKEN or `metahint settings --token`)",
    )?;

    let client = SyncClient::new(GithubContentsStore::new(remote.clone(), token)?, remote);
    let changed = match client.link_existing(&location, &args.hints).await {
        Ok(changed) => changed,
        Err(err) if err.is_conflict() => {
            anyhow::bail!("{err}. Someone else committed first; run the command again")
        }
        Err(err) => return Err(err).context("Failed to link hints"),
    };
    if changed {
        println!("Linked {} hint(s) to {}", args.hints.len(), location.id);
    } else {
        println!("{} already links every given hint", location.id);
    }
    Ok(())
}

async fn run_scopes(args: ScopesArgs) -> Result<()> {
    let path = settings_path().context("No configuration directory available")?;
    let mut settings = load_settings().await?;
    let before = settings.active_scopes.clone();

    if args.reset {
        settings.active_scopes = ActiveScopeSet::all();
    }
    for scope in &args.enable {
        settings.active_scopes.enable(*scope);
    }
    for scope in &args.disable {
        settings.active_scopes.disable(*scope);
    }
    if settings.active_scopes != before {
        settings
            .save(&path)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
        log::info!("Saved active scopes to {}", path.display());
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "active_scopes": settings.active_scopes }))?
        );
    } else {
        for scope in Scope::ALL {
            let mark = if settings.active_scopes.contains(scope) { "x" } else { " " };
            println!("[{mark}] {scope}");
        }
    }
    Ok(())
}

async fn run_settings(args: SettingsArgs) -> Result<()> {
    let path = settings_path().context("No configuration directory available")?;
    let mut settings = load_settings().await?;

    let changed = if let Some(token) = args.token.as_deref() {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("Token is empty");
        }
        settings.token = Some(token.to_string());
        true
    } else if args.clear_token {
        settings.token.take().is_some()
    } else {
        false
    };
    if changed {
        settings
            .save(&path)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
    }

    let token_configured = settings.token.is_some();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "path": path,
                "token_configured": token_configured,
                "active_scopes": settings.active_scopes,
            }))?
        );
    } else {
        println!("settings: {}", path.display());
        println!(
            "token: {}",
            settings.token.as_deref().map_or("not set".to_string(), mask_token)
        );
        println!(
            "active scopes: {}/{}",
            settings.active_scopes.len(),
            Scope::ALL.len()
        );
    }
    Ok(())
}

async fn load_settings() -> Result<Settings> {
    let Some(path) = settings_path() else {
        return Ok(Settings::default());
    };
    Settings::load(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn write_token(flag: Option<&str>) -> Result<Option<String>> {
    let settings = load_settings().await?;
    let env_token = env::var(TOKEN_ENV).ok();
    Ok(resolve_token(flag, env_token.as_deref(), &settings))
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "set".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("set ({head}...{tail})")
}
