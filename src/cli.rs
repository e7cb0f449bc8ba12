use agency_console::api::{ApiClient, UreqTransport};
use agency_console::cache::QueryCache;
use agency_console::config::Config;
use agency_console::error::{Error, Result};
use agency_console::ledger::{self, DateRange, LedgerFilter};
use agency_console::logger;
use agency_console::projects;
use agency_console::session::{Navigator, Session};
use agency_console::state::{Agency, Currency, ResourceKind, TracingHook, UsageLevel};
use agency_console::storage::FileSessionStore;
use agency_console::workflow::{
    ActionDialog, ButtonStyle, CreateAgencyForm, DialogOutcome, LifecycleKind, SubmitOutcome,
    Target, TopUpWorkflow,
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agency-console")]
#[command(about = "Agency Console CLI - Manage agency tenants, resource top-ups and websites")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: "human" or "json"
    #[arg(short, long)]
    pub format: Option<String>,

    /// Platform API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Session file path
    #[arg(long)]
    pub session_file: Option<String>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as a platform operator
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (falls back to AGENCY_CONSOLE_PASSWORD, then stdin)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and remove the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List agencies, newest first
    Agencies {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one agency with its resource usage
    Agency { id: u64 },

    /// Operator dashboard totals
    Stats,

    /// Platform storage capacity
    System,

    /// Register a new agency
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Initial storage in MB
        #[arg(long, default_value_t = 0)]
        storage: u64,
        #[arg(long, default_value_t = 0)]
        tokens: u64,
        #[arg(long, default_value_t = 0)]
        websites: u64,
        #[arg(long, default_value_t = 0)]
        images: u64,
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Top up an agency's resources
    Topup {
        id: u64,
        /// Storage to add in MB
        #[arg(long)]
        storage: Option<u64>,
        #[arg(long)]
        tokens: Option<u64>,
        #[arg(long)]
        websites: Option<u64>,
        #[arg(long)]
        images: Option<u64>,
        /// Preset as RESOURCE:N (1-based), e.g. storage:3; repeatable
        #[arg(long)]
        preset: Vec<String>,
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },

    /// Suspend an agency
    Suspend {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },

    /// Reactivate a suspended agency
    Reactivate {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },

    /// Permanently delete an agency
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },

    /// List an agency's websites
    Websites { agency_id: u64 },

    /// Website lifecycle actions
    Site {
        #[command(subcommand)]
        action: SiteCommand,
    },

    /// Top-up history ledger
    History {
        /// Case-insensitive agency name filter
        #[arg(short, long)]
        search: Option<String>,
        /// Only this agency id
        #[arg(short, long)]
        agency: Option<u64>,
        /// all, 7days, 30days or 90days
        #[arg(short, long, default_value = "all")]
        range: String,
    },

    /// The signed-in tenant's projects and quota
    Projects,
}

#[derive(Subcommand)]
pub enum SiteCommand {
    Suspend {
        site_id: u64,
        /// Owning agency (defaults to the signed-in user)
        #[arg(short, long)]
        agency: Option<u64>,
        #[arg(short, long)]
        yes: bool,
    },
    Reactivate {
        site_id: u64,
        #[arg(short, long)]
        agency: Option<u64>,
        #[arg(short, long)]
        yes: bool,
    },
    Delete {
        site_id: u64,
        #[arg(short, long)]
        agency: Option<u64>,
        #[arg(short, long)]
        yes: bool,
    },
}

/// Tells the operator to sign in again when the server drops the session.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn redirect_to_login(&mut self) {
        eprintln!("Session expired. Please login again with `agency-console login`.");
    }
}

type Client = ApiClient<UreqTransport>;

fn connect(config: &Config) -> Result<Client> {
    let store = FileSessionStore::new(config.session_path.clone());
    let session = Session::hydrate(Box::new(store), Box::new(CliNavigator))?;
    let transport = UreqTransport::new(&config.api_base_url, config.timeout());
    Ok(ApiClient::new(transport, session))
}

/// Format output based on format type
fn format_output<T: serde::Serialize>(
    data: &T,
    format: &str,
    human: impl FnOnce() -> String,
) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(data)
            .map_err(|e| Error::Io(format!("Failed to serialize JSON: {}", e))),
        _ => Ok(human()),
    }
}

fn print_output<T: serde::Serialize>(
    data: &T,
    format: &str,
    human: impl FnOnce() -> String,
) -> Result<()> {
    println!("{}", format_output(data, format, human)?);
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr()
        .flush()
        .map_err(|e| Error::Io(format!("Failed to write prompt: {}", e)))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| Error::Io(format!("Failed to read from stdin: {}", e)))?;
    Ok(line.trim().to_string())
}

/// Interactive yes/no; `assume_yes` skips the prompt.
fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = read_line(&format!("{} [y/N] ", prompt))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn parse_currency(code: &str) -> Result<Currency> {
    code.parse().map_err(Error::Validation)
}

/// `RESOURCE:N` with a 1-based preset index.
fn parse_preset(raw: &str) -> Result<(ResourceKind, usize)> {
    let (kind, index) = raw.split_once(':').ok_or_else(|| {
        Error::Validation(format!("Preset '{}' must look like storage:3", raw))
    })?;
    let kind: ResourceKind = kind.parse().map_err(Error::Validation)?;
    let index: usize = index
        .trim()
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Validation(format!("Preset index in '{}' must be 1 or more", raw)))?;
    Ok((kind, index - 1))
}

fn level_marker(level: UsageLevel) -> &'static str {
    match level {
        UsageLevel::Normal => "",
        UsageLevel::Warning => " (warning)",
        UsageLevel::Critical => " (critical)",
    }
}

fn render_agency(agency: &Agency) -> String {
    let mut out = format!(
        "{} (#{}) [{}]\n  Email:   {}\n  Phone:   {}\n  Created: {}\n",
        agency.name,
        agency.id,
        agency.status_label(),
        agency.email,
        agency.phone,
        agency.created_at
    );
    if let Some(notes) = &agency.notes {
        out.push_str(&format!("  Notes:   {}\n", notes));
    }
    for usage in agency.usage_report() {
        out.push_str(&format!(
            "  {:<14} {:>28}  {:>3}%{}\n",
            usage.kind.label(),
            usage.display(),
            usage.percentage,
            level_marker(usage.level)
        ));
    }
    out.trim_end().to_string()
}

fn find_agency(cache: &mut QueryCache, api: &mut Client, id: u64) -> Result<Agency> {
    cache
        .agencies(api)?
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .ok_or_else(|| Error::Validation(format!("Agency {} not found", id)))
}

/// Show the dialog, ask, and run the action.
fn run_dialog(
    api: &mut Client,
    cache: &mut QueryCache,
    mut dialog: ActionDialog,
    assume_yes: bool,
) -> Result<()> {
    eprintln!("{}", dialog.title());
    match dialog.target() {
        Target::Agency { name, .. } => eprintln!("  {}", name),
        Target::Website { name, host, .. } => eprintln!("  {} ({})", name, host),
    }
    eprintln!("{}", dialog.description());

    let prompt = match dialog.style() {
        ButtonStyle::Destructive => format!("{}? This cannot be undone.", dialog.confirm_label()),
        ButtonStyle::Default => format!("{}?", dialog.confirm_label()),
    };
    if !confirm(&prompt, assume_yes)? {
        dialog.cancel();
        println!("Cancelled.");
        return Ok(());
    }

    match dialog.confirm(api, cache)? {
        DialogOutcome::Completed => {
            println!(
                "{} {}: done.",
                dialog.title(),
                dialog.target().name()
            );
            Ok(())
        }
        DialogOutcome::Failed(message) => Err(Error::Rejected(message)),
        DialogOutcome::Ignored => Ok(()),
    }
}

fn agency_lifecycle(
    api: &mut Client,
    cache: &mut QueryCache,
    id: u64,
    kind: LifecycleKind,
    assume_yes: bool,
) -> Result<()> {
    let agency = find_agency(cache, api, id)?;
    if kind != LifecycleKind::Delete && kind != LifecycleKind::toggle_for(agency.is_active) {
        return Err(Error::Validation(format!(
            "Agency {} is already {}",
            agency.name,
            agency.status_label()
        )));
    }
    run_dialog(
        api,
        cache,
        ActionDialog::open(Target::from(&agency), kind),
        assume_yes,
    )
}

fn site_lifecycle(
    api: &mut Client,
    cache: &mut QueryCache,
    site_id: u64,
    agency: Option<u64>,
    kind: LifecycleKind,
    assume_yes: bool,
) -> Result<()> {
    let owner = match agency {
        Some(id) => id,
        None => api.session().require_user()?.id,
    };
    let site = cache
        .websites(api, owner)?
        .find_site(site_id)
        .cloned()
        .ok_or_else(|| {
            Error::Validation(format!("Website {} not found for agency {}", site_id, owner))
        })?;
    if kind != LifecycleKind::Delete && kind != LifecycleKind::toggle_for(site.is_active) {
        return Err(Error::Validation(format!(
            "Website {} is already {}",
            site.name,
            site.status_label()
        )));
    }
    run_dialog(
        api,
        cache,
        ActionDialog::open(Target::from(&site), kind),
        assume_yes,
    )
}

#[allow(clippy::too_many_arguments)]
fn top_up(
    api: &mut Client,
    cache: &mut QueryCache,
    format: &str,
    id: u64,
    quantities: [(ResourceKind, Option<u64>); 4],
    presets: &[String],
    amount: f64,
    currency: &str,
    assume_yes: bool,
) -> Result<()> {
    let agency = find_agency(cache, api, id)?;
    let mut workflow = TopUpWorkflow::new(&agency);
    {
        let form = workflow.form_mut()?;
        for preset in presets {
            let (kind, index) = parse_preset(preset)?;
            form.select_preset(kind, index)?;
        }
        for (kind, value) in quantities {
            if let Some(v) = value {
                form.set(kind, v);
            }
        }
        form.amount = amount;
        form.currency = parse_currency(currency)?;
    }

    if !workflow.form().is_empty() {
        eprintln!("Top up {}:", workflow.agency_name());
        for (kind, text) in workflow.form().summary() {
            eprintln!("  {:<14} {}", kind.label(), text);
        }
        eprintln!(
            "  {:<14} {}",
            "Amount",
            workflow.form().currency.format_amount(workflow.form().amount)
        );
        if !confirm("Submit top-up?", assume_yes)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let updated = match workflow.submit_checked(api, cache)? {
        SubmitOutcome::Submitted(agency) => agency,
        SubmitOutcome::NeedsConfirmation {
            requested_mb,
            available_mb,
        } => {
            eprintln!(
                "Warning: requested storage {} exceeds available platform storage {}.",
                ResourceKind::Storage.format_amount(requested_mb as i64),
                ResourceKind::Storage.format_amount(available_mb as i64)
            );
            if !confirm("Proceed anyway?", assume_yes)? {
                workflow.back_to_editing();
                println!("Cancelled.");
                return Ok(());
            }
            match workflow.proceed(api, cache)? {
                SubmitOutcome::Submitted(agency) => agency,
                SubmitOutcome::NeedsConfirmation { .. } => {
                    return Err(Error::Workflow("unexpected second confirmation".to_string()))
                }
            }
        }
    };

    print_output(&updated, format, || {
        format!("Top-up applied.\n{}", render_agency(&updated))
    })
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.set_api_base_url(&url);
    }
    if let Some(path) = cli.session_file {
        config.set_session_path(PathBuf::from(path));
    }
    if let Some(format) = cli.format {
        config.set_output_format(format);
    }
    if let Some(level) = cli.log_level {
        config.set_log_level(level);
    }

    logger::init(config.get_log_level());

    let format = config.get_output_format().to_string();
    let mut api = connect(&config)?;
    let mut cache = QueryCache::new();
    cache.subscribe(Box::new(TracingHook));

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password.or_else(|| std::env::var("AGENCY_CONSOLE_PASSWORD").ok())
            {
                Some(p) => p,
                None => read_line("Password: ")?,
            };
            let user = api.login(&email, &password)?;
            print_output(&user, &format, || {
                format!("Logged in as {} <{}>", user.name, user.email)
            })
        }

        Commands::Logout => {
            api.logout()?;
            println!("Logged out.");
            Ok(())
        }

        Commands::Whoami => {
            let user = api.session().require_user()?.clone();
            print_output(&user, &format, || {
                format!("{} <{}> (#{})", user.name, user.email, user.id)
            })
        }

        Commands::Agencies { search } => {
            let needle = search.unwrap_or_default().to_lowercase();
            let agencies: Vec<Agency> = cache
                .agencies(&mut api)?
                .iter()
                .filter(|a| needle.is_empty() || a.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            print_output(&agencies, &format, || {
                if agencies.is_empty() {
                    return "No agencies found.".to_string();
                }
                agencies
                    .iter()
                    .map(|a| {
                        let storage = a.usage(ResourceKind::Storage);
                        format!(
                            "{:>6}  {:<28} {:<10} {:<30} storage {:>3}%{}",
                            a.id,
                            a.name,
                            a.status_label(),
                            a.email,
                            storage.percentage,
                            level_marker(storage.level)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        Commands::Agency { id } => {
            let agency = find_agency(&mut cache, &mut api, id)?;
            print_output(&agency, &format, || render_agency(&agency))
        }

        Commands::Stats => {
            let stats = cache.dashboard_stats(&mut api)?;
            print_output(&stats, &format, || {
                format!(
                    "Agencies:        {}\nWebsites used:   {}\nStorage used:    {:.1} GB\nTokens used:     {:.0}K",
                    stats.total_agencies,
                    stats.total_websites,
                    stats.total_storage_gb,
                    stats.total_tokens_k
                )
            })
        }

        Commands::System => {
            let system = cache.system_storage(&mut api)?;
            print_output(&system, &format, || {
                format!(
                    "Worker node storage: {:.1} GB\nAllotted to agencies: {:.1} GB ({:.1}%)\nAvailable:           {}",
                    system.worker_node_storage_gb,
                    system.agency_allotted_gb,
                    system.agency_allotted_percent,
                    ResourceKind::Storage.format_amount(system.available_mb() as i64)
                )
            })
        }

        Commands::Create {
            name,
            email,
            phone,
            storage,
            tokens,
            websites,
            images,
            amount,
            currency,
            notes,
        } => {
            let form = CreateAgencyForm {
                name,
                email,
                phone,
                storage,
                tokens,
                websites,
                images,
                amount,
                currency: parse_currency(&currency)?,
                notes,
            };
            let agency = form.submit(&mut api, &mut cache)?;
            print_output(&agency, &format, || {
                format!("Agency created.\n{}", render_agency(&agency))
            })
        }

        Commands::Topup {
            id,
            storage,
            tokens,
            websites,
            images,
            preset,
            amount,
            currency,
            yes,
        } => top_up(
            &mut api,
            &mut cache,
            &format,
            id,
            [
                (ResourceKind::Storage, storage),
                (ResourceKind::Tokens, tokens),
                (ResourceKind::Websites, websites),
                (ResourceKind::Images, images),
            ],
            &preset,
            amount,
            &currency,
            yes,
        ),

        Commands::Suspend { id, yes } => {
            agency_lifecycle(&mut api, &mut cache, id, LifecycleKind::Suspend, yes)
        }
        Commands::Reactivate { id, yes } => {
            agency_lifecycle(&mut api, &mut cache, id, LifecycleKind::Reactivate, yes)
        }
        Commands::Delete { id, yes } => {
            agency_lifecycle(&mut api, &mut cache, id, LifecycleKind::Delete, yes)
        }

        Commands::Websites { agency_id } => {
            let dashboard = cache.websites(&mut api, agency_id)?.clone();
            print_output(&dashboard.customers, &format, || {
                let rows: Vec<String> = dashboard
                    .sites()
                    .map(|(customer, site)| {
                        format!(
                            "{:>6}  {:<28} {:<10} {:<20} {}",
                            site.id,
                            site.name,
                            site.status_label(),
                            customer.name,
                            site.public_url()
                        )
                    })
                    .collect();
                if rows.is_empty() {
                    "No websites found.".to_string()
                } else {
                    rows.join("\n")
                }
            })
        }

        Commands::Site { action } => match action {
            SiteCommand::Suspend {
                site_id,
                agency,
                yes,
            } => site_lifecycle(
                &mut api,
                &mut cache,
                site_id,
                agency,
                LifecycleKind::Suspend,
                yes,
            ),
            SiteCommand::Reactivate {
                site_id,
                agency,
                yes,
            } => site_lifecycle(
                &mut api,
                &mut cache,
                site_id,
                agency,
                LifecycleKind::Reactivate,
                yes,
            ),
            SiteCommand::Delete {
                site_id,
                agency,
                yes,
            } => site_lifecycle(
                &mut api,
                &mut cache,
                site_id,
                agency,
                LifecycleKind::Delete,
                yes,
            ),
        },

        Commands::History {
            search,
            agency,
            range,
        } => {
            let range: DateRange = range.parse().map_err(Error::Validation)?;
            let records = cache.history(&mut api)?.to_vec();
            let agencies = cache.agencies(&mut api)?.to_vec();
            let filter = LedgerFilter {
                search: search.unwrap_or_default(),
                agency_id: agency,
                range,
            };
            let view = ledger::build(&records, &agencies, &filter, chrono::Utc::now());
            print_output(&view, &format, || {
                let mut lines: Vec<String> = view
                    .rows
                    .iter()
                    .map(|row| {
                        format!(
                            "{}  {:<28} {:<40} {:>18}  {:?}",
                            row.record
                                .created_at
                                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            row.agency_name,
                            row.record.resource_labels().join(", "),
                            row.record.format_amount(),
                            row.record.status
                        )
                    })
                    .collect();
                if lines.is_empty() {
                    lines.push("No top-ups match the current filters.".to_string());
                }
                lines.push(format!(
                    "\nTop-ups: {}  Total value: ${:.2} USD  Active agencies: {}",
                    view.summary.total_top_ups,
                    view.summary.total_value_usd,
                    view.summary.active_agencies
                ));
                lines.join("\n")
            })
        }

        Commands::Projects => {
            let user_id = api.session().require_user()?.id;
            let view = projects::build(cache.websites(&mut api, user_id)?);
            print_output(&view, &format, || {
                let mut lines: Vec<String> = view.cards.iter().map(|c| c.text()).collect();
                lines.push(String::new());
                if view.projects.is_empty() {
                    lines.push("No projects yet.".to_string());
                }
                for p in &view.projects {
                    lines.push(format!(
                        "{:>6}  {:<28} {:<10} {:<20} {}\n        edit: {}",
                        p.site_id, p.name, p.status, p.customer, p.public_url, p.editor_url
                    ));
                }
                lines.join("\n")
            })
        }
    }
}
