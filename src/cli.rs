use std::error::Error;
use std::path::PathBuf;

use atty::Stream;
use clap::{Args, Parser, Subcommand};
use playbook_rs::strategy::{HANDLE_FIELD, NAME_FIELD, PACKAGE_FIELD};
use playbook_rs::{
    Activation, GuideSource, GuidesLocation, PageSession, PlaybookConfig, RenderContext,
    StrategyRegistry, markup,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "playbook-rs", about = "Browse and render the TGR playbook", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Read guides from this JSON file instead of the embedded copy.
    #[arg(long, global = true, value_name = "PATH")]
    guides: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operations on the guide document.
    #[command(subcommand)]
    Guides(GuidesCommand),
    /// Render the full page as HTML on stdout.
    Render {
        /// Referral id substituted into every link.
        #[arg(long)]
        refid: Option<String>,
        /// Open this guide (1-based) in the rendered accordion.
        #[arg(long)]
        open: Option<usize>,
    },
    /// Generate a welcome message for a new member.
    Welcome(WelcomeArgs),
    /// Serve the playbook over HTTP.
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

#[derive(Subcommand, Debug)]
enum GuidesCommand {
    /// List every guide in document order.
    List,
    /// Show one guide's content.
    Show {
        /// 1-based guide number.
        index: usize,
        /// Referral id substituted into the content.
        #[arg(long)]
        refid: Option<String>,
    },
    /// List guides whose title or content contains the term.
    Search {
        /// Case-insensitive search term.
        term: String,
    },
}

#[derive(Args, Debug)]
struct WelcomeArgs {
    /// The new member's full name.
    #[arg(long)]
    name: String,
    /// The new member's username, used as their referral id.
    #[arg(long)]
    username: String,
    /// Package value, e.g. `starter`, `silver` or `gold`.
    #[arg(long)]
    package: Option<String>,
    /// Form id of the welcome generator.
    #[arg(long, default_value = "welcomeForm")]
    form: String,
}

#[cfg(feature = "web")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: std::net::SocketAddr,
    /// CSS framework for the page chrome.
    #[arg(long, default_value = "tailwind", value_parser = ["tailwind", "bootstrap"])]
    theme: String,
    /// Public base URL used in canonical links and the sitemap.
    #[arg(long)]
    base_url: Option<String>,
    /// Persist video hub clicks to this JSON-lines file.
    #[arg(long, value_name = "PATH")]
    counter_file: Option<PathBuf>,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = PlaybookConfig {
        guides: cli
            .guides
            .clone()
            .map_or(GuidesLocation::Embedded, GuidesLocation::File),
        ..PlaybookConfig::default()
    };
    match cli.command {
        Command::Guides(GuidesCommand::List) => handle_list(&config, cli.json),
        Command::Guides(GuidesCommand::Show { index, refid }) => {
            handle_show(&config, index, refid.as_deref(), cli.json)
        }
        Command::Guides(GuidesCommand::Search { term }) => handle_search(&config, &term, cli.json),
        Command::Render { refid, open } => handle_render(&config, refid.as_deref(), open),
        Command::Welcome(args) => handle_welcome(&config, args, cli.json),
        #[cfg(feature = "web")]
        Command::Serve(args) => handle_serve(config, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(config: &PlaybookConfig) -> Result<GuideSource, Box<dyn Error>> {
    Ok(config.load_guides()?)
}

fn handle_list(config: &PlaybookConfig, as_json: bool) -> Result<(), Box<dyn Error>> {
    let source = load(config)?;
    let rows: Vec<(usize, &str, bool)> = source
        .instructions
        .iter()
        .enumerate()
        .map(|(idx, guide)| (idx + 1, guide.title.as_str(), guide.form.is_some()))
        .collect();
    if as_json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(index, title, has_form)| {
                json!({ "index": index, "title": title, "has_form": has_form })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_guide_table(&rows);
    }
    Ok(())
}

fn handle_show(
    config: &PlaybookConfig,
    index: usize,
    refid: Option<&str>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let source = load(config)?;
    let options = config.page_options(refid);
    let ctx = RenderContext::render(&source, &options, &StrategyRegistry::default());
    let Some(guide) = index.checked_sub(1).and_then(|idx| ctx.guides().get(idx)) else {
        return Err(format!("guide {index} not found ({} available)", ctx.guides().len()).into());
    };
    if as_json {
        let payload = json!({
            "index": index,
            "title": guide.title,
            "content": guide.content,
            "html": markup::translate(&guide.content),
            "class": ctx.content_class(index),
            "form": guide.form.as_ref().map(|form| form.id()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!("{index}. {}", guide.title);
    render_markdown_block("Content", &markup::to_markdown(&guide.content));
    if let Some(form) = &guide.form {
        println!("\nForm: {} ({})", form.id(), form.calculation_logic());
    }
    Ok(())
}

fn handle_search(config: &PlaybookConfig, term: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let source = load(config)?;
    let ctx = RenderContext::render(
        &source,
        &config.page_options(None),
        &StrategyRegistry::default(),
    );
    let mut accordion = ctx.accordion();
    let outcome = accordion.filter(term, ctx.guides());
    let rows: Vec<(usize, &str, bool)> = accordion
        .items()
        .iter()
        .filter(|item| item.is_visible)
        .filter_map(|item| {
            ctx.guides()
                .get(item.index - 1)
                .map(|guide| (item.index, guide.title.as_str(), guide.form.is_some()))
        })
        .collect();
    if as_json {
        let payload = json!({
            "term": term,
            "matches": outcome.matches,
            "no_results": outcome.no_results,
            "guides": rows.iter().map(|(index, title, _)| json!({ "index": index, "title": title })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if outcome.no_results {
        println!("No guides contain \"{term}\".");
    } else {
        println!("Matches for \"{term}\":");
        print_guide_table(&rows);
    }
    Ok(())
}

fn handle_render(
    config: &PlaybookConfig,
    refid: Option<&str>,
    open: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let options = config.page_options(refid);
    let mut session = PageSession::load(
        config.load_guides(),
        &options,
        &StrategyRegistry::default(),
        playbook_rs::NoClipboard,
    );
    if let Some(index) = open {
        if !session.activate_header(index) {
            return Err(format!("guide {index} not found").into());
        }
    }
    println!("{}", session.html());
    Ok(())
}

fn handle_welcome(
    config: &PlaybookConfig,
    args: WelcomeArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let source = load(config)?;
    let options = config.page_options(None);
    let ctx = RenderContext::render(&source, &options, &StrategyRegistry::default());
    let mut session = PageSession::new(ctx, &options, playbook_rs::NoClipboard);
    session.set_field(NAME_FIELD, &args.name);
    session.set_field(HANDLE_FIELD, &args.username);
    if let Some(package) = &args.package {
        if !session.set_field(PACKAGE_FIELD, package) {
            return Err(format!("form has no {PACKAGE_FIELD} field").into());
        }
    }
    let message = match session.activate_action(&args.form) {
        Some(Activation::Generated(message)) => message,
        Some(Activation::Rejected(err)) => return Err(err.message.into()),
        Some(Activation::Ignored) => {
            return Err(format!("form {:?} does not generate messages", args.form).into());
        }
        None => return Err(format!("no input form with id {:?}", args.form).into()),
    };
    if as_json {
        let payload = json!({ "form": args.form, "message": message });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{message}");
    }
    Ok(())
}

#[cfg(feature = "web")]
fn handle_serve(config: PlaybookConfig, args: ServeArgs) -> Result<(), Box<dyn Error>> {
    use playbook_rs::web::{self, WebConfig, WebTheme};

    let theme = match args.theme.as_str() {
        "bootstrap" => WebTheme::Bootstrap,
        _ => WebTheme::Tailwind,
    };
    let web_config = WebConfig {
        addr: args.addr,
        theme,
        base_url: args
            .base_url
            .unwrap_or_else(|| format!("http://{}", args.addr)),
        playbook: PlaybookConfig {
            counter_path: args.counter_file,
            ..config
        },
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(web_config))?;
    Ok(())
}

fn print_guide_table(rows: &[(usize, &str, bool)]) {
    if rows.is_empty() {
        println!("No guides loaded.");
        return;
    }
    let width = rows
        .iter()
        .map(|(_, title, _)| title.chars().count())
        .max()
        .unwrap_or(5)
        .max("TITLE".len());
    println!("{:>3}  {:<width$}  {}", "#", "TITLE", "FORM", width = width);
    println!("{:->3}  {:-<width$}  {}", "", "", "----", width = width);
    for (index, title, has_form) in rows {
        let form = if *has_form { "yes" } else { "" };
        println!("{:>3}  {:<width$}  {}", index, title, form, width = width);
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn markdown_skin() -> MadSkin {
    MadSkin::default()
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = markdown_skin();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
