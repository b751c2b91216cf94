// CLI module - command-line argument parsing and handlers
//
// `feedsave scan` loads a saved feed page, runs a media session over it and
// replays infinite-scroll batches and client-side navigations from files.

use crate::download::SaveHandler;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use feedsave_core::{LifecycleCoordinator, MediaConfig, ResolvedUrl, ScanReport, UrlHandler};
use feedsave_dom::{Document, SelectorList};
use feedsave_html::HtmlParser;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// feedsave - save controls for feed media
#[derive(Parser)]
#[command(name = "feedsave")]
#[command(version)]
#[command(about = "Find feed media, resolve direct URLs and attach save controls", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a saved page and attach a control to every eligible media element
    Scan(ScanArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// HTML file of the page
    pub file: PathBuf,

    /// Address the page was loaded from
    #[arg(long, default_value = "https://www.instagram.com/")]
    pub address: String,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append a fragment to the body as one infinite-scroll batch (repeatable)
    #[arg(long, value_name = "FILE")]
    pub append: Vec<PathBuf>,

    /// Replace the body with a file's content and move to a new address (repeatable)
    #[arg(long, value_name = "ADDRESS=FILE", value_parser = parse_navigation)]
    pub navigate: Vec<Navigation>,

    /// Click every attached control
    #[arg(long)]
    pub click: bool,

    /// Download clicked media into this directory instead of printing URLs
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,
}

/// Client-side navigation replayed from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub address: String,
    pub file: PathBuf,
}

fn parse_navigation(value: &str) -> Result<Navigation, String> {
    let (address, file) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ADDRESS=FILE, got `{value}`"))?;
    if address.is_empty() || file.is_empty() {
        return Err(format!("expected ADDRESS=FILE, got `{value}`"));
    }
    Ok(Navigation {
        address: address.to_string(),
        file: PathBuf::from(file),
    })
}

/// Prints each clicked URL on stdout
#[derive(Debug, Default)]
struct PrintHandler;

impl UrlHandler for PrintHandler {
    fn handle(&self, url: Option<&ResolvedUrl>) {
        match url {
            Some(url) => println!("{url}"),
            None => tracing::warn!("No media URL found"),
        }
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Scan(args) => run_scan(args),
        }
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => MediaConfig::load(path)?,
        None => MediaConfig::default(),
    };

    let parser = HtmlParser::new();
    let mut doc = parser.parse_with_url(&read_html(&args.file)?, &args.address);

    let saver = args.save_dir.as_deref().map(SaveHandler::new).transpose()?.map(Rc::new);
    let handler: Rc<dyn UrlHandler> = match &saver {
        Some(saver) => saver.clone(),
        None => Rc::new(PrintHandler),
    };

    let mut session = LifecycleCoordinator::new(&config, handler)?;
    let mut total = session.start(&mut doc);

    for path in &args.append {
        let added = parser.append_to_body(&read_html(path)?, &mut doc)?;
        tracing::debug!(file = %path.display(), nodes = added.len(), "appended batch");
        total += session.deliver_mutations(&mut doc);
    }

    for navigation in &args.navigate {
        navigate(&parser, &mut doc, navigation)?;
        if let Some(report) = session.poll(&mut doc) {
            total += report;
        }
    }

    if args.click {
        let clicked = click_controls(&doc, &config)?;
        tracing::info!(clicked, "clicked controls");
    }

    session.stop(&mut doc);
    if let Some(saver) = &saver {
        saver.wait();
    }

    print_summary(&total);
    Ok(())
}

fn read_html(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn navigate(parser: &HtmlParser, doc: &mut Document, navigation: &Navigation) -> Result<()> {
    let html = read_html(&navigation.file)?;
    let body = doc.body().context("document has no body")?;

    doc.tree_mut().clear_children(body)?;
    parser.parse_fragment_into(&html, doc, body)?;
    doc.set_url(&navigation.address);
    Ok(())
}

fn click_controls(doc: &Document, config: &MediaConfig) -> Result<usize> {
    let marker = SelectorList::parse(&format!(".{}", config.control.class))?;
    let tree = doc.tree();
    let controls = tree.query_selector_all(tree.root(), &marker);
    for &control in &controls {
        doc.click(control);
    }
    Ok(controls.len())
}

fn print_summary(report: &ScanReport) {
    println!(
        "{} containers, {} media examined, {} controls attached, {} skipped, {} unresolved",
        report.containers, report.examined, report.attached, report.skipped, report.unresolved
    );
}
