use crate::audit::{self, AuditFilters, Sorting};
use crate::cli::{AuditArgs, Cli, Command, PickArgs};
use crate::collections::{CollectionTree, Identifier, JsonTreeSupplier, TreeSupplier};
use crate::config::AppConfig;
use crate::picker::HierarchicalPicker;
use crate::search::{QuestionIndex, SearchLoader};
use crate::tui;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

// Upper bound for the single search a headless render performs.
const HEADLESS_WAIT: Duration = Duration::from_secs(30);

// Merges CLI flags over the config file: flags only ever loosen the policy or set the user.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let args = &cli.pick;
    if let Some(user) = &args.user {
        config.current_user = Some(Identifier::from(user.as_str()));
    }
    if args.browse_personal {
        config.policy.personal_requires_search = false;
    }
    if args.show_nested_root {
        config.policy.hide_nested_root = false;
    }
    Ok(config)
}

fn load_tree(path: &Path, current_user: Option<Identifier>) -> Result<CollectionTree> {
    JsonTreeSupplier::new(path, current_user)
        .load_tree()
        .with_context(|| format!("loading collections from {}", path.display()))
}

fn load_questions(path: &Path) -> Result<QuestionIndex> {
    QuestionIndex::load(path).with_context(|| format!("loading questions from {}", path.display()))
}

// Renders the picker once to stdout, after waiting for its single search.
fn run_headless(
    tree: &CollectionTree,
    options: tui::PickerOptions,
    mut loader: SearchLoader,
    config: &AppConfig,
) {
    let mut picker =
        HierarchicalPicker::new(tree, options.initial_location, options.policy, |_| {});
    picker.set_search_text(options.search_text);
    loader.request(&picker.query());
    let view = picker.view(loader.wait(HEADLESS_WAIT));
    for line in tui::plain_lines(&view, &config.theme) {
        println!("{line}");
    }
}

fn run_pick(args: &PickArgs, config: &AppConfig) -> Result<()> {
    // Step 1: Load both exports. The tree is loaded once; questions feed the search worker.
    let collections = args
        .collections
        .as_deref()
        .context("--collections <FILE> is required")?;
    let questions = args
        .questions
        .as_deref()
        .context("--questions <FILE> is required")?;
    let tree = load_tree(collections, config.current_user.clone())?;
    let loader = SearchLoader::spawn(load_questions(questions)?);

    let options = tui::PickerOptions {
        initial_location: args.initial.as_deref().map(Identifier::from),
        search_text: args.search.clone().unwrap_or_default(),
        policy: config.policy,
    };

    // Step 2: Headless render or interactive session.
    if args.headless {
        run_headless(&tree, options, loader, config);
        return Ok(());
    }

    match tui::run_picker(&tree, options, loader, &config.theme)? {
        Some(id) => println!("{id}"),
        None => info!("picker closed without a selection"),
    }
    Ok(())
}

fn run_audit(args: &AuditArgs, config: &AppConfig) -> Result<()> {
    let index = load_questions(&args.questions)?;
    let tree = match &args.collections {
        Some(path) => Some(load_tree(path, config.current_user.clone())?),
        None => None,
    };

    let mut sorting = Sorting::from_clicks(&args.sort);
    if args.desc {
        sorting.descending = true;
    }
    let filters = AuditFilters {
        question: args.question_filter.clone(),
        collection: args.collection_filter.clone(),
    };

    let rows = audit::audit_rows(&index, tree.as_ref(), &filters, sorting);
    let shown = audit::page(&rows, args.page);
    info!(
        total = rows.len(),
        page = args.page,
        column = ?sorting.column,
        order = sorting.order(),
        "audit listing"
    );
    print!("{}", audit::render_table(shown, sorting));
    println!(
        "({} of {} questions, page {})",
        shown.len(),
        rows.len(),
        args.page
    );
    Ok(())
}

// Main orchestrator for qpick.
pub fn run_qpick(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    match &cli.command {
        Some(Command::Audit(args)) => run_audit(args, &config),
        None => run_pick(&cli.pick, &config),
    }
}
