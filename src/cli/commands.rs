//! Command implementations

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::editing;
use crate::application::selection::{self, parse_assignment};
use crate::application::{demo_catalog, Solution, SolutionSet};
use crate::cli::args::{Cli, Commands, ConfigCommands, FixArgs, KindArg, SortArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, project_config_path, Settings};
use crate::domain::{
    Catalog, DomainError, NodeId, NodeKind, Price, SolutionIterator, TreeRender,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Paths and services shared by all commands.
struct Context {
    container: ServiceContainer,
    project_dir: PathBuf,
    catalog_path: PathBuf,
}

impl Context {
    fn settings(&self) -> &Settings {
        &self.container.settings
    }

    /// Catalog with the `--fix` assignments applied.
    fn catalog(&self, fix: &FixArgs) -> CliResult<Catalog> {
        let mut tree = self.container.catalog.load_or_demo(&self.catalog_path)?;
        let assignments = fix
            .fix
            .iter()
            .map(|text| parse_assignment(text))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CliError::InvalidArgs(e.to_string()))?;
        selection::apply(&mut tree, &assignments)
            .map_err(|e| CliError::InvalidArgs(e.to_string()))?;
        Ok(tree)
    }

    /// Load the catalog, apply `edit` to the node at `path` and write the
    /// result back to the catalog file.
    fn edit<F>(&self, path: &str, edit: F) -> CliResult<()>
    where
        F: FnOnce(&mut Catalog, NodeId) -> Result<(), DomainError>,
    {
        let invalid = |e: DomainError| CliError::InvalidArgs(e.to_string());
        let mut tree = self.container.catalog.load_or_demo(&self.catalog_path)?;
        let id = editing::resolve(&tree, path).map_err(invalid)?;
        edit(&mut tree, id).map_err(invalid)?;
        self.container.catalog.save(&tree, &self.catalog_path)?;
        debug!(path, nodes = tree.len(), "catalog edited");
        Ok(())
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let command = match &cli.command {
        Some(command) => command,
        None => return Err(CliError::Usage("no command given, see --help".into())),
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e))?,
    };
    let settings = Settings::load(Some(&project_dir))?;
    let catalog_path = cli
        .catalog
        .clone()
        .unwrap_or_else(|| settings.catalog_path(&project_dir));
    debug!(
        "project_dir={}, catalog={}",
        project_dir.display(),
        catalog_path.display()
    );
    let ctx = Context {
        container: ServiceContainer::new(settings),
        project_dir,
        catalog_path,
    };

    match command {
        Commands::Tree => cmd_tree(&ctx),
        Commands::Price => cmd_price(&ctx),
        Commands::Count { fix } => cmd_count(&ctx, fix),
        Commands::Solutions {
            fix,
            sort,
            limit,
            verbose,
        } => cmd_solutions(&ctx, fix, *sort, *limit, *verbose),
        Commands::Params => cmd_params(&ctx),
        Commands::Save { fix, output } => cmd_save(&ctx, fix, output.as_deref()),
        Commands::Check { path } => cmd_check(&ctx, path.as_deref()),
        Commands::Add {
            parent,
            name,
            kind,
            price,
        } => cmd_add(&ctx, parent, name, *kind, *price),
        Commands::Remove { path } => cmd_remove(&ctx, path),
        Commands::Rename { path, name } => cmd_rename(&ctx, path, name),
        Commands::Reprice { path, price } => cmd_reprice(&ctx, path, *price),
        Commands::Kind { path, kind } => cmd_kind(&ctx, path, *kind),
        Commands::Demo { output } => cmd_demo(&ctx, output.as_deref()),
        Commands::Config { command } => cmd_config(&ctx, command),
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_tree(ctx: &Context) -> CliResult<()> {
    let tree = ctx.catalog(&FixArgs::default())?;
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_price(ctx: &Context) -> CliResult<()> {
    let tree = ctx.catalog(&FixArgs::default())?;
    match tree.root() {
        Some(root) => {
            let price = *tree.node(root).subtree_key();
            output::action("cheapest", &ctx.settings().format_price(price));
        }
        None => output::warning("catalog is empty"),
    }
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_count(ctx: &Context, fix: &FixArgs) -> CliResult<()> {
    let tree = ctx.catalog(fix)?;
    let iter = SolutionIterator::new(&tree);
    output::info(&iter.solution_count());
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_solutions(
    ctx: &Context,
    fix: &FixArgs,
    sort: Option<SortArg>,
    limit: Option<usize>,
    verbose: bool,
) -> CliResult<()> {
    let tree = ctx.catalog(fix)?;
    let mut iter = SolutionIterator::new(&tree);

    let mut renders: HashMap<String, String> = HashMap::new();
    if verbose && iter.solution_count() > 0 {
        loop {
            let solution = Solution::from_iterator(&iter);
            renders
                .entry(solution.hash)
                .or_insert_with(|| iter.to_tree_string().to_string());
            if !iter.next_solution() {
                break;
            }
        }
    }

    let mut set = SolutionSet::collect(&mut iter);
    let order = match sort {
        Some(arg) => arg.order(),
        None => Some(ctx.settings().sort),
    };
    if let Some(order) = order {
        set.sort(order);
    }

    let limit = limit.or(ctx.settings().limit).unwrap_or(usize::MAX);
    for solution in set.iter().take(limit) {
        output::info(&format_solution(ctx.settings(), solution));
        if let Some(render) = renders.get(&solution.hash) {
            output::detail(&render.trim_end().replace('\n', "\n  "));
        }
    }
    if set.len() > limit {
        output::detail(&format!("... {} more", set.len() - limit));
    }
    Ok(())
}

fn format_solution(settings: &Settings, solution: &Solution) -> String {
    let mut line = format!(
        "{:>12}  {} {}",
        settings.format_price(solution.price),
        solution.mark,
        solution.model
    );
    if !solution.summary.is_empty() {
        line.push_str(&format!("  ({})", solution.summary));
    }
    line
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_params(ctx: &Context) -> CliResult<()> {
    let tree = ctx.catalog(&FixArgs::default())?;
    for parameter in selection::parameters(&tree) {
        let alternatives = parameter
            .alternatives
            .iter()
            .map(|alt| {
                if parameter.fixed.as_deref() == Some(alt.as_str()) {
                    format!("*{}", alt)
                } else {
                    alt.clone()
                }
            })
            .join(", ");
        output::info(&format!(
            "{}{}: {}",
            "  ".repeat(parameter.depth),
            parameter.name,
            alternatives
        ));
    }
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_save(ctx: &Context, fix: &FixArgs, output_path: Option<&Path>) -> CliResult<()> {
    let tree = ctx.catalog(fix)?;
    let mut iter = SolutionIterator::new(&tree);
    let mut set = SolutionSet::collect(&mut iter);
    set.sort(ctx.settings().sort);

    let path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.settings().solutions_path(&ctx.project_dir));
    let model_hash = ctx.container.catalog.model_hash(&ctx.catalog_path)?;
    ctx.container.store.save(&set, &model_hash, &path)?;
    output::success(&format!(
        "saved {} solutions to {}",
        set.len(),
        path.display()
    ));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_check(ctx: &Context, path: Option<&Path>) -> CliResult<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.settings().solutions_path(&ctx.project_dir));
    if !ctx.container.fs.exists(&path) {
        return Err(CliError::Usage(format!(
            "no solutions file at {}, run `trimtree save` first",
            path.display()
        )));
    }
    let model_hash = ctx.container.catalog.model_hash(&ctx.catalog_path)?;
    let stored = ctx.container.store.load(&path, &model_hash)?;
    if stored.outdated {
        output::warning(&format!(
            "catalog changed since {} was written ({} -> {})",
            path.display(),
            stored.model_hash,
            model_hash
        ));
    } else {
        output::success(&format!("{} matches the catalog", path.display()));
    }

    let tree = ctx.catalog(&FixArgs::default())?;
    let mut iter = SolutionIterator::new(&tree);
    let fresh = SolutionSet::collect(&mut iter);

    let mut solutions = stored.solutions;
    for solution in solutions.iter().filter(|s| !fresh.contains(&s.hash)) {
        output::diff_remove(&format_solution(ctx.settings(), solution));
    }
    for solution in fresh.iter().filter(|s| !solutions.contains(&s.hash)) {
        output::diff_add(&format_solution(ctx.settings(), solution));
    }
    let report = solutions.reconcile(&fresh);
    if report.is_unchanged() {
        output::success_detail("solutions are current");
    } else {
        output::detail(&format!(
            "{} added, {} removed",
            report.added, report.removed
        ));
    }
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_add(ctx: &Context, parent: &str, name: &str, kind: KindArg, price: Price) -> CliResult<()> {
    ctx.edit(parent, |tree, id| {
        editing::add(tree, id, name, kind.into(), price).map(|_| ())
    })?;
    output::success(&format!("added {}/{}", parent, name.trim()));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_remove(ctx: &Context, path: &str) -> CliResult<()> {
    ctx.edit(path, editing::remove)?;
    output::success(&format!("removed {}", path));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_rename(ctx: &Context, path: &str, name: &str) -> CliResult<()> {
    ctx.edit(path, |tree, id| editing::rename(tree, id, name))?;
    output::success(&format!("renamed {} to {}", path, name.trim()));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_reprice(ctx: &Context, path: &str, price: Price) -> CliResult<()> {
    ctx.edit(path, |tree, id| editing::reprice(tree, id, price).map(|_| ()))?;
    output::success(&format!(
        "{} now costs {}",
        path,
        ctx.settings().format_price(price)
    ));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_kind(ctx: &Context, path: &str, kind: KindArg) -> CliResult<()> {
    ctx.edit(path, |tree, id| editing::change_kind(tree, id, kind.into()))?;
    output::success(&format!("{} is now {:?}", path, NodeKind::from(kind)));
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
fn cmd_demo(ctx: &Context, output_path: Option<&Path>) -> CliResult<()> {
    let path = output_path.unwrap_or(ctx.catalog_path.as_path());
    if ctx.container.fs.exists(path) {
        return Err(CliError::Usage(format!(
            "{} already exists",
            path.display()
        )));
    }
    let tree = demo_catalog();
    ctx.container.catalog.save(&tree, path)?;
    output::success(&format!("demo catalog written to {}", path.display()));
    Ok(())
}

fn cmd_config(ctx: &Context, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header("Effective configuration");
            output::info(&ctx.settings().to_toml()?);
        }
        ConfigCommands::Path => {
            let describe = |path: &Path| {
                let state = if path.exists() { "" } else { " (missing)" };
                format!("{}{}", path.display(), state)
            };
            match global_config_path() {
                Some(path) => output::action("global", &describe(&path)),
                None => output::action("global", "unavailable"),
            }
            output::action("project", &describe(&project_config_path(&ctx.project_dir)));
            output::action("catalog", &describe(&ctx.catalog_path));
        }
    }
    Ok(())
}
