//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::IoResultExt;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{DomainError, EntryOrigin, VisibilityFilter};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    debug!("project_dir: {}", project_dir.display());

    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .with_path_context("print help", &project_dir)?;
        return Ok(());
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(command, &project_dir),
        _ => {
            let settings = Settings::load(Some(&project_dir))?;
            let container = ServiceContainer::new(settings)?;
            match command {
                Commands::Symbols {
                    package: pkg,
                    visibility,
                    skip_undoc,
                } => cmd_symbols(&container, &project_dir.join(pkg), *visibility, *skip_undoc),
                Commands::Docs {
                    package: pkg,
                    visibility,
                    missing,
                    check,
                } => cmd_docs(&container, &project_dir.join(pkg), *visibility, *missing, *check),
                Commands::Tree { package: pkg } => cmd_tree(&container, &project_dir.join(pkg)),
                Commands::Check { package: pkg } => cmd_check(&container, &project_dir.join(pkg)),
                Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
            }
        }
    }
}

fn resolve_project_dir(project_dir: Option<&Path>) -> CliResult<PathBuf> {
    match project_dir {
        Some(dir) if dir.is_dir() => Ok(dir.to_path_buf()),
        Some(dir) => Err(CliError::InvalidArgs(format!(
            "project directory does not exist: {}",
            dir.display()
        ))),
        None => Ok(std::env::current_dir().with_path_context("current dir", Path::new("."))?),
    }
}

#[instrument(skip(container))]
fn cmd_symbols(
    container: &ServiceContainer,
    package: &Path,
    visibility: Option<VisibilityFilter>,
    skip_undoc: bool,
) -> CliResult<()> {
    let settings = &container.settings;
    let filter = visibility.unwrap_or(settings.visibility);
    let skip_undoc = skip_undoc || settings.skip_undoc;

    let tree = container.inventory().load(package, &settings.exclude)?;
    let entries = container.inventory().symbols(&tree, filter, skip_undoc)?;

    let width = entries
        .iter()
        .map(|e| e.qualified_name.len())
        .max()
        .unwrap_or(0);
    for entry in &entries {
        let line = format!(
            "{:<width$}  {:<8}  {}",
            entry.qualified_name,
            entry.kind().as_str(),
            entry.visibility,
        );
        match &entry.origin {
            EntryOrigin::Defined => output::info(&line),
            EntryOrigin::Reexported { from } => output::info(&format!("{line}  <- {from}")),
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_docs(
    container: &ServiceContainer,
    package: &Path,
    visibility: Option<VisibilityFilter>,
    missing: bool,
    check: bool,
) -> CliResult<()> {
    let settings = &container.settings;
    let filter = visibility.unwrap_or(settings.visibility);

    let tree = container.inventory().load(package, &settings.exclude)?;
    let report = container.inventory().documentation(&tree, filter)?;

    if missing {
        for name in report.undocumented() {
            output::info(name);
        }
    } else {
        let width = report.presence.keys().map(String::len).max().unwrap_or(0);
        for (name, presence) in &report.presence {
            output::info(&format!(
                "{name:<width$}  doc {}  example {}",
                output::mark(presence.has_doc),
                output::mark(presence.has_example),
            ));
        }
    }
    output::header(&report.coverage);

    let undocumented = report.coverage.undocumented();
    if check && undocumented > 0 {
        return Err(CliError::Undocumented(undocumented));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, package: &Path) -> CliResult<()> {
    let tree = container
        .inventory()
        .load(package, &container.settings.exclude)?;
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, package: &Path) -> CliResult<()> {
    let tree = container
        .inventory()
        .load(package, &container.settings.exclude)?;
    let errors = tree.validate();

    if errors.is_empty() {
        output::success(&format!("all re-exports resolve in {} packages", tree.len()));
        return Ok(());
    }

    for err in &errors {
        output::failure(err);
    }
    let packages = errors
        .iter()
        .map(|DomainError::Reference { package, .. }| package.as_str())
        .unique()
        .join(", ");
    output::warning(&format!("affected packages: {packages}"));
    Err(CliError::UnresolvedReexports(errors.len()))
}

fn cmd_config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let describe =
                |path: &Path| format!("{} {}", path.display(), output::mark(path.exists()));
            match global_config_path() {
                Some(path) => output::action("global", &describe(&path)),
                None => output::action("global", "(no config directory)"),
            }
            output::action("local", &describe(&local_config_path(project_dir)));
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(project_dir)
            };

            let fs = RealFileSystem;
            if fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            fs.ensure_parent(&path)
                .with_path_context("create config directory", &path)?;
            fs.write(&path, &Settings::template())
                .with_path_context("write config", &path)?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}
