//! `kiln dev`: build in development mode, serve and rebuild on change.

use crate::cli::DevArgs;
use crate::cli::enums::ModeArg;
use crate::config::{CliOverrides, DevServerOverrides, ProjectConfig};
use crate::dev::{
    DEFAULT_IGNORES, DevRunner, DevServer, DevServerState, FileChange, FileWatcher, SharedState,
};
use crate::error::{CliError, Result};
use crate::ui;
use kiln_config::KilnConfig;
use kiln_pipeline::{BuildMode, OutputResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

/// Execute the dev command.
///
/// Runs an initial development build, starts the server and, unless
/// watching is off, rebuilds whenever a project file changes. A change to
/// the config file reloads the configuration before rebuilding. Build
/// failures never stop the server; they are shown in the terminal and, with
/// the overlay on, in the browser.
///
/// # Errors
///
/// Fails on `--mode production`, on configuration errors, or if the server
/// or the watcher cannot start.
pub async fn execute(args: DevArgs) -> Result<()> {
    if matches!(args.mode, Some(ModeArg::Production)) {
        return Err(CliError::InvalidArgument(
            "kiln dev only runs in development mode; use 'kiln build --mode production'".into(),
        ));
    }

    let overrides = dev_overrides(&args);
    let mut project = ProjectConfig::load(&args.project, &overrides)?;
    let dev = project.config.dev_server_or_default();
    ui::info(&format!(
        "Starting development server for '{}' ({})",
        project.config.name,
        project.source_display()
    ));

    let state: SharedState = Arc::new(DevServerState::new(dev.clone()));
    let mut runner = dev_runner(&project, dev.write_to_disk)?;

    ui::info("Performing initial build...");
    runner.rebuild(&state).await;

    let config_file = project
        .source
        .as_ref()
        .map(|source| source.canonicalize().unwrap_or_else(|_| source.clone()));

    let (_watcher, mut change_rx) = if dev.watch {
        let ignores = watch_ignores(&project.root, &project.config);
        let (watcher, rx) = FileWatcher::new(project.root.clone(), ignores, dev.debounce_ms)?;
        ui::info(&format!("Watching for changes in {}", watcher.root().display()));
        (Some(watcher), Some(rx))
    } else {
        (None, None)
    };

    let content_base = match &dev.content_base {
        Some(base) => project.root.join(base),
        None => project.root.clone(),
    };
    let server = DevServer::new(state.clone(), content_base);
    let url = format!("http://{}", server.address());
    let mut server_handle = tokio::spawn(server.start());

    if args.open {
        open_browser(&url);
    }
    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = next_change(&mut change_rx) => {
                ui::info(&format!("Changed: {}", display_path(change.path(), &project.root)));

                if config_file.as_deref() == Some(change.path()) {
                    match reload(&args, &overrides) {
                        Ok((reloaded, reloaded_runner)) => {
                            project = reloaded;
                            runner = reloaded_runner;
                            ui::success("Configuration reloaded");
                        }
                        Err(err) => {
                            ui::error(&format!("Keeping previous configuration: {err}"));
                            continue;
                        }
                    }
                }

                let runner = runner.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    runner.rebuild(&state).await;
                });
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            joined = &mut server_handle => {
                return match joined {
                    Ok(Ok(())) => Err(CliError::Server("server stopped unexpectedly".into())),
                    Ok(Err(err)) => Err(err),
                    Err(err) => Err(CliError::Server(format!("server task failed: {err}"))),
                };
            }
        }
    }

    ui::success("Development server stopped");
    Ok(())
}

fn dev_overrides(args: &DevArgs) -> CliOverrides {
    let dev_server = DevServerOverrides {
        host: args.host.clone(),
        port: args.port,
        watch: args.no_watch.then_some(false),
        overlay: args.no_overlay.then_some(false),
        write_to_disk: args.write_to_disk.then_some(true),
    };

    CliOverrides {
        mode: Some(BuildMode::Development),
        dev_server: (!dev_server.is_empty()).then_some(dev_server),
        ..Default::default()
    }
}

fn dev_runner(project: &ProjectConfig, write_to_disk: bool) -> Result<DevRunner> {
    let config = project.materialize(BuildMode::Development)?;
    Ok(DevRunner::new(config, project.root.clone(), write_to_disk))
}

fn reload(args: &DevArgs, overrides: &CliOverrides) -> Result<(ProjectConfig, DevRunner)> {
    let project = ProjectConfig::load(&args.project, overrides)?;
    let dev = project.config.dev_server_or_default();
    let runner = dev_runner(&project, dev.write_to_disk)?;
    Ok((project, runner))
}

/// Ignore list for the watcher: the defaults, both output directories and
/// the configured `devServer.watchIgnore` entries.
pub fn watch_ignores(root: &Path, config: &KilnConfig) -> Vec<String> {
    let mut ignores: Vec<String> = DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect();

    let resolver = OutputResolver::new(config.output.clone(), config.name.clone());
    for mode in BuildMode::ALL {
        let path = &resolver.resolve(mode).path;
        let relative = if path.is_absolute() {
            match path.strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            }
        } else {
            path.clone()
        };
        let pattern = relative.to_string_lossy().replace('\\', "/");
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/').to_string();
        if !pattern.is_empty() && pattern != "." && !ignores.contains(&pattern) {
            ignores.push(pattern);
        }
    }

    if let Some(dev) = &config.dev_server {
        ignores.extend(dev.watch_ignore.iter().cloned());
    }
    ignores
}

async fn next_change(rx: &mut Option<mpsc::Receiver<FileChange>>) -> Option<FileChange> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {url}")),
        Err(e) => ui::warning(&format!("Failed to open browser: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use kiln_config::DevServerConfig;

    fn dev_args(argv: &[&str]) -> DevArgs {
        let mut full = vec!["kiln", "dev"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Dev(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_dev_overrides_only_given_flags() {
        let overrides = dev_overrides(&dev_args(&[]));
        assert_eq!(overrides.mode, Some(BuildMode::Development));
        assert!(overrides.dev_server.is_none());

        let overrides = dev_overrides(&dev_args(&["--port", "9000", "--no-watch"]));
        let dev = overrides.dev_server.unwrap();
        assert_eq!(dev.port, Some(9000));
        assert_eq!(dev.watch, Some(false));
        assert_eq!(dev.overlay, None);
    }

    #[test]
    fn test_watch_ignores_include_output_dirs() {
        let mut config = KilnConfig::default();
        config.dev_server = Some(DevServerConfig {
            watch_ignore: vec!["*.tmp".into()],
            ..Default::default()
        });

        let ignores = watch_ignores(Path::new("/project"), &config);

        assert!(ignores.iter().any(|i| i == "node_modules"));
        assert!(ignores.iter().any(|i| i == "*.tmp"));
        let resolver = OutputResolver::new(config.output.clone(), config.name.clone());
        let dev_out = resolver.resolve(BuildMode::Development).path.to_string_lossy().to_string();
        let dev_out = dev_out.trim_start_matches("./").trim_end_matches('/');
        assert!(ignores.iter().any(|i| i == dev_out));
    }

    #[tokio::test]
    async fn test_production_mode_rejected() {
        let err = execute(dev_args(&["--mode", "production"])).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
