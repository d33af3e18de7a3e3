use crate::{
    acquire,
    decide::{self, Decision, ProceedReason},
    deps::{DependencyChecker, PathChecker},
    desktop::FreedesktopIntegrator,
    install,
    target::{InstallScope, InstallTarget, UserDataDirs, APP_DISPLAY_NAME},
    uninstall::{self, UninstallOutcome},
};
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Install,
    Uninstall,
    Help,
    Version,
}

// Flag combinations resolve once into this struct; nothing downstream
// re-inspects argv.
#[derive(Debug, Clone, Copy)]
struct RunOptions {
    action: Action,
    user_scope: bool,
    force: bool,
    clean: bool,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;

    match options.action {
        Action::Help => {
            print_help();
            Ok(())
        }
        Action::Version => {
            println!("orbit-install v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Action::Install => run_install(options),
        Action::Uninstall => run_uninstall(options),
    }
}

fn parse_args(args: &[String]) -> Result<RunOptions> {
    let mut action = Action::Install;
    let mut user_scope = false;
    let mut force = false;
    let mut clean = false;

    for arg in args {
        match arg.as_str() {
            "--install" | "--update" => action = Action::Install,
            "--uninstall" => action = Action::Uninstall,
            "--user" => user_scope = true,
            "--force" => force = true,
            "--clean" => clean = true,
            "--help" | "-h" => action = Action::Help,
            "--version" | "-V" => action = Action::Version,
            other => bail!("unrecognized option '{other}' (see --help)"),
        }
    }

    Ok(RunOptions {
        action,
        user_scope,
        force,
        clean,
    })
}

fn resolve_scope(options: RunOptions) -> InstallScope {
    if options.user_scope {
        InstallScope::User
    } else {
        InstallScope::System
    }
}

fn run_install(options: RunOptions) -> Result<()> {
    let scope = resolve_scope(options);
    let target = InstallTarget::resolve(scope)?;
    let user_dirs = UserDataDirs::resolve()?;

    if target.requires_elevation() {
        PathChecker.ensure(&["sudo"])?;
    }

    println!("Checking for {APP_DISPLAY_NAME} releases...");
    let check = decide::check_for_update(&target.install_dir, options.force)?;

    let reason = match check.decision {
        Decision::Skip => {
            println!(
                "{APP_DISPLAY_NAME} {} is already up to date.",
                check.installed_version
            );
            return Ok(());
        }
        Decision::Proceed(reason) => reason,
    };

    match reason {
        ProceedReason::Forced => println!(
            "Forcing install of {APP_DISPLAY_NAME} {}.",
            check.metadata.current_version
        ),
        ProceedReason::FreshInstall => println!(
            "Installing {APP_DISPLAY_NAME} {} ({}).",
            check.metadata.current_version,
            scope.label()
        ),
        ProceedReason::Newer => println!(
            "Updating {APP_DISPLAY_NAME} {} -> {}.",
            check.installed_version, check.metadata.current_version
        ),
    }

    let workdir = tempfile::Builder::new()
        .prefix("orbit-install-")
        .tempdir()?;
    println!("Downloading {}...", check.metadata.package_url);
    let payload = acquire::acquire(&check.metadata.package_url, workdir.path())?;

    let integrator = FreedesktopIntegrator {
        desktop_dir: target.desktop_dir.clone(),
    };
    let report = install::install(&payload, &target, &user_dirs, &integrator)?;

    if report.fresh {
        println!(
            "Installed {APP_DISPLAY_NAME} {} to {}.",
            check.metadata.current_version,
            target.install_dir.display()
        );
    } else {
        println!(
            "Updated {APP_DISPLAY_NAME} to {} in {}.",
            check.metadata.current_version,
            target.install_dir.display()
        );
    }
    if let Some(backup_dir) = report.backup_dir {
        println!("User data backed up to {}.", backup_dir.display());
    }
    Ok(())
}

fn run_uninstall(options: RunOptions) -> Result<()> {
    let scope = resolve_scope(options);
    let target = InstallTarget::resolve(scope)?;
    let other = InstallTarget::resolve(scope.other())?;
    let user_dirs = UserDataDirs::resolve()?;

    if target.requires_elevation() {
        PathChecker.ensure(&["sudo"])?;
    }

    let integrator = FreedesktopIntegrator {
        desktop_dir: target.desktop_dir.clone(),
    };
    let outcome = uninstall::uninstall(
        &target,
        Some(&other),
        &user_dirs,
        options.clean,
        &integrator,
    )?;

    match outcome {
        UninstallOutcome::Removed { cleaned } => {
            println!(
                "{APP_DISPLAY_NAME} removed from {}.",
                target.install_dir.display()
            );
            if cleaned {
                println!("User data and caches removed.");
            }
        }
        UninstallOutcome::NotInstalled { other_scope } => {
            println!(
                "{APP_DISPLAY_NAME} is not installed at {}.",
                target.install_dir.display()
            );
            if let Some(found) = other_scope {
                println!(
                    "A {} installation exists; rerun with {}.",
                    found.label(),
                    match found {
                        InstallScope::User => "--user",
                        InstallScope::System => "no --user flag",
                    }
                );
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("orbit-install v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  orbit-install [--install|--update]  Install or update Orbit (default)");
    println!("  orbit-install --uninstall           Remove the Orbit installation");
    println!();
    println!("Options:");
    println!("  --user       Per-user install under ~/.local instead of system-wide");
    println!("  --force      Reinstall even when the installed version is current");
    println!("  --clean      With --uninstall, also remove user data and caches");
    println!("  -h, --help       Show help");
    println!("  -V, --version    Show version");
}
