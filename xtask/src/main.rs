use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for retro-host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only video module tests
        #[arg(long)]
        video: bool,
        /// Run only plugin tests
        #[arg(long)]
        plugin: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Run benchmarks
    Bench,
    /// Run a core with content
    Run {
        /// Path to the core module
        core: String,
        /// Path to the content file
        content: String,
        /// Build in release mode
        #[arg(long)]
        release: bool,
        /// Log filter passed as RUST_LOG
        #[arg(long)]
        log: Option<String>,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            video,
            plugin,
            integration,
        } => run_test(doc, ignored, video, plugin, integration),
        Commands::Bench => run_bench(),
        Commands::Run {
            core,
            content,
            release,
            log,
        } => run_core(&core, &content, release, log.as_deref()),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task(
        "Test",
        || run_test(false, false, false, false, false),
        verbose,
    )?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--all-targets");
    feature_args(&mut cmd);

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn feature_args(cmd: &mut Command) {
    // CI runners have no ALSA headers, so skip the audio feature there
    if std::env::var("CI").is_ok() {
        cmd.arg("--no-default-features");
    } else {
        cmd.arg("--all-features");
    }
}

fn run_test(doc: bool, ignored: bool, video: bool, plugin: bool, integration: bool) -> Result<()> {
    if doc {
        let mut cmd = Command::new("cargo");
        cmd.arg("test");
        feature_args(&mut cmd);
        cmd.arg("--doc");

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    let suites: [(bool, &str, &[&str]); 3] = [
        (video, "Video", &["--lib", "video"]),
        (plugin, "Plugin", &["--lib", "plugin"]),
        (
            integration,
            "Integration",
            &[
                "--test",
                "host_lifecycle",
                "--test",
                "negotiation",
                "--test",
                "presentation",
            ],
        ),
    ];
    let selected = suites.iter().filter(|(enabled, _, _)| *enabled).count();

    if selected == 0 {
        let mut cmd = Command::new("cargo");
        cmd.arg("test");
        feature_args(&mut cmd);

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    let mut failed = Vec::new();

    for (enabled, name, args) in suites {
        if !enabled {
            continue;
        }

        println!("{} Running {} tests...", "→".blue(), name.bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test");
        feature_args(&mut cmd);
        cmd.args(args);

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        match execute_command(&mut cmd) {
            Ok(_) => println!("{} {} tests passed\n", "✓".green(), name),
            Err(e) => {
                println!("{} {} tests failed\n", "✗".red(), name);
                if selected == 1 {
                    return Err(e);
                }
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Test suites failed: {}", failed.join(", "))
    }
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    execute_command(&mut cmd)
}

fn run_core(core: &str, content: &str, release: bool, log: Option<&str>) -> Result<()> {
    use std::path::Path;

    println!("{}", "=== Run Core ===".bold().blue());

    for (label, path) in [("Core", core), ("Content", content)] {
        if !Path::new(path).exists() {
            println!(
                "{} {} not found: {}",
                "✗".red().bold(),
                label,
                path.yellow()
            );
            anyhow::bail!("{} not found: {}", label, path);
        }
        println!("{} {}: {}", "✓".green(), label, path.cyan());
    }

    let library_ext = std::env::consts::DLL_EXTENSION;
    if !core.ends_with(library_ext) {
        println!(
            "{} Core does not have a .{} extension",
            "⚠".yellow().bold(),
            library_ext
        );
    }

    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run");

    if release {
        cmd.arg("--release");
    }
    if let Some(filter) = log {
        cmd.env("RUST_LOG", filter);
    }

    cmd.arg("--").arg(core).arg(content);

    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        println!("\n{} Host exited with an error", "✗".red().bold());
        anyhow::bail!("Host failed with exit code: {}", status);
    }

    println!(
        "\n{} Session ended after {}",
        "✓".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );

    Ok(())
}

fn run_pre_commit() -> Result<()> {
    println!("{}", "=== Pre-commit Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), false)?;
    run_task("Clippy", || run_clippy(false), false)?;
    run_task(
        "Test",
        || run_test(false, false, false, false, false),
        false,
    )?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Pre-commit checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = r#"#!/bin/sh
# Auto-generated by cargo x install-hooks
set -e

echo "Running pre-commit checks..."
cargo x pre-commit
"#;

    let hook_path = ".git/hooks/pre-commit";
    fs::write(hook_path, hook_content)?;

    // Make executable (Unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    println!("  Pre-commit hook will run: fmt, clippy, test");

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
