//! Development tasks for step-paster
//!
//! Usage:
//!   cargo xtask install     Install release binary and man pages under /usr/local (requires sudo)
//!   cargo xtask uninstall   Remove the installed binary and man pages (requires sudo)
//!   cargo xtask dist        Build release binary and man pages into dist/

use anyhow::Context;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

const BINARY: &str = "step-paster";
const BIN_DIR: &str = "/usr/local/bin";
const MAN_DIR: &str = "/usr/local/share/man/man1";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(command) = args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let result = match command.as_str() {
        "install" => install(),
        "uninstall" => uninstall(),
        "dist" => dist().map(|_| ()),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
            Err(anyhow::anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        r#"
step-paster development tasks

Usage: cargo xtask <COMMAND>

Commands:
  install    Build release binary and install to {bin} (requires sudo)
  uninstall  Remove step-paster and its man pages (requires sudo)
  dist       Build release binary and man pages into dist/
"#,
        bin = BIN_DIR
    );
}

/// Get the project root directory
fn project_root() -> anyhow::Result<PathBuf> {
    let dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir().context("cannot determine current directory")?,
    };

    // xtask is in a subdirectory, go up one level
    Ok(dir.parent().unwrap_or(&dir).to_path_buf())
}

/// Release build with man page generation switched on
fn build_release(root: &Path) -> anyhow::Result<()> {
    println!("==> Building release binary...");

    let status = Command::new("cargo")
        .args(["build", "--release", "--bin", BINARY])
        .env("STEP_PASTER_GEN_MANPAGES", "1")
        .current_dir(root)
        .status()?;

    if !status.success() {
        anyhow::bail!("Build failed");
    }
    Ok(())
}

/// Man pages written by build.rs for the latest release build
fn generated_man_pages(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let build_dir = root.join("target/release/build");
    let mut pages = Vec::new();

    for entry in std::fs::read_dir(&build_dir)
        .with_context(|| format!("reading {}", build_dir.display()))?
    {
        let man_dir = entry?.path().join("out/man");
        if !man_dir.is_dir() {
            continue;
        }
        for page in std::fs::read_dir(&man_dir)? {
            let page = page?.path();
            if page.extension().is_some_and(|ext| ext == "1") {
                pages.push(page);
            }
        }
    }

    Ok(pages)
}

/// Build release binary and install to /usr/local
fn install() -> anyhow::Result<()> {
    let root = project_root()?;
    build_release(&root)?;

    let binary = root.join("target/release").join(BINARY);
    if !binary.exists() {
        anyhow::bail!("Binary not found at {:?}", binary);
    }

    let target = format!("{}/{}", BIN_DIR, BINARY);
    println!("==> Installing to {}...", target);

    let status = Command::new("sudo")
        .arg("install")
        .arg("-Dm755")
        .arg(&binary)
        .arg(&target)
        .status()?;

    if !status.success() {
        anyhow::bail!("Install failed (sudo required)");
    }

    for page in generated_man_pages(&root)? {
        let Some(name) = page.file_name() else {
            continue;
        };
        let status = Command::new("sudo")
            .arg("install")
            .arg("-Dm644")
            .arg(&page)
            .arg(Path::new(MAN_DIR).join(name))
            .status()?;
        if !status.success() {
            anyhow::bail!("Installing man page {:?} failed", name);
        }
    }

    println!("==> Installed successfully!");
    let _ = Command::new(&target).arg("--version").status();

    Ok(())
}

/// Remove step-paster and its man pages
fn uninstall() -> anyhow::Result<()> {
    let target = format!("{}/{}", BIN_DIR, BINARY);
    println!("==> Removing {}...", target);

    let status = Command::new("sudo")
        .args(["rm", "-f", &target])
        .status()?;

    if !status.success() {
        anyhow::bail!("Uninstall failed (sudo required)");
    }

    let pages = format!("{}/{}*.1", MAN_DIR, BINARY);
    let _ = Command::new("sudo")
        .args(["sh", "-c", &format!("rm -f {}", pages)])
        .status();

    println!("==> Uninstalled successfully!");
    Ok(())
}

/// Build release binary and man pages into dist/
fn dist() -> anyhow::Result<PathBuf> {
    let root = project_root()?;
    build_release(&root)?;

    let dist = root.join("dist");
    std::fs::create_dir_all(dist.join("man"))?;

    let binary = root.join("target/release").join(BINARY);
    std::fs::copy(&binary, dist.join(BINARY))
        .with_context(|| format!("copying {}", binary.display()))?;

    for page in generated_man_pages(&root)? {
        if let Some(name) = page.file_name() {
            std::fs::copy(&page, dist.join("man").join(name))?;
        }
    }

    println!("==> Built: {}", dist.display());
    let _ = Command::new(dist.join(BINARY)).arg("--version").status();

    Ok(dist)
}
