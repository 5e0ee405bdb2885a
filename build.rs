//! Man pages for step-paster
//!
//! Renders `step-paster.1` plus one `step-paster-<command>.1` per
//! subcommand from the clap definitions in `src/cli.rs`. Rendering only
//! happens for release builds or when `STEP_PASTER_GEN_MANPAGES` is set;
//! `cargo xtask install` and `cargo xtask dist` pick the pages up from
//! `$OUT_DIR/man`.

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs::{self, File};
use std::io::Error;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

const BIN: &str = "step-paster";

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=STEP_PASTER_GEN_MANPAGES");

    let release = env::var("PROFILE").map(|p| p == "release").unwrap_or(false);
    if !release && env::var_os("STEP_PASTER_GEN_MANPAGES").is_none() {
        return Ok(());
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target"));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let cmd = Cli::command();
    let mut pages = vec![(BIN.to_string(), cmd.clone())];
    pages.extend(
        cmd.get_subcommands()
            .filter(|sub| sub.get_name() != "help")
            .map(|sub| (format!("{}-{}", BIN, sub.get_name()), sub.clone())),
    );

    for (name, page) in pages {
        render(&man_dir, &name, page)?;
    }

    println!("cargo:warning=Man pages written to {}", man_dir.display());
    Ok(())
}

/// Write `<name>.1` into `dir`
fn render(dir: &Path, name: &str, cmd: clap::Command) -> Result<(), Error> {
    let mut file = File::create(dir.join(format!("{}.1", name)))?;
    Man::new(cmd).render(&mut file)
}
