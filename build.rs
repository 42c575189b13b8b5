use clap::CommandFactory;
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::io::Result;
use std::path::PathBuf;

#[path = "src/cli.rs"]
mod cli;

use cli::Cli;

fn generate_completions(outdir: &std::ffi::OsString) -> Result<()> {
    let mut cmd = Cli::command();
    for shell in [Shell::Bash, Shell::Fish, Shell::Zsh, Shell::PowerShell] {
        generate_to(shell, &mut cmd, "kumascrape", outdir)?;
    }
    Ok(())
}

fn render_page(cmd: clap::Command, title: &str, path: PathBuf) -> Result<()> {
    let mut buffer = Vec::new();
    Man::new(cmd).title(title).render(&mut buffer)?;
    fs::write(path, buffer)
}

/// One page for the binary and one per subcommand, `kumascrape-scrape.1` etc.
fn generate_man_pages() -> Result<()> {
    let out_dir = PathBuf::from("target/man");
    fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    render_page(cmd.clone(), "kumascrape", out_dir.join("kumascrape.1"))?;

    for subcommand in cmd.get_subcommands() {
        if subcommand.get_name() == "help" {
            continue;
        }
        let name = format!("kumascrape-{}", subcommand.get_name());
        render_page(subcommand.clone(), &name, out_dir.join(format!("{name}.1")))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    if let Some(outdir) = env::var_os("OUT_DIR") {
        generate_completions(&outdir)?;
    }

    generate_man_pages()?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
