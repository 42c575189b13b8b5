use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;

use kumascrape::config::{Config, OutputFormat};
use kumascrape::issues::render_issues;
use kumascrape::{Grammar, Severity, scrape};

mod cli;
use cli::{Cli, Commands, Format, GrammarName};

fn read_all(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn start_dir_for(input_path: &Option<PathBuf>) -> io::Result<PathBuf> {
    if let Some(p) = input_path {
        Ok(p.parent().unwrap_or(Path::new(".")).to_path_buf())
    } else {
        std::env::current_dir()
    }
}

fn load_config(explicit: Option<&Path>, file: &Option<PathBuf>) -> io::Result<Config> {
    let start_dir = start_dir_for(file)?;
    let (cfg, cfg_path) = kumascrape::config::load(explicit, &start_dir)?;

    if let Some(path) = &cfg_path {
        log::debug!("Using config from: {}", path.display());
    } else {
        log::debug!("Using default config");
    }
    Ok(cfg)
}

fn grammar_for(name: GrammarName) -> Grammar {
    match name {
        GrammarName::Html => Grammar::HTML,
        GrammarName::Kumascript => Grammar::KUMASCRIPT,
        GrammarName::Feature => Grammar::COMPAT_FEATURE,
        GrammarName::Support => Grammar::COMPAT_SUPPORT,
        GrammarName::Footnote => Grammar::COMPAT_FOOTNOTE,
    }
}

fn display_name(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

fn print_issues(input: &str, issues: &[kumascrape::Issue], cfg: &Config, file: &Option<PathBuf>) {
    let rendered = render_issues(
        input,
        issues,
        Some(&display_name(file)),
        cfg.min_severity.into(),
        cfg.context,
    );
    print!("{rendered}");
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            file,
            locale,
            data,
            format,
        } => {
            let mut cfg = load_config(cli.config.as_deref(), &file)?;
            if let Some(locale) = locale {
                cfg.locale = locale;
            }
            if data.is_some() {
                cfg.data = data;
            }
            if let Some(format) = format {
                cfg.output = match format {
                    Format::Json => OutputFormat::Json,
                    Format::Issues => OutputFormat::Issues,
                };
            }

            let input = read_all(file.as_ref())?;
            let result = scrape(&input, Some(cfg.clone())).map_err(io::Error::other)?;

            match cfg.output {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&result).map_err(io::Error::other)?;
                    println!("{json}");
                }
                OutputFormat::Issues => {
                    if result.issues.is_empty() {
                        println!("No issues found");
                    } else {
                        print_issues(&input, &result.issues, &cfg, &file);
                    }
                }
            }
            Ok(())
        }
        Commands::Check { file } => {
            let cfg = load_config(cli.config.as_deref(), &file)?;
            let input = read_all(file.as_ref())?;
            let result = scrape(&input, Some(cfg.clone())).map_err(io::Error::other)?;

            if result.issues.is_empty() {
                println!("No issues found");
                return Ok(());
            }

            print_issues(&input, &result.issues, &cfg, &file);
            println!("Found {} issue(s)", result.issues.len());

            if result
                .issues
                .iter()
                .any(|issue| issue.severity() >= Severity::Error)
            {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Parse { file, grammar } => {
            let input = read_all(file.as_ref())?;
            match grammar_for(grammar).parse(&input) {
                Ok(tree) => {
                    println!("{:#?}", tree);
                    Ok(())
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
    }
}
