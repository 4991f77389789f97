use clap::{Parser, Subcommand};
use markheim::config::{self, ConfigResolver};
use markheim::{clean, generate, output};
use std::path::PathBuf;

mod logging;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "markheim")]
#[command(about = "Static site builder with Jekyll-style front matter and layouts")]
#[command(long_about = "\
Static site builder with Jekyll-style front matter and layouts

Configuration cascades through four layers, later layers winning:

  1. system defaults            (markheim gen-config prints them)
  2. generator defaults         (front matter rules for the generator)
  3. generator native defaults  (paths, markdown_ext, keep_files, ...)
  4. _config.yml                (in the site root)

Site structure:

  site/
  ├── _config.yml          # User config (required)
  ├── _layouts/            # Layouts: `layout: post` → _layouts/post.html
  ├── _includes/           # Partials for {% include %}
  ├── _posts/              # 2024-03-01-hello.md → site.posts
  ├── index.html           # Front matter → rendered; no front matter → copied
  └── about.md             # Markdown → about.html

Front matter keys are split into page variables (page.*) and internals
(layout, permalink, published) that templates never see.")]
#[command(version = version_string())]
struct Cli {
    /// Site root containing the user config file
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the destination, then render and copy the site into it
    Build,
    /// Remove everything in the destination except keep_files
    Clean,
    /// Print the resolved configuration as JSON
    Config,
    /// Print the documented system defaults
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Build => {
            let config = ConfigResolver::new().resolve(&cli.root)?;
            let report = generate::build(&config)?;
            output::print_build_report(&report);
            println!("==> Build complete: {}", config.paths().destination.display());
            if !report.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Clean => {
            let config = ConfigResolver::new().resolve(&cli.root)?;
            let report = clean::clean(
                &config.paths().destination,
                &config.settings().keep_files,
            )?;
            output::print_clean_report(&report);
        }
        Command::Config => {
            let config = ConfigResolver::new().resolve(&cli.root)?;
            println!("{}", serde_json::to_string_pretty(config.values())?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config());
        }
    }

    Ok(())
}
