//! nbdocs - Jupyter notebook to MDX converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nbdocs::convert::find_notebooks;
use nbdocs::{ConvertConfig, Converter, GithubRepo, Layout, PaginationMode};

#[derive(Parser)]
#[command(name = "nbdocs")]
#[command(version, about = "Jupyter notebook to MDX converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    nbdocs convert docs/intro.ipynb .     Convert one notebook
    nbdocs all .                          Convert every notebook under .
    nbdocs all . --dry-run                List notebooks without converting")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single notebook
    Convert {
        /// Notebook to convert
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,

        /// Project root (asset store and edit URLs are relative to it)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,
    },
    /// Convert every notebook under a directory
    All {
        /// Project root to scan
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// List the notebooks that would be converted
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
struct Options {
    /// GitHub user or organization for edit links
    #[arg(long, global = true, requires = "github_repo")]
    github_user: Option<String>,

    /// GitHub repository for edit links
    #[arg(long, global = true, requires = "github_user")]
    github_repo: Option<String>,

    /// Branch used in edit links
    #[arg(long, global = true, default_value = "main")]
    branch: String,

    /// Reject misplaced or repeated pagebreak markers
    #[arg(long, global = true)]
    strict: bool,

    /// Do not write .gitignore entries for generated files
    #[arg(long, global = true)]
    no_ignore_files: bool,
}

impl Options {
    fn to_config(&self) -> ConvertConfig {
        let mut config = ConvertConfig::new().with_ignore_files(!self.no_ignore_files);
        if let (Some(user), Some(repo)) = (&self.github_user, &self.github_repo) {
            config = config.with_github(GithubRepo::new(user, repo).with_branch(&self.branch));
        }
        if self.strict {
            config = config.with_pagination(PaginationMode::Strict);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let converter = Converter::new().with_config(cli.options.to_config());
    let result = match &cli.command {
        Command::Convert { notebook, root } => convert(&converter, notebook, root),
        Command::All { root, dry_run } => convert_all(&converter, root, *dry_run),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn convert(converter: &Converter, notebook: &Path, root: &Path) -> Result<(), String> {
    let conversion = converter
        .convert(notebook, root)
        .map_err(|e| e.to_string())?;

    let layout = match conversion.layout {
        Layout::SinglePage => "single page",
        Layout::MultiPage => "multi page",
    };
    println!(
        "{} ({layout}): {} file(s) written",
        notebook.display(),
        conversion.outputs.len()
    );
    if !conversion.skipped_sections.is_empty() {
        return Err(format!(
            "sections {:?} failed to render",
            conversion.skipped_sections
        ));
    }
    Ok(())
}

fn convert_all(converter: &Converter, root: &Path, dry_run: bool) -> Result<(), String> {
    if dry_run {
        for path in find_notebooks(root) {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let stats = converter.convert_all(root).map_err(|e| e.to_string())?;
    println!(
        "{}/{} notebooks converted, {} file(s) written in {:.2?}",
        stats.success, stats.total, stats.files_created, stats.elapsed
    );
    for (path, message) in &stats.failures {
        println!("  FAILED {}: {message}", path.display());
    }

    if stats.failed > 0 {
        Err(format!("{} notebook(s) failed", stats.failed))
    } else {
        Ok(())
    }
}
