//! Generate command implementation
//!
//! The generate command runs the full pipeline:
//! 1. Building the tag catalog and the adjacent patch chain
//! 2. Composing every ordered tag pair in parallel
//! 3. Rendering the index and change list pages
//! 4. Pulling raw file contents per tag
//! 5. Staging static assets
//! 6. Writing the site to the output directory

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;

use super::RepoArgs;
use tag_compare::defaults::DEFAULT_OUTPUT;
use tag_compare::output::{emoji, OutputConfig, TerminalProgress};
use tag_compare::phases::orchestrator;
use tag_compare::phases::SiteSettings;
use tag_compare::suggestions;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Copy static assets from this directory instead of the built-in ones
    #[arg(long, value_name = "DIR", env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Worker threads for composing pairs and pulling contents (defaults to CPU count)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<NonZeroUsize>,

    /// Do not copy file contents into the site
    #[arg(long)]
    pub no_content: bool,

    /// Leave files matching this glob out of the copied contents (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Also write every change list as JSON under changes/
    #[arg(long)]
    pub json: bool,

    /// Base URL the index page loads change lists from
    #[arg(long, value_name = "URL", default_value = "./files/")]
    pub diff_base_url: String,

    /// Base URL the diff view loads file contents from
    #[arg(long, value_name = "URL", default_value = "./content/")]
    pub content_base_url: String,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl GenerateArgs {
    fn settings(&self) -> Result<SiteSettings> {
        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| suggestions::invalid_glob(pattern, &e))?;
        }

        Ok(SiteSettings {
            output: self.output.clone(),
            static_dir: self.static_dir.clone(),
            jobs: self.jobs,
            policy: self.repo.policy(),
            tag_filter: self.repo.filter()?,
            pull_content: !self.no_content,
            exclude: self.exclude.clone(),
            json: self.json,
            diff_base_url: with_trailing_slash(&self.diff_base_url),
            content_base_url: with_trailing_slash(&self.content_base_url),
        })
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Execute the generate command
pub fn execute(args: GenerateArgs, output: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();
    let settings = args.settings()?;

    if !args.quiet {
        println!("{} Tag Compare Generate", emoji(output, "🔍", "[GENERATE]"));
        println!();
    }

    let provider = args.repo.open()?;
    let progress = TerminalProgress::new(args.quiet);

    match orchestrator::execute_generate(&provider, &settings, &progress) {
        Ok(report) => {
            if !args.quiet {
                println!(
                    "{} Generated in {:.2}s",
                    emoji(output, "✅", "[OK]"),
                    start_time.elapsed().as_secs_f64()
                );
                println!("   {} tags, {} tag pairs", report.tags, report.pairs);
                println!(
                    "   {} files written to: {}",
                    report.files,
                    settings.output.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            if !args.quiet {
                println!("{} Generate failed", emoji(output, "❌", "[FAILED]"));
                println!();
            }
            Err(suggestions::with_hints(e, &[]))
        }
    }
}
