//! # Tags Command Implementation
//!
//! This module implements the `tags` subcommand, which prints the tag
//! catalog of a repository, newest first, with each tag's ordinal and
//! commit.
//!
//! Tags whose name carries no version ordinal are marked as demoted. This
//! command is read-only.

use anyhow::Result;
use clap::Args;

use super::RepoArgs;
use tag_compare::catalog::Tag;
use tag_compare::output::OutputConfig;

/// List the tags of a repository in version order
#[derive(Args, Debug)]
pub struct TagsArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `tags` command.
pub fn execute(args: TagsArgs, output: &OutputConfig) -> Result<()> {
    let (_, catalog) = args.repo.catalog()?;
    let tags: Vec<&Tag> = catalog.descending().collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    for tag in tags {
        println!("{}", format_tag(tag, output));
    }
    Ok(())
}

fn format_tag(tag: &Tag, output: &OutputConfig) -> String {
    let short = tag.commit.get(..12).unwrap_or(&tag.commit);
    let ordinal = if tag.demoted {
        let marker = "demoted";
        if output.use_color {
            console::style(marker).dim().to_string()
        } else {
            marker.to_string()
        }
    } else {
        tag.ordinal.to_string()
    };
    format!("{}\t{}\t{}", tag.name, ordinal, short)
}
