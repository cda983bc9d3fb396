//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Boolean settings
//!
//! Settings that also live in `.relnote.toml` come as `--x` / `--no-x`
//! pairs. Neither flag means "use the configured value".

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// relnote - changelogs and release records from git history
#[derive(Parser, Debug)]
#[command(name = "relnote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if relnote was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the changelog and release record for a revision range
    #[command(
        name = "changelog",
        after_help = "\
EXAMPLES:
    # Changelog between the two newest tags, published to GitHub
    relnote changelog

    # Explicit range and version, markdown to a file, no remote release
    relnote changelog -p v1.2.0 --rev HEAD -v 1.3.0 \\
        --output-markdown CHANGELOG.md --no-update-release

    # Record the release on the CI build's pipeline activity
    relnote changelog --activity-file .relnote/activity.yaml --build 42"
    )]
    Changelog(ChangelogArgs),

    /// Print the schema document for release records
    Schema,
}

/// Arguments of `relnote changelog`.
#[derive(Args, Debug, Default, Clone)]
pub struct ChangelogArgs {
    /// Exclusive start of the range (default: second-newest tag, else first commit)
    #[arg(short = 'p', long)]
    pub previous_rev: Option<String>,

    /// Inclusive end of the range (default: newest tag, else HEAD)
    #[arg(long)]
    pub rev: Option<String>,

    /// Version being released (default: chart version, else newest tag)
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Application name (default: chart name, else repository name)
    #[arg(long)]
    pub name: Option<String>,

    /// Build number for the activity record (default: $BUILD_NUMBER, else $BUILD_ID)
    #[arg(long)]
    pub build: Option<String>,

    /// Repository URL (default: URL of the default remote)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Do not contact the issue tracker or release store
    #[arg(long)]
    pub offline: bool,

    /// Pipeline activity file to update
    #[arg(long, value_name = "FILE")]
    pub activity_file: Option<PathBuf>,

    /// YAML list of extra dependency updates to include
    #[arg(long, value_name = "FILE")]
    pub dependency_updates: Option<PathBuf>,

    /// Header template text
    #[arg(long, conflicts_with = "header_file")]
    pub header: Option<String>,

    /// Header template file
    #[arg(long, value_name = "FILE")]
    pub header_file: Option<PathBuf>,

    /// Footer template text
    #[arg(long, conflicts_with = "footer_file")]
    pub footer: Option<String>,

    /// Footer template file
    #[arg(long, value_name = "FILE")]
    pub footer_file: Option<PathBuf>,

    /// Directory for generated documents (default: templates dir of the first chart)
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Release document file name
    #[arg(long, value_name = "FILE")]
    pub release_yaml_file: Option<String>,

    /// Schema document file name
    #[arg(long, value_name = "FILE")]
    pub crd_yaml_file: Option<String>,

    /// Write the markdown to this file
    #[arg(long, value_name = "FILE")]
    pub output_markdown: Option<PathBuf>,

    /// Branch recorded on commits (default: current branch, else master)
    #[arg(long)]
    pub branch: Option<String>,

    /// Write the release document
    #[arg(long, conflicts_with = "no_generate_release_yaml")]
    pub generate_release_yaml: bool,

    /// Do not write the release document
    #[arg(long)]
    pub no_generate_release_yaml: bool,

    /// Write the schema document
    #[arg(long, conflicts_with = "no_generate_crd")]
    pub generate_crd: bool,

    /// Do not write the schema document
    #[arg(long)]
    pub no_generate_crd: bool,

    /// Replace an existing schema document
    #[arg(long, conflicts_with = "no_overwrite_crd")]
    pub overwrite_crd: bool,

    /// Keep an existing schema document
    #[arg(long)]
    pub no_overwrite_crd: bool,

    /// Create or update the remote release
    #[arg(long, conflicts_with = "no_update_release")]
    pub update_release: bool,

    /// Do not touch the remote release
    #[arg(long)]
    pub no_update_release: bool,

    /// Include merge commits
    #[arg(long, conflicts_with = "no_include_merge_commits")]
    pub include_merge_commits: bool,

    /// Skip merge commits
    #[arg(long)]
    pub no_include_merge_commits: bool,

    /// Fail when there are no commits in the range
    #[arg(long, conflicts_with = "no_fail_if_no_commits")]
    pub fail_if_no_commits: bool,

    /// Only warn when there are no commits in the range
    #[arg(long)]
    pub no_fail_if_no_commits: bool,
}

/// Resolve a `--x` / `--no-x` pair. `None` means neither was given.
pub fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_changelog_flags() {
        let cli = Cli::parse_from([
            "relnote",
            "--debug",
            "changelog",
            "-p",
            "v1.0.0",
            "--rev",
            "HEAD",
            "-v",
            "1.1.0",
            "--no-update-release",
            "--generate-crd",
        ]);

        assert!(cli.debug);
        let Command::Changelog(args) = cli.command else {
            panic!("expected changelog command");
        };
        assert_eq!(args.previous_rev.as_deref(), Some("v1.0.0"));
        assert_eq!(args.rev.as_deref(), Some("HEAD"));
        assert_eq!(args.version.as_deref(), Some("1.1.0"));
        assert_eq!(flag_pair(args.update_release, args.no_update_release), Some(false));
        assert_eq!(flag_pair(args.generate_crd, args.no_generate_crd), Some(true));
        assert_eq!(flag_pair(args.overwrite_crd, args.no_overwrite_crd), None);
    }

    #[test]
    fn conflicting_pair_rejected() {
        let result = Cli::try_parse_from([
            "relnote",
            "changelog",
            "--update-release",
            "--no-update-release",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn header_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "relnote",
            "changelog",
            "--header",
            "x",
            "--header-file",
            "h.md",
        ]);
        assert!(result.is_err());
    }
}
