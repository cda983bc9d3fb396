//! changelog command - Generate the changelog and release record
//!
//! Picks the revision range, the collaborators (git, tracker, release
//! store) and the sinks, then hands everything to
//! [`crate::changelog::generate`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use chrono::Utc;

use crate::changelog::activity::{
    build_number, record_activity, ActivityKey, ActivityUpdate, FileActivityStore,
};
use crate::changelog::publish::{
    clean_version, find_chart_dir, find_templates_dir, publish_release, resolve_tag_name,
    write_markdown, write_release_document, write_schema, ChartInfo,
};
use crate::changelog::{generate, ChangelogOptions};
use crate::cli::args::{flag_pair, ChangelogArgs};
use crate::cli::Context;
use crate::core::config::{read_template_file, Config};
use crate::core::types::{DependencyUpdate, RepositoryInfo};
use crate::git::{Git, GitUrl};
use crate::scm::offline::OfflineScm;
use crate::scm::{create_client, IssueTracker, ScmClient};
use crate::ui::output;

/// Branch recorded when neither configured nor checked out.
const DEFAULT_BRANCH: &str = "master";

/// Flags merged over the configuration.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    header: String,
    footer: String,
    templates_dir: Option<PathBuf>,
    release_yaml_file: String,
    crd_yaml_file: String,
    generate_release_yaml: bool,
    generate_crd: bool,
    overwrite_crd: bool,
    update_release: bool,
    include_merge_commits: bool,
    fail_if_no_commits: bool,
    output_markdown: Option<PathBuf>,
    branch: Option<String>,
}

impl Settings {
    fn resolve(config: &Config, args: &ChangelogArgs, work_dir: &Path) -> Result<Self> {
        let header = match (&args.header, &args.header_file) {
            (Some(text), _) => text.clone(),
            (None, Some(file)) => read_template_file(&work_dir.join(file))?,
            (None, None) => config.header_template(work_dir)?,
        };
        let footer = match (&args.footer, &args.footer_file) {
            (Some(text), _) => text.clone(),
            (None, Some(file)) => read_template_file(&work_dir.join(file))?,
            (None, None) => config.footer_template(work_dir)?,
        };

        Ok(Self {
            header,
            footer,
            templates_dir: args
                .templates_dir
                .clone()
                .or_else(|| config.templates_dir().map(PathBuf::from))
                .map(|dir| work_dir.join(dir)),
            release_yaml_file: args
                .release_yaml_file
                .clone()
                .unwrap_or_else(|| config.release_yaml_file().to_string()),
            crd_yaml_file: args
                .crd_yaml_file
                .clone()
                .unwrap_or_else(|| config.crd_yaml_file().to_string()),
            generate_release_yaml: flag_pair(
                args.generate_release_yaml,
                args.no_generate_release_yaml,
            )
            .unwrap_or(config.generate_release_yaml()),
            generate_crd: flag_pair(args.generate_crd, args.no_generate_crd)
                .unwrap_or(config.generate_crd()),
            overwrite_crd: flag_pair(args.overwrite_crd, args.no_overwrite_crd)
                .unwrap_or(config.overwrite_crd()),
            update_release: flag_pair(args.update_release, args.no_update_release)
                .unwrap_or(config.update_release()),
            include_merge_commits: flag_pair(
                args.include_merge_commits,
                args.no_include_merge_commits,
            )
            .unwrap_or(config.include_merge_commits()),
            fail_if_no_commits: flag_pair(args.fail_if_no_commits, args.no_fail_if_no_commits)
                .unwrap_or(config.fail_if_no_commits()),
            output_markdown: args
                .output_markdown
                .clone()
                .or_else(|| config.output_markdown().map(PathBuf::from))
                .map(|file| work_dir.join(file)),
            branch: args
                .branch
                .clone()
                .or_else(|| config.branch().map(String::from)),
        })
    }
}

/// Generate the changelog.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn changelog(ctx: &Context, args: &ChangelogArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(changelog_async(ctx, args))
}

async fn changelog_async(ctx: &Context, args: &ChangelogArgs) -> Result<()> {
    let verbosity = ctx.verbosity();
    let cwd = ctx.cwd()?;
    let git = Git::open(&cwd).context("Failed to open repository")?;
    let work_dir = git.work_dir()?.to_path_buf();

    let loaded = Config::load(Some(&work_dir)).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    let config = loaded.config;
    let settings = Settings::resolve(&config, args, &work_dir)?;

    let Some(range) = git.discover_range(args.previous_rev.as_deref(), args.rev.as_deref())?
    else {
        tracing::info!("no previous commit version found so change diff unavailable");
        return Ok(());
    };

    let git_url = source_url(&git, args)?.as_deref().and_then(GitUrl::parse);
    let repository = git_url
        .as_ref()
        .map(GitUrl::repository_info)
        .unwrap_or_default();

    let chart = match find_chart_dir(&work_dir) {
        Some(dir) => Some(ChartInfo::load(&dir).context("Failed to read Chart.yaml")?),
        None => None,
    };
    let version = resolve_version(args.version.as_deref(), chart.as_ref(), &git)?;
    let name = resolve_name(args.name.as_deref(), chart.as_ref(), &repository, &work_dir);
    let branch = settings
        .branch
        .clone()
        .or_else(|| git.current_branch())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    let offline = args.offline || git_url.is_none();
    let client = build_client(git_url.as_ref(), &config, offline);
    let project_key_tracker;
    let tracker: &dyn IssueTracker = match config.tracker() {
        Some(kind) if kind != client.kind() => {
            project_key_tracker = OfflineScm::new(kind, client.full_name());
            &project_key_tracker
        }
        _ => client.as_tracker(),
    };

    let options = ChangelogOptions {
        name: name.clone(),
        version: version.clone(),
        previous_rev: range.from,
        current_rev: range.to,
        repository: repository.clone(),
        branch: branch.clone(),
        include_merge_commits: settings.include_merge_commits,
        fail_if_no_commits: settings.fail_if_no_commits,
        header: settings.header.clone(),
        footer: settings.footer.clone(),
        dependency_updates: load_dependency_updates(args.dependency_updates.as_deref(), &work_dir)?,
    };

    let generated = generate(&git, tracker, client.as_directory(), &options)
        .await
        .context("Failed to generate changelog")?;
    let mut record = generated.record;
    let markdown = generated.markdown;

    let publishing = settings.update_release && !offline;
    if publishing {
        let tag = resolve_tag_name(&version, &git)?;
        publish_release(client.as_release_store(), &mut record, &tag, &markdown).await?;
    }

    let mut written = Vec::new();
    if let Some(path) = &settings.output_markdown {
        write_markdown(path, &markdown)?;
        written.push(path.display().to_string());
    } else if !publishing {
        output::print(&markdown, verbosity);
    }

    if settings.generate_release_yaml || settings.generate_crd {
        let templates_dir = match &settings.templates_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                dir.clone()
            }
            None => find_templates_dir(&work_dir)?,
        };

        if settings.generate_release_yaml {
            let path = templates_dir.join(&settings.release_yaml_file);
            write_release_document(&path, &record, Utc::now())?;
            written.push(path.display().to_string());
        }

        if settings.generate_crd {
            let path = templates_dir.join(&settings.crd_yaml_file);
            if let Some(path) = write_schema(&path, settings.overwrite_crd)? {
                git.add_path(&templates_dir)
                    .with_context(|| format!("Failed to stage {}", templates_dir.display()))?;
                written.push(path.display().to_string());
            }
        }
    }

    if let Some(file) = &args.activity_file {
        let store = FileActivityStore::new(work_dir.join(file));
        let key = build_number(args.build.as_deref(), |name| std::env::var(name).ok())
            .map(|build| ActivityKey::new(&repository.owner, &repository.name, &branch, build));
        record_activity(&store, key.as_ref(), &ActivityUpdate::from_record(&record))?;
    }

    if !written.is_empty() {
        tracing::info!(
            "release {} {} written to:\n{}",
            name,
            clean_version(&version),
            output::format_list(&written, "  - ")
        );
    }

    Ok(())
}

/// The repository URL: `--source-url`, else the default remote's URL.
fn source_url(git: &Git, args: &ChangelogArgs) -> Result<Option<String>> {
    if let Some(url) = &args.source_url {
        return Ok(Some(url.clone()));
    }
    match git.default_remote()? {
        Some(remote) => Ok(git.remote_url(&remote)?),
        None => Ok(None),
    }
}

/// GitHub (or Enterprise) client, falling back to offline for unknown hosts.
fn build_client(url: Option<&GitUrl>, config: &Config, offline: bool) -> Box<dyn ScmClient> {
    let kind = config.tracker().unwrap_or_default();
    let Some(url) = url else {
        return Box::new(OfflineScm::new(kind, String::new()));
    };
    if offline {
        return Box::new(OfflineScm::new(kind, url.full_name()));
    }

    match create_client(&url.clone_url, config.token(), config.api_base()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("working offline: {}", e);
            Box::new(OfflineScm::new(kind, url.full_name()))
        }
    }
}

/// `--version`, else the chart version, else the newest tag without `v`.
fn resolve_version(explicit: Option<&str>, chart: Option<&ChartInfo>, git: &Git) -> Result<String> {
    if let Some(version) = explicit.filter(|v| !v.is_empty()) {
        return Ok(version.to_string());
    }
    if let Some(chart) = chart.filter(|c| !c.version.is_empty()) {
        return Ok(chart.version.clone());
    }
    match git.tags()?.first() {
        Some(tag) => Ok(clean_version(&tag.name).to_string()),
        None => bail!("No version given and none found in Chart.yaml or tags. Use --version."),
    }
}

/// `--name`, else the chart name, else the repository or directory name.
fn resolve_name(
    explicit: Option<&str>,
    chart: Option<&ChartInfo>,
    repository: &RepositoryInfo,
    work_dir: &Path,
) -> String {
    explicit
        .filter(|n| !n.is_empty())
        .map(String::from)
        .or_else(|| chart.map(|c| c.name.clone()).filter(|n| !n.is_empty()))
        .or_else(|| Some(repository.name.clone()).filter(|n| !n.is_empty()))
        .or_else(|| {
            work_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

fn load_dependency_updates(file: Option<&Path>, work_dir: &Path) -> Result<Vec<DependencyUpdate>> {
    let Some(file) = file else {
        return Ok(Vec::new());
    };
    let path = work_dir.join(file);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
