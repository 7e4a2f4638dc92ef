//! specflow - infrastructure spec change review CLI
//!
//! ## Commands
//!
//! - `classify`: list the risk warnings for a change between two spec files
//! - `render`: print the pull request body for a change
//! - `apply`: open a reviewable pull request for a spec change on GitHub
//! - `discover`: list existing cloud resources from an exported snapshot

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use specflow_core::{
    classify, render_pr_body, render_pr_title, ApplierConfig, ApplyRequest, ChangeWarning,
    DiscoveryConfig, DiscoveryRequest, DiscoveryService, Severity, SnapshotInventory, Spec,
    SpecApplier, METRICS,
};
use specflow_github::GitHubClient;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "specflow")]
#[command(version = specflow_core::VERSION)]
#[command(about = "Infrastructure spec change review", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Lowest severity that makes `classify --fail-on` exit with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Threshold {
    Info,
    Warning,
    Critical,
}

impl Threshold {
    fn severity(self) -> Severity {
        match self {
            Threshold::Info => Severity::Info,
            Threshold::Warning => Severity::Warning,
            Threshold::Critical => Severity::Critical,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the change between two spec files
    Classify {
        /// Previously committed spec (omit for a first submission)
        #[arg(long)]
        old: Option<PathBuf>,

        /// Proposed spec
        #[arg(long)]
        new: PathBuf,

        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Exit with an error when any warning reaches this severity
        #[arg(long, value_enum)]
        fail_on: Option<Threshold>,
    },

    /// Print the pull request title and body for a change
    Render {
        /// Previously committed spec (omit for a first submission)
        #[arg(long)]
        old: Option<PathBuf>,

        /// Proposed spec
        #[arg(long)]
        new: PathBuf,
    },

    /// Open a pull request proposing a spec change
    Apply {
        /// Target repository, `owner/name`
        #[arg(short, long)]
        repository: String,

        /// Repository-relative path of the spec file
        #[arg(short, long)]
        spec_path: String,

        /// Local file holding the proposed spec
        #[arg(short, long)]
        file: PathBuf,

        /// Commit message (default: `Update <spec path>`)
        #[arg(short, long)]
        message: Option<String>,

        /// Base branch (overrides SPECFLOW_BASE_BRANCH)
        #[arg(long)]
        base_branch: Option<String>,

        /// Comma separated labels (overrides SPECFLOW_PR_LABELS)
        #[arg(long)]
        labels: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Discover existing resources from an exported inventory snapshot
    Discover {
        /// Directory holding the exported JSON responses
        #[arg(long, env = "SPECFLOW_SNAPSHOT_DIR")]
        snapshot_dir: PathBuf,

        /// Comma separated categories (default: all)
        #[arg(short, long)]
        categories: Option<String>,

        /// Restrict subnets to one VPC
        #[arg(long)]
        parent_filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    specflow_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Classify {
            old,
            new,
            output,
            fail_on,
        } => cmd_classify(old.as_deref(), &new, output, fail_on),
        Commands::Render { old, new } => cmd_render(old.as_deref(), &new),
        Commands::Apply {
            repository,
            spec_path,
            file,
            message,
            base_branch,
            labels,
            output,
        } => {
            cmd_apply(
                repository,
                spec_path,
                &file,
                message,
                base_branch.as_deref(),
                labels.as_deref(),
                output,
            )
            .await
        }
        Commands::Discover {
            snapshot_dir,
            categories,
            parent_filter,
        } => cmd_discover(snapshot_dir, categories.as_deref(), parent_filter.as_deref()).await,
    };

    METRICS.flush();
    result
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Committed specs are only required to be a mapping; proposed specs must validate.
fn load_specs(old: Option<&Path>, new: &Path) -> Result<(Option<Spec>, Spec)> {
    let old = match old {
        Some(path) => Some(
            Spec::from_yaml(&read_file(path)?)
                .with_context(|| format!("Invalid spec in {}", path.display()))?,
        ),
        None => None,
    };
    let new = Spec::parse(&read_file(new)?)
        .with_context(|| format!("Invalid spec in {}", new.display()))?;
    Ok((old, new))
}

fn format_warnings(warnings: &[ChangeWarning]) -> String {
    if warnings.is_empty() {
        return "No warnings\n".to_string();
    }
    warnings
        .iter()
        .map(|w| {
            format!(
                "{} {:<8} {}\n         at {}\n",
                w.severity.icon(),
                w.severity.label(),
                w.message,
                w.field_path
            )
        })
        .collect()
}

fn reaches(warnings: &[ChangeWarning], threshold: Threshold) -> bool {
    warnings.iter().any(|w| w.severity >= threshold.severity())
}

fn cmd_classify(
    old: Option<&Path>,
    new: &Path,
    output: OutputFormat,
    fail_on: Option<Threshold>,
) -> Result<()> {
    let (old, new) = load_specs(old, new)?;
    let warnings = classify(old.as_ref(), &new);
    debug!(warnings = warnings.len(), first_submission = old.is_none(), "classified");

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&warnings)?),
        OutputFormat::Text => print!("{}", format_warnings(&warnings)),
    }

    if let Some(threshold) = fail_on {
        if reaches(&warnings, threshold) {
            bail!("change has warnings at or above {:?}", threshold);
        }
    }
    Ok(())
}

fn cmd_render(old: Option<&Path>, new: &Path) -> Result<()> {
    let (old, new) = load_specs(old, new)?;
    let warnings = classify(old.as_ref(), &new);
    let previous = old.unwrap_or_default();

    println!("{}\n", render_pr_title(&new));
    print!("{}", render_pr_body(&previous, &new, &warnings));
    Ok(())
}

async fn cmd_apply(
    repository: String,
    spec_path: String,
    file: &Path,
    message: Option<String>,
    base_branch: Option<&str>,
    labels: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    let request = ApplyRequest {
        repository,
        spec_path,
        new_spec_raw: read_file(file)?,
        commit_message: message,
    };

    let mut config = ApplierConfig::from_env();
    if let Some(branch) = base_branch {
        config = config.with_base_branch(branch);
    }
    if let Some(labels) = labels {
        config = config.with_labels(specflow_core::parse_label_list(labels));
    }

    let client = GitHubClient::from_env().context("Failed to configure GitHub client")?;
    let applier = SpecApplier::new(client, config);

    match applier.apply(&request).await {
        Ok(outcome) => {
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Text => {
                    println!("Opened pull request #{}", outcome.pull_request_number);
                    println!("  url:    {}", outcome.pull_request_url);
                    println!("  branch: {}", outcome.branch_name);
                    if !outcome.labels_applied {
                        println!("  labels: not applied (see logs)");
                    }
                    print!("{}", format_warnings(&outcome.warnings));
                }
            }
            Ok(())
        }
        Err(e) => {
            let failure = e.to_failure();
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&failure)?),
                OutputFormat::Text => {
                    eprintln!("Stage:  {}", failure.stage);
                    eprintln!("Hint:   {}", failure.hint);
                }
            }
            Err(e).context(format!("apply failed ({})", failure.error_category))
        }
    }
}

async fn cmd_discover(
    snapshot_dir: PathBuf,
    categories: Option<&str>,
    parent_filter: Option<&str>,
) -> Result<()> {
    let request = DiscoveryRequest::parse(categories, parent_filter)?;
    let service = DiscoveryService::new(
        SnapshotInventory::new(snapshot_dir),
        DiscoveryConfig::from_env(),
    );
    let result = service.discover(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn spec_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_classify_with_threshold() {
        let cli = Cli::try_parse_from([
            "specflow", "classify", "--old", "a.yaml", "--new", "b.yaml", "--fail-on", "critical",
        ])
        .unwrap();
        match cli.command {
            Commands::Classify { old, fail_on, .. } => {
                assert_eq!(old, Some(PathBuf::from("a.yaml")));
                assert_eq!(fail_on, Some(Threshold::Critical));
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn apply_requires_repository() {
        assert!(Cli::try_parse_from(["specflow", "apply", "--spec-path", "a", "--file", "b"]).is_err());
    }

    #[test]
    fn load_specs_validates_only_the_proposed_spec() {
        let old = spec_file("spec:\n  data:\n    engine: postgres\n");
        let new = spec_file("kind: Database\nmetadata:\n  name: orders\nspec:\n  data:\n    engine: mysql\n");

        let (old_spec, new_spec) = load_specs(Some(old.path()), new.path()).unwrap();
        assert!(old_spec.unwrap().kind().is_none());
        assert_eq!(new_spec.name(), Some("orders"));

        let invalid = spec_file("spec: {}\n");
        assert!(load_specs(None, invalid.path()).is_err());
    }

    #[test]
    fn threshold_compares_by_severity() {
        let old = spec_file("kind: Database\nmetadata:\n  name: orders\nspec:\n  data:\n    engine: postgres\n");
        let new = spec_file("kind: Database\nmetadata:\n  name: orders\nspec:\n  data:\n    engine: mysql\n");
        let (old, new) = load_specs(Some(old.path()), new.path()).unwrap();
        let warnings = classify(old.as_ref(), &new);

        assert!(reaches(&warnings, Threshold::Warning));
        assert!(reaches(&warnings, Threshold::Critical));
        assert!(!reaches(&[], Threshold::Info));
    }

    #[test]
    fn text_output_names_field_paths() {
        let text = format_warnings(&[ChangeWarning {
            severity: Severity::Warning,
            message: "Disabling WAF will remove security protection".to_string(),
            field_path: "spec.security.waf.enabled".to_string(),
        }]);
        assert!(text.contains("spec.security.waf.enabled"));
        assert_eq!(format_warnings(&[]), "No warnings\n");
    }
}
