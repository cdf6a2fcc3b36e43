//! CLI Interface
//!
//! Command-line interface for browsing and editing a prefixfs store.

use crate::config::{ConfigLoader, PrefixFsConfig, StoreBackend};
use crate::error::ApiError;
use crate::ops::{OverwritePolicy, Outcome};
use crate::ordering::SortOrder;
use crate::path;
use crate::search::filter_tree;
use crate::session::Session;
use crate::tooling::format::{
    format_file_size, format_listing, format_outcome, format_paste_report, format_tree,
    format_upload_report,
};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use tracing::info;

/// prefixfs CLI - folders over a flat object store
#[derive(Parser, Debug)]
#[command(name = "prefixfs")]
#[command(about = "Browse and edit a flat object store as a folder tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use a local directory as the store (overrides store.backend/root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Answer yes to every overwrite and delete confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Enable verbose logging (info level on stderr)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the folder tree in the default order
    Tree {
        /// Directory to start from (default: store root)
        path: Option<String>,
    },
    /// List one directory using the saved sort order
    Ls {
        path: Option<String>,
        /// Keep only entries whose name contains this text
        #[arg(long)]
        search: Option<String>,
        /// One-off sort order, e.g. name-asc or size-desc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Upload a local file or directory into a store directory
    Put {
        source: PathBuf,
        /// Destination directory (default: store root)
        dest: Option<String>,
    },
    /// Download one object to a local file
    Get { key: String, dest: PathBuf },
    /// Delete files or directories recursively
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Move into an existing directory, or to a new path
    Mv {
        #[arg(required = true)]
        sources: Vec<String>,
        dest: String,
    },
    /// Copy into an existing directory, or to a new path
    Cp {
        #[arg(required = true)]
        sources: Vec<String>,
        dest: String,
    },
    /// Rename within the parent directory
    Rename { path: String, new_name: String },
    /// Search names across the whole tree
    Find { query: String },
    /// Show or set the saved sort order
    Sort { order: Option<String> },
    /// Public URL of an object
    Url { key: String },
}

impl Cli {
    /// Load configuration and fold the CLI overrides into it.
    pub fn load_config(&self) -> Result<PrefixFsConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(root) = &self.root {
            config.store.backend = StoreBackend::Local;
            config.store.root = Some(root.clone());
        }

        let logging = &mut config.logging;
        if self.verbose {
            logging.level = "info".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        Ok(config)
    }
}

/// CLI context holding the browsing session
pub struct CliContext {
    session: Session,
    assume_yes: bool,
    /// Failed steps of every command run so far
    unfinished: Outcome,
}

impl CliContext {
    /// Open a session against the configured store
    pub async fn new(config: &PrefixFsConfig, assume_yes: bool) -> Result<Self, ApiError> {
        Ok(Self::with_session(Session::open(config).await?, assume_yes))
    }

    pub fn with_session(session: Session, assume_yes: bool) -> Self {
        Self {
            session,
            assume_yes,
            unfinished: Outcome::Success,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Surface the steps that failed since the last call as an error.
    pub fn finish(&mut self) -> Result<(), ApiError> {
        std::mem::take(&mut self.unfinished).into_result()
    }

    fn record(&mut self, outcome: &Outcome) {
        let seen = std::mem::take(&mut self.unfinished);
        self.unfinished = seen.merge(outcome.clone());
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Tree { path } => self.handle_tree(path.as_deref()),
            Commands::Ls { path, search, sort } => {
                self.handle_ls(path.as_deref(), search.as_deref(), sort.as_deref())
            }
            Commands::Mkdir { path } => self.handle_mkdir(path).await,
            Commands::Put { source, dest } => self.handle_put(source, dest.as_deref()).await,
            Commands::Get { key, dest } => {
                let size = self.session.download_to(key, dest).await?;
                Ok(format!(
                    "Downloaded {} ({}) to {}",
                    key,
                    format_file_size(size),
                    dest.display()
                ))
            }
            Commands::Rm { paths } => self.handle_rm(paths).await,
            Commands::Mv { sources, dest } => self.handle_mv(sources, dest).await,
            Commands::Cp { sources, dest } => self.handle_cp(sources, dest).await,
            Commands::Rename { path, new_name } => self.handle_rename(path, new_name).await,
            Commands::Find { query } => {
                let matches = filter_tree(self.session.tree(), query);
                if matches.is_empty() {
                    return Ok(format!("No names contain '{}'", query));
                }
                Ok(format_tree(&matches))
            }
            Commands::Sort { order } => self.handle_sort(order.as_deref()),
            Commands::Url { key } => Ok(self.session.public_url(key)?.to_string()),
        }
    }

    fn handle_tree(&self, path: Option<&str>) -> Result<String, ApiError> {
        match path.map(path::normalize).filter(|p| !p.is_empty()) {
            None => Ok(format_tree(self.session.tree())),
            Some(dir) => {
                let node = self
                    .session
                    .find_node(&dir)
                    .ok_or_else(|| ApiError::NotFound(dir.clone()))?;
                Ok(format_tree(std::slice::from_ref(node)))
            }
        }
    }

    fn handle_ls(
        &mut self,
        path: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Result<String, ApiError> {
        while self.session.up() {}
        if let Some(dir) = path.map(path::normalize).filter(|p| !p.is_empty()) {
            self.session.enter(&dir)?;
        }
        self.session.set_search(search.unwrap_or(""));

        let mut view = self.session.management_view();
        if let Some(token) = sort {
            token.parse::<SortOrder>()?.sort(&mut view);
        }
        let title = match self.session.current_dir() {
            "" => "/".to_string(),
            dir => format!("/{}", dir),
        };
        Ok(format_listing(&title, &view))
    }

    async fn handle_mkdir(&mut self, raw: &str) -> Result<String, ApiError> {
        let target = sanitized_target(raw)?;
        let ops = self.session.ops();
        let outcome = self
            .with_overwrite_confirmation(&target, |policy| {
                ops.create_directory(&target, policy)
            })
            .await?;
        self.session.refresh().await;
        Ok(match outcome {
            Some(outcome) => {
                self.record(&outcome);
                format_outcome(&format!("Created {}/", target), &outcome)
            }
            None => "Cancelled".to_string(),
        })
    }

    async fn handle_put(
        &mut self,
        source: &std::path::Path,
        dest: Option<&str>,
    ) -> Result<String, ApiError> {
        let dest = dest.map(path::normalize).unwrap_or_default();
        let assume_yes = self.assume_yes;
        let report = self
            .session
            .ops()
            .upload_local(source, &dest, |key| {
                assume_yes
                    || prompt(&format!("'{}' already exists. Replace it?", key)).unwrap_or(false)
            })
            .await?;
        self.session.refresh().await;
        self.record(&Outcome::from_failures(report.failed.clone()));
        Ok(format_upload_report(&report))
    }

    async fn handle_rm(&mut self, paths: &[String]) -> Result<String, ApiError> {
        let selection = self.session.selection_mut();
        selection.clear();
        for raw in paths {
            selection.select(&path::normalize(raw));
        }
        let nodes = self.session.selection().selected_nodes(self.session.tree());
        if nodes.len() < paths.len() {
            let missing: Vec<&String> = paths
                .iter()
                .filter(|raw| self.session.find_node(raw).is_none())
                .collect();
            return Err(ApiError::NotFound(
                missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
            ));
        }
        if !self.confirm(&format!("Delete {} item(s)?", nodes.len()))? {
            return Ok("Cancelled".to_string());
        }
        let outcome = self.session.delete_selected().await;
        self.record(&outcome);
        Ok(format_outcome(&format!("Deleted {} item(s)", nodes.len()), &outcome))
    }

    async fn handle_mv(&mut self, sources: &[String], dest: &str) -> Result<String, ApiError> {
        let dest = path::normalize(dest);
        if self.is_directory(&dest) {
            let mut lines = Vec::with_capacity(sources.len());
            for source in sources {
                let outcome = self.session.drop_onto(source, Some(&dest)).await?;
                self.record(&outcome);
                let action = format!("Moved {} into {}/", source, dest);
                lines.push(format_outcome(&action, &outcome));
            }
            return Ok(lines.join("\n"));
        }

        let [source] = sources else {
            return Err(ApiError::InvalidPath(format!(
                "'{}' is not a directory; moving several sources needs one",
                dest
            )));
        };
        let node = self
            .session
            .find_node(source)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(source.clone()))?;
        let ops = self.session.ops();
        let (node, target) = (&node, dest.as_str());
        let outcome = self
            .with_overwrite_confirmation(target, move |policy| async move {
                let taken = node.path != target && ops.exists(target).await?;
                match policy {
                    OverwritePolicy::Refuse if taken => {
                        return Err(ApiError::AlreadyExists(target.to_string()));
                    }
                    OverwritePolicy::Replace => {
                        if let Some(existing) = ops.lookup(target).await? {
                            let cleared =
                                ops.delete_recursive(target, !existing.is_file()).await?;
                            if !cleared.is_success() {
                                return Ok(cleared);
                            }
                        }
                    }
                    OverwritePolicy::Refuse => {}
                }
                ops.move_path(&node.path, target, node.is_dir()).await
            })
            .await;
        self.session.refresh().await;
        Ok(match outcome? {
            Some(outcome) => {
                self.record(&outcome);
                format_outcome(&format!("Moved {} to {}", source, dest), &outcome)
            }
            None => "Cancelled".to_string(),
        })
    }

    async fn handle_cp(&mut self, sources: &[String], dest: &str) -> Result<String, ApiError> {
        let dest = path::normalize(dest);
        if self.is_directory(&dest) || dest.is_empty() {
            let selection = self.session.selection_mut();
            selection.clear();
            for source in sources {
                selection.select(&path::normalize(source));
            }
            let copied = self.session.copy_selection();
            if copied < sources.len() {
                return Err(ApiError::NotFound(sources.join(", ")));
            }
            while self.session.up() {}
            if !dest.is_empty() {
                self.session.enter(&dest)?;
            }
            return Ok(match self.session.paste().await {
                Some(report) => {
                    for item in &report.items {
                        if let Ok(outcome) = &item.result {
                            self.record(outcome);
                        }
                    }
                    format_paste_report(&report)
                }
                None => "Nothing to copy".to_string(),
            });
        }

        let [source] = sources else {
            return Err(ApiError::InvalidPath(format!(
                "'{}' is not a directory; copying several sources needs one",
                dest
            )));
        };
        let node = self
            .session
            .find_node(source)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(source.clone()))?;
        let result = self.session.ops().copy(&node, &dest).await;
        self.session.refresh().await;
        let outcome = result?;
        self.record(&outcome);
        Ok(format_outcome(&format!("Copied {} to {}", source, dest), &outcome))
    }

    async fn handle_rename(&mut self, raw: &str, new_name: &str) -> Result<String, ApiError> {
        let node = self
            .session
            .find_node(raw)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(raw.to_string()))?;
        let target = path::join(path::parent(&node.path), &path::sanitize_name(new_name));
        let ops = self.session.ops();
        let outcome = self
            .with_overwrite_confirmation(&target, |policy| ops.rename(&node, new_name, policy))
            .await;
        self.session.refresh().await;
        Ok(match outcome? {
            Some(outcome) => {
                self.record(&outcome);
                let action = format!("Renamed {} to {}", node.path, target);
                format_outcome(&action, &outcome)
            }
            None => "Cancelled".to_string(),
        })
    }

    fn handle_sort(&mut self, order: Option<&str>) -> Result<String, ApiError> {
        if let Some(token) = order {
            let order: SortOrder = token.parse()?;
            self.session.set_sort_order(order)?;
            info!(sort = %order, "Sort order saved");
            return Ok(format!("Sort order set to {} ({})", order, order.label()));
        }
        let current = self.session.sort_order();
        let lines: Vec<String> = SortOrder::all()
            .iter()
            .map(|order| {
                let marker = if *order == current { "*" } else { " " };
                format!("{} {:<10} {}", marker, order.to_string(), order.label())
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn is_directory(&self, path: &str) -> bool {
        self.session.find_node(path).map(|n| n.is_dir()).unwrap_or(false)
    }

    /// Run `op` refusing overwrites; on a conflict ask, then rerun replacing.
    /// `Ok(None)` means the user declined.
    async fn with_overwrite_confirmation<F, Fut>(
        &self,
        target: &str,
        op: F,
    ) -> Result<Option<Outcome>, ApiError>
    where
        F: Fn(OverwritePolicy) -> Fut,
        Fut: Future<Output = Result<Outcome, ApiError>>,
    {
        match op(OverwritePolicy::Refuse).await {
            Err(e) if e.is_conflict() => {
                if !self.confirm(&format!("'{}' already exists. Replace it?", target))? {
                    return Ok(None);
                }
                op(OverwritePolicy::Replace).await.map(Some)
            }
            other => other.map(Some),
        }
    }

    fn confirm(&self, question: &str) -> Result<bool, ApiError> {
        if self.assume_yes {
            return Ok(true);
        }
        prompt(question)
    }
}

fn prompt(question: &str) -> Result<bool, ApiError> {
    use dialoguer::Confirm;
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))
}

/// Normalise a user path and sanitise its last segment
fn sanitized_target(raw: &str) -> Result<String, ApiError> {
    let normalized = path::normalize(raw);
    let name = path::sanitize_name(path::file_name(&normalized));
    if name.is_empty() {
        return Err(ApiError::InvalidPath(format!("'{}' has no name", raw)));
    }
    Ok(path::join(path::parent(&normalized), &name))
}
