use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use humanize_bytes::humanize_bytes_binary;
use itertools::Itertools;
use log::warn;
use crate::api::{ApiConfig, HttpContentRepository};
use crate::auth::{CredentialProvider, StaticCredential};
use crate::config::{Config, FlatConfig};
use crate::entities::{MediaId, MediaItem, MediaSection, MediaUpload, SectionForm, SectionId};
use crate::http::{self, ApiContext};
use crate::manager::{FetchStatus, MediaLibraryManager};
use crate::object_store::ObjectStore;
use crate::repository::{Catalog, ContentRepository};

#[derive(Parser, Debug)]
#[command(name = "schoolsite-media", version, about = "Manage the school website media library")]
pub struct Cli {
    #[command(flatten)]
    pub config: FlatConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage media sections
    Sections {
        #[command(subcommand)]
        action: SectionsCommand,
    },
    /// Manage media items
    Media {
        #[command(subcommand)]
        action: MediaCommand,
    },
    /// Run an in-memory development backend
    Serve {
        #[arg(long, default_value = "[::]:1698")]
        addr: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SectionsCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Update {
        id: SectionId,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: SectionId,
    },
}

#[derive(Subcommand, Debug)]
pub enum MediaCommand {
    List {
        #[arg(long)]
        section: Option<SectionId>,
    },
    Upload {
        path: PathBuf,
        #[arg(long)]
        section: Option<SectionId>,
    },
    Move {
        id: MediaId,
        section: SectionId,
    },
    Delete {
        id: MediaId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Item count per section
    Counts,
}

type HttpManager = MediaLibraryManager<HttpContentRepository, StaticCredential>;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from(cli.config);
    match cli.command {
        Command::Serve { addr } => {
            let ctx = ApiContext::new(Arc::new(Catalog::seeded()), config.api.bearer_token);
            http::serve(&addr, ctx).await
        }
        Command::Sections { action } => {
            let mut manager = create_manager(&config)?;
            run_sections(&mut manager, action).await
        }
        Command::Media { action } => {
            let mut manager = create_manager(&config)?;
            run_media(&mut manager, action).await
        }
    }
}

fn create_manager(config: &Config) -> anyhow::Result<HttpManager> {
    let mut api_config = ApiConfig::new(config.api.api_url.clone());
    api_config.timeout = config.api.timeout;
    let repository = HttpContentRepository::new(api_config).context("failed to create HTTP client")?;
    let auth = StaticCredential::new(config.api.bearer_token.clone());
    let object_store = ObjectStore::new(config.storage.base_url.clone());
    Ok(MediaLibraryManager::new(repository, auth, object_store))
}

pub async fn run_sections<R, A>(manager: &mut MediaLibraryManager<R, A>, action: SectionsCommand) -> anyhow::Result<()>
where
    R: ContentRepository,
    A: CredentialProvider,
{
    match action {
        SectionsCommand::List => {
            manager.load_sections().await;
        }
        SectionsCommand::Create { name, description, color } => {
            let form = section_form(name, description, color);
            let section = manager.create_section(&form).await?;
            println!("Section created: {}", format_section(&section));
        }
        SectionsCommand::Update { id, name, description, color } => {
            let form = section_form(name, description, color);
            let section = manager.update_section(id, &form).await?;
            println!("Section updated: {}", format_section(&section));
        }
        SectionsCommand::Delete { id } => {
            manager.delete_section(id).await?;
            println!("Section {} deleted", id);
        }
    }
    println!("{}", "Sections".bold());
    for section in manager.sections() {
        println!("  {}", format_section(section));
    }
    Ok(())
}

pub async fn run_media<R, A>(manager: &mut MediaLibraryManager<R, A>, action: MediaCommand) -> anyhow::Result<()>
where
    R: ContentRepository,
    A: CredentialProvider,
{
    manager.load_sections().await;
    match action {
        MediaCommand::List { section } => {
            manager.load_filtered_media(section).await;
            print_view(manager)?;
        }
        MediaCommand::Upload { path, section } => {
            let upload = MediaUpload::from_path(&path).await
                .with_context(|| format!("failed to read {}", path.display()))?;
            manager.load_filtered_media(section).await;
            let media = manager.upload_media(&upload, section).await?;
            println!("Media uploaded: {}", format_media(manager, &media));
        }
        MediaCommand::Move { id, section } => {
            manager.load_filtered_media(None).await;
            manager.move_to_section(id, section).await?;
            println!("Media {} moved to section {}", id, section);
        }
        MediaCommand::Delete { id, yes } => {
            if !yes {
                anyhow::bail!("refusing to delete media {} without --yes", id);
            }
            manager.delete_media(id).await?;
            println!("Media {} deleted", id);
        }
        MediaCommand::Counts => {
            manager.load_filtered_media(None).await;
            let counts = manager.section_counts();
            for section in manager.sections() {
                let count = counts.get(&Some(section.id)).copied().unwrap_or(0);
                println!("{:>5}  {}", count, section.name);
            }
            if let Some(count) = counts.get(&None) {
                println!("{:>5}  {}", count, "(unsectioned)".dimmed());
            }
        }
    }
    Ok(())
}

fn section_form(name: String, description: Option<String>, color: Option<String>) -> SectionForm {
    SectionForm { name, description, color }
}

fn format_section(section: &MediaSection) -> String {
    let description = section.description.as_deref().unwrap_or("");
    format!("{:>4}  {:<16} {}  {}", section.id, section.name, section.color, description.dimmed())
}

fn format_media<R, A>(manager: &MediaLibraryManager<R, A>, media: &MediaItem) -> String
where
    R: ContentRepository,
    A: CredentialProvider,
{
    let section = media.section_name.as_deref().unwrap_or("(unsectioned)");
    format!(
        "{:>5}  {:<32} {:>10}  {:<16} {}",
        media.id,
        media.original_name,
        humanize_bytes_binary!(media.file_size),
        section,
        manager.resolve_url(media),
    )
}

fn print_view<R, A>(manager: &MediaLibraryManager<R, A>) -> anyhow::Result<()>
where
    R: ContentRepository,
    A: CredentialProvider,
{
    let view = manager.view();
    match view.status {
        FetchStatus::Failed => {
            anyhow::bail!(view.error.clone().unwrap_or_else(|| "failed to load media".to_string()));
        }
        FetchStatus::Fallback => {
            if let Some(warning) = &view.warning {
                warn!("{}", warning);
            }
        }
        _ => (),
    }
    let title = view.selected_section()
        .map(|x| x.name.clone())
        .unwrap_or_else(|| "All media".to_string());
    println!("{} ({})", title.bold(), view.items.len());
    let lines = view.items.iter().map(|x| format_media(manager, x)).join("\n");
    if !lines.is_empty() {
        println!("{}", lines);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;
    use crate::repository::InMemoryRepository;

    fn manager(repository: InMemoryRepository) -> MediaLibraryManager<InMemoryRepository, StaticCredential> {
        MediaLibraryManager::new(repository, StaticCredential::new(Some("t".to_string())), ObjectStore::new("http://x"))
    }

    #[test]
    fn parses_upload_command() {
        let cli = Cli::parse_from(["schoolsite-media", "media", "upload", "a.png", "--section", "3"]);
        match cli.command {
            Command::Media { action: MediaCommand::Upload { path, section } } => {
                assert_eq!(path, PathBuf::from("a.png"));
                assert_eq!(section, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_command_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sports day.png");
        std::fs::File::create(&path).unwrap().write_all(&[137, 80, 78, 71]).unwrap();

        let repository = InMemoryRepository::default();
        let mut manager = manager(repository.clone());
        run_media(&mut manager, MediaCommand::Upload { path, section: Some(2) }).await.unwrap();

        let items = repository.catalog().media(Some(2));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original_name, "sports day.png");
        assert_eq!(items[0].content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn delete_command_needs_confirmation() {
        let repository = InMemoryRepository::default();
        let mut manager = manager(repository.clone());
        let result = run_media(&mut manager, MediaCommand::Delete { id: 1, yes: false }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_command_fails_without_backend() {
        let repository = InMemoryRepository::default();
        repository.set_offline(true);
        let mut manager = manager(repository);
        let result = run_media(&mut manager, MediaCommand::List { section: None }).await;
        assert!(result.is_err());
    }
}
