use console::Term;
use printquote_protocol::api::QuoteCreateRequest;
use printquote_protocol::common::ModeKey;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::auth::AuthService;
use crate::config::{Config, ConfigService};
use crate::draft::QuoteDraft;
use crate::error::{PqError, Result};
use crate::prompt::DraftPrompter;
use crate::ui::UI;
use crate::workspace::QuoteWorkspace;
use crate::{
    Commands, ConfigArgs, CreateArgs, DeleteArgs, EditArgs, LoginArgs, OptimizeArgs, ShowArgs,
};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
    prompter: DraftPrompter,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
            prompter: DraftPrompter::new(),
        }
    }

    /// Load configuration using the handler's config path
    pub async fn load_config(&self) -> Result<Config> {
        if let Some(path) = &self.config_path {
            Config::load_from(path).await
        } else {
            Config::load().await
        }
    }

    async fn auth_service(&self) -> Result<AuthService> {
        Ok(AuthService::new(self.load_config().await?))
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => self.handle_login(args).await,
            Commands::Register => self.auth_service().await?.register().await,
            Commands::Logout => self.auth_service().await?.logout().await,
            Commands::Status => self.handle_status().await,
            Commands::List => self.handle_list().await,
            Commands::Show(args) => self.handle_show(args).await,
            Commands::Create(args) => self.handle_create(args).await,
            Commands::Edit(args) => self.handle_edit(args).await,
            Commands::Delete(args) => self.handle_delete(args).await,
            Commands::Optimize(args) => self.handle_optimize(args).await,
            Commands::Config(args) => self.handle_config(args).await,
        }
    }

    async fn handle_login(&mut self, args: LoginArgs) -> Result<()> {
        self.auth_service().await?.login(args.identifier).await
    }

    /// Handle status command
    async fn handle_status(&mut self) -> Result<()> {
        let status_info = self.auth_service().await?.get_status().await?;

        let mut status_info_vec = vec![
            ("Version", status_info.version),
            (
                "Authentication",
                self.ui.format_auth_status(status_info.authenticated),
            ),
        ];
        if let Some(stored_at) = status_info.stored_at {
            status_info_vec.push(("Session since", stored_at));
        }
        status_info_vec.push(("Endpoint", status_info.endpoint));
        status_info_vec.push((
            "Server",
            if status_info.server_connected {
                self.ui.format_server_status(true)
            } else {
                format!(
                    "{} ({})",
                    self.ui.format_server_status(false),
                    status_info.server_status_msg
                )
            },
        ));

        self.ui.card("Status", status_info_vec);
        Ok(())
    }

    async fn handle_list(&mut self) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);

        let pb = self.ui.spinner("Loading quotes...");
        let quotes = workspace.refresh().await;
        pb.finish_and_clear();

        self.ui.header("Quotes");
        self.ui.quote_table(quotes?);
        Ok(())
    }

    async fn handle_show(&mut self, args: ShowArgs) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);
        let quote = workspace.open(&args.id).await?;
        self.ui.quote_detail(quote);
        Ok(())
    }

    /// Handle create command: from a file or field by field
    async fn handle_create(&mut self, args: CreateArgs) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);

        match args.file {
            Some(path) => {
                let request = read_request(&path).await?;
                workspace.open_draft(QuoteDraft::from_request(request));
            }
            None => {
                workspace.open_new();
                self.ui.header("New quote");
                self.prompter.fill(workspace.draft_mut())?;
            }
        }

        let pb = self.ui.spinner("Saving quote...");
        let saved = workspace.submit().await;
        pb.finish_and_clear();

        let quote = saved?;
        self.ui.success(&format!("Created quote {}", quote.id));
        self.ui.quote_detail(quote);
        Ok(())
    }

    async fn handle_edit(&mut self, args: EditArgs) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);
        workspace.open(&args.id).await?;

        match args.file {
            Some(path) => {
                let request = read_request(&path).await?;
                workspace.draft_mut().load_request(request);
            }
            None => {
                self.ui.header("Edit quote");
                self.prompter.fill(workspace.draft_mut())?;
            }
        }

        let pb = self.ui.spinner("Saving quote...");
        let saved = workspace.submit().await;
        pb.finish_and_clear();

        let quote = saved?;
        self.ui.success(&format!("Updated quote {}", quote.id));
        self.ui.quote_detail(quote);
        Ok(())
    }

    async fn handle_delete(&mut self, args: DeleteArgs) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);

        if !args.force {
            let name = workspace.open(&args.id).await?.quote_name.clone();
            if !self.prompter.confirm(&format!("Delete quote '{}'?", name))? {
                self.ui.info("Nothing deleted");
                return Ok(());
            }
        }

        workspace.delete(&args.id).await?;
        self.ui.success(&format!("Deleted quote {}", args.id));
        Ok(())
    }

    /// Handle optimize command: show the proposals, then maybe apply one
    async fn handle_optimize(&mut self, args: OptimizeArgs) -> Result<()> {
        let client = self.auth_service().await?.get_authenticated_client().await?;
        let mut workspace = QuoteWorkspace::new(&client);
        let name = workspace.open(&args.id).await?.quote_name.clone();

        let pb = self.ui.spinner("Computing proposals...");
        let fetched = workspace.fetch_proposals().await.copied();
        pb.finish_and_clear();
        let proposals = fetched?;

        self.ui.header(&format!("Proposals for {}", name));
        self.ui.proposal_cards(&proposals);

        let Some(mode) = self.pick_mode(&args)? else {
            return Ok(());
        };
        debug!("Applying {} proposal", mode);

        let pb = self.ui.spinner("Applying proposal...");
        let applied = workspace.apply_proposal(mode).await;
        pb.finish_and_clear();

        let quote = applied?;
        self.ui.success(&format!("{} applied", mode.title()));
        self.ui.quote_detail(quote);
        Ok(())
    }

    fn pick_mode(&self, args: &OptimizeArgs) -> Result<Option<ModeKey>> {
        if let Some(mode) = args.apply {
            if args.yes || self.prompter.confirm(&format!("Apply {}?", mode.title()))? {
                return Ok(Some(mode));
            }
            self.ui.info("Proposal not applied");
            return Ok(None);
        }

        if !Term::stdout().is_term() {
            return Ok(None);
        }
        let titles: Vec<&str> = ModeKey::ALL.iter().map(|key| key.title()).collect();
        let choice = self.prompter.choose("Apply a proposal?", &titles)?;
        Ok(choice.map(|index| ModeKey::ALL[index]))
    }

    /// Handle config command
    async fn handle_config(&mut self, args: ConfigArgs) -> Result<()> {
        let config = self.load_config().await?;
        let mut service = if let Some(path) = self.config_path.clone() {
            ConfigService::with_config_path(config, path)
        } else {
            ConfigService::new(config)
        };
        service.handle_config(args.command).await
    }
}

/// Read a quote payload from a JSON file
async fn read_request(path: &Path) -> Result<QuoteCreateRequest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PqError::io_from_error(format!("Cannot read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| {
        PqError::invalid_input(format!("{} is not a valid quote: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::fixtures::sample_request;
    use crate::tests::utils::test_helpers::{create_temp_dir, create_temp_file_with_content};

    #[tokio::test]
    async fn test_read_request_from_file() {
        let dir = create_temp_dir();
        let body = serde_json::to_vec(&sample_request()).unwrap();
        let path = create_temp_file_with_content(&dir, "quote.json", &body);

        let request = read_request(&path).await.unwrap();
        assert_eq!(request, sample_request());
    }

    #[tokio::test]
    async fn test_read_request_rejects_bad_json() {
        let dir = create_temp_dir();
        let path = create_temp_file_with_content(&dir, "quote.json", b"{\"quote_name\": 3}");
        let err = read_request(&path).await.unwrap_err();
        assert!(matches!(err, PqError::InvalidInput { .. }));

        let missing = dir.path().join("missing.json");
        let err = read_request(&missing).await.unwrap_err();
        assert!(matches!(err, PqError::Io { .. }));
    }
}
