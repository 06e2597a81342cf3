//! One pass of the tool in two stages. [`prepare`] authenticates, loads
//! the attribute catalog and the category's assets, and generates the
//! ExifTool config; [`PreparedRun::execute`] then writes every file in the
//! chosen folder.

use std::path::PathBuf;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::auth::{self, UserCredentials};
use crate::config::Config;
use crate::exiftool::folder::{clean_folder_input, process_folder, FolderSummary};
use crate::exiftool::writer::{ToolRunner, WriterSettings};
use crate::mediavalet::{
    self, fetch_assets_in_category, fetch_attribute_catalog, ApiClient, AssetMetadataTable,
    AttributeCatalog,
};
use crate::prompt;

/// Everything fetched for a run. Created after authentication and dropped
/// when the run ends.
#[derive(Debug)]
pub struct RunContext {
    pub api: ApiClient,
    pub catalog: AttributeCatalog,
    pub assets: AssetMetadataTable,
}

impl RunContext {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            catalog: AttributeCatalog::default(),
            assets: AssetMetadataTable::default(),
        }
    }

    /// Fetch the custom attribute catalog. A failed request leaves it empty.
    pub async fn load_catalog(&mut self) {
        self.catalog = fetch_attribute_catalog(&self.api)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to retrieve attributes: {}", e);
                AttributeCatalog::default()
            });
    }

    /// Fetch the category's assets projected onto the catalog. A failed
    /// request leaves the table empty.
    pub async fn load_assets(&mut self, category_id: &str) {
        self.assets = fetch_assets_in_category(&self.api, &self.catalog, category_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to retrieve assets: {}", e);
                AssetMetadataTable::default()
            });
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub attributes: usize,
    pub assets: usize,
    pub folder: FolderSummary,
}

impl RunSummary {
    /// Fails when any file failed or the folder was not fully processed.
    pub fn ensure_complete(&self) -> anyhow::Result<()> {
        if self.folder.failed > 0 {
            anyhow::bail!("{} files failed", self.folder.failed);
        }
        if self.folder.cancelled {
            anyhow::bail!("Interrupted before all files were processed");
        }
        Ok(())
    }
}

/// A run with every interactive and network stage done, ready to write
/// files.
#[derive(Debug)]
pub struct PreparedRun {
    context: RunContext,
    folder: PathBuf,
    settings: WriterSettings,
    no_progress_bar: bool,
}

/// Prompt for anything missing, authenticate, fetch the catalog and the
/// category's assets, and generate the ExifTool config.
///
/// Returns an error when no token is issued or the config cannot be
/// written. Nothing here observes cancellation, so the caller installs its
/// signal handler only once this returns.
pub async fn prepare(config: &Config) -> anyhow::Result<PreparedRun> {
    let http = mediavalet::http_client(config.http_timeout)?;

    let user = UserCredentials {
        username: prompt::value_or_prompt(
            config.username.clone(),
            "Enter MediaValet Username: ",
            "Username",
        )?,
        password: prompt::password_or_prompt(
            config.password.clone(),
            "Enter MediaValet Password: ",
        )?,
    };

    let token = auth::acquire_token(&http, &config.endpoints, &config.client, &user)
        .await
        .context("Token request failed")?
        .ok_or_else(|| anyhow::anyhow!("Authentication failed: no access token was issued"))?;
    tracing::info!("Authenticated as {}", user.username);
    drop(user);

    let api = ApiClient::new(
        http,
        config.endpoints.clone(),
        token,
        config.subscription_key.clone(),
    );
    let mut context = RunContext::new(api);
    context.load_catalog().await;
    if context.catalog.is_empty() {
        tracing::warn!("No custom attributes available; files will receive no tags");
    }

    let category = prompt::value_or_prompt(
        config.category.clone(),
        "Enter MediaValet Category ID: ",
        "Category ID",
    )?;
    context.load_assets(category.trim()).await;
    if context.assets.is_empty() {
        tracing::warn!("No assets found in category {}", category.trim());
    }

    let config_path = crate::exiftool::config::write_config(
        &context.catalog,
        &config.namespace,
        &config.exiftool_config,
    )
    .context("Failed to generate ExifTool config")?;

    let folder_input = prompt::value_or_prompt(
        config.directory.clone(),
        "Enter Local Folder Path: ",
        "Folder path",
    )?;

    Ok(PreparedRun {
        context,
        folder: PathBuf::from(clean_folder_input(&folder_input)),
        settings: WriterSettings {
            exiftool: config.exiftool.clone(),
            config_path,
            namespace: config.namespace.clone(),
            timeout: config.tool_timeout,
            dry_run: config.dry_run,
        },
        no_progress_bar: config.no_progress_bar,
    })
}

impl PreparedRun {
    /// Write metadata into every file of the chosen folder.
    ///
    /// Returns an error when the folder is invalid. Per-file failures and
    /// cancellation are reported in the summary.
    pub async fn execute(
        self,
        runner: &dyn ToolRunner,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RunSummary> {
        let folder = process_folder(
            &self.folder,
            &self.context.assets,
            &self.settings,
            runner,
            self.no_progress_bar,
            cancel,
        )
        .await?;

        Ok(RunSummary {
            attributes: self.context.catalog.len(),
            assets: self.context.assets.len(),
            folder,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::auth::endpoints::Endpoints;
    use crate::auth::ClientCredentials;
    use crate::exiftool::writer::test_support::RecordingRunner;
    use crate::exiftool::Namespace;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, work: &Path, folder: &Path) -> Config {
        Config {
            username: Some("operator@example.com".into()),
            password: Some("hunter2".into()),
            category: Some("cat-1".into()),
            directory: Some(format!("\"{}\"", folder.display())),
            client: ClientCredentials {
                client_id: "client-id".into(),
                client_secret: "client-secret".into(),
            },
            subscription_key: "sub-key".into(),
            endpoints: Endpoints::new(&server.uri(), &server.uri()).unwrap(),
            exiftool: PathBuf::from("exiftool"),
            exiftool_config: work.join("ExifTool_config"),
            namespace: Namespace::default(),
            http_timeout: None,
            tool_timeout: None,
            dry_run: false,
            no_progress_bar: true,
        }
    }

    async fn mount_token(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"access_token": "tok"})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let server = MockServer::start().await;
        mount_token(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/attributes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payload": [
                    {"id": "id1", "name": "ProjectName", "isSystemProperty": false},
                    {"id": "sys", "name": "Created", "isSystemProperty": true}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payload": {"assets": [
                    {"file": {"fileName": "photo.jpg"}, "attributes": {"id1": "Acme", "sys": "2024"}}
                ]}
            })))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join("photo.jpg"), b"jpeg").unwrap();
        std::fs::write(folder.path().join("unknown.jpg"), b"jpeg").unwrap();

        let config = config_for(&server, work.path(), folder.path());
        let runner = RecordingRunner::default();
        let summary = prepare(&config)
            .await
            .unwrap()
            .execute(&runner, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.attributes, 1);
        assert_eq!(summary.assets, 1);
        assert_eq!(summary.folder.written, 1);
        assert_eq!(summary.folder.skipped, 1);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let args: Vec<String> = calls[0]
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"-XMP-mv:ProjectName=Acme".to_string()));
        assert!(args.contains(&"-overwrite_original".to_string()));
        assert!(!args.iter().any(|a| a.contains("Created")));

        let generated = std::fs::read_to_string(work.path().join("ExifTool_config")).unwrap();
        assert!(generated.contains("    ProjectName => { },"));
        assert!(!generated.contains("Created"));
    }

    #[tokio::test]
    async fn test_failed_fetches_continue_with_empty_tables() {
        let server = MockServer::start().await;
        mount_token(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/attributes"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join("photo.jpg"), b"jpeg").unwrap();

        let config = config_for(&server, work.path(), folder.path());
        let runner = RecordingRunner::default();
        let summary = prepare(&config)
            .await
            .unwrap()
            .execute(&runner, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.attributes, 0);
        assert_eq!(summary.assets, 0);
        assert_eq!(summary.folder.skipped, 1);
        assert!(runner.calls().is_empty());
        assert!(work.path().join("ExifTool_config").exists());
    }

    #[tokio::test]
    async fn test_rejected_login_stops_run() {
        let server = MockServer::start().await;
        mount_token(&server, 401).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let folder = tempfile::tempdir().unwrap();
        let config = config_for(&server, work.path(), folder.path());

        let err = prepare(&config).await.unwrap_err();
        assert!(err.to_string().contains("no access token"));
        assert!(!work.path().join("ExifTool_config").exists());
    }

    #[tokio::test]
    async fn test_invalid_folder_is_error() {
        let server = MockServer::start().await;
        mount_token(&server, 200).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let missing = work.path().join("no-such-folder");
        let config = config_for(&server, work.path(), &missing);
        let runner = RecordingRunner::default();

        let err = prepare(&config)
            .await
            .unwrap()
            .execute(&runner, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_cancelled_run_is_incomplete() {
        let server = MockServer::start().await;
        mount_token(&server, 200).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join("photo.jpg"), b"jpeg").unwrap();
        let config = config_for(&server, work.path(), folder.path());
        let runner = RecordingRunner::default();

        // Preparation finishes before any cancellation token exists.
        let prepared = prepare(&config).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = prepared.execute(&runner, &cancel).await.unwrap();

        assert!(summary.folder.cancelled);
        assert!(runner.calls().is_empty());
        let err = summary.ensure_complete().unwrap_err();
        assert!(err.to_string().contains("Interrupted"));
    }

    #[test]
    fn test_ensure_complete() {
        let mut summary = RunSummary::default();
        assert!(summary.ensure_complete().is_ok());

        summary.folder.failed = 2;
        assert!(summary
            .ensure_complete()
            .unwrap_err()
            .to_string()
            .contains("2 files failed"));
    }
}
