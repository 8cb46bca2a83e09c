use std::{env, path::PathBuf};

use anyhow::Context as _;
use project_scanner::{config::Config, gitlab_client::GitlabClient, provider::Provider, queries};
use scanner_framework::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Missing argument for config path")?;
    let config = Config::load(&config_path).context("Failed to load config")?;

    logging::init(env!("CARGO_PKG_NAME"), config.log_json);
    tracing::info!("project scanner starting");
    tracing::debug!(config = ?config);

    let client = GitlabClient::from_config(&config)?;
    tracing::debug!(endpoint = %client.endpoint());
    let provider = Provider::from_config(client, &config);

    // An optional project path restricts the run to that single project.
    if let Some(full_path) = env::args().nth(2) {
        match provider
            .fetch_single_project(&queries::fetch_project(&full_path))
            .await
        {
            Some(project) => {
                tracing::info!(id = %project.id, created_at = ?project.created_at, "project found")
            }
            None => tracing::warn!(%full_path, "project not found"),
        }
        return Ok(());
    }

    let (projects, completion) = provider.recent_projects(&queries::list_projects()).await;
    for project in &projects {
        tracing::info!(
            id = %project.id,
            created_at = ?project.created_at,
            full_path = ?project.fields.get("fullPath"),
            "recent project"
        );
    }

    if completion.is_complete() {
        tracing::info!(projects = projects.len(), ?completion, "project scan finished");
    } else {
        tracing::warn!(projects = projects.len(), ?completion, "project scan truncated");
    }

    Ok(())
}
