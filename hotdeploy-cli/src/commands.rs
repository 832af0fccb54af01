//! CLI command implementations

use std::path::PathBuf;

use clap::Subcommand;
use hotdeploy_core::config::{
    DEFAULT_SOURCE_ROOT, ENABLED_PARAM, FILTER_VARIABLES_PARAM, InitParams, init_params_from_env,
    parse_filter_variables,
};
use hotdeploy_core::{FilterConfig, RequestContext, ResourceSync, Result, SyncOutcome};
use hotdeploy_web::{ServerConfig, run_server};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve a deployment directory with resource sync in front of it
    Serve {
        /// Deployed web application directory
        #[arg(short, long)]
        deploy_dir: PathBuf,
        /// Source tree mirrored into the deployment
        #[arg(short, long, default_value = DEFAULT_SOURCE_ROOT)]
        source_root: PathBuf,
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Enable resource sync ("true" enables, anything else disables)
        #[arg(long)]
        enabled: Option<String>,
        /// Placeholder values as key=value,key=value
        #[arg(long)]
        filter_variables: Option<String>,
    },
    /// Sync the given resources once and report what happened
    Sync {
        /// Deployed web application directory
        #[arg(short, long)]
        deploy_dir: PathBuf,
        /// Source tree mirrored into the deployment
        #[arg(short, long, default_value = DEFAULT_SOURCE_ROOT)]
        source_root: PathBuf,
        /// Placeholder values as key=value,key=value
        #[arg(long)]
        filter_variables: Option<String>,
        /// Resource paths as requested over HTTP, e.g. /index.html
        #[arg(required = true)]
        resources: Vec<String>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve {
            deploy_dir,
            source_root,
            host,
            port,
            enabled,
            filter_variables,
        } => {
            let filter = serve_filter_config(
                init_params_from_env(),
                deploy_dir,
                source_root,
                enabled,
                filter_variables,
            );
            serve(host, port, filter).await
        }
        Commands::Sync {
            deploy_dir,
            source_root,
            filter_variables,
            resources,
        } => {
            let config =
                sync_filter_config(init_params_from_env(), deploy_dir, source_root, filter_variables);
            for (resource, outcome) in sync_resources(config, resources).await? {
                println!("{resource}: {outcome}");
            }
            Ok(())
        }
    }
}

/// Start the development server
///
/// # Errors
/// - `HotdeployError::Configuration` - Deployment directory missing
/// - `HotdeployError::Io` - Failed to bind or serve
pub async fn serve(host: String, port: u16, filter: FilterConfig) -> Result<()> {
    let mut config = ServerConfig::new(filter);
    config.host = host;
    config.port = port;

    run_server(config).await
}

/// Sync each resource once, returning the outcome per resource in order
///
/// # Errors
/// - `HotdeployError::Sync` - Copying or rewriting a resource failed
pub async fn sync_resources(
    config: FilterConfig,
    resources: Vec<String>,
) -> Result<Vec<(String, SyncOutcome)>> {
    let sync = ResourceSync::new(config);
    let mut outcomes = Vec::with_capacity(resources.len());

    for resource in resources {
        let context = RequestContext::resolve(None, &resource);
        let outcome = sync.sync(&context).await?;
        outcomes.push((resource, outcome));
    }

    Ok(outcomes)
}

/// Init parameters from `env`, overridden by explicit flags.
fn serve_filter_config(
    mut params: InitParams,
    deploy_dir: PathBuf,
    source_root: PathBuf,
    enabled: Option<String>,
    filter_variables: Option<String>,
) -> FilterConfig {
    if let Some(enabled) = enabled {
        params.insert(ENABLED_PARAM.to_string(), enabled);
    }
    if let Some(variables) = filter_variables {
        params.insert(FILTER_VARIABLES_PARAM.to_string(), variables);
    }

    FilterConfig::from_init_params(&params, deploy_dir).with_source_root(source_root)
}

/// Manual syncs are always on; `--filter-variables` replaces the env list.
fn sync_filter_config(
    params: InitParams,
    deploy_dir: PathBuf,
    source_root: PathBuf,
    filter_variables: Option<String>,
) -> FilterConfig {
    let mut config = FilterConfig::from_init_params(&params, deploy_dir)
        .with_enabled(true)
        .with_source_root(source_root);
    if let Some(raw) = filter_variables {
        config.variables = parse_filter_variables(&raw);
    }
    config
}

#[cfg(test)]
mod tests {
    use hotdeploy_core::SkipReason;
    use hotdeploy_core::test_fixtures::WebappDirs;

    use super::*;

    fn env(entries: &[(&str, &str)]) -> InitParams {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_serve_flags_override_env() {
        let config = serve_filter_config(
            env(&[(ENABLED_PARAM, "false"), (FILTER_VARIABLES_PARAM, "pom.version=env")]),
            PathBuf::from("/deploy"),
            PathBuf::from("webapp"),
            Some("true".to_string()),
            Some("pom.version=flag".to_string()),
        );

        assert!(config.enabled);
        assert_eq!(config.variables["pom.version"], "flag");
        assert_eq!(config.source_root, PathBuf::from("webapp"));
        assert_eq!(config.destination_root, PathBuf::from("/deploy"));
    }

    #[test]
    fn test_serve_falls_back_to_env() {
        let config = serve_filter_config(
            env(&[(ENABLED_PARAM, "TRUE"), (FILTER_VARIABLES_PARAM, "project.name=Env")]),
            PathBuf::from("/deploy"),
            PathBuf::from(DEFAULT_SOURCE_ROOT),
            None,
            None,
        );

        assert!(config.enabled);
        assert_eq!(config.variables["project.name"], "Env");
    }

    #[test]
    fn test_serve_defaults_to_disabled() {
        let config = serve_filter_config(
            InitParams::new(),
            PathBuf::from("/deploy"),
            PathBuf::from(DEFAULT_SOURCE_ROOT),
            None,
            None,
        );

        assert!(!config.enabled);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_sync_config_forced_on_and_flag_replaces_env_variables() {
        let config = sync_filter_config(
            env(&[(ENABLED_PARAM, "false"), (FILTER_VARIABLES_PARAM, "a=env,b=env")]),
            PathBuf::from("/deploy"),
            PathBuf::from("webapp"),
            Some("a=flag".to_string()),
        );

        assert!(config.enabled);
        assert_eq!(config.variables.len(), 1);
        assert_eq!(config.variables["a"], "flag");
    }

    #[test]
    fn test_sync_config_keeps_env_variables_without_flag() {
        let config = sync_filter_config(
            env(&[(FILTER_VARIABLES_PARAM, "a=env")]),
            PathBuf::from("/deploy"),
            PathBuf::from("webapp"),
            None,
        );

        assert!(config.enabled);
        assert_eq!(config.variables["a"], "env");
    }

    #[tokio::test]
    async fn test_sync_resources_reports_each_resource() {
        let dirs = WebappDirs::new();
        dirs.write_source("/index.html", "Version: ${pom.version}");
        dirs.write_source("/site.css", "body {}");
        let config = sync_filter_config(
            env(&[(ENABLED_PARAM, "false")]),
            dirs.deploy.clone(),
            dirs.source.clone(),
            Some("pom.version=1.0.0-SNAPSHOT".to_string()),
        );

        let outcomes = sync_resources(
            config,
            vec![
                "/index.html".to_string(),
                "/site.css".to_string(),
                "/missing.js".to_string(),
                "/data.json".to_string(),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            outcomes,
            vec![
                ("/index.html".to_string(), SyncOutcome::Copied { substituted: true }),
                ("/site.css".to_string(), SyncOutcome::Copied { substituted: false }),
                ("/missing.js".to_string(), SyncOutcome::Skipped(SkipReason::MissingSource)),
                (
                    "/data.json".to_string(),
                    SyncOutcome::Skipped(SkipReason::UnwatchedExtension)
                ),
            ]
        );
        assert_eq!(
            dirs.read_deployed("/index.html").as_deref(),
            Some("Version: 1.0.0-SNAPSHOT")
        );
    }

    #[tokio::test]
    async fn test_sync_resources_propagates_io_error() {
        let dirs = WebappDirs::new();
        dirs.write_source("/nested/page.jsp", "<%= 1 %>");
        std::fs::remove_dir(dirs.deploy.join("nested")).unwrap();
        let config = sync_filter_config(
            InitParams::new(),
            dirs.deploy.clone(),
            dirs.source.clone(),
            None,
        );

        let result = sync_resources(config, vec!["/nested/page.jsp".to_string()]).await;

        assert!(matches!(result, Err(hotdeploy_core::HotdeployError::Sync(_))));
    }
}
