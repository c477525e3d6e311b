use clap::Subcommand;
use karma_core::AlertService;

use super::{
    tables,
    utils::{print_info, print_json, print_success, CliResult, OutputFormat},
};

#[derive(Subcommand)]
pub enum AlertCommands {
    /// Check that the Karma dashboard is reachable
    Check,

    /// List alerts
    Alerts {
        /// active, suppressed or all
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Alert counts by severity, state and cluster
    Summary,

    /// Clusters with their alert counts
    Clusters,

    /// Alertmanager instances behind the dashboard
    Upstreams,

    /// Alerts of one cluster
    ByCluster { cluster: String },

    /// Alerts of one namespace
    ByNamespace { namespace: String },

    /// Alerts of one severity (critical, warning, info, none, unknown)
    BySeverity { severity: String },

    /// Search alerts by name
    Search {
        pattern: String,

        /// substring (default) or exact
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Alerts for a container across clusters
    Container {
        container: String,

        /// Only clusters whose name contains this
        #[arg(short, long)]
        cluster: Option<String>,
    },

    /// Every alert with the given name
    Details {
        name: String,

        /// Group by cluster and show per-cluster counts
        #[arg(long)]
        multi_cluster: bool,

        /// Only clusters whose name contains this (with --multi-cluster)
        #[arg(short, long)]
        cluster: Option<String>,
    },
}

pub async fn handle_alert_command(
    command: AlertCommands,
    service: &AlertService,
    format: OutputFormat,
) -> CliResult<()> {
    let json = format == OutputFormat::Json;

    match command {
        AlertCommands::Check => {
            let report = service.check_upstream(service.context()).await?;
            if json {
                return print_json(&report);
            }
            let latency = report.latency_ms().map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
            print_success(&format!(
                "Karma at {} is reachable ({latency})",
                service.client().base_url()
            ));
        }

        AlertCommands::Alerts { state } => {
            let alerts = service.list_alerts(service.context(), state.as_deref()).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
            print_info(&format!("{} alerts", alerts.len()));
        }

        AlertCommands::Summary => {
            let summary = service.alerts_summary(service.context()).await?;
            if json {
                return print_json(&summary);
            }
            let (counts, top) = tables::summary_tables(&summary);
            counts.printstd();
            println!("\nTop alerts ({} unique names):", summary.unique_alert_names);
            top.printstd();
        }

        AlertCommands::Clusters => {
            let clusters = service.list_clusters(service.context()).await?;
            if json {
                return print_json(&clusters);
            }
            tables::clusters_table(&clusters).printstd();
        }

        AlertCommands::Upstreams => {
            let instances = service.list_upstream_instances(service.context()).await?;
            if json {
                return print_json(&instances);
            }
            tables::instances_table(&instances).printstd();
        }

        AlertCommands::ByCluster { cluster } => {
            let alerts = service.alerts_by_cluster(service.context(), &cluster).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::ByNamespace { namespace } => {
            let alerts = service.alerts_by_namespace(service.context(), &namespace).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::BySeverity { severity } => {
            let alerts = service.alerts_by_severity(service.context(), &severity).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::Search { pattern, mode } => {
            let alerts = service.search_alerts(service.context(), &pattern, mode.as_deref()).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::Container { container, cluster } => {
            let alerts = service
                .search_alerts_by_container(service.context(), &container, cluster.as_deref())
                .await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::Details { name, multi_cluster: false, .. } => {
            let alerts = service.alert_details(service.context(), &name).await?;
            if json {
                return print_json(&alerts);
            }
            tables::alerts_table(&alerts).printstd();
        }

        AlertCommands::Details { name, multi_cluster: true, cluster } => {
            let grouped = service
                .alert_details_multi_cluster(service.context(), &name, cluster.as_deref())
                .await?;
            if json {
                return print_json(&grouped);
            }
            if grouped.is_empty() {
                print_info(&format!("No '{name}' alerts in any cluster"));
                return Ok(());
            }
            tables::grouped_alerts_table(&grouped).printstd();

            let stats = service.multi_cluster_stats(service.context(), &name).await?;
            tables::cluster_stats_table(&stats).printstd();
        }
    }

    Ok(())
}
