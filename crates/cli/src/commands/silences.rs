use clap::Subcommand;
use karma_core::{
    silences::{Matcher, SilenceRequest},
    AlertService,
};

use super::{
    tables,
    utils::{print_info, print_json, print_success, CliResult, OutputFormat},
};

#[derive(Subcommand)]
pub enum SilenceCommands {
    /// List silences across clusters
    List,

    /// Create a silence
    Create {
        /// Matcher such as alertname=DiskFull or namespace=~kube-.* (repeatable)
        #[arg(short, long = "matcher", required = true)]
        matchers: Vec<String>,

        /// e.g. 2h, 90m, 1d (defaults to the configured duration)
        #[arg(short, long, default_value = "")]
        duration: String,

        #[arg(short, long, default_value = "")]
        comment: String,

        /// Target cluster; defaults to the value of a cluster= matcher
        #[arg(long)]
        cluster: Option<String>,

        #[arg(long)]
        created_by: Option<String>,
    },

    /// Expire a silence
    Remove {
        id: String,

        /// Owning cluster; looked up from the listing when omitted
        #[arg(long)]
        cluster: Option<String>,
    },
}

/// Builds a request from command-line matcher strings.
pub fn build_request(
    matchers: &[String],
    duration: String,
    comment: String,
    cluster: Option<String>,
    created_by: Option<String>,
) -> CliResult<SilenceRequest> {
    let mut parsed = Vec::new();
    for raw in matchers {
        parsed.extend(Matcher::parse_list(raw)?);
    }

    let mut request = SilenceRequest::new(parsed, duration, comment);
    if let Some(cluster) = cluster {
        request = request.with_cluster(cluster);
    }
    if let Some(created_by) = created_by {
        request = request.with_created_by(created_by);
    }
    Ok(request)
}

pub async fn handle_silence_command(
    command: SilenceCommands,
    service: &AlertService,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        SilenceCommands::List => {
            let silences = service.list_silences(service.context()).await?;
            if format == OutputFormat::Json {
                return print_json(&silences);
            }
            tables::silences_table(&silences).printstd();
            print_info(&format!("{} silences", silences.len()));
        }

        SilenceCommands::Create { matchers, duration, comment, cluster, created_by } => {
            let request = build_request(&matchers, duration, comment, cluster, created_by)?;
            let created = service.silence_alert(service.context(), request).await?;
            if format == OutputFormat::Json {
                return print_json(&created);
            }
            print_success(&format!(
                "Silence {} created in {} (via {}), ends {}",
                created.id, created.cluster, created.instance, created.ends_at
            ));
        }

        SilenceCommands::Remove { id, cluster } => {
            service.remove_silence(service.context(), &id, cluster.as_deref()).await?;
            print_success(&format!("Silence {id} removed"));
        }
    }

    Ok(())
}
