use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use nexus_tester::report::{self, OutputFormat, RunReport, Suite};
use nexus_tester::runner::{NodeSelection, NodeTester, Progress, WorkflowSelection, WorkflowTester};
use nexus_tester::utils::{self, config::HarnessConfig, config::TestEnvironment};
use nexus_tester::driver;

#[derive(Parser)]
#[command(name = "nexus-tester")]
#[command(version)]
#[command(about = "Test harness for n8n workflows and custom nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append log records to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger deployed workflows and check their executions
    Workflows {
        #[command(flatten)]
        target: WorkflowTarget,

        #[command(flatten)]
        connection: Connection,

        /// Test environment; isolated answers executions with canned responses
        #[arg(long, env = "TEST_ENV", value_enum, default_value = "isolated")]
        env: TestEnvironment,

        /// Seconds to wait for an execution to finish
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Seconds between two status checks
        #[arg(long, default_value = "2")]
        poll_interval: u64,

        /// Directory holding <workflow_id>.json input overrides
        #[arg(long, default_value = "test_data")]
        test_data_dir: PathBuf,

        #[command(flatten)]
        output: Output,
    },

    /// Build, lint and test custom node modules
    Nodes {
        #[command(flatten)]
        target: NodeTarget,

        /// Directory containing custom nodes
        #[arg(long, env = "NODE_DIR", default_value = "./custom-nodes")]
        node_dir: PathBuf,

        /// Preferred build tool, tsc is used when it is not installed
        #[arg(long, env = "N8N_DEV_CLI", default_value = "n8n-node-dev")]
        build_cli: String,

        /// Program that runs a module's unit tests
        #[arg(long, default_value = "pytest")]
        test_runner: String,

        #[command(flatten)]
        output: Output,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct WorkflowTarget {
    /// Test a specific workflow by ID
    #[arg(long)]
    workflow: Option<String>,

    /// Test all workflows with a specific tag
    #[arg(long)]
    tag: Option<String>,

    /// Test all workflows
    #[arg(long)]
    all: bool,
}

impl WorkflowTarget {
    fn selection(self) -> WorkflowSelection {
        match (self.workflow, self.tag) {
            (Some(id), _) => WorkflowSelection::Single(id),
            (None, Some(tag)) => WorkflowSelection::Tag(tag),
            (None, None) => WorkflowSelection::All,
        }
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct NodeTarget {
    /// Test a specific node by name
    #[arg(long)]
    node: Option<String>,

    /// Test all nodes
    #[arg(long)]
    all: bool,
}

impl NodeTarget {
    fn selection(self) -> NodeSelection {
        match self.node {
            Some(name) => NodeSelection::Single(name),
            None => NodeSelection::All,
        }
    }
}

#[derive(Args)]
struct Connection {
    #[arg(long, env = "N8N_HOST", default_value = "localhost")]
    host: String,

    #[arg(long, env = "N8N_PORT", default_value = "5678")]
    port: u16,

    #[arg(long, env = "N8N_PROTOCOL", default_value = "http")]
    protocol: String,

    #[arg(long, env = "N8N_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Args)]
struct Output {
    /// Output format for test results
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    utils::logging::init(cli.verbose, cli.log_file.as_deref())?;
    let progress = Progress::new(!cli.verbose);

    let (report, output) = match cli.command {
        Commands::Workflows {
            target,
            connection,
            env,
            timeout,
            poll_interval,
            test_data_dir,
            output,
        } => {
            let config = HarnessConfig {
                base_url: HarnessConfig::base_url_from_parts(
                    &connection.protocol,
                    &connection.host,
                    connection.port,
                ),
                api_key: connection.api_key.filter(|k| !k.is_empty()),
                test_env: env,
                poll_timeout: Duration::from_secs(timeout),
                poll_interval: Duration::from_secs(poll_interval),
                test_data_dir,
                ..Default::default()
            };
            config.validate()?;
            log::info!(
                "Testing workflows against {} ({} environment)",
                config.base_url,
                config.test_env.as_str()
            );

            let api = driver::connect(&config)?;
            let tester = WorkflowTester::new(api, &config).with_progress(progress);
            let verdicts = tester.run(&target.selection()).await?;
            (RunReport::new(Suite::Workflows, verdicts), output)
        }
        Commands::Nodes {
            target,
            node_dir,
            build_cli,
            test_runner,
            output,
        } => {
            let config = HarnessConfig {
                node_dir,
                build_cli,
                test_runner,
                ..Default::default()
            };
            let tester = NodeTester::new(&config).with_progress(progress);
            let verdicts = tester.run(&target.selection()).await;
            (RunReport::new(Suite::Nodes, verdicts), output)
        }
    };

    report::emit(&report, output.format, output.output.as_deref())?;

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
