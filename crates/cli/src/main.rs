use std::path::PathBuf;

use anyhow::Result;
use bridgegraph::commands::{list_backends_command, native_command, render_command, RenderOverrides};
use bridgegraph::init_logging;
use bridgegraph_core::config::NativeFailurePolicy;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Attributed call-graph builder with native (FFI) call-graph merging.
///
/// This CLI is a thin wrapper around `bridgegraph-core`; all graph logic
/// lives in the library so it can be tested and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "bridgegraph",
    version,
    about = "Render call graphs that cross the managed/native boundary",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FailurePolicyArg {
    Abort,
    Degrade,
}

impl From<FailurePolicyArg> for NativeFailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::Abort => NativeFailurePolicy::Abort,
            FailurePolicyArg::Degrade => NativeFailurePolicy::Degrade,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the call graph from a frontend relation stream and emit DOT.
    Render {
        /// Frontend relation stream (YAML, or JSON by extension).
        #[arg(long)]
        input: PathBuf,

        /// Optional config file (YAML, or JSON by extension).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write DOT here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print build/merge statistics as JSON.
        #[arg(long, default_value_t = false)]
        stats_json: bool,

        /// Focus package path.
        #[arg(long)]
        focus: Option<String>,

        /// Grouping: pkg, type (comma-separated or repeated).
        #[arg(long)]
        group: Vec<String>,

        /// Omit standard-distribution packages.
        #[arg(long, default_value_t = false)]
        nostd: bool,

        /// Omit calls to unexported functions.
        #[arg(long, default_value_t = false)]
        nointer: bool,

        /// Include package path prefixes (overrides limit/ignore).
        #[arg(long)]
        include: Vec<String>,

        /// Limit to package path prefixes.
        #[arg(long)]
        limit: Vec<String>,

        /// Ignore package path prefixes.
        #[arg(long)]
        ignore: Vec<String>,

        #[arg(long)]
        minlen: Option<u32>,

        #[arg(long)]
        nodesep: Option<f64>,

        #[arg(long)]
        nodeshape: Option<String>,

        #[arg(long)]
        nodestyle: Option<String>,

        /// LR, RL, TB or BT.
        #[arg(long)]
        rankdir: Option<String>,

        /// Root of the native sources to compile and merge.
        #[arg(long)]
        native_root: Option<PathBuf>,

        /// Pre-generated native call graph (DOT) to merge.
        #[arg(long)]
        native_dot: Option<PathBuf>,

        /// Native backend name (see `backends`).
        #[arg(long)]
        native_backend: Option<String>,

        /// Preprocessor symbol for unifdef (-DNAME, -DNAME=VAL, -UNAME).
        #[arg(long = "define", allow_hyphen_values = true)]
        defines: Vec<String>,

        /// What to do when native extraction fails.
        #[arg(long, value_enum)]
        on_native_failure: Option<FailurePolicyArg>,
    },

    /// List the native call-graph backends.
    Backends {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run only the native extraction and print the native call graph.
    Native {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        native_root: Option<PathBuf>,

        #[arg(long)]
        native_dot: Option<PathBuf>,

        #[arg(long)]
        native_backend: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render {
            input,
            config,
            output,
            stats_json,
            focus,
            group,
            nostd,
            nointer,
            include,
            limit,
            ignore,
            minlen,
            nodesep,
            nodeshape,
            nodestyle,
            rankdir,
            native_root,
            native_dot,
            native_backend,
            defines,
            on_native_failure,
        } => {
            let overrides = RenderOverrides {
                focus,
                group,
                nostd,
                nointer,
                include,
                limit,
                ignore,
                minlen,
                nodesep,
                nodeshape,
                nodestyle,
                rankdir,
                native_root,
                native_dot,
                native_backend,
                defines,
                on_native_failure: on_native_failure.map(Into::into),
            };
            render_command(&input, config.as_deref(), overrides, output.as_deref(), stats_json)?
        }
        Command::Backends { json } => list_backends_command(json)?,
        Command::Native { config, native_root, native_dot, native_backend, json } => {
            native_command(config.as_deref(), native_root, native_dot, native_backend, json)?
        }
    }

    Ok(())
}
