use std::fs::File;
use std::io::BufWriter;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::{error, info, LevelFilter};

use sourmash_relay::cmd::{sketch_path, SketchParameters};
use sourmash_relay::config::{RelayConfig, DEFAULT_BIND, DEFAULT_MAX_UPLOAD, DEFAULT_SEARCH_URL};
use sourmash_relay::search::{results_to_json, SearchClient};
use sourmash_relay::server::serve;
use sourmash_relay::signature::{save_signatures, Signature};
use sourmash_relay::Result;

#[derive(Parser)]
#[command(name = "smrelay", version, about = "Sketch sequences and relay them to a sourmash search API")]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP relay
    Serve {
        #[arg(long, env = "RELAY_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Largest accepted request body, in bytes
        #[arg(long, env = "RELAY_MAX_UPLOAD", default_value_t = DEFAULT_MAX_UPLOAD)]
        max_upload: usize,

        #[command(flatten)]
        sketch: SketchArgs,
    },

    /// Sketch a sequence file and save the signature
    Sketch {
        /// FASTA/FASTQ file, optionally gzip compressed
        input: PathBuf,

        /// Output signature; compressed when the name ends in .gz
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        sketch: SketchArgs,
    },

    /// Sketch a sequence file (or load a signature) and query the remote search
    Search {
        input: PathBuf,

        /// Treat the input as a signature instead of sequences
        #[arg(long)]
        signature: bool,

        #[command(flatten)]
        remote: RemoteArgs,

        #[command(flatten)]
        sketch: SketchArgs,
    },
}

#[derive(Args)]
struct RemoteArgs {
    /// Search API receiving the serialized sketch
    #[arg(long, env = "RELAY_SEARCH_URL", default_value = DEFAULT_SEARCH_URL)]
    search_url: String,

    /// Outbound request timeout in seconds
    #[arg(long, env = "RELAY_TIMEOUT")]
    timeout: Option<u64>,
}

impl RemoteArgs {
    fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Args)]
struct SketchArgs {
    /// k-mer size
    #[arg(short, long, default_value_t = 21)]
    ksize: u32,

    /// Keep roughly one in `scaled` distinct k-mers
    #[arg(long, default_value_t = 1000)]
    scaled: u64,
}

impl SketchArgs {
    fn params(&self) -> SketchParameters {
        SketchParameters::builder()
            .ksize(self.ksize)
            .scaled(self.scaled)
            .build()
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Serve {
            bind,
            remote,
            max_upload,
            sketch,
        } => {
            let config = RelayConfig::builder()
                .bind(bind)
                .search_url(remote.search_url.clone())
                .max_upload(max_upload)
                .timeout(remote.timeout())
                .sketch(sketch.params())
                .build();
            serve(config).await?;
        }
        Command::Sketch {
            input,
            output,
            sketch,
        } => {
            let sig = sketch_path(&input, &sketch.params())?;

            let compress = output.extension().map_or(false, |ext| ext == "gz");
            let writer = BufWriter::new(File::create(&output)?);
            save_signatures(&[sig], writer, compress)?;
            info!("saved signature to {}", output.display());
        }
        Command::Search {
            input,
            signature,
            remote,
            sketch,
        } => {
            let sigs = if signature {
                Signature::from_path(&input)?
            } else {
                vec![sketch_path(&input, &sketch.params())?]
            };

            let client = SearchClient::new(remote.search_url.clone(), remote.timeout())?;
            let results = client.query(&sigs).await?;
            println!("{}", results_to_json(&results)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if cli.quiet {
        log::set_max_level(LevelFilter::Warn);
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
