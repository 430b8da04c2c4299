use std::path::PathBuf;

use clap::{Parser, Subcommand};
use embedtel_core::{
    config::{Config, InstrumentationCfg},
    http_client::HttpClient,
    instrument::EmbeddingsInstrumentor,
    model::EmbedRequest,
    provider::{EmbedProvider, NullProvider},
    providers::openai::OpenAI,
    telemetry::{CallContext, EmbeddingsInstruments, TracingTracer},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "embedtel CLI smoke tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an embeddings request through the instrumented provider
    Embed {
        #[arg(long)]
        model: String,
        #[arg(short, long, required = true, help = "Input text; repeat for a batch")]
        input: Vec<String>,
        #[arg(short, long, help = "JSON or TOML config file")]
        config: Option<PathBuf>,
        #[arg(long, help = "Do not record prompt contents on the span")]
        no_content: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Embed {
            model,
            input,
            config,
            no_content,
        } => {
            let cfg = match config {
                Some(path) => Config::from_path(&path)?,
                None => Config {
                    instrumentation: InstrumentationCfg::from_env(),
                    ..Config::default()
                },
            };

            let instrumentor = EmbeddingsInstrumentor::new(
                cfg.instrumentation.clone(),
                TracingTracer,
                EmbeddingsInstruments::logging(),
            );
            let provider: Box<dyn EmbedProvider> = if std::env::var(&cfg.openai.api_key_env).is_ok() {
                let http = HttpClient::from_cfg(&cfg.http)?;
                instrumentor.instrument(OpenAI::from_cfg(http, &cfg.openai)?)
            } else {
                tracing::info!(env = %cfg.openai.api_key_env, "api key not set; using null provider");
                instrumentor.instrument(NullProvider)
            };

            let mut cx = CallContext::new();
            if no_content {
                cx = cx.with_trace_content(false);
            }
            let req = if input.len() == 1 {
                EmbedRequest::new(model, input[0].clone())
            } else {
                EmbedRequest::new(model, input)
            };
            let resp = provider.embed(&cx, req).await?;
            for (i, dim) in resp.dimensions().iter().enumerate() {
                println!("{} -> dim={}", i, dim);
            }
        }
    }

    Ok(())
}
