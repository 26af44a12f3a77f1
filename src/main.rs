#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # lingua-tutor
//!
//! Serves the tutor over HTTP, or runs a single answer through the pipeline
//! from the command line.
//!
//! Configuration is read from the environment (and a `.env` file, if
//! present). `OPENAI_API_KEY` is required.

use std::sync::Arc;

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use lingua_tutor::{
    PipelineRequest, TutorPipeline,
    config::TutorConfig,
    server::{self, AppState},
    tutor::TutorPrompts,
};
use tracing::{Level, info, metadata::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Start the HTTP server, optionally on a specific port
    Serve(Option<u16>),
    /// Grade one answer and print the result
    Ask(String, String),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the listening port
    fn port() -> impl Parser<Option<u16>> {
        long("port")
            .short('p')
            .help("Port to listen on (overrides PORT)")
            .argument::<u16>("PORT")
            .optional()
    }

    /// parses the language name
    fn language() -> impl Parser<String> {
        positional("LANGUAGE").help("Language being learned, eg. French")
    }

    /// parses the learner's answer
    fn answer() -> impl Parser<String> {
        positional("ANSWER").help("The learner's answer")
    }

    let serve = construct!(Cmd::Serve(port()))
        .to_options()
        .command("serve")
        .help("Start the tutor HTTP server");

    let ask = construct!(Cmd::Ask(language(), answer()))
        .to_options()
        .command("ask")
        .help("Grade an answer, generate feedback, and moderate it");

    let cmd = construct!([serve, ask]);

    cmd.to_options()
        .descr("A language-learning tutor that grades answers and explains mistakes")
        .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(Level::INFO).into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();
    let mut config = TutorConfig::from_env().context("Failed to load configuration")?;
    let prompts = TutorPrompts::load();
    let client = config.completion_client()?;
    info!(
        model = config.openai().model(),
        timeout = ?config.provider_timeout(),
        "Completion provider configured"
    );

    match cmd {
        Cmd::Serve(port) => {
            if let Some(port) = port {
                config.set_server(config.server().clone().with_port(port));
            }
            let app = server::router(AppState::new(client, &prompts, config.stage_options()));
            server::serve(app, config.server()).await?;
        }
        Cmd::Ask(language, answer) => {
            let pipeline =
                TutorPipeline::configured(Arc::new(client), &prompts, config.stage_options());
            let request = PipelineRequest::new(language, answer);
            match pipeline.process_request(&request).await {
                Ok(reply) => {
                    println!("{} {}/10", "Mark:".bold(), reply.mark.to_string().green());
                    println!("{}", reply.feedback);
                }
                Err(e) => {
                    tracing::error!("{e}");
                    eprintln!("{} {}", "Error:".red().bold(), e.public_message());
                    std::process::exit(1);
                }
            }
        }
    };

    Ok(())
}
