use std::io::{self, Write};

use anyhow::Context;
use chat_engine::{
    ConversationSession, CredentialProvider, ReqwestTransport, SessionController,
    StaticCredentials, StreamTransport,
};
use chat_logging::{chat_error, chat_info, LogDestination};
use clap::Parser;
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::cli::CliArgs;
use super::config::{load_config, resolve, TOKEN_ENV_VAR};
use super::render::TerminalRenderer;

const QUIT_COMMAND: &str = "/quit";

pub async fn run_app() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = load_config(&args.config)?;

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match (&config.log_file, args.debug) {
        (Some(path), true) => chat_logging::initialize(LogDestination::Both(path), level),
        (Some(path), false) => chat_logging::initialize(LogDestination::File(path), level),
        (None, _) => chat_logging::initialize(LogDestination::Terminal, level),
    }

    let resolved = resolve(&args, config, std::env::var(TOKEN_ENV_VAR).ok())?;
    let transport =
        ReqwestTransport::new(resolved.transport).context("failed to build HTTP client")?;
    let credentials = StaticCredentials::from(resolved.token);
    let mut session = ConversationSession::new(SessionController::new(
        transport,
        credentials,
        resolved.session,
    ));
    let mut renderer = TerminalRenderer::new(io::stdout());

    if let Some(question) = args.question {
        ask(&mut session, &mut renderer, question).await;
        let failed = session.state().last_error().is_some();
        session.close();
        if failed {
            chat_error!("One-shot question failed");
            anyhow::bail!("the question could not be answered");
        }
        return Ok(());
    }

    run_prompt_loop(&mut session, &mut renderer).await?;
    session.close();
    chat_info!("Conversation closed");
    Ok(())
}

/// Reads one question per line until EOF, `/quit` or Ctrl-C at the prompt.
///
/// An empty line resends the question kept after a failed attempt.
async fn run_prompt_loop<T, C>(
    session: &mut ConversationSession<T, C>,
    renderer: &mut TerminalRenderer<io::Stdout>,
) -> anyhow::Result<()>
where
    T: StreamTransport,
    C: CredentialProvider,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };
        if line.trim() == QUIT_COMMAND {
            return Ok(());
        }
        let question = if line.trim().is_empty() {
            session.state().input().to_string()
        } else {
            line
        };
        if question.trim().is_empty() {
            continue;
        }
        ask(session, renderer, question).await;
    }
}

/// Streams one answer to the terminal; Ctrl-C while it streams stops it.
async fn ask<T, C>(
    session: &mut ConversationSession<T, C>,
    renderer: &mut TerminalRenderer<io::Stdout>,
    question: String,
) where
    T: StreamTransport,
    C: CredentialProvider,
{
    session.set_input(question);
    let cancel = session.cancel_handle();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = session.submit(&cancel, renderer).await;
    interrupt.abort();
    renderer.finish(session.state(), &outcome);
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}
