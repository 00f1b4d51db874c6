//! Handlers for the menu entries and subcommands.

use std::sync::Arc;

use tracing::{info, warn};

use super::console::{self, Prompter};
use super::interrupt::{InterruptScope, Interrupts};
use super::{AgentInput, MenuChoice};
use crate::agent::{AgentSession, AssistantsRuntime};
use crate::config::AppConfig;
use crate::error::{GenieError, Result};
use crate::genie::{PollOutcome, PollingEngine};

/// Interactive main menu. Returns on "Exit", end of input, or a fatal error.
pub async fn run_menu(config: &AppConfig, interrupts: &Interrupts) -> Result<()> {
    let mut prompter = Prompter::stdin();

    loop {
        console::print_menu();
        let Some(choice) = prompter
            .ask("Please select an option (1-3): ", true)
            .await?
        else {
            return Ok(());
        };

        let outcome = match MenuChoice::parse(&choice) {
            Some(MenuChoice::Genie) => genie_interactive(config, interrupts, &mut prompter).await,
            Some(MenuChoice::Agent) => agent_loop(config, interrupts, &mut prompter).await,
            Some(MenuChoice::Exit) => {
                println!("Exiting the application. Goodbye!");
                return Ok(());
            }
            None => {
                println!("Invalid choice. Please try again.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            if e.is_fatal() {
                return Err(e);
            }
            console::print_error(&e);
        }
        println!();
    }
}

/// `genie ask "<prompt>"`.
pub async fn handle_ask(config: &AppConfig, interrupts: &Interrupts, prompt: &str) -> Result<()> {
    run_genie(config, interrupts, prompt).await.map(|_| ())
}

/// `genie agent`.
pub async fn handle_agent(config: &AppConfig, interrupts: &Interrupts) -> Result<()> {
    let mut prompter = Prompter::stdin();
    agent_loop(config, interrupts, &mut prompter).await
}

async fn genie_interactive(
    config: &AppConfig,
    interrupts: &Interrupts,
    prompter: &mut Prompter,
) -> Result<()> {
    let Some(prompt) = prompter.ask("Please enter your prompt:", false).await? else {
        return Ok(());
    };
    if prompt.trim().is_empty() {
        return Err(GenieError::InvalidArgument(
            "Prompt cannot be null or empty.".into(),
        ));
    }
    run_genie(config, interrupts, &prompt).await.map(|_| ())
}

async fn run_genie(
    config: &AppConfig,
    interrupts: &Interrupts,
    prompt: &str,
) -> Result<PollOutcome> {
    let engine = PollingEngine::from_settings(&config.genie_settings()?)?;
    let scope = interrupts.scope();

    println!("Starting conversation...");
    let outcome = engine
        .run(prompt, scope.token(), |conversation, snapshot| {
            console::print_genie_info(conversation, snapshot, "");
        })
        .await?;

    println!("Message processing is completed.");
    console::print_genie_info(&outcome.conversation, &outcome.snapshot, &outcome.result);
    Ok(outcome)
}

/// Ctrl-C during a request cancels that request; Ctrl-C at the prompt ends
/// the session, and cleanup still runs.
async fn agent_loop(
    config: &AppConfig,
    interrupts: &Interrupts,
    prompter: &mut Prompter,
) -> Result<()> {
    let agent_settings = config.agent_settings()?;
    let engine = PollingEngine::from_settings(&config.genie_settings()?)?;
    let runtime = Arc::new(AssistantsRuntime::from_settings(&agent_settings)?);

    let session_scope = interrupts.scope();
    let mut session = AgentSession::start(runtime, &agent_settings, engine).await?;
    session
        .observers_mut()
        .on_text(console::print_delta)
        .on_image(|path| println!("New image received: {}", path.display()));

    let result = prompt_loop(&session, interrupts, &session_scope, prompter).await;
    drop(session_scope);

    let report = session.cleanup().await?;
    console::print_sweep_report(&report);
    result
}

async fn prompt_loop(
    session: &AgentSession,
    interrupts: &Interrupts,
    session_scope: &InterruptScope,
    prompter: &mut Prompter,
) -> Result<()> {
    loop {
        let line = tokio::select! {
            _ = session_scope.token().cancelled() => {
                println!();
                console::print_notice("Interrupted. Closing the agent session.");
                return Ok(());
            }
            line = prompter.ask(
                "Please enter your prompt for the Azure AI Agent (type 'exit' to quit):",
                false,
            ) => line?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        match AgentInput::classify(&line) {
            AgentInput::Exit => {
                println!("Exiting Azure AI Agent interaction.");
                return Ok(());
            }
            AgentInput::Blank => {
                console::print_notice("Prompt cannot be null or empty. Please try again.");
            }
            AgentInput::Prompt(prompt) => {
                let request = interrupts.scope();
                match session.send(prompt, request.token()).await {
                    Ok(outcome) => {
                        info!(
                            passes = outcome.passes,
                            tool_outputs = outcome.tool_outputs.len(),
                            images = outcome.images.len(),
                            "Agent reply finished"
                        );
                        println!();
                    }
                    Err(GenieError::Canceled) => {
                        println!();
                        console::print_notice("Request cancelled.");
                    }
                    Err(e) => {
                        warn!(error = %e, "Agent request failed");
                        console::print_error(&e);
                    }
                }
            }
        }
        println!();
    }
}
