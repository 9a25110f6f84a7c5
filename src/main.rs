use clap::Parser;
use colored::*;
use std::process;

use runix_chat::api::HttpTransport;
use runix_chat::cli::Args;
use runix_chat::config::{save_api_key, Config};
use runix_chat::error::{Result, RunixError};
use runix_chat::orchestrator::{ChatClient, ChatSettings, SendOutcome};
use runix_chat::session::{FilesystemSessionStore, SessionManager};
use runix_chat::ui::{display_error, display_inspector, display_notice, display_sessions, print_delta};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        display_error(&e.to_string());
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::from_env_and_args(&args).map_err(RunixError::ConfigError)?;

    if config.verbose {
        eprintln!("{}", format!("[runix] Base URL: {}", config.base_url).dimmed());
        eprintln!(
            "{}",
            format!("[runix] Data dir: {}", config.data_dir.display()).dimmed()
        );
        if let Some(agent) = config.agent {
            eprintln!("{}", format!("[runix] Agent: {}", agent).dimmed());
        }
    }

    if let Some(key) = &args.set_api_key {
        save_api_key(&config.data_dir, key)?;
        println!("{}", "API key saved.".green());
    }

    let store = FilesystemSessionStore::new(&config.data_dir);
    let mut sessions = SessionManager::load(Box::new(store))?;

    if args.clear_history {
        sessions.clear()?;
        println!("{}", "All chat sessions cleared.".green());
        return Ok(());
    }

    if let Some(id) = &args.delete {
        sessions.delete(id)?;
        println!("{}", format!("Deleted session {}", id).green());
    }

    if let Some(id) = &args.session {
        sessions.select(id)?;
    }

    if args.new_session {
        sessions.create_session(config.agent.unwrap_or_default())?;
    }

    if let Some(title) = &args.rename {
        let id = sessions.ensure_active(config.agent.unwrap_or_default())?;
        sessions.rename(&id, title)?;
    }

    if args.list_sessions {
        display_sessions(sessions.sessions(), sessions.active_id());
        return Ok(());
    }

    if args.message.is_empty() && !args.regenerate {
        let did_something = args.set_api_key.is_some()
            || args.delete.is_some()
            || args.session.is_some()
            || args.new_session
            || args.rename.is_some();
        if did_something {
            return Ok(());
        }
        print_usage();
        process::exit(1);
    }

    let transport = HttpTransport::new(&config)?;
    let mut client = ChatClient::new(Box::new(transport), sessions, ChatSettings::from(&config));

    // Ctrl-C stops the reply in flight; whatever arrived stays in the session.
    let cancel = client.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let outcome = if args.regenerate {
        match client.regenerate(print_delta).await? {
            Some(outcome) => outcome,
            None => {
                display_notice("Nothing to regenerate in this session.");
                return Ok(());
            }
        }
    } else {
        client.send(&args.message.join(" "), print_delta).await?
    };

    match outcome {
        SendOutcome::Replied(message) | SendOutcome::Incomplete(message) => {
            if !message.content.ends_with('\n') {
                println!();
            }
        }
        SendOutcome::Aborted { .. } => {
            println!();
            display_notice("(cancelled)");
        }
        SendOutcome::Failed { error, apology } => {
            if config.verbose {
                eprintln!("{}", format!("[runix] {}", error).dimmed());
            }
            display_notice(&apology.content);
        }
    }

    if args.inspect {
        display_inspector(&client.inspector());
    }

    Ok(())
}

fn print_usage() {
    eprintln!("{}", "Usage: runix [OPTIONS] <message>".red());
    eprintln!("{}", "  -n, --new                  Start a new chat session".dimmed());
    eprintln!("{}", "      --session <ID>         Switch to a session".dimmed());
    eprintln!("{}", "      --list                 List chat sessions".dimmed());
    eprintln!("{}", "      --regenerate           Resend the last user message".dimmed());
    eprintln!("{}", "      --agent <AGENT>        crow, falcon, owl or phoenix".dimmed());
    eprintln!("{}", "      --inspect              Show the run inspector".dimmed());
    eprintln!("{}", "  Run `runix --help` for every option.".dimmed());
}
