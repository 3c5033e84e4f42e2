use std::path::PathBuf;
use std::process::ExitCode;

use agentchat::agent::{load_agents, parse_agent_spec};
use agentchat::{
    AgentRef, ChatTarget, ClientConfig, ConfigError, ConversationSession, Message, SessionError, SessionEvent,
    SessionHandle, Transcript,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Parser, Debug)]
#[command(name = "agentchat", about = "Chat with agents over a realtime session")]
struct Cli {
    /// Realtime endpoint returned by the backend when the session was created.
    #[arg(long)]
    endpoint: Option<String>,

    /// Auth token, appended to the endpoint as `token=`.
    #[arg(long)]
    token: Option<String>,

    /// Language model label chosen for this conversation.
    #[arg(long)]
    model: Option<String>,

    /// Known agent, repeatable. Order is the attribution search order.
    #[arg(long = "agent", value_name = "ID=NAME[=AVATAR_URL]")]
    agents: Vec<String>,

    /// JSON array of `{id, name, avatar_url}` agents.
    #[arg(long)]
    agents_file: Option<PathBuf>,

    /// Treat a single agent as a group chat.
    #[arg(long, default_value_t = false)]
    group: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;

    let endpoint = cli.endpoint.or(config.endpoint.clone()).ok_or(SessionError::MissingEndpoint)?;
    let token = cli.token.or(config.token.clone()).ok_or(SessionError::MissingToken)?;
    let model = cli.model.unwrap_or_else(|| config.model.clone());

    let mut agents: Vec<AgentRef> = match cli.agents_file.or(config.agents_file.clone()) {
        Some(path) => load_agents(&path)?,
        None => Vec::new(),
    };
    for spec in &cli.agents {
        agents.push(parse_agent_spec(spec)?);
    }

    let target = match agents.len() {
        0 => return Err(SessionError::NoAgents.into()),
        1 if !cli.group => ChatTarget::Single(agents.remove(0)),
        _ => ChatTarget::Group(agents),
    };

    let session = ConversationSession::new(model, target, endpoint);
    eprintln!("session {} ({}) opening...", session.id, session.model);
    let (handle, mut events) = SessionHandle::open(session, &token, config.transport_options());

    let mut transcript = Transcript::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.close();
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => submit(&handle, &mut transcript, line.trim()),
                    Ok(None) | Err(_) => {
                        stdin_open = false;
                        handle.close();
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Some(SessionEvent::Closed) | None => break,
                    Some(event) => render(event, &mut transcript),
                }
            }
        }
    }

    tracing::info!(messages = transcript.len(), "session finished");
    drop(handle);
    Ok(())
}

fn submit(handle: &SessionHandle, transcript: &mut Transcript, line: &str) {
    if line.is_empty() {
        return;
    }
    if line == "/quit" {
        handle.close();
        return;
    }
    if handle.send(line) {
        transcript.push(Message::user(line));
    } else if handle.awaiting_reply() {
        eprintln!("(waiting for a reply; message not sent)");
    } else {
        eprintln!("(not connected; message not sent)");
    }
}

fn render(event: SessionEvent, transcript: &mut Transcript) {
    match event {
        SessionEvent::Connected => eprintln!("connected"),
        SessionEvent::Typing(true) => eprintln!("... agent is typing"),
        SessionEvent::Typing(false) | SessionEvent::Closed => {}
        SessionEvent::Message(message) => {
            let name = message.agent_name.as_deref().unwrap_or("Agent");
            println!("{name}: {}", message.content);
            if let Some(error) = &message.error {
                eprintln!("  ({name} reported an error: {error})");
            }
            transcript.push(message);
        }
        SessionEvent::TransportError(error) => eprintln!("connection error: {error}"),
    }
}
