use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "runix")]
#[command(about = "Chat with the Runix research assistant from the terminal", long_about = None)]
pub struct Args {
    #[arg(short = 'n', long = "new", help = "Start a new chat session")]
    pub new_session: bool,

    #[arg(long = "session", help = "Switch to the session with this id")]
    pub session: Option<String>,

    #[arg(long = "list", help = "List chat sessions")]
    pub list_sessions: bool,

    #[arg(long = "rename", help = "Rename the active session")]
    pub rename: Option<String>,

    #[arg(long = "delete", help = "Delete the session with this id")]
    pub delete: Option<String>,

    #[arg(long = "clear", help = "Delete all chat sessions")]
    pub clear_history: bool,

    #[arg(
        long = "regenerate",
        help = "Resend the last user message of the active session"
    )]
    pub regenerate: bool,

    #[arg(
        long = "agent",
        help = "Agent to answer as (crow, falcon, owl, phoenix)"
    )]
    pub agent: Option<String>,

    #[arg(long = "no-stream", help = "Wait for the full reply instead of streaming")]
    pub no_stream: bool,

    #[arg(long = "temperature", help = "Sampling temperature sent to the backend")]
    pub temperature: Option<f32>,

    #[arg(long = "max-output-tokens", help = "Upper bound on reply tokens")]
    pub max_output_tokens: Option<u32>,

    #[arg(
        long = "api-endpoint",
        help = "Runix base URL (e.g., http://localhost:3000)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(long = "set-api-key", help = "Save an API key sent as a Bearer token")]
    pub set_api_key: Option<String>,

    #[arg(long = "inspect", help = "Print the run inspector after the reply")]
    pub inspect: bool,

    #[arg(short = 'v', long = "verbose", help = "Log stream diagnostics to stderr")]
    pub verbose: bool,

    #[arg(help = "Message to send")]
    pub message: Vec<String>,
}
