use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "study-chat", about = "Ask questions about a study material")]
pub struct CliArgs {
    /// Path to the RON configuration file
    #[arg(long, default_value = "study_chat.ron")]
    pub config: PathBuf,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Study material to ask about (overrides the config file)
    #[arg(long)]
    pub material: Option<u64>,

    /// Ask a single question and exit instead of reading questions from stdin
    #[arg(long)]
    pub question: Option<String>,

    /// Enable debug logging, mirrored to the terminal
    #[arg(long)]
    pub debug: bool,
}
