//! CLI argument definitions for sonar.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `chart` | Fetch bars for a symbol and print chart series |
//! | `status` | Print current market status, once or continuously |
//! | `chat` | Stream a reply from one chat provider |
//! | `transcribe` | Turn an audio file into text |
//!
//! # Examples
//!
//! ```bash
//! sonar chart AAPL --start 2023-06-01 --end 2023-06-02 --pretty
//! sonar chart MSFT --timeframe 15 --raw
//! sonar status --watch
//! sonar chat --provider anthropic "Summarise AAPL's last quarter"
//! sonar transcribe memo.webm
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sonar_chat::ProviderKind;

/// Market charts, market status and AI chat from the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "sonar",
    author,
    version,
    about = "Market charts, market status and AI chat from the terminal"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch intraday bars and print close/high/low chart series.
    ///
    /// Dates default to the year ending today. Ranges must fall within
    /// 2023-01-01..2025-12-31.
    Chart(ChartArgs),

    /// Print market status. With --watch, refresh every minute until Ctrl-C.
    Status(StatusArgs),

    /// Send one message to a chat provider and stream the reply to stdout.
    Chat(ChatArgs),

    /// Transcribe an audio file with Whisper.
    Transcribe(TranscribeArgs),
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    /// Bar size in minutes: 1, 5, 15, 30 or 60.
    #[arg(long, short, default_value = "1")]
    pub timeframe: String,

    /// First day, YYYY-MM-DD.
    #[arg(long)]
    pub start: Option<String>,

    /// Last day, YYYY-MM-DD.
    #[arg(long)]
    pub end: Option<String>,

    /// Print the full upstream response instead of chart series.
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// Query the selected range for every timeframe, not only one-minute bars.
    #[arg(long, default_value_t = false)]
    pub honour_range: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Keep polling and print each refresh as one JSON line.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// anthropic, openai or perplexity.
    #[arg(long, short)]
    pub provider: ProviderKind,

    /// Message text; multiple words are joined with spaces.
    #[arg(required = true)]
    pub message: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TranscribeArgs {
    /// Audio file to upload.
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_defaults_to_one_minute_without_dates() {
        let cli = Cli::try_parse_from(["sonar", "chart", "AAPL"]).expect("valid arguments");
        match cli.command {
            Command::Chart(args) => {
                assert_eq!(args.symbol, "AAPL");
                assert_eq!(args.timeframe, "1");
                assert!(args.start.is_none());
                assert!(!args.raw);
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn chat_parses_provider_and_message_words() {
        let cli = Cli::try_parse_from(["sonar", "chat", "--provider", "openai", "hello", "there"])
            .expect("valid arguments");
        match cli.command {
            Command::Chat(args) => {
                assert_eq!(args.provider, ProviderKind::OpenAi);
                assert_eq!(args.message, vec!["hello", "there"]);
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn chat_rejects_unknown_provider_and_empty_message() {
        assert!(Cli::try_parse_from(["sonar", "chat", "--provider", "bard", "hi"]).is_err());
        assert!(Cli::try_parse_from(["sonar", "chat", "--provider", "openai"]).is_err());
    }

    #[test]
    fn pretty_is_global() {
        let cli = Cli::try_parse_from(["sonar", "status", "--pretty"]).expect("valid arguments");
        assert!(cli.pretty);
    }
}
