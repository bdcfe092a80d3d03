use std::error::Error;
use std::io;
use std::process;

use chatloop::commands::chat::{self, ChatArgs};
use chatloop::commands::config::{self, ConfigArgs};
use chatloop::logging;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};

const VERSION_TEXT: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("CHATLOOP_GIT_SHA"),
    ", built: ",
    env!("CHATLOOP_BUILD_TS"),
    ")"
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  chatloop\n  chatloop --provider ollama\n  chatloop --provider fake --verbose\n  chatloop config check\n  chatloop completion bash > ~/.local/share/bash-completion/completions/chatloop\n\nType `exit` at the `You: ` prompt to leave.";

#[derive(Debug, Parser)]
#[command(
    name = "chatloop",
    about = "Chat with an LLM persona from the terminal",
    version = VERSION_TEXT,
    args_conflicts_with_subcommands = true,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,
    /// Print debug logs on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Suppress all logs; fatal errors are still printed.
    #[arg(long, short, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Inspect the local config file")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "chatloop", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "chatloop", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "chatloop", &mut io::stdout()),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result: Result<(), Box<dyn Error>> = match cli.command {
        None => chat::run(cli.chat).await.map_err(Into::into),
        Some(Commands::Config(args)) => config::run(args).map_err(Into::into),
        Some(Commands::Completion { shell }) => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
