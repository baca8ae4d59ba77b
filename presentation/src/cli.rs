use crate::clipboard;
use crate::interrupt::InterruptRouter;
use crate::render::{print_error, TerminalRenderer};
use crate::view::{RepositoryStatus, SessionView};
use application::analyze_service::{AnalyzeRequest, AnalyzeService};
use application::conversation_service::{ConversationService, UserTurn};
use clap::{ArgAction, Parser};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use domain::models::ImageAttachment;
use domain::session::{Role, Session};
use infrastructure::config::Config;
use infrastructure::gemini_client::GeminiClient;
use infrastructure::image_loader::load_image;
use shared::confirmation::confirm_discard_conversation;
use shared::error::{ModelRequestError, RepoMindError};
use shared::types::Result;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "repomind")]
#[command(about = "Chat with Gemini about a zipped codebase, screenshots included")]
pub struct Cli {
    /// Project archive (.zip) to analyze on startup
    pub archive: Option<PathBuf>,

    /// Gemini API key (defaults to GEMINI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Gemini model to use (defaults to GEMINI_MODEL or gemini-2.5-flash)
    #[arg(long)]
    pub model: Option<String>,

    /// Screenshot (PNG/JPEG) to attach to the first question
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Ask a single question, print the answer and exit
    #[arg(short, long)]
    pub question: Option<String>,

    /// Copy every final answer to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Keep the conversation when another archive is loaded
    #[arg(long)]
    pub keep_history: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Load(PathBuf),
    Key(Option<String>),
    Image(PathBuf),
    Detach,
    Files,
    History,
    Help,
    Exit,
    Ask(String),
    Empty,
    Unknown(String),
}

pub fn parse_command(input: &str) -> ReplCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return ReplCommand::Exit;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ReplCommand::Ask(trimmed.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name, arg.is_empty()) {
        ("load", false) => ReplCommand::Load(PathBuf::from(arg)),
        ("key", true) => ReplCommand::Key(None),
        ("key", false) => ReplCommand::Key(Some(arg.to_string())),
        ("image", false) => ReplCommand::Image(PathBuf::from(arg)),
        ("detach", _) => ReplCommand::Detach,
        ("files", _) => ReplCommand::Files,
        ("history", _) => ReplCommand::History,
        ("help", _) => ReplCommand::Help,
        ("exit" | "quit", _) => ReplCommand::Exit,
        _ => ReplCommand::Unknown(trimmed.to_string()),
    }
}

pub struct CliApp {
    session: Session,
    analyzer: AnalyzeService,
    conversation: ConversationService<GeminiClient>,
    pending_image: Option<ImageAttachment>,
    interrupts: InterruptRouter,
    keep_history: bool,
    copy_to_clipboard: bool,
}

impl CliApp {
    pub fn new(cli: &Cli, config: Config) -> Result<Self> {
        let client = GeminiClient::new(&config)?;
        debug!(model = client.model(), "gemini client ready");
        Ok(Self {
            session: Session::with_api_key(config.api_key),
            analyzer: AnalyzeService::new(cli.keep_history),
            conversation: ConversationService::new(client),
            pending_image: None,
            interrupts: InterruptRouter::install(),
            keep_history: cli.keep_history,
            copy_to_clipboard: cli.copy,
        })
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        if let Some(archive) = cli.archive {
            self.handle_load(archive).await?;
        }
        if let Some(image) = cli.image {
            self.handle_image(image);
        }

        if let Some(question) = cli.question {
            if !self.session.is_loaded() {
                anyhow::bail!("a repository archive is required to ask a question");
            }
            return self.handle_question(question).await;
        }

        self.print_welcome();
        self.repl().await
    }

    async fn repl(&mut self) -> Result<()> {
        loop {
            let view = SessionView::from_session(&self.session);
            let label = match &self.pending_image {
                Some(image) if view.chat_input_visible => {
                    format!("{} [{}]", view.input_prompt(), image.name)
                }
                _ => view.input_prompt().to_string(),
            };
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .allow_empty(true)
                .interact_text()?;

            match parse_command(&input) {
                ReplCommand::Exit => break,
                ReplCommand::Empty => continue,
                ReplCommand::Load(path) => {
                    if self.session.api_key().is_none() {
                        self.prompt_api_key()?;
                    }
                    self.handle_load(path).await?
                }
                ReplCommand::Key(Some(key)) => self.set_api_key(key),
                ReplCommand::Key(None) => self.prompt_api_key()?,
                ReplCommand::Image(path) => self.handle_image(path),
                ReplCommand::Detach => {
                    if self.pending_image.take().is_some() {
                        println!("{}", "Screenshot detached.".yellow());
                    }
                }
                ReplCommand::Files => self.print_files(),
                ReplCommand::History => self.print_history(),
                ReplCommand::Help => Self::print_help(),
                ReplCommand::Unknown(command) => {
                    println!("{} {}", "Unknown command:".yellow(), command);
                    Self::print_help();
                }
                ReplCommand::Ask(question) => {
                    if !view.chat_input_visible {
                        println!(
                            "{}",
                            "Please load a ZIP archive with /load <path> to begin.".cyan()
                        );
                        continue;
                    }
                    self.handle_question(question).await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_load(&mut self, archive: PathBuf) -> Result<()> {
        if self.session.is_loaded() && !self.keep_history && !self.session.transcript().is_empty()
        {
            if !confirm_discard_conversation(self.session.transcript().len())? {
                return Ok(());
            }
        }

        eprintln!("{}", "Processing repository... extracting files".cyan());
        let request = AnalyzeRequest {
            api_key: self.session.api_key().map(String::from),
            archive: Some(archive),
        };
        let operation = self.interrupts.begin();
        // Dropping the load future leaves the session as it was; the blocking
        // extraction finishes in the background and removes its scratch dir.
        let result = tokio::select! {
            biased;
            _ = operation.token().cancelled() => {
                println!("{}", "Load cancelled.".yellow());
                return Ok(());
            }
            result = self.analyzer.on_analyze_requested(&mut self.session, request) => result,
        };
        drop(operation);

        match result {
            Ok(outcome) => {
                println!(
                    "{}",
                    format!("Repository loaded: {} files.", outcome.file_count).green()
                );
                if outcome.transcript_cleared {
                    println!("{}", "Previous conversation cleared.".yellow());
                }
            }
            Err(RepoMindError::Archive(err)) => {
                debug!(error = %err, "archive rejected");
                print_error("Error reading ZIP:", &err);
            }
            Err(err) => print_error("Cannot analyze:", &err),
        }
        Ok(())
    }

    fn prompt_api_key(&mut self) -> Result<()> {
        let key = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Gemini API key")
            .allow_empty_password(true)
            .interact()?;
        self.set_api_key(key);
        Ok(())
    }

    fn set_api_key(&mut self, key: String) {
        self.session.set_api_key(Some(key));
        if self.session.api_key().is_some() {
            println!("{}", "API key set for this session.".green());
        } else {
            println!("{}", "API key cleared.".yellow());
        }
    }

    fn handle_image(&mut self, path: PathBuf) {
        match load_image(&path) {
            Ok(image) => {
                println!(
                    "{} {} ({}x{})",
                    "Screenshot attached:".green(),
                    image.name,
                    image.width,
                    image.height
                );
                self.pending_image = Some(image);
            }
            Err(err) => print_error("Cannot attach screenshot:", &err),
        }
    }

    async fn handle_question(&mut self, question: String) -> Result<()> {
        let mut turn = UserTurn::new(question);
        if let Some(image) = self.pending_image.take() {
            println!("{} {}", "Visual context:".cyan(), image.name);
            turn = turn.with_image(image);
        }

        eprintln!("{}", "Analyzing code + pixels...".italic().dimmed());
        let operation = self.interrupts.begin();
        let mut renderer = TerminalRenderer::new(std::io::stdout());
        let result = self
            .conversation
            .on_user_turn_submitted(&mut self.session, turn, &mut renderer, operation.token())
            .await;
        drop(operation);

        match result {
            Ok(reply) => {
                if self.copy_to_clipboard {
                    match clipboard::copy_to_clipboard(&reply) {
                        Ok(()) => println!("{}", "Copied to clipboard.".green()),
                        Err(err) => print_error("Clipboard copy failed:", &err),
                    }
                }
            }
            Err(RepoMindError::ModelRequest(ModelRequestError::Cancelled)) => {
                println!("{}", "Answer cancelled.".yellow());
            }
            Err(err @ RepoMindError::ModelRequest(_)) => print_error("API Error:", &err),
            Err(err) => print_error("Cannot ask:", &err),
        }
        Ok(())
    }

    fn print_welcome(&self) {
        println!("{}", "RepoMind Vision".blue().bold());
        println!("Multimodal debugging: code + visuals, powered by Gemini.");
        let view = SessionView::from_session(&self.session);
        if !view.has_api_key {
            println!(
                "{}",
                "No API key found. Enter one with /key, or set GEMINI_API_KEY.".yellow()
            );
        }
        if let RepositoryStatus::NotLoaded = view.repository {
            println!("{}", "Load a project to begin:".cyan());
            println!("  1. /load path/to/project.zip");
            println!("  2. Ask questions about the code");
            println!("  3. Attach screenshots of bugs with /image path/to/shot.png");
        }
        println!("Type /help for commands, 'exit' to quit.");
    }

    fn print_files(&self) {
        match self.session.repository() {
            Some(repo) if repo.is_empty() => println!("{}", "The archive had no source files.".yellow()),
            Some(repo) => {
                for path in repo.file_paths() {
                    println!("  {}", path);
                }
                println!("{}", format!("{} files", repo.file_count()).dimmed());
            }
            None => println!("{}", "No repository loaded.".yellow()),
        }
    }

    fn print_history(&self) {
        let view = SessionView::from_session(&self.session);
        if view.messages.is_empty() {
            println!("{}", "No messages yet.".dimmed());
            return;
        }
        for message in view.messages {
            let label = match message.role {
                Role::User => message.role.as_str().green().bold(),
                Role::Assistant => message.role.as_str().blue().bold(),
            };
            println!("{}:", label);
            if let Some(attachment) = message.attachment {
                println!("  {} {}", "[screenshot]".cyan(), attachment);
            }
            println!("{}\n", message.content);
        }
    }

    fn print_help() {
        println!("Commands:");
        println!("  /load <zip>      analyze a project archive");
        println!("  /key [key]       set the Gemini API key (prompts when omitted)");
        println!("  /image <file>    attach a PNG/JPEG screenshot to the next question");
        println!("  /detach          drop the pending screenshot");
        println!("  /files           list collected files");
        println!("  /history         show the conversation");
        println!("  exit | quit      leave");
        println!("Anything else is sent as a question.");
        println!("Ctrl-C cancels an answer or a load in progress, and exits when idle.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_and_exit() {
        assert_eq!(
            parse_command("  Why is the button invisible? "),
            ReplCommand::Ask("Why is the button invisible?".into())
        );
        assert_eq!(parse_command("exit"), ReplCommand::Exit);
        assert_eq!(parse_command("QUIT"), ReplCommand::Exit);
        assert_eq!(parse_command("/quit"), ReplCommand::Exit);
        assert_eq!(parse_command("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(
            parse_command("/load ./my project.zip"),
            ReplCommand::Load(PathBuf::from("./my project.zip"))
        );
        assert_eq!(
            parse_command("/image shot.png"),
            ReplCommand::Image(PathBuf::from("shot.png"))
        );
        assert_eq!(parse_command("/files"), ReplCommand::Files);
        assert_eq!(parse_command("/history"), ReplCommand::History);
        assert_eq!(parse_command("/detach"), ReplCommand::Detach);
        assert_eq!(parse_command("/help"), ReplCommand::Help);
    }

    #[test]
    fn test_parse_key_command() {
        assert_eq!(
            parse_command("/key my-secret"),
            ReplCommand::Key(Some("my-secret".into()))
        );
        assert_eq!(parse_command("/key"), ReplCommand::Key(None));
        assert_eq!(parse_command("  /key   "), ReplCommand::Key(None));
    }

    #[test]
    fn test_parse_incomplete_commands() {
        assert_eq!(parse_command("/load"), ReplCommand::Unknown("/load".into()));
        assert_eq!(parse_command("/frobnicate"), ReplCommand::Unknown("/frobnicate".into()));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "repomind",
            "project.zip",
            "--api-key",
            "k",
            "--copy",
            "-vv",
            "-q",
            "what does it do?",
        ]);
        assert_eq!(cli.archive, Some(PathBuf::from("project.zip")));
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert!(cli.copy);
        assert!(!cli.keep_history);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.question.as_deref(), Some("what does it do?"));
    }
}
