//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use plinth_core::domain::TemplateLanguage;

pub mod global;
pub use global::{GlobalArgs, LogFormat, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "plinth",
    bin_name = "plinth",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Plugin-driven voice app scaffolding",
    long_about = "Plinth creates voice app projects from the official templates \
                  and wires in marketplace plugins for platforms, servers and databases.",
    after_help = "EXAMPLES:\n\
        \x20 plinth new my-skill --platform alexa --server lambda\n\
        \x20 plinth new my-app --language javascript --skip-install\n\
        \x20 plinth plugins --tag platforms\n\
        \x20 plinth completions bash > /usr/share/bash-completion/completions/plinth",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project from the template.
    #[command(
        visible_alias = "n",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 plinth new my-skill --platform alexa\n\
            \x20 plinth new my-app   --language js --server express\n\
            \x20 plinth new my-app   --template-dir ./templates --skip-install"
    )]
    New(NewArgs),

    /// List marketplace plugins.
    #[command(
        visible_alias = "ls",
        about = "List marketplace plugins",
        after_help = "EXAMPLES:\n\
            \x20 plinth plugins\n\
            \x20 plinth plugins --tag server\n\
            \x20 plinth plugins --show-config --project ./my-skill\n\
            \x20 plinth plugins --format json"
    )]
    Plugins(PluginsArgs),

    /// Initialise a Plinth configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 plinth init           # default location\n\
            \x20 plinth init --local   # .plinth.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 plinth completions bash > ~/.local/share/bash-completion/completions/plinth\n\
            \x20 plinth completions zsh  > ~/.zfunc/_plinth\n\
            \x20 plinth completions fish > ~/.config/fish/completions/plinth.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Plinth configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 plinth config get defaults.language\n\
            \x20 plinth config list\n\
            \x20 plinth config path"
    )]
    Config(ConfigCommands),
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `plinth new`.
#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Directory to create the project in.
    #[arg(value_name = "DIRECTORY", help = "Project directory")]
    pub directory: PathBuf,

    /// Template language.
    #[arg(
        short = 'l',
        long = "language",
        value_name = "LANGUAGE",
        value_enum,
        help = "Template language [default: from config, else typescript]"
    )]
    pub language: Option<Language>,

    /// Platform plugins to add; repeatable.
    #[arg(
        short = 'p',
        long = "platform",
        value_name = "PLATFORM",
        help = "Platform plugin to add (e.g. alexa, core); repeatable"
    )]
    pub platforms: Vec<String>,

    /// Server plugin to add.
    #[arg(
        short = 's',
        long = "server",
        value_name = "SERVER",
        help = "Server plugin to add (e.g. express, lambda)"
    )]
    pub server: Option<String>,

    /// Do not run the package installer.
    #[arg(long = "skip-install", help = "Skip installing dependencies")]
    pub skip_install: bool,

    /// Replace an existing, non-empty directory (destructive).
    #[arg(long = "overwrite", help = "Overwrite existing directory")]
    pub overwrite: bool,

    /// Copy the template from a local directory instead of cloning it.
    #[arg(
        long = "template-dir",
        value_name = "DIR",
        help = "Use a local template directory"
    )]
    pub template_dir: Option<PathBuf>,
}

// ── plugins ───────────────────────────────────────────────────────────────────

/// Arguments for `plinth plugins`.
#[derive(Debug, Clone, Args)]
pub struct PluginsArgs {
    /// Only show plugins carrying this tag.
    #[arg(short = 't', long = "tag", value_name = "TAG", help = "Filter by tag")]
    pub tag: Option<String>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: PluginsFormat,

    /// Print the init config of plugins that ship a CLI hook.
    #[arg(long = "show-config", help = "Show default config of CLI plugins")]
    pub show_config: bool,

    /// Project whose `package.json` gates which CLI hooks load.
    #[arg(
        long = "project",
        value_name = "DIR",
        requires = "show_config",
        help = "Project directory for --show-config"
    )]
    pub project: Option<PathBuf>,
}

/// Output format for the `plugins` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PluginsFormat {
    /// Human-readable table.
    Table,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `plinth init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.plinth.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `plinth completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `plinth config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.language`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// Template languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Language {
    /// Also accepted as `ts`.
    #[value(alias = "ts")]
    TypeScript,
    /// Also accepted as `js`.
    #[value(alias = "js")]
    JavaScript,
}

impl From<Language> for TemplateLanguage {
    fn from(language: Language) -> Self {
        match language {
            Language::TypeScript => TemplateLanguage::TypeScript,
            Language::JavaScript => TemplateLanguage::JavaScript,
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
