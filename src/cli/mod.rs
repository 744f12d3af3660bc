pub mod logging;
pub mod progress;
pub mod prompt;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fileflow")]
#[command(about = "Legacy office file checker and converter", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of FileFlow.toml and FILEFLOW_* variables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List legacy files modified after the cutoff without converting them
    Check(CheckArgs),
    /// Convert legacy .xls/.doc files to .xlsx/.docx
    Convert(ConvertArgs),
    /// Match CSV rows to attachment files and print who gets what
    MailPlan(MailPlanArgs),
    /// Move converted files out of a tree into one folder
    MoveConverted(MoveArgs),
    /// Delete converted files from a tree
    DeleteConverted(DeleteArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Target directory
    #[arg(short, long)]
    pub dir: PathBuf,
    /// Only files modified within this many days
    #[arg(long)]
    pub days: Option<i64>,
    /// File types to include, e.g. `doc,xls`
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Seconds to wait after each file
    #[arg(long)]
    pub delay: Option<f64>,
    /// Delete each original after its conversion was saved
    #[arg(long)]
    pub delete_originals: bool,
    /// Convert even when an up-to-date .xlsx/.docx already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Path to the LibreOffice executable
    #[arg(long)]
    pub soffice: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MailPlanArgs {
    /// CSV with a header row: identifier, then recipient addresses
    #[arg(long)]
    pub csv: PathBuf,
    /// Folder holding the attachments
    #[arg(long)]
    pub folder: PathBuf,
    #[arg(long, default_value = "pdf")]
    pub extension: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[arg(long)]
    pub from: PathBuf,
    #[arg(long)]
    pub to: PathBuf,
    #[arg(long, default_value = "docx")]
    pub extension: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(short, long)]
    pub dir: PathBuf,
    #[arg(long, default_value = "docx")]
    pub extension: String,
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl Commands {
    /// Operation name used in the log file name.
    pub fn operation(&self) -> &'static str {
        match self {
            Commands::Check(_) => "Check",
            Commands::Convert(_) => "Convert",
            Commands::MailPlan(_) => "Mail Plan",
            Commands::MoveConverted(_) => "Move",
            Commands::DeleteConverted(_) => "Delete",
            Commands::PrintConfig => "Config",
        }
    }

    /// Directory the operation works on, if any.
    pub fn target_dir(&self) -> Option<&PathBuf> {
        match self {
            Commands::Check(args) => Some(&args.selection.dir),
            Commands::Convert(args) => Some(&args.selection.dir),
            Commands::MailPlan(args) => Some(&args.folder),
            Commands::MoveConverted(args) => Some(&args.from),
            Commands::DeleteConverted(args) => Some(&args.dir),
            Commands::PrintConfig => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::parse_from([
            "fileflow",
            "convert",
            "--dir",
            "/data",
            "--days",
            "30",
            "--types",
            "doc,xls",
            "--delay",
            "0.5",
            "--delete-originals",
        ]);
        let Some(Commands::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.selection.dir, PathBuf::from("/data"));
        assert_eq!(args.selection.days, Some(30));
        assert_eq!(args.selection.types, vec!["doc", "xls"]);
        assert_eq!(args.delay, Some(0.5));
        assert!(args.delete_originals);
        assert!(!args.overwrite);
    }

    #[test]
    fn test_parse_config_after_subcommand() {
        let cli = Cli::parse_from(["fileflow", "check", "--dir", "/data", "--config", "site.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        assert!(matches!(cli.command, Some(Commands::Check(_))));
    }

    #[test]
    fn test_command_metadata() {
        let cli = Cli::parse_from(["fileflow", "check", "--dir", "/data"]);
        let command = cli.command.unwrap();
        assert_eq!(command.operation(), "Check");
        assert_eq!(command.target_dir(), Some(&PathBuf::from("/data")));
    }
}
