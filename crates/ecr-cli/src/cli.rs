use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ecr",
    about = "Entity-Component Records: linked records with differential inheritance",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with [store] and [ec] tables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the guided walkthrough against an in-memory repository
    Tutorial,
    /// List the records in a JSON file
    List(FileArgs),
    /// Look up a key, following the parent chain
    Get(KeyArgs),
    /// List the keys of a record
    Keys(KeysArgs),
    /// Expand a key into a self-contained tree
    Resolve(ResolveArgs),
    /// Show the complete state of a record
    Snapshot(RecordArgs),
    /// Show how a key is declared
    Declaration(KeyArgs),
    /// Copy a record and everything it reaches into a fresh repository
    Transfer(TransferArgs),
}

#[derive(Args)]
pub struct FileArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RecordArgs {
    pub file: PathBuf,
    pub id: String,
}

#[derive(Args)]
pub struct KeyArgs {
    pub file: PathBuf,
    pub id: String,
    pub key: String,
}

#[derive(Args)]
pub struct KeysArgs {
    pub file: PathBuf,
    pub id: String,
    /// Include inherited keys
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub file: PathBuf,
    pub id: String,
    pub key: String,
    /// Keys to leave unexpanded
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,
}

#[derive(Args)]
pub struct TransferArgs {
    pub file: PathBuf,
    pub id: String,
    /// Write the destination repository here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tutorial() {
        let cli = Cli::try_parse_from(["ecr", "tutorial"]).unwrap();
        assert!(matches!(cli.command, Command::Tutorial));
    }

    #[test]
    fn parse_get() {
        let cli = Cli::try_parse_from(["ecr", "get", "db.json", "e1", "color"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("db.json"));
            assert_eq!(args.id, "e1");
            assert_eq!(args.key, "color");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_keys_recursive() {
        let cli = Cli::try_parse_from(["ecr", "keys", "db.json", "e1", "-r"]).unwrap();
        if let Command::Keys(args) = cli.command {
            assert!(args.recursive);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_resolve_excludes() {
        let cli = Cli::try_parse_from([
            "ecr", "resolve", "db.json", "e1", "*", "--exclude", "@context", "-x", "owner",
        ])
        .unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.key, "*");
            assert_eq!(args.exclude, vec!["@context", "owner"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_resolve_without_key_fails() {
        assert!(Cli::try_parse_from(["ecr", "resolve", "db.json", "e1"]).is_err());
    }

    #[test]
    fn parse_transfer_output() {
        let cli =
            Cli::try_parse_from(["ecr", "transfer", "db.json", "e1", "-o", "out.json"]).unwrap();
        if let Command::Transfer(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("out.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["ecr", "--verbose", "tutorial"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["ecr", "--format", "json", "list", "db.json"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ecr", "snapshot", "db.json", "e1", "--config", "ecr.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ecr.toml")));
    }
}
