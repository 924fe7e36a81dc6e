use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Structural diff for hierarchical data trees",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the paths of a tree
    List(ListArgs),
    /// Compare two trees and print every difference
    Compare(CompareArgs),
    /// Check that one node is equal in two trees
    Equal(EqualArgs),
    /// Check that every dataset in a tree can be read
    Check(CheckArgs),
}

/// Folding flags shared by `list` and `compare`.
#[derive(Args, Clone, Debug, Default)]
pub struct FoldArgs {
    /// Fold groups at this depth below the root
    #[arg(short = 'd', long = "max-depth")]
    pub max_depth: Option<usize>,
    /// Fold this group (repeatable)
    #[arg(short = 'f', long = "fold")]
    pub fold: Vec<String>,
}

/// Comparison flags shared by `compare` and `equal`.
#[derive(Args, Clone, Debug, Default)]
pub struct CompareFlags {
    /// Require dtypes to match exactly
    #[arg(short = 't', long = "dtype")]
    pub dtype: bool,
    /// Compare integers (and integer/float pairs) by closeness
    #[arg(long)]
    pub close: bool,
    /// Check presence and structure only, not values
    #[arg(long)]
    pub shallow: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Tree document (JSON)
    pub source: PathBuf,
    /// Start somewhere in the tree
    #[arg(short, long, default_value = "/")]
    pub root: String,
    #[command(flatten)]
    pub fold: FoldArgs,
    /// List datasets only
    #[arg(short = 'D', long = "datasets")]
    pub datasets: bool,
    /// Keep only nodes with at least this many attributes
    #[arg(long)]
    pub min_attrs: Option<usize>,
    /// Show kind, dtype and shape
    #[arg(short, long)]
    pub info: bool,
    /// List the direct children of this group instead
    #[arg(short = 'L', long)]
    pub layer: Option<String>,
}

#[derive(Args)]
pub struct CompareArgs {
    /// First tree document (JSON)
    pub a: PathBuf,
    /// Second tree document (JSON)
    pub b: PathBuf,
    #[command(flatten)]
    pub flags: CompareFlags,
    #[command(flatten)]
    pub fold: FoldArgs,
    /// Compare datasets only
    #[arg(short = 'D', long = "datasets")]
    pub datasets: bool,
    /// Path in A renamed to a path in B (repeatable)
    #[arg(short = 'r', long = "renamed", num_args = 2, value_names = ["A", "B"])]
    pub renamed: Vec<String>,
    /// Treat renamed paths literally instead of as patterns
    #[arg(long)]
    pub literal: bool,
    /// TOML file with [compare], [fold] and [[rename]] sections
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args)]
pub struct EqualArgs {
    /// First tree document (JSON)
    pub a: PathBuf,
    /// Second tree document (JSON)
    pub b: PathBuf,
    /// Node to check in A
    pub path: String,
    /// Node to check in B (defaults to the path in A)
    pub path_b: Option<String>,
    /// Prefix applied to the path in B
    #[arg(long)]
    pub root: Option<String>,
    #[command(flatten)]
    pub flags: CompareFlags,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Tree document (JSON)
    pub source: PathBuf,
    /// Only check datasets below this group
    #[arg(short, long, default_value = "/")]
    pub root: String,
}

impl CompareArgs {
    /// `-r A B` occurrences as pairs.
    pub fn rename_pairs(&self) -> Vec<(String, String)> {
        self.renamed
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["strata", "list", "data.json"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.source, PathBuf::from("data.json"));
            assert_eq!(args.root, "/");
            assert!(args.fold.max_depth.is_none());
            assert!(!args.datasets);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_folding() {
        let cli = Cli::try_parse_from([
            "strata", "list", "data.json", "-d", "2", "-f", "/cache", "-f", "/tmp", "-D", "-i",
        ])
        .unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.fold.max_depth, Some(2));
            assert_eq!(args.fold.fold, vec!["/cache", "/tmp"]);
            assert!(args.datasets);
            assert!(args.info);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_layer_and_min_attrs() {
        let cli = Cli::try_parse_from(["strata", "list", "x.json", "-L", "/g", "--min-attrs", "1"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.layer, Some("/g".into()));
            assert_eq!(args.min_attrs, Some(1));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_compare() {
        let cli = Cli::try_parse_from(["strata", "compare", "a.json", "b.json", "-t", "--close"]).unwrap();
        if let Command::Compare(args) = cli.command {
            assert_eq!(args.a, PathBuf::from("a.json"));
            assert_eq!(args.b, PathBuf::from("b.json"));
            assert!(args.flags.dtype);
            assert!(args.flags.close);
            assert!(!args.flags.shallow);
            assert!(args.rename_pairs().is_empty());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_compare_renamed_pairs() {
        let cli = Cli::try_parse_from([
            "strata", "compare", "a.json", "b.json", "-r", "/a", "/b", "-r", "/c", "/d", "--literal",
        ])
        .unwrap();
        if let Command::Compare(args) = cli.command {
            assert_eq!(
                args.rename_pairs(),
                vec![("/a".to_string(), "/b".to_string()), ("/c".to_string(), "/d".to_string())]
            );
            assert!(args.literal);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_compare_rejects_half_pair() {
        assert!(Cli::try_parse_from(["strata", "compare", "a.json", "b.json", "-r", "/a"]).is_err());
    }

    #[test]
    fn parse_equal() {
        let cli = Cli::try_parse_from(["strata", "equal", "a.json", "b.json", "/x", "/y", "--root", "/bak"]).unwrap();
        if let Command::Equal(args) = cli.command {
            assert_eq!(args.path, "/x");
            assert_eq!(args.path_b, Some("/y".into()));
            assert_eq!(args.root, Some("/bak".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["strata", "check", "data.json", "-r", "/runs"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.source, PathBuf::from("data.json"));
            assert_eq!(args.root, "/runs");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["strata", "--verbose", "list", "x.json"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["strata", "compare", "a.json", "b.json", "--format", "json"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
