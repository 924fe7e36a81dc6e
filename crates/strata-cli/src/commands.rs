use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use strata_diff::{
    diff_with_rename, equal, traverse, traverse_with, CompareOptions, DiffOptions, FoldSpec,
    PathEntry, RenameMap, RenamedDiff, TraverseOptions, TreeDiff,
};
use strata_store::{verify_readable, InMemoryTree, TreeStore, Verification};
use strata_types::{NodeKind, NodePath};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let ok = match cli.command {
        Command::List(args) => cmd_list(args, &cli.format)?,
        Command::Compare(args) => cmd_compare(args, &cli.format)?,
        Command::Equal(args) => cmd_equal(args, &cli.format)?,
        Command::Check(args) => cmd_check(args, &cli.format)?,
    };
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn read_tree(path: &Path) -> anyhow::Result<(Vec<u8>, InMemoryTree)> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read \"{}\"", path.display()))?;
    let text = std::str::from_utf8(&bytes)
        .with_context(|| format!("\"{}\" is not a UTF-8 document", path.display()))?;
    let tree = InMemoryTree::from_json(text)
        .with_context(|| format!("failed to parse \"{}\"", path.display()))?;
    Ok((bytes, tree))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub compare: CompareOptions,
    pub fold: FoldSpec,
    pub rename: Vec<RenamePair>,
}

#[derive(Debug, Deserialize)]
pub struct RenamePair {
    pub from: String,
    pub to: String,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

fn apply_fold(mut spec: FoldSpec, args: &FoldArgs) -> FoldSpec {
    if let Some(depth) = args.max_depth {
        spec.max_depth = Some(depth);
    }
    spec.fold_paths
        .extend(args.fold.iter().map(|f| NodePath::parse(f)));
    spec
}

fn apply_flags(mut options: CompareOptions, flags: &CompareFlags) -> CompareOptions {
    options.require_matching_dtype |= flags.dtype;
    options.tolerant |= flags.close;
    options.shallow |= flags.shallow;
    options
}

/// File values first, command-line flags on top.
fn compare_setup(args: &CompareArgs) -> anyhow::Result<(DiffOptions, RenameMap)> {
    let config = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let options = DiffOptions {
        root: NodePath::root(),
        fold: apply_fold(config.fold, &args.fold),
        compare: apply_flags(config.compare, &args.flags),
        only_datasets: args.datasets,
    };

    let pairs = config
        .rename
        .into_iter()
        .map(|p| (p.from, p.to))
        .chain(args.rename_pairs());
    let rename = if args.literal {
        RenameMap::literal(pairs)
    } else {
        RenameMap::patterns(pairs)
    };
    Ok((options, rename))
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

/// One listed path with its optional info columns.
#[derive(Debug, Serialize)]
pub struct ListedPath {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

pub fn list_paths(tree: &InMemoryTree, args: &ListArgs) -> anyhow::Result<Vec<ListedPath>> {
    let entries: Vec<(String, Option<NodePath>)> = match &args.layer {
        Some(layer) => {
            let layer = NodePath::parse(layer);
            tree.list_children(&layer)?
                .into_iter()
                .map(|(name, _)| {
                    let path = layer.join(&name);
                    (path.to_string(), Some(path))
                })
                .collect()
        }
        None => {
            let spec = apply_fold(FoldSpec::default(), &args.fold);
            let options = TraverseOptions {
                include_attributed_groups: !args.datasets,
            };
            let list = traverse_with(tree, &NodePath::parse(&args.root), &spec, options)?;
            let mut entries: Vec<_> = list
                .iter()
                .map(|e| {
                    let node = match e {
                        PathEntry::Node(p) => Some(p.clone()),
                        PathEntry::Folded(_) => None,
                    };
                    (list.render(e), node)
                })
                .collect();
            entries.sort();
            entries
        }
    };

    let mut listed = Vec::with_capacity(entries.len());
    for (rendered, node) in entries {
        if let (Some(min), Some(path)) = (args.min_attrs, &node) {
            if tree.read_attributes(path)?.len() < min {
                continue;
            }
        }

        let mut item = ListedPath {
            path: rendered,
            kind: None,
            dtype: None,
            shape: None,
        };
        if args.info {
            match &node {
                Some(path) => match tree.require_kind(path)? {
                    NodeKind::Dataset => {
                        let meta = tree.dataset_meta(path)?;
                        item.kind = Some(NodeKind::Dataset.to_string());
                        item.dtype = Some(meta.dtype.to_string());
                        item.shape = Some(meta.shape.to_string());
                    }
                    NodeKind::Group => item.kind = Some(NodeKind::Group.to_string()),
                },
                None => item.kind = Some("folded".into()),
            }
        }
        listed.push(item);
    }
    Ok(listed)
}

fn cmd_list(args: ListArgs, format: &OutputFormat) -> anyhow::Result<bool> {
    let (_, tree) = read_tree(&args.source)?;
    let listed = list_paths(&tree, &args)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
        OutputFormat::Text if args.info => {
            let width = listed.iter().map(|l| l.path.len()).max().unwrap_or(0);
            for item in &listed {
                println!(
                    "{:<width$}  {:<8}  {:<7}  {}",
                    item.path,
                    item.kind.as_deref().unwrap_or("-"),
                    item.dtype.as_deref().unwrap_or("-"),
                    item.shape.as_deref().unwrap_or("-"),
                );
            }
        }
        OutputFormat::Text => {
            for item in &listed {
                println!("{}", item.path);
            }
        }
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

/// Row operators in `compare` output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Only in A.
    Removed,
    /// Only in B.
    Added,
    Changed,
    Folded,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Removed => "->",
            Self::Added => "<-",
            Self::Changed => "!=",
            Self::Folded => "??",
        }
    }
}

/// One line of `compare` output: path in A, operator, path in B.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub a: String,
    pub op: Op,
    pub b: String,
}

pub fn compare_rows(diff: &TreeDiff, renamed_a: &RenamedDiff, renamed_b: &RenamedDiff) -> Vec<Row> {
    let mut rows = Vec::new();
    let same = |op: Op| move |p: &String| Row { a: p.clone(), op, b: p.clone() };
    rows.extend(diff.removed.iter().map(|p| Row {
        a: p.clone(),
        op: Op::Removed,
        b: String::new(),
    }));
    rows.extend(diff.added.iter().map(|p| Row {
        a: String::new(),
        op: Op::Added,
        b: p.clone(),
    }));
    rows.extend(diff.changed.iter().map(same(Op::Changed)));
    rows.extend(diff.folded.iter().map(same(Op::Folded)));
    rows.extend(
        renamed_a
            .changed
            .iter()
            .zip(&renamed_b.changed)
            .map(|(a, b)| Row {
                a: a.clone(),
                op: Op::Changed,
                b: b.clone(),
            }),
    );
    rows
}

fn print_rows(rows: &[Row]) {
    let width = rows.iter().map(|r| r.a.len()).max().unwrap_or(0);
    for row in rows {
        let a = format!("{:<width$}", row.a);
        let (a, b) = match row.op {
            Op::Removed => (a.red().bold(), row.b.normal()),
            Op::Added => (a.normal(), row.b.green().bold()),
            Op::Changed => (a.cyan().bold(), row.b.cyan().bold()),
            Op::Folded => (a.magenta().bold(), row.b.magenta().bold()),
        };
        println!("{} {} {}", a, row.op.symbol(), b);
    }
}

#[derive(Serialize)]
struct CompareReport<'a> {
    diff: &'a TreeDiff,
    renamed_a: &'a RenamedDiff,
    renamed_b: &'a RenamedDiff,
}

/// Output for byte-identical documents: an empty report in JSON.
fn identical_output(format: &OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => {
            let (diff, renamed) = (TreeDiff::new(), RenamedDiff::default());
            let report = CompareReport {
                diff: &diff,
                renamed_a: &renamed,
                renamed_b: &renamed,
            };
            serde_json::to_string_pretty(&report)?
        }
        OutputFormat::Text => "Files are identical".to_string(),
    })
}

fn cmd_compare(args: CompareArgs, format: &OutputFormat) -> anyhow::Result<bool> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let (bytes_a, a) = read_tree(&args.a)?;
    let (bytes_b, b) = read_tree(&args.b)?;

    let digest_a = blake3::hash(&bytes_a);
    if digest_a == blake3::hash(&bytes_b) {
        debug!(digest = %digest_a.to_hex(), "documents are byte-identical");
        println!("{}", identical_output(format)?);
        return Ok(true);
    }

    let (options, rename) = compare_setup(&args)?;
    let (diff, renamed_a, renamed_b) = diff_with_rename(&a, &b, &rename, &options)?;
    let ok = diff.is_identical() && renamed_a.changed.is_empty();

    match format {
        OutputFormat::Json => {
            let report = CompareReport {
                diff: &diff,
                renamed_a: &renamed_a,
                renamed_b: &renamed_b,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let rows = compare_rows(&diff, &renamed_a, &renamed_b);
            if rows.is_empty() {
                println!("No differences found");
            } else {
                print_rows(&rows);
            }
        }
    }
    Ok(ok)
}

// ---------------------------------------------------------------------------
// equal
// ---------------------------------------------------------------------------

fn cmd_equal(args: EqualArgs, format: &OutputFormat) -> anyhow::Result<bool> {
    let (_, a) = read_tree(&args.a)?;
    let (_, b) = read_tree(&args.b)?;

    let path_a = NodePath::parse(&args.path);
    let path_b = args.path_b.as_deref().map(NodePath::parse);
    let root = args.root.as_deref().map(NodePath::parse);
    let options = apply_flags(CompareOptions::default(), &args.flags);

    let same = equal(&a, &b, &path_a, path_b.as_ref(), root.as_ref(), &options)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "path": path_a, "equal": same })),
        OutputFormat::Text if same => println!("{} {}", path_a, "equal".green().bold()),
        OutputFormat::Text => println!("{} {}", path_a, "not equal".red().bold()),
    }
    Ok(same)
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// Try reading every dataset below `root`.
pub fn check_tree(tree: &dyn TreeStore, root: &NodePath) -> anyhow::Result<Verification> {
    let datasets = traverse(tree, root, &FoldSpec::default())?.datasets(tree)?;
    Ok(verify_readable(tree, &datasets))
}

fn cmd_check(args: CheckArgs, format: &OutputFormat) -> anyhow::Result<bool> {
    let (_, tree) = read_tree(&args.source)?;
    let report = check_tree(&tree, &NodePath::parse(&args.root))?;

    match format {
        OutputFormat::Json => {
            let unreadable: Vec<_> = report
                .unreadable
                .iter()
                .map(|(path, e)| serde_json::json!({ "path": path, "error": e.to_string() }))
                .collect();
            let out = serde_json::json!({ "readable": report.readable, "unreadable": unreadable });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (path, e) in &report.unreadable {
                println!("{} {}", path.to_string().red().bold(), e);
            }
            if report.is_complete() {
                println!("All {} datasets readable", report.readable.len());
            }
        }
    }
    Ok(report.is_complete())
}
