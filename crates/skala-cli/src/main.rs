use std::io::Read;
use std::path::Path;

use skala::{Engine, ScaleNode};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Flat(skala::flat::Error),
    Core(skala::Error),
    Json(serde_json::Error),
    Unlabeled,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Flat(err) => write!(f, "{err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Unlabeled => write!(
                f,
                "Records carry no dimension labels; structuring them needs the generative service, which this tool does not call"
            ),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<skala::flat::Error> for CliError {
    fn from(value: skala::flat::Error) -> Self {
        Self::Flat(value)
    }
}

impl From<skala::Error> for CliError {
    fn from(value: skala::Error) -> Self {
        Self::Core(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Records,
    Tree,
    Json,
    Export,
}

#[derive(Debug)]
struct CliOptions {
    command: Command,
    input: String,
    name: Option<String>,
    payloads: Vec<String>,
    delimiter: char,
}

const USAGE: &str = "\
Usage: skala-cli <command> <input> [options]

Commands:
  records   print the normalized flat records as JSON
  tree      print the scale family as a tree
  json      print the full node collection as JSON
  export    print the flat export rows

Input is a delimited file path, or '-' for stdin.

Options:
  --name <name>         scale name for the imported root (default: file stem)
  --payload <file>      adaptation payload (JSON) grafted onto the root;
                        repeatable, one branch per payload
  --delimiter <d>       export delimiter: tab | semicolon | comma | pipe
";

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut it = args.iter();

        let command = match it.next().map(String::as_str) {
            Some("records") => Command::Records,
            Some("tree") => Command::Tree,
            Some("json") => Command::Json,
            Some("export") => Command::Export,
            _ => return Err(CliError::Usage(USAGE)),
        };
        let Some(input) = it.next() else {
            return Err(CliError::Usage(USAGE));
        };

        let mut options = Self {
            command,
            input: input.clone(),
            name: None,
            payloads: Vec::new(),
            delimiter: '\t',
        };

        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--name" => {
                    let Some(name) = it.next() else {
                        return Err(CliError::Usage("--name needs a value"));
                    };
                    options.name = Some(name.clone());
                }
                "--payload" => {
                    let Some(path) = it.next() else {
                        return Err(CliError::Usage("--payload needs a file path"));
                    };
                    options.payloads.push(path.clone());
                }
                "--delimiter" => {
                    options.delimiter = match it.next().map(String::as_str) {
                        Some("tab") => '\t',
                        Some("semicolon") => ';',
                        Some("comma") => ',',
                        Some("pipe") => '|',
                        _ => {
                            return Err(CliError::Usage(
                                "--delimiter must be tab, semicolon, comma, or pipe",
                            ));
                        }
                    };
                }
                _ => return Err(CliError::Usage(USAGE)),
            }
        }

        Ok(options)
    }

    fn scale_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if self.input == "-" {
            return "Skala".to_string();
        }
        Path::new(&self.input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Skala".to_string())
    }
}

fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn build_family(options: &CliOptions) -> Result<Engine, CliError> {
    let input = read_input(&options.input)?;
    let records = skala::flat::parse_records(&input)?;
    let structured = skala::ingest::structure_labeled_records(&options.scale_name(), &records)
        .ok_or(CliError::Unlabeled)?;

    let mut engine = Engine::new();
    let root_id = engine.import_structured(&structured)?;

    for path in &options.payloads {
        let payload: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let (ticket, _request) = engine.begin_branch(&root_id, path)?;
        let outcome = engine.complete_branch(ticket, &payload)?;
        for warning in &outcome.warnings {
            eprintln!("warning: {warning}");
        }
    }

    Ok(engine)
}

fn print_tree(engine: &Engine, node: &ScaleNode, prefix: &str, is_last: bool) {
    let connector = if node.is_root() {
        String::new()
    } else if is_last {
        format!("{prefix}`-- ")
    } else {
        format!("{prefix}|-- ")
    };
    let branches = engine.branch_count(&node.id, None);
    let drifted = node
        .dimensions
        .iter()
        .flat_map(|d| d.items.iter())
        .filter(|i| !i.rubric_in_sync())
        .count();
    let drift_note = if drifted > 0 {
        format!(", {drifted} drifted")
    } else {
        String::new()
    };
    println!(
        "{connector}{} [{}] {} items, {} branches{} @ ({}, {})",
        node.name,
        node.id,
        node.item_count(),
        branches,
        drift_note,
        node.position.x,
        node.position.y,
    );

    let children = engine.children(&node.id);
    let child_prefix = if node.is_root() {
        String::new()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}|   ")
    };
    for (i, child) in children.iter().enumerate() {
        print_tree(engine, child, &child_prefix, i + 1 == children.len());
    }
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = CliOptions::parse(&args)?;

    match options.command {
        Command::Records => {
            let input = read_input(&options.input)?;
            let records = skala::flat::parse_records(&input)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Tree => {
            let engine = build_family(&options)?;
            if let Some(root) = engine.root() {
                print_tree(&engine, root, "", true);
            }
        }
        Command::Json => {
            let engine = build_family(&options)?;
            println!("{}", serde_json::to_string_pretty(engine.nodes())?);
        }
        Command::Export => {
            let engine = build_family(&options)?;
            let rows = engine.export_rows();
            print!("{}", skala::flat::write_rows(&rows, options.delimiter));
        }
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
