use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use katefmt_config::Config;
use katefmt_engine::actions::comments::CommentSettings;
use katefmt_engine::actions::{Action, Expansions, IndentSettings, Outcome, Settings, run};
use katefmt_engine::editing::{Document, EditorView, Position, Range};

#[derive(Parser)]
#[command(name = "katefmt")]
#[command(about = "Run a C++ editing action on a file at a cursor position")]
struct Args {
    /// Action to run, e.g. boost-format or inline-comment
    #[arg(value_parser = parse_action)]
    action: Action,

    /// Source file to edit
    file: PathBuf,

    /// Cursor line (1-based)
    #[arg(long, default_value_t = 1)]
    line: usize,

    /// Cursor column (1-based, in characters)
    #[arg(long, default_value_t = 1)]
    column: usize,

    /// Selection as LINE:COL-LINE:COL (1-based)
    #[arg(long, value_parser = parse_selection)]
    select: Option<Range>,

    /// Document type used to pick the comment style; guessed from the file
    /// name when omitted
    #[arg(long = "doc-type")]
    doc_type: Option<String>,

    /// Configuration file; defaults to ~/.config/katefmt/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the result back to FILE instead of stdout
    #[arg(long = "in-place")]
    in_place: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run_cli(Args::parse()) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run_cli(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document_type = args
        .doc_type
        .clone()
        .unwrap_or_else(|| document_type_for(&args.file).to_string());
    let settings = settings_from(&config, document_type)?;
    log::info!(
        "{} on {} ({})",
        args.action,
        args.file.display(),
        settings.document_type
    );

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mut doc = Document::from_bytes(&bytes)
        .with_context(|| format!("{} is not valid UTF-8", args.file.display()))?;
    doc.set_cursor_position(one_based(args.line, args.column)?);
    doc.set_selection(args.select);

    let outcome = run(&mut doc, args.action, &settings)
        .with_context(|| format!("{} failed", args.action))?;
    report(&doc, outcome);

    if args.in_place {
        if outcome == Outcome::Applied {
            std::fs::write(&args.file, doc.to_bytes())
                .with_context(|| format!("Failed to write {}", args.file.display()))?;
        }
    } else {
        print!("{}", doc.text_content());
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map_or_else(Config::config_path, Path::to_path_buf);
    log::info!("Config path: {}", path.display());
    let config = Config::load_from_path(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    if config.is_none() {
        log::info!("No config file found, using defaults");
    }
    Ok(config.unwrap_or_default())
}

fn settings_from(config: &Config, document_type: String) -> Result<Settings> {
    let expansions = config
        .all_expansions()
        .context("Failed to load expansions")?;
    log::debug!("{} expansions loaded", expansions.len());
    Ok(Settings {
        comment: CommentSettings {
            position: config.comment.position,
            threshold: config.comment.threshold,
        },
        indent: IndentSettings {
            width: config.indent.width,
            use_tabs: config.indent.use_tabs,
        },
        document_type,
        expansions: Expansions::from_iter(expansions),
    })
}

/// Where the action left the cursor and selection
fn report(doc: &Document, outcome: Outcome) {
    match outcome {
        Outcome::Applied | Outcome::CursorMoved => {
            log::info!("Cursor at {}", doc.cursor_position());
        }
        Outcome::Selected => {
            if let Some(selection) = doc.selection_range() {
                log::info!("Selected {selection}");
            }
        }
        Outcome::Unchanged => log::info!("Nothing changed"),
    }
}

fn document_type_for(path: &Path) -> &'static str {
    if path.file_name().is_some_and(|name| name == "CMakeLists.txt") {
        return "CMake";
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("c") => "C",
        Some("py") => "Python",
        Some("pl" | "pm") => "Perl",
        Some("sh" | "bash") => "Bash",
        Some("cmake") => "CMake",
        Some("rb") => "Ruby",
        Some("rs") => "Rust",
        Some("java") => "Java",
        Some("js") => "JavaScript",
        Some("m" | "mm") => "Objective-C",
        _ => "C++",
    }
}

fn parse_action(s: &str) -> Result<Action, String> {
    s.parse::<Action>().map_err(|e| {
        let names: Vec<&str> = Action::ALL.iter().map(|action| action.name()).collect();
        format!("{e}; expected one of: {}", names.join(", "))
    })
}

fn one_based(line: usize, column: usize) -> Result<Position> {
    if line == 0 || column == 0 {
        bail!("lines and columns start at 1, got {line}:{column}");
    }
    Ok(Position::new(line - 1, column - 1))
}

fn parse_position(s: &str) -> Result<Position> {
    let (line, column) = s
        .split_once(':')
        .with_context(|| format!("expected LINE:COL, got '{s}'"))?;
    let line = line
        .trim()
        .parse()
        .with_context(|| format!("invalid line in '{s}'"))?;
    let column = column
        .trim()
        .parse()
        .with_context(|| format!("invalid column in '{s}'"))?;
    one_based(line, column)
}

fn parse_selection(s: &str) -> Result<Range, String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| format!("expected LINE:COL-LINE:COL, got '{s}'"))?;
    let start = parse_position(start).map_err(|e| format!("{e:#}"))?;
    let end = parse_position(end).map_err(|e| format!("{e:#}"))?;
    Ok(Range::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_selection() {
        let range = parse_selection("2:1-4:3").unwrap();

        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(3, 2));
    }

    #[test]
    fn test_parse_selection_rejects_zero() {
        let err = parse_selection("0:1-2:1").unwrap_err();

        assert!(err.contains("start at 1"));
    }

    #[test]
    fn test_parse_selection_rejects_garbage() {
        assert!(parse_selection("2:1").is_err());
        assert!(parse_selection("a:1-2:1").is_err());
    }

    #[test]
    fn test_parse_action_lists_names_on_error() {
        assert_eq!(parse_action("boost-format").unwrap(), Action::BoostFormat);

        let err = parse_action("reformat").unwrap_err();
        assert!(err.contains("unknown action 'reformat'"));
        assert!(err.contains("select-block"));
    }

    #[test]
    fn test_document_type_from_file_name() {
        assert_eq!(document_type_for(Path::new("src/main.cpp")), "C++");
        assert_eq!(document_type_for(Path::new("include/foo.hpp")), "C++");
        assert_eq!(document_type_for(Path::new("lib.c")), "C");
        assert_eq!(document_type_for(Path::new("setup.py")), "Python");
        assert_eq!(document_type_for(Path::new("CMakeLists.txt")), "CMake");
        assert_eq!(document_type_for(Path::new("Makefile")), "C++");
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.comment.position = 72;
        config.indent.use_tabs = true;
        config.expansions.insert("ctor".into(), "{0}()".into());

        let settings = settings_from(&config, "Python".to_string()).unwrap();

        assert_eq!(settings.comment.position, 72);
        assert_eq!(settings.comment.threshold, 50);
        assert_eq!(settings.indent.unit(), "\t");
        assert_eq!(settings.document_type, "Python");
        assert!(settings.expansions.get("ctor").is_some());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = load_config(Some(&temp_dir.path().join("missing.toml"))).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_run_in_place_formats_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("call.cpp");
        std::fs::write(&file, "foo(a, b);\n").unwrap();

        run_cli(Args {
            action: Action::BoostFormat,
            file: file.clone(),
            line: 1,
            column: 5,
            select: None,
            doc_type: None,
            config: Some(temp_dir.path().join("none.toml")),
            in_place: true,
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "foo(\n    a\n  , b\n);\n"
        );
    }

    #[test]
    fn test_run_reports_action_errors() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.cpp");
        std::fs::write(&file, "int x = 1;\n").unwrap();

        let err = run_cli(Args {
            action: Action::BoostFormat,
            file,
            line: 1,
            column: 5,
            select: None,
            doc_type: None,
            config: Some(temp_dir.path().join("none.toml")),
            in_place: true,
        })
        .unwrap_err();

        assert!(format!("{err:#}").contains("Didn't find anything to format"));
    }
}
