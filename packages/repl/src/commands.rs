//! Shell command parsing and execution.
//!
//! Commands act on the current locator (see `use`):
//! - `insert <row>` - Insert one row, a JSON object of columns
//! - `bulk <rows>` - Insert a JSON array of rows in one batch
//! - `query [selection] [-- args...]` - Print matching rows
//! - `update <patch> [selection] [-- args...]` - Overwrite fields on matching rows
//! - `delete [selection] [-- args...]` - Delete matching rows (all rows with no args)
//! - `type` - Show the current locator's type descriptor
//! - `use <locator>` - Switch locator
//! - `locators` - List registered locators
//! - `help`, `exit`
//!
//! Rows may nest objects or use dotted column names: `{"address": {"city":
//! "NY"}}` and `{"address.city": "NY"}` are the same row. Arguments after
//! `--` are bare words or JSON strings; a bare `null` is an absent argument.

use nu_ansi_term::{Color, Style};
use serde_json::Value as JsonValue;

use rowmap_core::{flatten, FieldPath, FlatRecord, ResourceLocator, Value};
use rowmap_serde::json_to_value;

use crate::session::Session;

/// Result of executing a command
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok(Option<String>),
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok(Some(display.into()))
    }
}

impl<E: std::fmt::Display> From<Result<String, E>> for CommandResult {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(display) => CommandResult::ok_display(display),
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }
}

/// Parse and execute a command
pub fn execute(input: &str, session: &mut Session) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::Ok(None);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    match command.to_lowercase().as_str() {
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        "locators" | "ls" => cmd_locators(session).into(),
        "use" => cmd_use(args, session).into(),
        "type" => cmd_type(session).into(),
        "insert" => cmd_insert(args, session).into(),
        "bulk" => cmd_bulk(args, session).into(),
        "query" | "q?" => cmd_query(args, session).into(),
        "update" => cmd_update(args, session).into(),
        "delete" => cmd_delete(args, session).into(),
        _ => CommandResult::Error(format!(
            "Unknown command: '{}'. Type 'help' for available commands.",
            command
        )),
    }
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = format!("{}\n\n", Style::new().bold().paint("rowmap shell commands"));

    let commands = [
        ("insert", "<row>", "Insert a JSON object of columns"),
        ("bulk", "<rows>", "Insert a JSON array of rows"),
        ("query", "[selection] [-- args]", "Print matching rows (alias: q?)"),
        ("update", "<patch> [selection] [-- args]", "Overwrite fields on matching rows"),
        ("delete", "[selection] [-- args]", "Delete matching rows; no args resets"),
        ("", "", ""),
        ("type", "", "Show the current locator's type"),
        ("use", "<locator>", "Switch to another locator"),
        ("locators", "", "List registered locators (alias: ls)"),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<10} {:<30} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc
            ));
        }
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Examples")));
    for example in [
        r#"insert {"id": 1, "name": "Ada", "address": {"city": "NY"}}"#,
        r#"query address.city = ? -- NY"#,
        r#"update {"name": "Ada L"} id = ? -- 1"#,
        r#"delete {"id": ?} -- 1"#,
    ] {
        help.push_str(&format!("  {}\n", arg_style.paint(example)));
    }
    help
}

fn current(session: &Session) -> Result<ResourceLocator, String> {
    session
        .current()
        .cloned()
        .ok_or_else(|| "no locator selected (see 'locators' and 'use')".to_string())
}

fn cmd_locators(session: &Session) -> Result<String, String> {
    let router = session.router();
    let locators = router.locators();
    if locators.is_empty() {
        return Ok(Color::Yellow.paint("no locators registered").to_string());
    }

    let lines: Vec<String> = locators
        .into_iter()
        .map(|locator| {
            let marker = if session.current() == Some(locator) { "*" } else { " " };
            let store = router.store_name(locator).unwrap_or("?");
            format!(
                "{} {} {}",
                Color::Green.bold().paint(marker),
                Color::Cyan.paint(locator.as_str()),
                Color::DarkGray.paint(format!("({})", store))
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

fn cmd_use(args: &str, session: &mut Session) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: use <locator>".to_string());
    }
    let locator = session.use_locator(args).map_err(|e| e.to_string())?;
    Ok(format!("{} {}", Color::Green.paint("using"), Color::Cyan.paint(locator.as_str())))
}

fn cmd_type(session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    match session.router().descriptor(&locator).map_err(|e| e.to_string())? {
        Some(descriptor) => {
            let json = serde_json::to_value(&*descriptor).map_err(|e| e.to_string())?;
            Ok(format_json(&json, true))
        }
        None => Ok(Color::Yellow.paint("untyped").to_string()),
    }
}

fn cmd_insert(args: &str, session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    let row = parse_row(&parse_json(args)?)?;
    session
        .router()
        .insert(&locator, &row)
        .map_err(|e| e.to_string())?;
    Ok(format!("{}", Color::Green.paint("inserted 1 row")))
}

fn cmd_bulk(args: &str, session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    let rows = match parse_json(args)? {
        JsonValue::Array(items) => items.iter().map(parse_row).collect::<Result<Vec<_>, _>>()?,
        _ => return Err("bulk expects a JSON array of rows".to_string()),
    };
    let count = session
        .router()
        .bulk_insert(&locator, &rows)
        .map_err(|e| e.to_string())?;
    Ok(format!("{}", Color::Green.paint(format!("inserted {} row(s)", count))))
}

fn cmd_query(args: &str, session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    let (selection, selection_args) = parse_selection(args)?;
    let rows = session
        .router()
        .query(&locator, &selection, &selection_args)
        .map_err(|e| e.to_string())?;
    Ok(format_rows(&rows))
}

fn cmd_update(args: &str, session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    let (patch, rest) = split_json_prefix(args)?;
    let patch = parse_row(&patch)?;
    let (selection, selection_args) = parse_selection(rest)?;
    session
        .router()
        .update(&locator, &patch, &selection, &selection_args)
        .map_err(|e| e.to_string())?;
    Ok(format!("{}", Color::Green.paint("updated")))
}

fn cmd_delete(args: &str, session: &Session) -> Result<String, String> {
    let locator = current(session)?;
    let (selection, selection_args) = parse_selection(args)?;
    session
        .router()
        .delete(&locator, &selection, &selection_args)
        .map_err(|e| e.to_string())?;
    Ok(format!("{}", Color::Green.paint("deleted")))
}

fn parse_json(text: &str) -> Result<JsonValue, String> {
    if text.is_empty() {
        return Err("expected JSON".to_string());
    }
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))
}

/// Parse one JSON value off the front of `text`, returning the remainder.
fn split_json_prefix(text: &str) -> Result<(JsonValue, &str), String> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<JsonValue>();
    match stream.next() {
        Some(Ok(value)) => {
            let rest = &text[stream.byte_offset()..];
            Ok((value, rest.trim()))
        }
        Some(Err(e)) => Err(format!("invalid JSON: {}", e)),
        None => Err("expected JSON".to_string()),
    }
}

/// A JSON object (nested or with dotted keys) as a flat row.
fn parse_row(json: &JsonValue) -> Result<FlatRecord, String> {
    let JsonValue::Object(columns) = json else {
        return Err("a row must be a JSON object".to_string());
    };

    // Top-level keys are column keys, so `address.city` nests
    let mut row = Value::map();
    for (key, cell) in columns {
        let path = FieldPath::parse(key).map_err(|e| e.to_string())?;
        row.set(&path, json_to_value(cell.clone()))
            .map_err(|e| e.to_string())?;
    }
    flatten(&row).map_err(|e| e.to_string())
}

/// Split `selection -- args` into the selection text and its arguments.
fn parse_selection(text: &str) -> Result<(String, Vec<Option<String>>), String> {
    let (selection, args) = match text.find("--") {
        Some(at) => (&text[..at], Some(&text[at + 2..])),
        None => (text, None),
    };
    let args = match args {
        Some(args) => parse_args(args)?,
        None => Vec::new(),
    };
    Ok((selection.trim().to_string(), args))
}

fn parse_args(text: &str) -> Result<Vec<Option<String>>, String> {
    let mut args = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if rest.starts_with('"') {
            let (value, after) = split_json_prefix(rest)?;
            match value {
                JsonValue::String(s) => args.push(Some(s)),
                other => return Err(format!("unexpected argument {}", other)),
            }
            rest = after;
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..end];
            args.push(if word == "null" { None } else { Some(word.to_string()) });
            rest = rest[end..].trim_start();
        }
    }
    Ok(args)
}

fn format_rows(rows: &[FlatRecord]) -> String {
    let mut out: Vec<String> = rows
        .iter()
        .map(|row| match serde_json::to_value(row) {
            Ok(json) => format_json(&json, false),
            Err(e) => e.to_string(),
        })
        .collect();
    out.push(
        Color::DarkGray
            .paint(format!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" }))
            .to_string(),
    );
    out.join("\n")
}

/// Format JSON with syntax highlighting
fn format_json(value: &JsonValue, pretty: bool) -> String {
    let mut out = String::new();
    paint_json(value, pretty, 0, &mut out);
    out
}

fn paint_json(value: &JsonValue, pretty: bool, depth: usize, out: &mut String) {
    let punct = Color::White.bold();
    let (open_sep, item_sep, indent, close_indent) = if pretty {
        (
            "\n".to_string(),
            ",\n".to_string(),
            "  ".repeat(depth + 1),
            format!("\n{}", "  ".repeat(depth)),
        )
    } else {
        (String::new(), ", ".to_string(), String::new(), String::new())
    };

    match value {
        JsonValue::Null | JsonValue::Bool(_) => {
            out.push_str(&Color::Yellow.paint(value.to_string()).to_string())
        }
        JsonValue::Number(_) => out.push_str(&Color::Cyan.paint(value.to_string()).to_string()),
        JsonValue::String(_) => out.push_str(&Color::Green.paint(value.to_string()).to_string()),
        JsonValue::Array(items) => {
            out.push_str(&punct.paint("[").to_string());
            for (i, item) in items.iter().enumerate() {
                out.push_str(if i == 0 { &open_sep } else { &item_sep });
                out.push_str(&indent);
                paint_json(item, pretty, depth + 1, out);
            }
            if !items.is_empty() {
                out.push_str(&close_indent);
            }
            out.push_str(&punct.paint("]").to_string());
        }
        JsonValue::Object(map) => {
            out.push_str(&punct.paint("{").to_string());
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(if i == 0 { &open_sep } else { &item_sep });
                out.push_str(&indent);
                out.push_str(&Color::Blue.paint(JsonValue::String(key.clone()).to_string()).to_string());
                out.push_str(": ");
                paint_json(item, pretty, depth + 1, out);
            }
            if !map.is_empty() {
                out.push_str(&close_indent);
            }
            out.push_str(&punct.paint("}").to_string());
        }
    }
}
