//! Terminal host implementation using Reedline.
//!
//! Readline-style editing (Vi or Emacs), tab completion of commands and
//! locators, and persistent history.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, Keybindings, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu,
    Signal as ReedlineSignal, Vi,
};

use crate::completer::ReplCompleter;
use crate::io::{Input, IoError, IoHost, PromptState, Tone};

/// Environment variable selecting `vi` or `emacs` editing.
pub const EDIT_MODE_ENV: &str = "ROWMAP_EDIT_MODE";

const COMPLETION_MENU: &str = "completion_menu";
const HISTORY_SIZE: usize = 1000;

/// Terminal host using Reedline for interactive I/O.
pub struct TerminalHost {
    line_editor: Reedline,
}

impl TerminalHost {
    /// Create a terminal host completing the given locators.
    pub fn new(locators: Vec<String>) -> Self {
        let completion_menu = ColumnarMenu::default()
            .with_name(COMPLETION_MENU)
            .with_text_style(Style::new().fg(Color::Cyan))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold());

        let line_editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new(locators)))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(completion_menu)))
            .with_edit_mode(edit_mode(use_vi_mode()));

        Self {
            line_editor: with_history(line_editor),
        }
    }
}

fn bind_completion(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
}

fn edit_mode(vi: bool) -> Box<dyn EditMode> {
    if vi {
        let mut insert = default_vi_insert_keybindings();
        bind_completion(&mut insert);
        return Box::new(Vi::new(insert, default_vi_normal_keybindings()));
    }

    let mut keybindings = default_emacs_keybindings();
    bind_completion(&mut keybindings);
    // Ctrl+D clears the line instead of ending input
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('d'),
        ReedlineEvent::Edit(vec![EditCommand::Clear]),
    );
    Box::new(Emacs::new(keybindings))
}

/// Attach file-backed history, or run without it if the file is unusable.
fn with_history(line_editor: Reedline) -> Reedline {
    let Some(path) = dirs::data_local_dir().map(|p| p.join("rowmap").join("history.txt")) else {
        return line_editor;
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::debug!(path = %parent.display(), error = %e, "cannot create history directory");
        }
    }
    match FileBackedHistory::with_file(HISTORY_SIZE, path) {
        Ok(history) => line_editor.with_history(Box::new(history)),
        Err(e) => {
            tracing::debug!(error = %e, "history disabled");
            line_editor
        }
    }
}

impl IoHost for TerminalHost {
    fn read(&mut self, prompt: &PromptState) -> Result<Input, IoError> {
        match self.line_editor.read_line(&TerminalPrompt { state: prompt }) {
            Ok(ReedlineSignal::Success(line)) => Ok(Input::Line(line)),
            Ok(ReedlineSignal::CtrlC) => Ok(Input::Interrupt),
            Ok(ReedlineSignal::CtrlD) => Ok(Input::Eof),
            Err(e) => Err(IoError(format!("line editor: {}", e))),
        }
    }

    fn write(&mut self, tone: Tone, text: &str) -> Result<(), IoError> {
        match tone {
            Tone::Plain => println!("{}", text),
            Tone::Error => println!("{} {}", Color::Red.bold().paint("Error:"), text),
            Tone::Notice => println!("{}", Color::Cyan.paint(text)),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush().map_err(|e| IoError(e.to_string()))
    }
}

struct TerminalPrompt<'a> {
    state: &'a PromptState,
}

impl Prompt for TerminalPrompt<'_> {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let text = match &self.state.current {
            Some(locator) => locator.clone(),
            None => format!("{} locator(s), none selected", self.state.locators),
        };
        Cow::Owned(Color::Yellow.paint(text).to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        let indicator = match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => Color::Green.bold().paint(">"),
            PromptEditMode::Vi(PromptViMode::Normal) => Color::Blue.bold().paint("[N]>"),
            PromptEditMode::Vi(PromptViMode::Insert) => Color::Green.bold().paint("[I]>"),
            PromptEditMode::Custom(s) => return Cow::Owned(format!("({})> ", s)),
        };
        Cow::Owned(format!("{} ", indicator))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse-search: {}) ", prefix, history_search.term))
    }
}

fn use_vi_mode() -> bool {
    vi_requested(
        std::env::var(EDIT_MODE_ENV).ok().as_deref(),
        [std::env::var("EDITOR").ok(), std::env::var("VISUAL").ok()]
            .iter()
            .flatten()
            .map(String::as_str),
    ) || inputrc_sets_vi()
}

/// An explicit edit mode wins; otherwise a vi-family editor selects vi.
fn vi_requested<'a>(explicit: Option<&str>, editors: impl IntoIterator<Item = &'a str>) -> bool {
    if let Some(mode) = explicit {
        let mode = mode.to_lowercase();
        return mode == "vi" || mode == "vim";
    }
    editors.into_iter().any(|editor| {
        let name = editor.rsplit('/').next().unwrap_or(editor).to_lowercase();
        name == "vi" || name.contains("vim")
    })
}

/// Whether an inputrc sets `editing-mode vi`.
fn inputrc_sets_vi() -> bool {
    let candidates = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| {
            content.lines().map(str::trim).any(|line| {
                line.starts_with("set") && line.contains("editing-mode") && line.contains("vi")
            })
        })
}
