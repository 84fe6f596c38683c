//! Platform-independent shell loop.

use crate::commands::{self, CommandResult};
use crate::io::{ExitReason, Input, IoError, IoHost, PromptState, Tone};
use crate::session::Session;

pub struct ReplCore {
    session: Session,
}

impl ReplCore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Run the loop until the user exits or input ends.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write(Tone::Notice, BANNER)?;

        loop {
            let line = match io.read(&self.prompt())? {
                Input::Line(line) => line,
                Input::Interrupt => {
                    io.write(Tone::Notice, "^C (use 'exit' to quit)")?;
                    continue;
                }
                Input::Eof => return farewell(io, ExitReason::Eof),
            };

            match commands::execute(&line, &mut self.session) {
                CommandResult::Ok(None) => {}
                CommandResult::Ok(Some(output)) => io.write(Tone::Plain, &output)?,
                CommandResult::Error(msg) => io.write(Tone::Error, &msg)?,
                CommandResult::Help => io.write(Tone::Plain, &commands::format_help())?,
                CommandResult::Exit => return farewell(io, ExitReason::UserExit),
            }
            io.flush()?;
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn prompt(&self) -> PromptState {
        PromptState {
            locators: self.session.router().locators().len(),
            current: self.session.current().map(|l| l.to_string()),
        }
    }
}

fn farewell(io: &mut impl IoHost, reason: ExitReason) -> Result<ExitReason, IoError> {
    io.write(Tone::Notice, "Goodbye!")?;
    io.flush()?;
    Ok(reason)
}

const BANNER: &str = r#"
 _ __ _____      ___ __ ___   __ _ _ __
| '__/ _ \ \ /\ / / '_ ` _ \ / _` | '_ \
| | | (_) \ V  V /| | | | | | (_| | |_) |
|_|  \___/ \_/\_/ |_| |_| |_|\__,_| .__/
                                  |_|

Type 'help' for available commands, 'exit' to quit.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShellConfig, SCRATCH_LOCATOR};
    use std::collections::VecDeque;

    /// Replays queued inputs, then reports end of input.
    #[derive(Default)]
    struct ScriptedHost {
        inputs: VecDeque<Input>,
        written: Vec<(Tone, String)>,
        prompts: Vec<PromptState>,
    }

    impl ScriptedHost {
        fn lines(lines: &[&str]) -> Self {
            Self {
                inputs: lines.iter().map(|l| Input::Line(l.to_string())).collect(),
                ..Self::default()
            }
        }

        fn text(&self) -> String {
            self.written
                .iter()
                .map(|(_, text)| text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        }

        fn errors(&self) -> usize {
            self.written.iter().filter(|(tone, _)| *tone == Tone::Error).count()
        }
    }

    impl IoHost for ScriptedHost {
        fn read(&mut self, prompt: &PromptState) -> Result<Input, IoError> {
            self.prompts.push(prompt.clone());
            Ok(self.inputs.pop_front().unwrap_or(Input::Eof))
        }

        fn write(&mut self, tone: Tone, text: &str) -> Result<(), IoError> {
            self.written.push((tone, text.to_string()));
            Ok(())
        }
    }

    fn core() -> ReplCore {
        ReplCore::new(Session::new(ShellConfig::scratch().build_router().unwrap()))
    }

    #[test]
    fn exit_command() {
        let mut host = ScriptedHost::lines(&["exit"]);
        assert_eq!(core().run(&mut host).unwrap(), ExitReason::UserExit);
        assert!(host.text().contains("Goodbye"));
    }

    #[test]
    fn end_of_input() {
        let mut host = ScriptedHost::default();
        assert_eq!(core().run(&mut host).unwrap(), ExitReason::Eof);
    }

    #[test]
    fn interrupt_continues() {
        let mut host = ScriptedHost::default();
        host.inputs.extend([Input::Interrupt, Input::Line("exit".to_string())]);

        assert_eq!(core().run(&mut host).unwrap(), ExitReason::UserExit);
        assert!(host.text().contains("^C"));
    }

    #[test]
    fn prompt_shows_current_locator() {
        let mut host = ScriptedHost::lines(&["exit"]);
        core().run(&mut host).unwrap();

        assert_eq!(
            host.prompts.last(),
            Some(&PromptState {
                locators: 1,
                current: Some(SCRATCH_LOCATOR.to_string()),
            })
        );
    }

    #[test]
    fn insert_then_query_on_scratch() {
        let mut host = ScriptedHost::lines(&[
            r#"insert {"id": "a", "note": "hello"}"#,
            r#"query {"note": ?} -- hello"#,
            "query note = ? and id = ? -- hello",
        ]);

        assert_eq!(core().run(&mut host).unwrap(), ExitReason::Eof);
        assert!(host.text().contains("(1 row)"));
        assert_eq!(host.errors(), 1);
    }
}
