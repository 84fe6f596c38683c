use reedline::{Completer, Span, Suggestion};

const COMMANDS: [(&str, &str); 11] = [
    ("insert", "Insert a row"),
    ("bulk", "Insert a batch of rows"),
    ("query", "Print matching rows"),
    ("update", "Overwrite fields on matching rows"),
    ("delete", "Delete matching rows"),
    ("type", "Show the current type"),
    ("use", "Switch locator"),
    ("locators", "List registered locators"),
    ("help", "Show help"),
    ("exit", "Exit the shell"),
    ("quit", "Exit the shell"),
];

/// Completes command names, and locators after `use`.
pub struct ReplCompleter {
    locators: Vec<String>,
}

impl ReplCompleter {
    pub fn new(locators: Vec<String>) -> Self {
        Self { locators }
    }
}

fn suggestion(value: &str, description: Option<&str>, start: usize, pos: usize) -> Suggestion {
    Suggestion {
        value: value.to_string(),
        description: description.map(str::to_string),
        style: None,
        extra: None,
        span: Span::new(start, pos),
        append_whitespace: true,
        match_indices: None,
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();
        let completing_new_word = line_to_pos.ends_with(char::is_whitespace);

        match (words.as_slice(), completing_new_word) {
            ([], _) | ([_], false) => {
                let prefix = words.first().copied().unwrap_or("");
                let start = pos - prefix.len();
                COMMANDS
                    .iter()
                    .filter(|(cmd, _)| cmd.starts_with(prefix))
                    .map(|(cmd, desc)| suggestion(cmd, Some(desc), start, pos))
                    .collect()
            }
            (["use"], true) | (["use", _], false) => {
                let prefix = if completing_new_word { "" } else { words[1] };
                let start = pos - prefix.len();
                self.locators
                    .iter()
                    .filter(|locator| locator.starts_with(prefix))
                    .map(|locator| suggestion(locator, None, start, pos))
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(suggestions: Vec<Suggestion>) -> Vec<String> {
        suggestions.into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn completes_commands() {
        let mut completer = ReplCompleter::new(Vec::new());
        assert_eq!(values(completer.complete("up", 2)), vec!["update"]);
        assert_eq!(values(completer.complete("", 0)).len(), COMMANDS.len());
        assert!(completer.complete("query x", 7).is_empty());
    }

    #[test]
    fn completes_locators_after_use() {
        let mut completer = ReplCompleter::new(vec![
            "content://people/contacts".to_string(),
            "content://scratch/notes".to_string(),
        ]);
        assert_eq!(values(completer.complete("use ", 4)).len(), 2);

        let suggestions = completer.complete("use content://p", 15);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "content://people/contacts");
        assert_eq!(suggestions[0].span, Span::new(4, 15));
    }
}
