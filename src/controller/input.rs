/// Something the user asked the client to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Submit(String),
    PrevMonth,
    NextMonth,
    ToggleVoice,
    Refresh,
    Logout,
    Help,
    Quit,
}

impl UserAction {
    /// Read one line of terminal input.
    ///
    /// Lines starting with `:` are commands; everything else, including
    /// unknown commands, is a query for the assistant.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            ":prev" | ":p" => UserAction::PrevMonth,
            ":next" | ":n" => UserAction::NextMonth,
            ":voice" | ":v" => UserAction::ToggleVoice,
            ":refresh" | ":r" => UserAction::Refresh,
            ":logout" => UserAction::Logout,
            ":help" | ":h" => UserAction::Help,
            ":quit" | ":q" => UserAction::Quit,
            _ => UserAction::Submit(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(UserAction::parse(":prev"), UserAction::PrevMonth);
        assert_eq!(UserAction::parse("  :next "), UserAction::NextMonth);
        assert_eq!(UserAction::parse(":q"), UserAction::Quit);
        assert_eq!(UserAction::parse(":logout"), UserAction::Logout);
    }

    #[test]
    fn other_text_is_a_query() {
        assert_eq!(
            UserAction::parse("What's on Friday?"),
            UserAction::Submit("What's on Friday?".to_string())
        );
        assert_eq!(
            UserAction::parse(":dance"),
            UserAction::Submit(":dance".to_string())
        );
    }
}
