/// Escape text from the backend before it reaches the terminal.
///
/// Control characters are replaced by their visible escaped form so a
/// summary cannot move the cursor or restyle the screen.
pub fn escape_display(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape_display("Lunch with Äijä @ café"), "Lunch with Äijä @ café");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(escape_display("a\u{1b}[31mb"), "a\\u{1b}[31mb");
        assert_eq!(escape_display("line\nbreak"), "line\\nbreak");
    }
}
