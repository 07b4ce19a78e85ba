//! Turning raw message text into a command word and argument

use sdk::errors::EngineError;
use tracing::{debug, warn};

/// A message split into its command word and argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub argument: Option<String>,
    /// The message was addressed to the bot by mention
    pub mentioned: bool,
}

/// Split off the first whitespace-delimited word
///
/// The remainder has leading whitespace removed and is `None` when empty.
pub fn split(text: &str) -> (String, Option<String>) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(index) => {
            let rest = text[index..].trim_start();
            let rest = (!rest.is_empty()).then(|| rest.to_string());
            (text[..index].to_string(), rest)
        }
        None => (text.to_string(), None),
    }
}

/// Replace Slack's `<target|label>` markup with the label
///
/// Each bracketed span, first to last, is replaced by the text after its last
/// `|`, or by its whole content when there is no `|`.
///
/// # Errors
///
/// Returns `EngineError::Unfurl` when `<` and `>` counts differ or a `<` is
/// never closed.
pub fn unfurl(text: &str) -> Result<String, EngineError> {
    let mut text = text.to_string();

    while let Some(open) = text.find('<') {
        if text.matches('<').count() != text.matches('>').count() {
            return Err(EngineError::Unfurl(text));
        }
        let close = match text[open..].find('>') {
            Some(offset) => open + offset,
            None => return Err(EngineError::Unfurl(text)),
        };

        let inner = &text[open + 1..close];
        let label = inner.rsplit('|').next().unwrap_or(inner).to_string();
        debug!(old = %&text[open..=close], new = %label, "unfurled");
        text.replace_range(open..=close, &label);
    }

    Ok(text)
}

fn unfurl_or_raw(argument: Option<String>) -> Option<String> {
    argument.map(|raw| match unfurl(&raw) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "keeping argument as typed");
            raw
        }
    })
}

/// Parse a message, recognising a leading mention of the bot
///
/// When the first word is `mention_token`, the rest of the message is split
/// again to recover the real command.
pub fn parse_command(text: &str, mention_token: Option<&str>) -> ParsedCommand {
    let (command, argument) = split(text);

    if mention_token.is_some_and(|token| token == command) {
        let (command, argument) = split(argument.as_deref().unwrap_or(""));
        return ParsedCommand {
            command,
            argument: unfurl_or_raw(argument),
            mentioned: true,
        };
    }

    ParsedCommand {
        command,
        argument: unfurl_or_raw(argument),
        mentioned: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_and_argument() {
        assert_eq!(
            split("  d:   wrote code  "),
            ("d:".to_string(), Some("wrote code".to_string()))
        );
        assert_eq!(split("end"), ("end".to_string(), None));
        assert_eq!(split("   "), (String::new(), None));
    }

    #[test]
    fn test_unfurl_links_and_mentions() {
        assert_eq!(
            unfurl("see <https://example.com|the docs>").unwrap(),
            "see the docs"
        );
        assert_eq!(unfurl("ping <@U123>").unwrap(), "ping @U123");
        assert_eq!(unfurl("<a|b|c> and <d>").unwrap(), "c and d");
    }

    #[test]
    fn test_unfurl_plain_text_unchanged() {
        assert_eq!(unfurl("no markup here").unwrap(), "no markup here");
    }

    #[test]
    fn test_unfurl_unbalanced() {
        assert!(matches!(unfurl("a < b"), Err(EngineError::Unfurl(_))));
        assert!(matches!(unfurl("> a <"), Err(EngineError::Unfurl(_))));
    }

    #[test]
    fn test_parse_mention() {
        let parsed = parse_command("<@UBOT> start now", Some("<@UBOT>"));
        assert!(parsed.mentioned);
        assert_eq!(parsed.command, "start");
        assert_eq!(parsed.argument.as_deref(), Some("now"));
    }

    #[test]
    fn test_parse_bare_mention() {
        let parsed = parse_command("<@UBOT>", Some("<@UBOT>"));
        assert!(parsed.mentioned);
        assert_eq!(parsed.command, "");
        assert_eq!(parsed.argument, None);
    }

    #[test]
    fn test_parse_keeps_raw_argument_on_unfurl_failure() {
        let parsed = parse_command("d: fixed a < b", None);
        assert!(!parsed.mentioned);
        assert_eq!(parsed.argument.as_deref(), Some("fixed a < b"));
    }

    #[test]
    fn test_mention_of_someone_else_is_not_a_mention() {
        let parsed = parse_command("<@UOTHER> start", Some("<@UBOT>"));
        assert!(!parsed.mentioned);
        assert_eq!(parsed.command, "<@UOTHER>");
    }
}
