// File: roastbot-core/src/services/mention.rs
//! Decides whether a chat line is talking to the bot and, if so, what it asks for.

/// What an inbound line amounts to, before any registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntent {
    /// Nothing but whitespace.
    Empty,
    /// A global trigger fired; reply with this text and do nothing else.
    Trigger(String),
    /// Neither the first nor the last token mentions the bot.
    NotAddressed,
    /// The line is the mention and nothing more.
    Greeting,
    /// Mention stripped; `args[0]` is the candidate keyword.
    Command(Vec<String>),
}

/// Fixed replies that bypass mention and command handling entirely.
pub fn trigger_reply(token: &str, operator: &str) -> Option<String> {
    match token.to_lowercase().as_str() {
        "!xd" => Some("xD".to_string()),
        "!php" => Some("PHPDETECTED".to_string()),
        "!bot" => Some(format!("I'm {}'s bot, written in Rust", operator)),
        _ => None,
    }
}

/// `@name`, `name,` and `@name,` all mention `name`, case-insensitively.
pub fn is_mention(token: &str, username: &str) -> bool {
    let token = token.strip_prefix('@').unwrap_or(token);
    let token = token.strip_suffix(',').unwrap_or(token);
    !username.is_empty() && token.eq_ignore_ascii_case(username)
}

/// Splits on single spaces and classifies the line. Empty tokens are kept, so
/// `"@bot  help"` yields `["", "help"]`, which no command matches.
pub fn classify(text: &str, username: &str, operator: &str) -> MessageIntent {
    if text.is_empty() {
        return MessageIntent::Empty;
    }
    let tokens: Vec<&str> = text.split(' ').collect();
    let (Some(first), Some(last)) = (tokens.first().copied(), tokens.last().copied()) else {
        return MessageIntent::Empty;
    };

    if let Some(reply) = trigger_reply(first, operator).or_else(|| trigger_reply(last, operator)) {
        return MessageIntent::Trigger(reply);
    }

    let first_mentions = is_mention(first, username);
    let last_mentions = is_mention(last, username);
    if !first_mentions && !last_mentions {
        return MessageIntent::NotAddressed;
    }

    if tokens.len() == 1 {
        return MessageIntent::Greeting;
    }

    let args = if first_mentions {
        &tokens[1..]
    } else {
        &tokens[..tokens.len() - 1]
    };
    MessageIntent::Command(args.iter().map(|t| t.to_string()).collect())
}
