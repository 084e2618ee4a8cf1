use std::{iter::Peekable, str::Chars};

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::services::bridge::HookError;

/// GSettings schema of the sound indicator.
pub const INDICATOR_SCHEMA: &str = "com.canonical.indicator.sound";

/// Key listing the players the indicator remembers.
pub const INDICATOR_KEY: &str = "interested-media-players";

/// Remove every remembered player whose entry contains `exposed_name`.
///
/// The setting is only written back when something was removed. Returns
/// whether it was.
///
/// # Errors
/// Returns error if `gsettings` fails or prints something that is not a
/// string array
#[instrument]
pub async fn purge_interested_players(exposed_name: &str) -> Result<bool, HookError> {
    let output = gsettings(&["get", INDICATOR_SCHEMA, INDICATOR_KEY]).await?;
    let players = parse_string_array(&output).map_err(|reason| HookError::Parse {
        command: format!("gsettings get {INDICATOR_SCHEMA} {INDICATOR_KEY}"),
        reason,
    })?;

    let Some(kept) = without(&players, exposed_name) else {
        debug!("Indicator does not remember this player");
        return Ok(false);
    };

    gsettings(&[
        "set",
        INDICATOR_SCHEMA,
        INDICATOR_KEY,
        &format_string_array(&kept),
    ])
    .await?;
    debug!(removed = players.len() - kept.len(), "Purged indicator players");
    Ok(true)
}

/// `players` without the entries containing `exposed_name`, or `None` if
/// no entry does.
pub fn without(players: &[String], exposed_name: &str) -> Option<Vec<String>> {
    let kept: Vec<String> = players
        .iter()
        .filter(|player| !player.contains(exposed_name))
        .cloned()
        .collect();

    (kept.len() != players.len()).then_some(kept)
}

async fn gsettings(args: &[&str]) -> Result<String, HookError> {
    let command = format!("gsettings {}", args.join(" "));
    let output = Command::new("gsettings")
        .args(args)
        .output()
        .await
        .map_err(|e| HookError::Command {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(HookError::Command {
            command,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse a GVariant text-format string array such as `['a', "b"]`.
///
/// Accepts the empty forms `[]` and `@as []`. Quotes may be single or
/// double; backslash escapes the next character, with `\n`, `\t` and `\r`
/// decoded.
///
/// # Errors
/// Returns a description of the first malformed position
pub fn parse_string_array(text: &str) -> Result<Vec<String>, String> {
    let text = text.trim();
    let text = text.strip_prefix("@as").map_or(text, str::trim_start);

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("expected a bracketed array, got '{text}'"))?;

    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    skip_whitespace(&mut chars);
    if chars.peek().is_none() {
        return Ok(items);
    }

    loop {
        skip_whitespace(&mut chars);
        items.push(parse_quoted(&mut chars)?);
        skip_whitespace(&mut chars);

        match chars.next() {
            None => return Ok(items),
            Some(',') => {}
            Some(other) => return Err(format!("expected ',' between elements, got '{other}'")),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let quote = match chars.next() {
        Some(quote @ ('\'' | '"')) => quote,
        Some(other) => return Err(format!("expected a quoted string, got '{other}'")),
        None => return Err("expected a quoted string, got end of input".to_string()),
    };

    let mut value = String::new();
    loop {
        match chars.next() {
            None => return Err("unterminated string".to_string()),
            Some('\\') => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(escaped) => value.push(escaped),
                None => return Err("dangling escape".to_string()),
            },
            Some(c) if c == quote => return Ok(value),
            Some(c) => value.push(c),
        }
    }
}

/// Render `items` in GVariant text format, suitable for `gsettings set`.
pub fn format_string_array(items: &[String]) -> String {
    if items.is_empty() {
        return "@as []".to_string();
    }

    let quoted: Vec<String> = items
        .iter()
        .map(|item| {
            let mut out = String::with_capacity(item.len() + 2);
            out.push('\'');
            for c in item.chars() {
                match c {
                    '\\' | '\'' => {
                        out.push('\\');
                        out.push(c);
                    }
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    _ => out.push(c),
                }
            }
            out.push('\'');
            out
        })
        .collect();

    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_empty_forms() {
        assert_eq!(parse_string_array("[]\n"), Ok(vec![]));
        assert_eq!(parse_string_array("@as []\n"), Ok(vec![]));
        assert_eq!(parse_string_array("[ ]"), Ok(vec![]));
    }

    #[test]
    fn parses_mixed_quotes_and_escapes() {
        let parsed = parse_string_array(r#"['rhythmbox.desktop', "it's", 'a\'b\\c']"#).unwrap();

        assert_eq!(parsed, strings(&["rhythmbox.desktop", "it's", "a'b\\c"]));
    }

    #[test]
    fn rejects_anything_but_a_string_array() {
        assert!(parse_string_array("__import__('os')").is_err());
        assert!(parse_string_array("[1, 2]").is_err());
        assert!(parse_string_array("['a' 'b']").is_err());
        assert!(parse_string_array("['a',]").is_err());
        assert!(parse_string_array("['unterminated]").is_err());
    }

    #[test]
    fn formatted_output_parses_back() {
        let items = strings(&["vlc.desktop", "it's \\ odd"]);

        let formatted = format_string_array(&items);

        assert_eq!(formatted, r"['vlc.desktop', 'it\'s \\ odd']");
        assert_eq!(parse_string_array(&formatted), Ok(items));
        assert_eq!(format_string_array(&[]), "@as []");
    }

    #[test]
    fn without_drops_matching_entries() {
        let players = strings(&[
            "rhythmbox.desktop",
            "btdevAABBplayer0.desktop",
            "btdevAABBplayer0",
        ]);

        assert_eq!(
            without(&players, "btdevAABBplayer0"),
            Some(strings(&["rhythmbox.desktop"]))
        );
        assert_eq!(without(&players, "btdevCCDDplayer0"), None);
    }
}
