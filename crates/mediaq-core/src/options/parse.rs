//! Parse a free-form engine flag string into an [`OptionOverlay`].

use super::{OptionOverlay, OverlayEntry, REPEATED_FLAG};

const FLAG_PREFIX: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionParseError {
    #[error("could not tokenize engine options (unbalanced quotes?): {0}")]
    Unbalanced(String),
    #[error("engine options contain a flag without a name")]
    EmptyFlag,
}

/// `--embed-thumbnail` -> `embed_thumbnail`.
fn fold_key(name: &str) -> String {
    name.replace('-', "_")
}

fn entry_for(key: String, value: Option<String>) -> OverlayEntry {
    match value {
        Some(v) if key == REPEATED_FLAG => OverlayEntry::Repeated(key, v),
        Some(v) => OverlayEntry::Valued(key, v),
        None => OverlayEntry::Flag(key),
    }
}

/// Tokenize `raw` shell-style and group tokens into flags.
///
/// A token starting with `--` names a flag. If the next token does not look
/// like a flag it becomes the value; otherwise the flag is a switch.
/// `--key=value` is accepted as well. Tokens that are neither a flag nor a
/// flag's value are ignored.
pub fn parse_overlay(raw: &str) -> Result<OptionOverlay, OptionParseError> {
    let tokens = shlex::split(raw).ok_or_else(|| OptionParseError::Unbalanced(raw.to_string()))?;

    let mut entries = Vec::new();
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        let Some(name) = token.strip_prefix(FLAG_PREFIX) else {
            tracing::debug!(token = %token, "ignoring positional token in engine options");
            continue;
        };

        if let Some((name, value)) = name.split_once('=') {
            if name.is_empty() {
                return Err(OptionParseError::EmptyFlag);
            }
            entries.push(entry_for(fold_key(name), Some(value.to_string())));
            continue;
        }

        if name.is_empty() {
            return Err(OptionParseError::EmptyFlag);
        }
        let key = fold_key(name);
        let value = iter.next_if(|next| !next.starts_with(FLAG_PREFIX));
        entries.push(entry_for(key, value));
    }

    Ok(OptionOverlay::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(raw: &str) -> Vec<OverlayEntry> {
        parse_overlay(raw).unwrap().entries().to_vec()
    }

    #[test]
    fn empty_string_is_empty_overlay() {
        assert!(parse_overlay("").unwrap().is_empty());
        assert!(parse_overlay("   ").unwrap().is_empty());
    }

    #[test]
    fn flags_values_and_switches() {
        assert_eq!(
            entries("--format 'bv*+ba' --embed-thumbnail --limit-rate 2M"),
            vec![
                OverlayEntry::Valued("format".into(), "bv*+ba".into()),
                OverlayEntry::Flag("embed_thumbnail".into()),
                OverlayEntry::Valued("limit_rate".into(), "2M".into()),
            ]
        );
    }

    #[test]
    fn trailing_flag_is_switch() {
        assert_eq!(
            entries("--format best --no-part"),
            vec![
                OverlayEntry::Valued("format".into(), "best".into()),
                OverlayEntry::Flag("no_part".into()),
            ]
        );
    }

    #[test]
    fn short_dash_values_are_kept() {
        assert_eq!(
            entries("--playlist-items -1"),
            vec![OverlayEntry::Valued("playlist_items".into(), "-1".into())]
        );
    }

    #[test]
    fn equals_form_and_quoted_values() {
        assert_eq!(
            entries(r#"--output="%(title)s.%(ext)s" --add-header "X-Test: a b""#),
            vec![
                OverlayEntry::Valued("output".into(), "%(title)s.%(ext)s".into()),
                OverlayEntry::Repeated("add_header".into(), "X-Test: a b".into()),
            ]
        );
    }

    #[test]
    fn positional_tokens_are_ignored() {
        assert_eq!(
            entries("stray --format best another"),
            vec![OverlayEntry::Valued("format".into(), "best".into())]
        );
    }

    #[test]
    fn unbalanced_quotes_fail() {
        assert!(matches!(
            parse_overlay("--format \"best"),
            Err(OptionParseError::Unbalanced(_))
        ));
    }

    #[test]
    fn bare_double_dash_fails() {
        assert_eq!(parse_overlay("-- best"), Err(OptionParseError::EmptyFlag));
        assert_eq!(parse_overlay("--=x"), Err(OptionParseError::EmptyFlag));
    }
}
