//! Separating positional tokens from flags ahead of dispatch.
//!
//! Dispatch has to find sub-command names before the resolved command's flags
//! are parsed, so this pass only needs to know which flags swallow the next
//! token. It never fails: malformed or unknown flags are left for the real
//! parser to report.

use crate::flag::FlagSet;

/// Returns the positional tokens of `args`, skipping flags and their values.
///
/// A `--name` or a two-character `-x` without `=` is assumed to take the next
/// token as its value unless the flag is known to need none. Scanning stops
/// at `--` or when a value-taking flag is the last token.
#[must_use]
pub fn strip_flags<S: AsRef<str>>(args: &[S], flags: &FlagSet) -> Vec<String> {
    let mut positional = Vec::new();
    let mut remaining = args.iter().map(|arg| arg.as_ref());

    while let Some(token) = remaining.next() {
        if token == "--" {
            break;
        }

        if takes_value(token, flags) {
            if remaining.next().is_none() {
                break;
            }
            continue;
        }

        if !token.is_empty() && !token.starts_with('-') {
            positional.push(token.to_string());
        }
    }

    positional
}

fn takes_value(token: &str, flags: &FlagSet) -> bool {
    if token.contains('=') {
        return false;
    }

    if let Some(name) = token.strip_prefix("--") {
        return !flags
            .lookup(name)
            .is_some_and(|flag| flag.has_no_opt_default());
    }

    let mut shorthand = match token.strip_prefix('-') {
        Some(shorthand) => shorthand.chars(),
        None => return false,
    };
    match (shorthand.next(), shorthand.next()) {
        (Some(letter), None) => !flags
            .short_lookup(letter)
            .is_some_and(|flag| flag.has_no_opt_default()),
        _ => false,
    }
}

/// `args` without the first occurrence of `token`.
#[must_use]
pub fn args_minus_first(args: &[String], token: &str) -> Vec<String> {
    let mut rest = args.to_vec();
    if let Some(position) = rest.iter().position(|arg| arg == token) {
        rest.remove(position);
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> FlagSet {
        let mut flags = FlagSet::new("test");
        flags.bool_flag("verbose", Some('v'), false, "").unwrap();
        flags.string_flag("output", Some('o'), "", "").unwrap();
        flags
    }

    #[test]
    fn test_flag_values_are_skipped() {
        let positional = strip_flags(&["--verbose", "--output", "file.txt", "run"], &flags());
        assert_eq!(positional, vec!["run"]);
    }

    #[test]
    fn test_double_dash_stops_scanning() {
        let positional = strip_flags(&["build", "--", "a", "-b"], &flags());
        assert_eq!(positional, vec!["build"]);
    }

    #[test]
    fn test_short_flags() {
        assert_eq!(strip_flags(&["-o", "out", "run"], &flags()), vec!["run"]);
        assert_eq!(strip_flags(&["-v", "run"], &flags()), vec!["run"]);
        assert_eq!(strip_flags(&["-oout", "run"], &flags()), vec!["run"]);
        assert_eq!(strip_flags(&["-o=out", "run"], &flags()), vec!["run"]);
    }

    #[test]
    fn test_inline_values() {
        let positional = strip_flags(&["--output=file.txt", "run", "now"], &flags());
        assert_eq!(positional, vec!["run", "now"]);
    }

    #[test]
    fn test_trailing_value_flag_stops() {
        assert!(strip_flags(&["--output"], &flags()).is_empty());
        assert_eq!(strip_flags(&["run", "--output"], &flags()), vec!["run"]);
    }

    #[test]
    fn test_unknown_flags_take_a_value() {
        let positional = strip_flags(&["--mystery", "value", "run"], &flags());
        assert_eq!(positional, vec!["run"]);
    }

    #[test]
    fn test_empty_tokens_are_ignored() {
        let positional = strip_flags(&["", "run", ""], &flags());
        assert_eq!(positional, vec!["run"]);
    }

    #[test]
    fn test_args_minus_first() {
        let args: Vec<String> = ["a", "b", "a"].iter().map(ToString::to_string).collect();
        assert_eq!(args_minus_first(&args, "a"), vec!["b", "a"]);
        assert_eq!(args_minus_first(&args, "z"), args);
    }
}
