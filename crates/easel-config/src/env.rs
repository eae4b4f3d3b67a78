use std::sync::OnceLock;

use regex::Regex;

/// Expand `${VAR}` placeholders in a raw TOML string
///
/// Shell-style defaults are supported via `${VAR:-fallback}`: when the
/// variable is unset the fallback is substituted instead of returning an
/// error. `$$` escapes a literal dollar sign.
///
/// Expansion runs on the raw config text before deserialization, so the
/// config structs use plain String/SecretString. Lines starting with `#`
/// (TOML comments) are passed through unchanged.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn placeholder() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        // Group 1: variable name. Group 2: optional `:-` fallback.
        RE.get_or_init(|| {
            Regex::new(r"\$(\$)|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("must be valid regex")
        })
    }

    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut last_end = 0;
        for captures in placeholder().captures_iter(line) {
            let overall = captures.get(0).expect("regex match has a whole-match group");
            output.push_str(&line[last_end..overall.start()]);
            last_end = overall.end();

            // `$$` escape
            if captures.get(1).is_some() {
                output.push('$');
                continue;
            }

            let var_name = captures.get(2).expect("placeholder match has a name group").as_str();
            match std::env::var(var_name) {
                Ok(value) => output.push_str(&value),
                Err(_) => match captures.get(3) {
                    Some(fallback) => output.push_str(fallback.as_str()),
                    None => return Err(format!("environment variable not found: `{var_name}`")),
                },
            }
        }
        output.push_str(&line[last_end..]);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_placeholders() {
        let input = "key = \"value\"";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn single_var() {
        temp_env::with_var("EASEL_TEST_VAR", Some("hello"), || {
            let result = expand_env("key = \"${EASEL_TEST_VAR}\"").unwrap();
            assert_eq!(result, "key = \"hello\"");
        });
    }

    #[test]
    fn multiple_vars_on_separate_lines() {
        let vars = [("EASEL_FOO", Some("foo")), ("EASEL_BAR", Some("bar"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("a = \"${EASEL_FOO}\"\nb = \"${EASEL_BAR}\"").unwrap();
            assert_eq!(result, "a = \"foo\"\nb = \"bar\"");
        });
    }

    #[test]
    fn missing_var_errors() {
        temp_env::with_var_unset("EASEL_MISSING", || {
            let err = expand_env("key = \"${EASEL_MISSING}\"").unwrap_err();
            assert!(err.contains("EASEL_MISSING"));
        });
    }

    #[test]
    fn fallback_used_when_unset() {
        temp_env::with_var_unset("EASEL_OPTIONAL", || {
            let result = expand_env("key = \"${EASEL_OPTIONAL:-fallback}\"").unwrap();
            assert_eq!(result, "key = \"fallback\"");
        });
    }

    #[test]
    fn fallback_ignored_when_set() {
        temp_env::with_var("EASEL_OPTIONAL", Some("actual"), || {
            let result = expand_env("key = \"${EASEL_OPTIONAL:-fallback}\"").unwrap();
            assert_eq!(result, "key = \"actual\"");
        });
    }

    #[test]
    fn empty_fallback() {
        temp_env::with_var_unset("EASEL_OPTIONAL", || {
            let result = expand_env("key = \"${EASEL_OPTIONAL:-}\"").unwrap();
            assert_eq!(result, "key = \"\"");
        });
    }

    #[test]
    fn dollar_escape() {
        let result = expand_env("key = \"costs $$5\"").unwrap();
        assert_eq!(result, "key = \"costs $5\"");
    }

    #[test]
    fn commented_lines_skip_expansion() {
        temp_env::with_var_unset("EASEL_MISSING", || {
            let input = "# key = \"${EASEL_MISSING}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn indented_comment_skips_expansion() {
        temp_env::with_var_unset("EASEL_MISSING", || {
            let input = "  # key = \"${EASEL_MISSING}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn mixed_comments_and_values() {
        temp_env::with_var("EASEL_REAL", Some("value"), || {
            temp_env::with_var_unset("EASEL_COMMENTED", || {
                let input = "# secret = \"${EASEL_COMMENTED}\"\nkey = \"${EASEL_REAL}\"";
                let result = expand_env(input).unwrap();
                assert_eq!(result, "# secret = \"${EASEL_COMMENTED}\"\nkey = \"value\"");
            });
        });
    }

    #[test]
    fn trailing_newline_preserved() {
        let result = expand_env("key = \"value\"\n").unwrap();
        assert_eq!(result, "key = \"value\"\n");
    }
}
