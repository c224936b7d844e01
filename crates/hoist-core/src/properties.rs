use std::collections::BTreeMap;
use std::path::Path;

/// Loads a `.hoist.env` file (shell-style `KEY=value` format).
///
/// `.hoist.env` holds repository credentials and other secrets. Values are
/// available via `${env:VAR}` interpolation in `Hoist.toml` and are
/// consulted before the process environment when resolving credentials.
pub fn load_env_file(path: &Path) -> miette::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    if !path.is_file() {
        return Ok(map);
    }
    let content = std::fs::read_to_string(path).map_err(hoist_util::errors::HoistError::Io)?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        if let Some((key, value)) = trimmed.split_once('=') {
            map.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
    }
    Ok(map)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Interpolate `${env:VAR}` references in a string.
///
/// Looks up values first from the provided `env_overrides` map (populated
/// from `.hoist.env`), then falls back to actual process environment variables.
/// Unknown variables expand to the empty string.
pub fn interpolate(input: &str, env_overrides: &BTreeMap<String, String>) -> String {
    let mut result = input.to_string();
    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find("${env:") {
        let start = search_from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let end = start + end;
        let key = &result[start + 6..end];
        let value = lookup(key, env_overrides).unwrap_or_default();
        result.replace_range(start..=end, &value);
        search_from = start + value.len();
    }
    result
}

/// Interpolate `${env:VAR}` references in every string value of a parsed
/// TOML document. Keys and non-string values are left untouched, and
/// substituted text is never re-read as TOML.
pub fn interpolate_strings(value: &mut toml::Value, env_overrides: &BTreeMap<String, String>) {
    match value {
        toml::Value::String(s) => {
            if s.contains("${env:") {
                *s = interpolate(s, env_overrides);
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                interpolate_strings(item, env_overrides);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                interpolate_strings(item, env_overrides);
            }
        }
        _ => {}
    }
}

/// Look up a variable in `env_overrides`, then in the process environment.
pub fn lookup(key: &str, env_overrides: &BTreeMap<String, String>) -> Option<String> {
    env_overrides
        .get(key)
        .cloned()
        .or_else(|| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_from_overrides() {
        let mut env = BTreeMap::new();
        env.insert("REPO_USER".to_string(), "deployer".to_string());
        assert_eq!(interpolate("user=${env:REPO_USER}", &env), "user=deployer");
    }

    #[test]
    fn unknown_variable_expands_to_empty() {
        let env = BTreeMap::new();
        assert_eq!(
            interpolate("x${env:HOIST_TEST_SURELY_UNSET_VAR}y", &env),
            "xy"
        );
    }

    #[test]
    fn value_containing_reference_is_not_reexpanded() {
        let mut env = BTreeMap::new();
        env.insert("A".to_string(), "${env:A}".to_string());
        assert_eq!(interpolate("${env:A}!", &env), "${env:A}!");
    }

    #[test]
    fn unterminated_reference_is_left_alone() {
        let env = BTreeMap::new();
        assert_eq!(interpolate("${env:OPEN", &env), "${env:OPEN");
    }

    #[test]
    fn strings_are_interpolated_without_toml_escaping() {
        let mut env = BTreeMap::new();
        env.insert("PASS".to_string(), r#"a\tb"q"#.to_string());
        let mut doc: toml::Value = toml::from_str(
            r#"
[repositories.internal]
url = "https://nexus.example.com"
password = "${env:PASS}"
tags = ["${env:PASS}", 3]
"#,
        )
        .unwrap();
        interpolate_strings(&mut doc, &env);

        let repo = &doc["repositories"]["internal"];
        assert_eq!(repo["password"].as_str(), Some(r#"a\tb"q"#));
        assert_eq!(repo["tags"][0].as_str(), Some(r#"a\tb"q"#));
        assert_eq!(repo["tags"][1].as_integer(), Some(3));
        assert_eq!(repo["url"].as_str(), Some("https://nexus.example.com"));
    }

    #[test]
    fn unquote_strips_matching_quotes() {
        assert_eq!(unquote("\"secret\""), "secret");
        assert_eq!(unquote("'secret'"), "secret");
        assert_eq!(unquote("\"mixed'"), "\"mixed'");
    }
}
