//! `{{ ... }}` expression pass over templatable settings.
//!
//! Settings may pull values from the environment so secrets stay out of
//! the file. Two expression forms are understood:
//!
//! - `{{ lookup('env', 'NAME') }}` (either quote style)
//! - `{{ env.NAME }}`
//!
//! Text outside the braces is kept as-is, so `"{{ env.ORG }}.github"`
//! works. An unset variable renders as the empty string. Any other
//! expression is an error rather than being passed through literally.

use crate::ConfigError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Whether `value` contains a template expression.
pub fn is_template(value: &str) -> bool {
    value
        .find(OPEN)
        .is_some_and(|start| value[start + OPEN.len()..].contains(CLOSE))
}

/// Render every expression in `value` using `lookup` for variables.
///
/// `field` names the setting in error messages.
pub fn render<F>(field: &str, value: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            return Err(template_error(field, "unterminated '{{'"));
        };

        let expr = after_open[..end].trim();
        let name = variable_name(expr).ok_or_else(|| {
            template_error(field, &format!("unsupported expression '{expr}'"))
        })?;
        if let Some(resolved) = lookup(name) {
            out.push_str(&resolved);
        } else {
            tracing::debug!(field, variable = name, "template variable is unset");
        }

        rest = &after_open[end + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

/// The environment variable an expression refers to.
fn variable_name(expr: &str) -> Option<&str> {
    if let Some(name) = expr.strip_prefix("env.") {
        return is_identifier(name).then_some(name);
    }

    let args = expr
        .strip_prefix("lookup")?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let (kind, name) = args.split_once(',')?;
    if unquote(kind.trim())? != "env" {
        return None;
    }
    let name = unquote(name.trim())?;
    is_identifier(name).then_some(name)
}

fn unquote(s: &str) -> Option<&str> {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn template_error(field: &str, reason: &str) -> ConfigError {
    ConfigError::Template {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn vars(name: &str) -> Option<String> {
        match name {
            "TS_CLIENT_ID" => Some("k123".into()),
            "ORG" => Some("example".into()),
            _ => None,
        }
    }

    #[test]
    fn plain_values_pass_through() {
        assert!(!is_template("example.com"));
        assert_eq!(render("tailnet", "example.com", vars).unwrap(), "example.com");
    }

    #[test]
    fn lookup_env_with_either_quote_style() {
        assert_eq!(
            render("client_id", "{{ lookup('env', 'TS_CLIENT_ID') }}", vars).unwrap(),
            "k123"
        );
        assert_eq!(
            render("client_id", r#"{{lookup("env","TS_CLIENT_ID")}}"#, vars).unwrap(),
            "k123"
        );
    }

    #[test]
    fn env_dot_form_and_surrounding_text() {
        assert!(is_template("{{ env.ORG }}.github"));
        assert_eq!(
            render("tailnet", "{{ env.ORG }}.github", vars).unwrap(),
            "example.github"
        );
    }

    #[test]
    fn unset_variable_renders_empty() {
        assert_eq!(render("tags", "x{{ env.MISSING }}y", vars).unwrap(), "xy");
    }

    #[test]
    fn other_lookups_are_rejected() {
        let err = render("client_secret", "{{ lookup('file', '/etc/passwd') }}", vars).unwrap_err();
        assert!(err.to_string().contains("client_secret"), "got: {err}");
    }

    #[test]
    fn unterminated_expression_is_rejected() {
        assert!(render("tailnet", "{{ env.ORG", vars).is_err());
    }
}
