//! Assign ("needs") extraction from directive code.
//!
//! ERB templates read their inputs through instance variables. Every
//! `@name` reference becomes a widget need; unless the widget keeps
//! instance-variable assigns, the reference is rewritten to the bare
//! method-call form `name`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Instance variable reference; the first group is the preceding character.
///
/// Class variables (`@@x`) and addresses inside words (`a@b`) do not match.
static IVAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w@])@([A-Za-z_][A-Za-z0-9_]*)").expect("invalid instance variable regex")
});

/// Record every `@name` in `code` into `needs`.
///
/// Returns the code with references rewritten to `name` when `rewrite` is
/// set, unchanged otherwise. The interpolation shorthand `#@name` becomes
/// `#{name}` so it stays interpolation.
///
/// ```
/// use std::collections::BTreeSet;
/// use h2f_renderer::extract_needs;
///
/// let mut needs = BTreeSet::new();
/// assert_eq!(extract_needs("@b + @a + @b", &mut needs, true), "b + a + b");
/// assert_eq!(needs.into_iter().collect::<Vec<_>>(), ["a", "b"]);
/// ```
pub fn extract_needs(code: &str, needs: &mut BTreeSet<String>, rewrite: bool) -> String {
    if !code.contains('@') {
        return code.to_owned();
    }
    IVAR_PATTERN
        .replace_all(code, |caps: &Captures| {
            let name = caps[2].trim().to_lowercase();
            let rewritten = match (rewrite, &caps[1]) {
                (false, _) => caps[0].to_owned(),
                (true, "#") => format!("#{{{name}}}"),
                (true, prefix) => format!("{prefix}{name}"),
            };
            needs.insert(name);
            rewritten
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str, rewrite: bool) -> (String, Vec<String>) {
        let mut needs = BTreeSet::new();
        let out = extract_needs(code, &mut needs, rewrite);
        (out, needs.into_iter().collect())
    }

    #[test]
    fn test_every_occurrence_rewritten() {
        let (out, needs) = run("@foo + @bar, @foo", true);
        assert_eq!(out, "foo + bar, foo");
        assert_eq!(needs, ["bar", "foo"]);
    }

    #[test]
    fn test_keep_instance_variables() {
        let (out, needs) = run("@foo + @bar", false);
        assert_eq!(out, "@foo + @bar");
        assert_eq!(needs, ["bar", "foo"]);
    }

    #[test]
    fn test_order_independent() {
        assert_eq!(run("@a + @b", true).1, run("@b + @a", true).1);
    }

    #[test]
    fn test_no_matches_is_identity() {
        assert_eq!(run("link_to 'x', root_path", true), ("link_to 'x', root_path".to_owned(), vec![]));
    }

    #[test]
    fn test_class_variables_and_emails_ignored() {
        let (out, needs) = run("@@count; mail_to \"a@b.com\"", true);
        assert_eq!(out, "@@count; mail_to \"a@b.com\"");
        assert!(needs.is_empty());
    }

    #[test]
    fn test_interpolation_shorthand_kept_live() {
        let (out, needs) = run("\"#@foo and #{@bar}\"", true);
        assert_eq!(out, "\"#{foo} and #{bar}\"");
        assert_eq!(needs, ["bar", "foo"]);
        assert_eq!(run("\"#@foo\"", false).0, "\"#@foo\"");
    }

    #[test]
    fn test_case_normalized() {
        let (out, needs) = run("(@User)", true);
        assert_eq!(out, "(user)");
        assert_eq!(needs, ["user"]);
    }
}
