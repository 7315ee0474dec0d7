//! Widget class names and output paths derived from input paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CliError;
use crate::scanner::{Input, STDIN_ARG};

/// Rails application root inferred from a view path.
static APP_VIEWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*app)/views/").expect("invalid app views regex"));

static ACRONYM_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("invalid acronym boundary regex")
});

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("invalid word boundary regex"));

/// Where generated source is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str(STDIN_ARG),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// How the `-o` option is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputOption<'a> {
    /// No `-o`: write next to the input.
    Beside,
    /// Write `<dir>/<underscored class>.rb`.
    Directory(&'a Path),
    /// Write exactly this file.
    File(&'a Path),
}

/// Output target for one input.
///
/// Without `-o`, `name.html.erb` and `name.rhtml` become `name.rb` and any
/// other name gets `.rb` appended. Standard input goes to standard output.
pub(crate) fn output_target(input: &Input, option: OutputOption<'_>, class_name: &str) -> OutputTarget {
    match (option, input) {
        (OutputOption::Directory(dir), _) => {
            OutputTarget::File(dir.join(format!("{}.rb", underscore(class_name))))
        }
        (OutputOption::File(path), _) => OutputTarget::File(path.to_path_buf()),
        (OutputOption::Beside, Input::Stdin) => OutputTarget::Stdout,
        (OutputOption::Beside, Input::File(path)) => OutputTarget::File(beside(path)),
    }
}

fn beside(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let lower = name.to_ascii_lowercase();
    let stem = [".html.erb", ".rhtml"]
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map_or(name.as_str(), |suffix| &name[..name.len() - suffix.len()]);
    path.with_file_name(format!("{stem}.rb"))
}

/// Widget class name for one input.
///
/// An explicit name wins. Otherwise the path relative to `class_base` is
/// camelized; without a base, the `app` directory of an `app/views` path
/// is used.
pub(crate) fn class_name(
    input: &Input,
    explicit: Option<&str>,
    class_base: Option<&Path>,
) -> Result<String, CliError> {
    if let Some(name) = explicit {
        return Ok(name.to_owned());
    }

    let Input::File(path) = input else {
        return Err(CliError::Validation(
            "When converting standard input, you must specify a name for the output class\n\
             using the -c command-line option. (Otherwise, we have no way of knowing what to name this widget!)"
                .to_owned(),
        ));
    };
    let path = std::path::absolute(path)?;

    let base = match class_base {
        Some(base) => std::path::absolute(base)?,
        None => infer_class_base(&path).ok_or_else(|| {
            CliError::Validation(format!(
                "We can't figure out what the name of the widget class for this file should be:\n  {}\n\
                 You must either specify an explicit name for the class, using the -c command-line option, or\n\
                 specify a base directory to infer the class name from, using the -b command-line option\n\
                 (e.g., \"-b my_rails_app/app\").",
                path.display()
            ))
        })?,
    };

    let relative = path.strip_prefix(&base).map_err(|_| {
        CliError::Validation(format!(
            "You specified a class base using the -b command-line option:\n  {}\n\
             but the file you asked to parse is not underneath that directory:\n  {}",
            base.display(),
            path.display()
        ))
    })?;

    let segments: Vec<String> = relative
        .iter()
        .map(|segment| segment.to_string_lossy().into_owned())
        .collect();
    let Some((last, dirs)) = segments.split_last() else {
        return Err(CliError::Validation(format!(
            "Cannot derive a class name from {}",
            path.display()
        )));
    };
    let file_stem = last.split('.').next().unwrap_or_default();

    let name = dirs
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(file_stem))
        .map(camelize)
        .collect::<Vec<_>>()
        .join("::");
    tracing::debug!(path = %path.display(), class = %name, "Derived class name");
    Ok(name)
}

fn infer_class_base(path: &Path) -> Option<PathBuf> {
    let text = path.to_string_lossy();
    APP_VIEWS
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| PathBuf::from(m.as_str()))
}

/// `users_admin` becomes `UsersAdmin`.
fn camelize(segment: &str) -> String {
    segment
        .split(['_', '-'])
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// `Views::UserProfiles::HTMLShow` becomes `views/user_profiles/html_show`.
fn underscore(class_name: &str) -> String {
    let path = class_name.replace("::", "/");
    let path = ACRONYM_BOUNDARY.replace_all(&path, "${1}_${2}");
    let path = WORD_BOUNDARY.replace_all(&path, "${1}_${2}");
    path.replace('-', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(path: &str) -> Input {
        Input::File(PathBuf::from(path))
    }

    #[test]
    fn test_output_beside_input() {
        assert_eq!(
            output_target(&file("/x/one.html.erb"), OutputOption::Beside, "One"),
            OutputTarget::File(PathBuf::from("/x/one.rb"))
        );
        assert_eq!(
            output_target(&file("/x/two.RHTML"), OutputOption::Beside, "Two"),
            OutputTarget::File(PathBuf::from("/x/two.rb"))
        );
        assert_eq!(
            output_target(&file("/x/three.html"), OutputOption::Beside, "Three"),
            OutputTarget::File(PathBuf::from("/x/three.html.rb"))
        );
        assert_eq!(
            output_target(&Input::Stdin, OutputOption::Beside, "One"),
            OutputTarget::Stdout
        );
    }

    #[test]
    fn test_output_directory_and_file() {
        let dir = Path::new("/out");
        assert_eq!(
            output_target(&file("/x/one.html.erb"), OutputOption::Directory(dir), "Views::Foo::One"),
            OutputTarget::File(PathBuf::from("/out/views/foo/one.rb"))
        );
        assert_eq!(
            output_target(&Input::Stdin, OutputOption::File(Path::new("foo.bar.xxx")), "One"),
            OutputTarget::File(PathBuf::from("foo.bar.xxx"))
        );
    }

    #[test]
    fn test_explicit_class_name() {
        assert_eq!(class_name(&Input::Stdin, Some("MyWidget"), None).unwrap(), "MyWidget");
    }

    #[test]
    fn test_stdin_requires_class_name() {
        let err = class_name(&Input::Stdin, None, None).unwrap_err();
        assert!(err.to_string().contains("-c command-line option"));
    }

    #[test]
    fn test_inferred_from_app_views() {
        let name = class_name(&file("/project/app/views/foo/one.html.erb"), None, None).unwrap();
        assert_eq!(name, "Views::Foo::One");
    }

    #[test]
    fn test_explicit_class_base() {
        let name = class_name(
            &file("/src/widgets/user_profiles/show_card.html.erb"),
            None,
            Some(Path::new("/src")),
        )
        .unwrap();
        assert_eq!(name, "Widgets::UserProfiles::ShowCard");
    }

    #[test]
    fn test_uninferable_class_base() {
        let err = class_name(&file("/tmp/one.html.erb"), None, None).unwrap_err();
        assert!(err.to_string().contains("-b my_rails_app/app"));
    }

    #[test]
    fn test_file_outside_class_base() {
        let err = class_name(&file("/tmp/one.html.erb"), None, Some(Path::new("/src/app"))).unwrap_err();
        assert!(err.to_string().contains("not underneath that directory"));
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("Views::Foo::One"), "views/foo/one");
        assert_eq!(underscore("Views::UserProfiles::HTMLShow"), "views/user_profiles/html_show");
        assert_eq!(underscore("MyWidget"), "my_widget");
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("user_profiles"), "UserProfiles");
        assert_eq!(camelize("show-card"), "ShowCard");
        assert_eq!(camelize("one"), "One");
    }
}
