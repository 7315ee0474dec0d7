//! Wraps a rendered body in the widget class.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::options::{AssignsMode, HashStyle};
use crate::ruby::hash_key;

/// Class-level settings of the generated widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAssembler {
    pub class_name: String,
    pub superclass: String,
    pub method_name: String,
    pub assigns: AssignsMode,
    pub hash_style: HashStyle,
}

impl DocumentAssembler {
    /// Produce the complete widget source.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use h2f_renderer::{AssignsMode, DocumentAssembler, HashStyle};
    ///
    /// let assembler = DocumentAssembler {
    ///     class_name: "Views::Home".to_owned(),
    ///     superclass: "Fortitude::Widget::Html5".to_owned(),
    ///     method_name: "content".to_owned(),
    ///     assigns: AssignsMode::NeedsDefaultedToNil,
    ///     hash_style: HashStyle::Legacy,
    /// };
    /// let needs = BTreeSet::from(["user".to_owned()]);
    /// let source = assembler.assemble("text(user)", &needs);
    /// assert_eq!(
    ///     source,
    ///     "class Views::Home < Fortitude::Widget::Html5\n  needs :user => nil\n\n  def content\n    text(user)\n  end\nend\n"
    /// );
    /// ```
    #[must_use]
    pub fn assemble(&self, body: &str, needs: &BTreeSet<String>) -> String {
        let mut out = String::with_capacity(body.len() + 128);
        let _ = writeln!(out, "class {} < {}", self.class_name, self.superclass);

        if self.assigns.declares_needs() && !needs.is_empty() {
            for need in needs {
                let _ = writeln!(out, "  needs {}", self.declaration(need));
            }
            out.push('\n');
        }

        let _ = writeln!(out, "  def {}", self.method_name);
        for line in body.trim_end().lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "    {line}");
            }
        }
        out.push_str("  end\nend\n");
        out
    }

    fn declaration(&self, need: &str) -> String {
        match self.assigns {
            AssignsMode::RequiredNeeds => format!(":{need}"),
            _ => format!("{}nil", hash_key(need, self.hash_style)),
        }
    }
}
