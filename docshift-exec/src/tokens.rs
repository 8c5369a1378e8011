//! Substitution of `$$` tokens in converter, viewer and editor commands.
//!
//! | Token | Replaced by |
//! |-------|-------------|
//! | `$$i` | input file |
//! | `$$o` | output file |
//! | `$$b` | input file without its extension |
//! | `$$p` | directory containing the input file |
//! | `$$a` | back-channel address of the running process |
//!
//! Paths are shell-quoted. A token whose value is unknown is left as is.

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\$\$([iobpa])").expect("token pattern is valid"))
}

/// Values available for substitution into a command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTokens {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub address: Option<String>,
}

impl CommandTokens {
    /// Create tokens for the given input file.
    pub fn for_input(input: impl AsRef<Path>) -> Self {
        Self {
            input: Some(input.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Set the output file (builder pattern).
    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Set the back-channel address (builder pattern).
    pub fn with_address(mut self, address: Option<String>) -> Self {
        self.address = address;
        self
    }

    /// Input path with its extension removed.
    pub fn base(&self) -> Option<PathBuf> {
        self.input.as_ref().map(|p| p.with_extension(""))
    }

    /// Directory holding the input file.
    pub fn directory(&self) -> Option<PathBuf> {
        self.input
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
    }

    /// Replace every known token in `template`.
    ///
    /// Substitution is a single pass, so values containing `$$` are never
    /// expanded again.
    pub fn substitute(&self, template: &str) -> String {
        token_regex()
            .replace_all(template, |caps: &Captures<'_>| {
                let value = match &caps[1] {
                    "i" => self.input.as_deref().map(quote_path),
                    "o" => self.output.as_deref().map(quote_path),
                    "b" => self.base().as_deref().map(quote_path),
                    "p" => self.directory().as_deref().map(quote_path),
                    "a" => self.address.as_deref().map(quote),
                    _ => None,
                };
                value.unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Substitute `$$b` alone, unquoted. Used for `resultdir`/`resultfile` names,
/// which are file names rather than command arguments.
pub fn substitute_base(template: &str, base: &str) -> String {
    template.replace("$$b", base)
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Quote a single shell word.
///
/// Words made only of characters the shell never interprets pass through.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=+:,@%".contains(c));
    if safe {
        return word.to_string();
    }

    if cfg!(windows) {
        format!("\"{}\"", word.replace('"', "\\\""))
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substitute_all_tokens() {
        let tokens = CommandTokens::for_input("/work/doc.dvi")
            .with_output("/work/doc.ps")
            .with_address(Some("/tmp/docshift.sock".to_string()));

        assert_eq!(
            tokens.substitute("dvips -o $$o $$i"),
            "dvips -o /work/doc.ps /work/doc.dvi"
        );
        assert_eq!(tokens.substitute("cd $$p && make $$b"), "cd /work && make /work/doc");
        assert_eq!(tokens.substitute("viewer --server=$$a"), "viewer --server=/tmp/docshift.sock");
    }

    #[test]
    fn test_substitute_quotes_spaces() {
        let tokens = CommandTokens::for_input("/my docs/it's.tex");
        assert_eq!(
            tokens.substitute("latex $$i"),
            r"latex '/my docs/it'\''s.tex'"
        );
    }

    #[test]
    fn test_unknown_value_leaves_token() {
        let tokens = CommandTokens::for_input("/work/doc.tex");
        assert_eq!(tokens.substitute("conv $$i $$o"), "conv /work/doc.tex $$o");
    }

    #[test]
    fn test_single_pass() {
        let tokens = CommandTokens::for_input("/work/$$o.tex").with_output("/work/out");
        assert_eq!(tokens.substitute("cp $$i $$o"), "cp '/work/$$o.tex' /work/out");
    }

    #[test]
    fn test_substitute_base() {
        assert_eq!(substitute_base("$$b.html.dir", "paper"), "paper.html.dir");
    }

    #[test]
    fn test_quote_empty() {
        assert_eq!(quote(""), "''");
    }
}
