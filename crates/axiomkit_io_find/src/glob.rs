//! Shell-style glob compiler (`*` and `?` only).
//!
//! Every character other than the two wildcards is a literal, so compiling
//! never fails. `*` crosses `/` freely; there are no segment semantics.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeGlobToken {
    /// Maximal run of non-wildcard characters, matched exactly.
    Literal(String),
    /// `*`: zero or more characters.
    AnySeq,
    /// `?`: exactly one character.
    AnyChar,
}

/// Compiled glob matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPredicate {
    pattern: String,
    anchored: bool,
    tokens: Vec<TypeGlobToken>,
}

impl GlobPredicate {
    /// Compile `pattern`.
    ///
    /// When `anchored` is true the pattern has to span the whole subject,
    /// otherwise a match of any contiguous substring is enough.
    pub fn compile(pattern: &str, anchored: bool) -> Self {
        let mut tokens = Vec::new();
        if !anchored {
            tokens.push(TypeGlobToken::AnySeq);
        }

        let mut c_literal = String::new();
        for ch in pattern.chars() {
            let token_wild = match ch {
                '*' => TypeGlobToken::AnySeq,
                '?' => TypeGlobToken::AnyChar,
                _ => {
                    c_literal.push(ch);
                    continue;
                }
            };
            if !c_literal.is_empty() {
                tokens.push(TypeGlobToken::Literal(std::mem::take(&mut c_literal)));
            }
            // `**` behaves exactly like `*`
            if token_wild == TypeGlobToken::AnySeq && tokens.last() == Some(&TypeGlobToken::AnySeq)
            {
                continue;
            }
            tokens.push(token_wild);
        }
        if !c_literal.is_empty() {
            tokens.push(TypeGlobToken::Literal(c_literal));
        }
        if !anchored && tokens.last() != Some(&TypeGlobToken::AnySeq) {
            tokens.push(TypeGlobToken::AnySeq);
        }

        Self {
            pattern: pattern.to_string(),
            anchored,
            tokens,
        }
    }

    /// Source glob text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_match(&self, subject: &str) -> bool {
        _match_tokens(&self.tokens, subject)
    }
}

impl fmt::Display for GlobPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.anchored {
            write!(f, "{}", self.pattern)
        } else {
            write!(f, "*{}*", self.pattern)
        }
    }
}

/// Greedy matcher that only ever backtracks to the most recent `*`.
///
/// Cursors are byte offsets into `subject` and always sit on a char
/// boundary.
fn _match_tokens(tokens: &[TypeGlobToken], subject: &str) -> bool {
    let mut n_token = 0;
    let mut n_byte = 0;
    let mut backtrack: Option<(usize, usize)> = None;

    loop {
        let rest = &subject[n_byte..];
        if n_token < tokens.len() {
            match &tokens[n_token] {
                TypeGlobToken::AnySeq => {
                    backtrack = Some((n_token + 1, n_byte));
                    n_token += 1;
                    continue;
                }
                TypeGlobToken::AnyChar => {
                    if let Some(ch) = rest.chars().next() {
                        n_token += 1;
                        n_byte += ch.len_utf8();
                        continue;
                    }
                }
                TypeGlobToken::Literal(c_literal) => {
                    if rest.starts_with(c_literal.as_str()) {
                        n_token += 1;
                        n_byte += c_literal.len();
                        continue;
                    }
                }
            }
        } else if rest.is_empty() {
            return true;
        }

        // retry with the last `*` swallowing one more char
        let Some((n_token_next, n_byte_star)) = backtrack else {
            return false;
        };
        let Some(ch_star) = subject[n_byte_star..].chars().next() else {
            return false;
        };
        let n_byte_resume = n_byte_star + ch_star.len_utf8();
        backtrack = Some((n_token_next, n_byte_resume));
        n_token = n_token_next;
        n_byte = n_byte_resume;
    }
}

#[cfg(test)]
mod tests {
    use super::GlobPredicate;

    #[test]
    fn anchored_literal_matches_itself_only() {
        let glob = GlobPredicate::compile("README.md", true);
        assert!(glob.is_match("README.md"));
        assert!(!glob.is_match("README.mdx"));
        assert!(!glob.is_match("a/README.md"));
    }

    #[test]
    fn star_matches_empty_and_separators() {
        let glob = GlobPredicate::compile("a*b", true);
        assert!(glob.is_match("ab"));
        assert!(glob.is_match("axxb"));
        assert!(glob.is_match("a/x/y/b"));
        assert!(!glob.is_match("a/x/y/bc"));
    }

    #[test]
    fn question_mark_is_exactly_one_char() {
        let glob = GlobPredicate::compile("?.x", true);
        assert!(glob.is_match("a.x"));
        assert!(glob.is_match("/.x"));
        assert!(!glob.is_match(".x"));
        assert!(!glob.is_match("ab.x"));

        let glob_yaml = GlobPredicate::compile("*.y?ml", true);
        assert!(glob_yaml.is_match("conf.yaml"));
        assert!(!glob_yaml.is_match("conf.yml"));

        let glob_four = GlobPredicate::compile("*.????", true);
        assert!(glob_four.is_match("index.html"));
        assert!(!glob_four.is_match("index.htm"));
    }

    #[test]
    fn regex_metacharacters_are_literals() {
        let glob = GlobPredicate::compile("a+[b](c).txt", true);
        assert!(glob.is_match("a+[b](c).txt"));
        assert!(!glob.is_match("aa[b](c).txt"));
        assert!(!GlobPredicate::compile("*.txt", true).is_match("atxt"));
    }

    #[test]
    fn unanchored_matches_substring() {
        let glob = GlobPredicate::compile("ir-a/subdir-b", false);
        assert!(glob.is_match("dir-a/subdir-b"));
        assert!(glob.is_match("dir-a/subdir-b/README"));
        assert!(!glob.is_match("dir-a/subdir-a"));
        assert!(!GlobPredicate::compile("ir-a/subdir-b", true).is_match("dir-a/subdir-b"));
    }

    #[test]
    fn empty_pattern() {
        let glob_anchored = GlobPredicate::compile("", true);
        assert!(glob_anchored.is_match(""));
        assert!(!glob_anchored.is_match("a"));

        let glob_free = GlobPredicate::compile("", false);
        assert!(glob_free.is_match(""));
        assert!(glob_free.is_match("anything/at/all"));
    }

    #[test]
    fn backtracking_over_repeated_literals() {
        let glob = GlobPredicate::compile("*ab*abc", true);
        assert!(glob.is_match("xxabyyababc"));
        assert!(!glob.is_match("xxabyyabab"));
        assert!(GlobPredicate::compile("**", true).is_match(""));
    }

    #[test]
    fn multibyte_subjects_advance_by_char() {
        let glob = GlobPredicate::compile("??.md", true);
        assert!(glob.is_match("数据.md"));
        assert!(!glob.is_match("数.md"));
        assert!(GlobPredicate::compile("*é*", false).is_match("café/notes"));
        assert!(GlobPredicate::compile("*据", true).is_match("数据数据"));
    }

    #[test]
    fn compile_is_deterministic() {
        let glob_a = GlobPredicate::compile("src/*.r?", false);
        let glob_b = GlobPredicate::compile("src/*.r?", false);
        assert_eq!(glob_a, glob_b);
        assert_eq!(glob_a.to_string(), "*src/*.r?*");
        assert!(glob_a.is_match("crates/src/lib.rs"));
    }
}
