//! Pattern-table lexer.
//!
//! The tokenizer is a pure function of its inputs: source text plus an
//! ordered list of [`TokenDef`]s. It never fails; spans no definition
//! matches become tokens of the caller's "unknown" kind, which the parser
//! rejects with a proper syntax error.
//!
//! # Algorithm
//!
//! Repeatedly find, among all still-viable definitions, the match starting
//! earliest in the remaining text; ties go to the earliest-listed
//! definition. Any skipped prefix is emitted as an unknown token, then the
//! winning match is emitted tagged with the running line/column. A
//! definition that stops matching anywhere in the remaining text is pruned
//! from further consideration.
//!
//! Invariant: the concatenation of all emitted tokens' text reproduces the
//! input exactly, and tokens never overlap.

use regex::Regex;

/// One entry of the tokenizer's definition table.
pub struct TokenDef<K> {
    kind: K,
    regex: Regex,
}

impl<K: Copy> TokenDef<K> {
    /// A definition matching a regular expression.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid; definition tables are static data,
    /// so a bad pattern is a programming error.
    pub fn pattern(kind: K, pattern: &str) -> Self {
        Self {
            kind,
            regex: Regex::new(pattern).expect("invalid token pattern"),
        }
    }

    /// A definition matching literal text, optionally case-insensitive.
    pub fn literal(kind: K, text: &str, case_insensitive: bool) -> Self {
        let escaped = regex::escape(text);
        let pattern = if case_insensitive {
            format!("(?i){}", escaped)
        } else {
            escaped
        };
        Self::pattern(kind, &pattern)
    }

    pub fn kind(&self) -> K {
        self.kind
    }
}

/// A classified, position-tagged span of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    /// The matching definition's kind (or the unknown kind).
    pub kind: K,
    /// The matched text, verbatim.
    pub text: String,
    /// Capture groups of the winning pattern (group 0 excluded).
    pub groups: Vec<Option<String>>,
    /// Source line (1-indexed).
    pub line: usize,
    /// Column offset within the line (0-indexed).
    pub column: usize,
}

/// Splits `source` into a complete, non-overlapping token covering.
pub fn tokenize<K: Copy>(source: &str, defs: &[TokenDef<K>], unknown: K) -> Vec<Token<K>> {
    let mut tokens = Vec::new();
    let mut position = 0;
    let mut line = 1;
    let mut column = 0;

    // Cached earliest match (start, end) per definition; `None` once pruned.
    let mut next_match: Vec<Option<(usize, usize)>> = defs
        .iter()
        .map(|def| def.regex.find(source).map(|m| (m.start(), m.end())))
        .collect();

    while position < source.len() {
        // Refresh any cached match the cursor has passed; prune definitions
        // with no further match.
        for (def, cached) in defs.iter().zip(next_match.iter_mut()) {
            if let Some((start, _)) = *cached {
                if start < position {
                    *cached = def
                        .regex
                        .find_at(source, position)
                        .map(|m| (m.start(), m.end()));
                }
            }
        }

        // Earliest match wins; ties go to the earliest-listed definition.
        let winner = next_match
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.map(|(start, end)| (i, start, end)))
            .filter(|(_, start, end)| end > start)
            .min_by_key(|(i, start, _)| (*start, *i));

        let Some((index, start, end)) = winner else {
            emit(&mut tokens, unknown, &source[position..], &mut line, &mut column);
            position = source.len();
            break;
        };

        if start > position {
            emit(
                &mut tokens,
                unknown,
                &source[position..start],
                &mut line,
                &mut column,
            );
        }

        let def = &defs[index];
        let groups = def
            .regex
            .captures_at(source, start)
            .map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let token_index = tokens.len();
        emit(&mut tokens, def.kind, &source[start..end], &mut line, &mut column);
        tokens[token_index].groups = groups;

        position = end;
    }

    debug_assert_eq!(
        tokens.iter().map(|t| t.text.len()).sum::<usize>(),
        source.len()
    );
    tokens
}

fn emit<K: Copy>(
    tokens: &mut Vec<Token<K>>,
    kind: K,
    text: &str,
    line: &mut usize,
    column: &mut usize,
) {
    tokens.push(Token {
        kind,
        text: text.to_string(),
        groups: Vec::new(),
        line: *line,
        column: *column,
    });
    for ch in text.chars() {
        if ch == '\n' {
            *line += 1;
            *column = 0;
        } else {
            *column += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Word,
        Number,
        Space,
        Keyword,
        Unknown,
    }

    fn defs() -> Vec<TokenDef<Kind>> {
        vec![
            TokenDef::literal(Kind::Keyword, "let", false),
            TokenDef::pattern(Kind::Word, "[a-z]+"),
            TokenDef::pattern(Kind::Number, "[0-9]+"),
            TokenDef::pattern(Kind::Space, "[ \n]+"),
        ]
    }

    #[test]
    fn test_covers_input_exactly() {
        let source = "let x??? 42";
        let tokens = tokenize(source, &defs(), Kind::Unknown);
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_tie_prefers_earliest_listed() {
        // "let" matches both Keyword and Word at position 0.
        let tokens = tokenize("let", &defs(), Kind::Unknown);
        assert_eq!(tokens[0].kind, Kind::Keyword);
    }

    #[test]
    fn test_unmatched_spans_become_unknown() {
        let tokens = tokenize("abc???def", &defs(), Kind::Unknown);
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Word, Kind::Unknown, Kind::Word]);
        assert_eq!(tokens[1].text, "???");
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = tokenize("ab\ncd ef", &defs(), Kind::Unknown);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
        // "cd" starts line 2, column 0
        assert_eq!((tokens[2].line, tokens[2].column), (2, 0));
        // "ef" after one space
        assert_eq!((tokens[4].line, tokens[4].column), (2, 3));
    }

    #[test]
    fn test_capture_groups() {
        let defs = vec![TokenDef::pattern(Kind::Number, "([0-9]+)x([0-9]+)")];
        let tokens = tokenize("3x4", &defs, Kind::Unknown);
        assert_eq!(
            tokens[0].groups,
            vec![Some("3".to_string()), Some("4".to_string())]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", &defs(), Kind::Unknown).is_empty());
    }
}
