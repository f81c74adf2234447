//! Depth-aware scanning of DDL text
//!
//! The lexer turns raw text into tokens, dropping whitespace and comments
//! (`--` and `/* */`) while keeping string literals and quoted
//! identifiers whole. Statement and entry splitting then work on tokens
//! with an explicit parenthesis depth counter, so `DECIMAL(10,2)` or
//! `CHECK (a IN (1, 2))` never split an entry.

use std::ops::Range;

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: keyword or unquoted identifier, original spelling
    Word(String),
    /// `"x"`, `` `x` `` or `[x]`, quotes removed
    QuotedIdent(String),
    /// `'text'`; `terminated` is false when input ended inside the literal
    Str { value: String, terminated: bool },
    /// Numeric literal
    Number(String),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// Any other single character (operators, casts, ...)
    Other(char),
    /// `/*` with no closing `*/`; spans the rest of the input
    UnterminatedComment,
}

/// A token with its byte span in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// Case-insensitive keyword match on bare words
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Identifier value, unquoted words folded to lower case
    pub fn ident(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Word(w) => Some(w.to_lowercase()),
            TokenKind::QuotedIdent(q) => Some(q.clone()),
            _ => None,
        }
    }

    pub fn is_ident(&self) -> bool {
        matches!(self.kind, TokenKind::Word(_) | TokenKind::QuotedIdent(_))
    }

    pub fn is(&self, kind: &TokenKind) -> bool {
        &self.kind == kind
    }
}

/// Character-level lexer state
struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |(i, _)| *i)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    /// Skip a block comment. Returns false when input ends inside it.
    fn skip_block_comment(&mut self) -> bool {
        // positioned on '/', '*' follows
        self.advance();
        self.advance();
        while let Some(c) = self.current() {
            self.advance();
            if c == '*' && self.current() == Some('/') {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Read up to `close`, where a doubled `close` is an escaped one.
    /// Returns the content and whether the closing char was found.
    fn read_delimited(&mut self, close: char) -> (String, bool) {
        self.advance(); // opening quote
        let mut value = String::new();
        while let Some(c) = self.current() {
            self.advance();
            if c == close {
                if self.current() == Some(close) {
                    value.push(c);
                    self.advance();
                } else {
                    return (value, true);
                }
            } else {
                value.push(c);
            }
        }
        (value, false)
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let c = self.current()?;
            let start = self.offset();

            let kind = match c {
                c if c.is_whitespace() => {
                    self.advance();
                    continue;
                }
                '-' if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.peek() == Some('*') => {
                    if self.skip_block_comment() {
                        continue;
                    }
                    TokenKind::UnterminatedComment
                }
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }
                '.' if !self.peek().is_some_and(|n| n.is_ascii_digit()) => {
                    self.advance();
                    TokenKind::Dot
                }
                '\'' => {
                    let (value, terminated) = self.read_delimited('\'');
                    TokenKind::Str { value, terminated }
                }
                '"' => TokenKind::QuotedIdent(self.read_delimited('"').0),
                '`' => TokenKind::QuotedIdent(self.read_delimited('`').0),
                '[' => TokenKind::QuotedIdent(self.read_delimited(']').0),
                c if c.is_ascii_digit() || c == '.' => {
                    TokenKind::Number(self.read_while(|c| c.is_ascii_digit() || c == '.'))
                }
                c if c.is_alphabetic() || c == '_' => {
                    TokenKind::Word(self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '$'))
                }
                other => {
                    self.advance();
                    TokenKind::Other(other)
                }
            };

            return Some(Token {
                kind,
                span: start..self.offset(),
            });
        }
    }
}

/// Tokenize DDL text, skipping whitespace and comments
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// One statement, normally `;`-terminated
#[derive(Debug, Clone, Copy)]
pub struct RawStatement<'t> {
    /// Tokens, terminator excluded
    pub tokens: &'t [Token],
    /// Parentheses never went negative and ended at depth 0
    pub balanced: bool,
    /// Every string literal was closed
    pub literals_closed: bool,
    /// False when the statement was cut at a following `CREATE` because
    /// its `;` is missing
    pub terminated: bool,
}

impl RawStatement<'_> {
    /// Whether a `/*` inside the statement runs to the end of the input
    pub fn has_unterminated_comment(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|t| t.is(&TokenKind::UnterminatedComment))
    }
}

/// Split a token stream into statements on `;`
///
/// String literals are single tokens, so a `;` inside quotes never ends a
/// statement. A statement missing its `)` still ends at the next `;`, which
/// keeps one broken statement from swallowing the rest of the script. A
/// `CREATE` at depth 0 in the middle of a statement also starts a new one,
/// with the cut statement marked as not terminated.
pub fn split_statements(tokens: &[Token]) -> Vec<RawStatement<'_>> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut depth: i64 = 0;
    let mut balanced = true;
    let mut literals_closed = true;

    for (i, token) in tokens.iter().enumerate() {
        if i > start && depth == 0 && token.is_keyword("CREATE") {
            statements.push(RawStatement {
                tokens: &tokens[start..i],
                balanced,
                literals_closed,
                terminated: false,
            });
            start = i;
            balanced = true;
            literals_closed = true;
        }

        match &token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth < 0 {
                    balanced = false;
                }
            }
            TokenKind::Str { terminated: false, .. } => literals_closed = false,
            TokenKind::Semicolon => {
                if i > start {
                    statements.push(RawStatement {
                        tokens: &tokens[start..i],
                        balanced: balanced && depth == 0,
                        literals_closed,
                        terminated: true,
                    });
                }
                start = i + 1;
                depth = 0;
                balanced = true;
                literals_closed = true;
            }
            _ => {}
        }
    }

    if start < tokens.len() {
        statements.push(RawStatement {
            tokens: &tokens[start..],
            balanced: balanced && depth == 0,
            literals_closed,
            terminated: true,
        });
    }

    statements
}

/// Index of the `)` matching the `(` at `open`
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    if !tokens.get(open)?.is(&TokenKind::LParen) {
        return None;
    }
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas at parenthesis depth 0. Empty entries are dropped.
pub fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                if i > start {
                    entries.push(&tokens[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        entries.push(&tokens[start..]);
    }
    entries
}

/// Source text covered by a token slice, verbatim
pub fn source_text<'s>(src: &'s str, tokens: &[Token]) -> &'s str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &src[first.span.start..last.span.end],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn comments_are_skipped() {
        let src = "-- header\nCREATE /* inline */ TABLE t -- trailing\n(id INT);";
        let words: Vec<String> = tokenize(src)
            .into_iter()
            .filter_map(|t| match t.kind {
                TokenKind::Word(w) => Some(w),
                _ => None,
            })
            .collect();
        assert_eq!(words, vec!["CREATE", "TABLE", "t", "id", "INT"]);
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let tokens = kinds("DEFAULT '-- not a comment; really'");
        assert_eq!(
            tokens[1],
            TokenKind::Str {
                value: "-- not a comment; really".to_string(),
                terminated: true
            }
        );
    }

    #[test]
    fn quoted_identifiers() {
        let tokens = tokenize(r#""Order Items" `col` [x] 'it''s'"#);
        assert_eq!(tokens[0].ident(), Some("Order Items".to_string()));
        assert_eq!(tokens[1].ident(), Some("col".to_string()));
        assert_eq!(tokens[2].ident(), Some("x".to_string()));
        assert_eq!(
            tokens[3].kind,
            TokenKind::Str { value: "it's".to_string(), terminated: true }
        );
    }

    #[test]
    fn unquoted_identifiers_fold_case() {
        let tokens = tokenize("Users");
        assert_eq!(tokens[0].ident(), Some("users".to_string()));
        assert!(tokens[0].is_keyword("USERS"));
    }

    #[test]
    fn statements_split_on_semicolon() {
        let tokens = tokenize("CREATE TABLE a (id INT); ; CREATE TABLE b (id INT)");
        let statements = split_statements(&tokens);
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.balanced));
    }

    #[test]
    fn unbalanced_statement_is_flagged() {
        let tokens = tokenize("CREATE TABLE a (id INT; CREATE TABLE b (id INT));");
        let statements = split_statements(&tokens);
        assert_eq!(statements.len(), 2);
        assert!(!statements[0].balanced);
        assert!(!statements[1].balanced);
    }

    #[test]
    fn unterminated_literal_is_flagged() {
        let tokens = tokenize("CREATE TABLE a (name TEXT DEFAULT 'oops);");
        let statements = split_statements(&tokens);
        assert_eq!(statements.len(), 1);
        assert!(!statements[0].literals_closed);
    }

    #[test]
    fn create_without_semicolon_starts_new_statement() {
        let tokens = tokenize("CREATE TABLE a (id INT)\nCREATE TABLE b (id INT);");
        let statements = split_statements(&tokens);
        assert_eq!(statements.len(), 2);
        assert!(!statements[0].terminated);
        assert!(statements[0].balanced);
        assert!(statements[1].terminated);
        assert!(statements[1].tokens[0].is_keyword("CREATE"));
    }

    #[test]
    fn unclosed_block_comment_becomes_a_token() {
        let tokens = tokenize("CREATE TABLE a (id INT); /* never closed\nCREATE TABLE b (id INT);");
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::UnterminatedComment));

        let statements = split_statements(&tokens);
        assert_eq!(statements.len(), 2);
        assert!(!statements[0].has_unterminated_comment());
        assert!(statements[1].has_unterminated_comment());
    }

    #[test]
    fn hash_is_an_operator() {
        let tokens = kinds("CHECK (x # 1 = 0)");
        assert_eq!(tokens.len(), 8);
        assert_eq!(tokens[3], TokenKind::Other('#'));
    }

    #[test]
    fn top_level_split_respects_nesting() {
        let src = "price DECIMAL(10,2), CHECK (price >= 0 AND kind IN ('a', 'b')), id INT,";
        let tokens = tokenize(src);
        let entries = split_top_level(&tokens);
        assert_eq!(entries.len(), 3);
        assert_eq!(source_text(src, entries[0]), "price DECIMAL(10,2)");
        assert_eq!(source_text(src, entries[1]), "CHECK (price >= 0 AND kind IN ('a', 'b'))");
        assert_eq!(source_text(src, entries[2]), "id INT");
    }

    #[test]
    fn matching_paren_skips_nested_groups() {
        let tokens = tokenize("(a DECIMAL(10, 2), b INT) tail");
        assert_eq!(matching_paren(&tokens, 0), Some(tokens.len() - 2));
        assert_eq!(matching_paren(&tokens, 1), None);
    }
}
