//! Minimal Ruby tokenizer for directive code.
//!
//! Only distinguishes what block classification needs: keywords, literal
//! boundaries, brackets and whether a token ends a value. String, regex,
//! symbol and percent literals are skipped as single tokens so keywords
//! inside them are never seen.

/// Reserved words that matter for block structure or value position.
const KEYWORDS: &[&str] = &[
    "BEGIN", "END", "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do",
    "else", "elsif", "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not",
    "or", "redo", "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless",
    "until", "when", "while", "yield", "__FILE__", "__LINE__", "__ENCODING__",
];

/// Keywords after which an expression is complete.
const VALUE_KEYWORDS: &[&str] = &[
    "end", "self", "nil", "true", "false", "return", "break", "next", "redo", "retry", "super",
    "yield", "__FILE__", "__LINE__", "__ENCODING__",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    /// Local variable or method name.
    Identifier,
    /// Capitalized name.
    Constant,
    /// Reserved word.
    Keyword(&'static str),
    /// `@ivar`, `@@cvar` or `$global`.
    Variable,
    /// Any string or character literal.
    Str,
    Symbol,
    Number,
    Regex,
    /// `%w`, `%i` and other non-string percent literals.
    Literal,
    /// `name:` hash key.
    Label,
    Open,
    Close,
    /// `.`, `&.` or `::`.
    Dot,
    Operator,
    /// Line break or `;`.
    Terminator,
}

impl Token {
    /// Whether an expression can end with this token.
    pub(crate) fn ends_value(self) -> bool {
        match self {
            Self::Identifier
            | Self::Constant
            | Self::Variable
            | Self::Str
            | Self::Symbol
            | Self::Number
            | Self::Regex
            | Self::Literal
            | Self::Close => true,
            Self::Keyword(word) => VALUE_KEYWORDS.contains(&word),
            Self::Label | Self::Open | Self::Dot | Self::Operator | Self::Terminator => false,
        }
    }
}

/// Tokenize Ruby code.
///
/// Returns `None` when a literal is unterminated or brackets do not balance.
pub(crate) fn tokenize(code: &str) -> Option<Vec<Token>> {
    Lexer::new(code).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    brackets: Vec<char>,
}

impl Lexer {
    fn new(code: &str) -> Self {
        Self {
            chars: code.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            brackets: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn previous(&self) -> Option<Token> {
        self.tokens.last().copied()
    }

    /// Whether the next token starts a new operand rather than continuing one.
    fn at_operand(&self) -> bool {
        self.previous().is_none_or(|token| !token.ends_value())
    }

    /// `foo %w[a]` and `foo /x/`: a command argument after an identifier.
    fn at_command_argument(&self) -> bool {
        matches!(self.previous(), Some(Token::Identifier))
            && self.pos > 0
            && self.chars[self.pos - 1].is_whitespace()
            && self.peek(1).is_some_and(|c| !c.is_whitespace() && c != '=')
    }

    fn run(mut self) -> Option<Vec<Token>> {
        while let Some(c) = self.peek(0) {
            match c {
                '\\' if self.peek(1) == Some('\n') => self.pos += 2,
                ' ' | '\t' | '\r' => self.pos += 1,
                '\n' | ';' => {
                    self.pos += 1;
                    self.tokens.push(Token::Terminator);
                }
                '#' => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '"' | '`' => {
                    self.pos = skip_quoted(&self.chars, self.pos + 1, c, c, true)?;
                    self.tokens.push(Token::Str);
                }
                '\'' => {
                    self.pos = skip_quoted(&self.chars, self.pos + 1, c, c, false)?;
                    self.tokens.push(Token::Str);
                }
                '@' | '$' => self.variable(),
                ':' => self.colon()?,
                '%' if self.at_operand() || self.at_command_argument() => self.percent_literal()?,
                '/' if self.at_operand() || self.at_command_argument() => {
                    self.pos = skip_quoted(&self.chars, self.pos + 1, '/', '/', true)?;
                    while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    self.tokens.push(Token::Regex);
                }
                '?' if self.at_operand() && self.is_char_literal() => {
                    self.pos += if self.peek(1) == Some('\\') { 3 } else { 2 };
                    self.tokens.push(Token::Str);
                }
                '(' | '[' | '{' => {
                    self.pos += 1;
                    self.brackets.push(c);
                    self.tokens.push(Token::Open);
                }
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if self.brackets.pop() != Some(expected) {
                        return None;
                    }
                    self.pos += 1;
                    self.tokens.push(Token::Close);
                }
                '.' if self.peek(1) == Some('.') => {
                    while self.peek(0) == Some('.') {
                        self.pos += 1;
                    }
                    self.tokens.push(Token::Operator);
                }
                '.' => {
                    self.pos += 1;
                    self.tokens.push(Token::Dot);
                }
                '&' if self.peek(1) == Some('.') => {
                    self.pos += 2;
                    self.tokens.push(Token::Dot);
                }
                c if c.is_ascii_digit() => self.number(),
                c if is_identifier_start(c) => self.word(),
                _ => {
                    self.pos += 1;
                    self.tokens.push(Token::Operator);
                }
            }
        }

        self.brackets.is_empty().then_some(self.tokens)
    }

    fn is_char_literal(&self) -> bool {
        match (self.peek(1), self.peek(2)) {
            (Some('\\'), Some(_)) => true,
            (Some(c), next) => !c.is_whitespace() && !next.is_some_and(is_identifier_char),
            (None, _) => false,
        }
    }

    fn variable(&mut self) {
        self.pos += 1;
        if self.peek(0) == Some('@') {
            self.pos += 1;
        }
        if self.peek(0).is_some_and(is_identifier_char) {
            while self.peek(0).is_some_and(is_identifier_char) {
                self.pos += 1;
            }
        } else if self.peek(0).is_some_and(|c| !c.is_whitespace()) {
            // special globals such as `$!` or `$0`
            self.pos += 1;
        }
        self.tokens.push(Token::Variable);
    }

    fn colon(&mut self) -> Option<()> {
        match self.peek(1) {
            Some(':') => {
                self.pos += 2;
                self.tokens.push(Token::Dot);
            }
            Some(quote @ ('"' | '\'')) => {
                self.pos = skip_quoted(&self.chars, self.pos + 2, quote, quote, quote == '"')?;
                self.tokens.push(Token::Symbol);
            }
            Some(c) if is_identifier_start(c) => {
                self.pos += 1;
                while self.peek(0).is_some_and(is_identifier_char) {
                    self.pos += 1;
                }
                if self.peek(0).is_some_and(|c| matches!(c, '?' | '!' | '=')) {
                    self.pos += 1;
                }
                self.tokens.push(Token::Symbol);
            }
            Some(c) if self.at_operand() && "+-*/<=>![]%&|^~".contains(c) => {
                self.pos += 1;
                while self
                    .peek(0)
                    .is_some_and(|c| "+-*/<=>![]%&|^~@".contains(c))
                {
                    self.pos += 1;
                }
                self.tokens.push(Token::Symbol);
            }
            _ => {
                self.pos += 1;
                self.tokens.push(Token::Operator);
            }
        }
        Some(())
    }

    fn percent_literal(&mut self) -> Option<()> {
        let (kind, delimiter_at) = match self.peek(1) {
            Some(c @ ('q' | 'Q' | 'w' | 'W' | 'i' | 'I' | 'r' | 's' | 'x'))
                if self.peek(2).is_some_and(is_percent_delimiter) =>
            {
                (Some(c), 2)
            }
            Some(c) if is_percent_delimiter(c) => (None, 1),
            _ => {
                self.pos += 1;
                self.tokens.push(Token::Operator);
                return Some(());
            }
        };

        let open = self.peek(delimiter_at)?;
        let close = match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };
        let interpolate = !matches!(kind, Some('q' | 'w' | 'i' | 's'));
        self.pos = skip_quoted(&self.chars, self.pos + delimiter_at + 1, open, close, interpolate)?;

        self.tokens.push(match kind {
            None | Some('q' | 'Q') => Token::Str,
            Some('r') => Token::Regex,
            Some('s') => Token::Symbol,
            _ => Token::Literal,
        });
        Some(())
    }

    fn number(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.pos += 1;
            }
        }
        self.tokens.push(Token::Number);
    }

    fn word(&mut self) {
        let start = self.pos;
        while self.peek(0).is_some_and(is_identifier_char) {
            self.pos += 1;
        }
        if self.peek(0).is_some_and(|c| c == '?' || c == '!')
            && self.peek(1) != Some('=')
            && self.peek(1) != Some(':')
        {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        let after_dot = matches!(self.previous(), Some(Token::Dot));
        if self.peek(0) == Some(':') && self.peek(1) != Some(':') && !after_dot {
            self.pos += 1;
            self.tokens.push(Token::Label);
            return;
        }

        let token = if after_dot {
            Token::Identifier
        } else if let Some(keyword) = KEYWORDS.iter().find(|&&keyword| keyword == word) {
            Token::Keyword(*keyword)
        } else if word.starts_with(|c: char| c.is_ascii_uppercase()) {
            Token::Constant
        } else {
            Token::Identifier
        };
        self.tokens.push(token);
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_percent_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Skip a delimited literal starting just after its opening delimiter.
///
/// Returns the position after the closing delimiter.
fn skip_quoted(
    chars: &[char],
    start: usize,
    open: char,
    close: char,
    interpolate: bool,
) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = start;
    while let Some(&c) = chars.get(pos) {
        match c {
            '\\' => pos += 2,
            '#' if interpolate && chars.get(pos + 1) == Some(&'{') => {
                pos = skip_interpolation(chars, pos + 2)?;
            }
            c if c == close && depth == 0 => return Some(pos + 1),
            c if c == close => {
                depth -= 1;
                pos += 1;
            }
            c if c == open && open != close => {
                depth += 1;
                pos += 1;
            }
            _ => pos += 1,
        }
    }
    None
}

/// Skip `#{ ... }` content starting just after the opening brace.
fn skip_interpolation(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = start;
    while let Some(&c) = chars.get(pos) {
        match c {
            '\\' => pos += 2,
            '"' | '`' => pos = skip_quoted(chars, pos + 1, c, c, true)?,
            '\'' => pos = skip_quoted(chars, pos + 1, c, c, false)?,
            '{' => {
                depth += 1;
                pos += 1;
            }
            '}' => {
                depth -= 1;
                pos += 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => pos += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_inside_strings_ignored() {
        let tokens = tokenize(r#"foo "if #{"end"} do" 'case'"#).unwrap();
        assert_eq!(tokens, vec![Token::Identifier, Token::Str, Token::Str]);
    }

    #[test]
    fn test_symbols_and_labels() {
        let tokens = tokenize("link_to :if, if: true").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier,
                Token::Symbol,
                Token::Operator,
                Token::Label,
                Token::Keyword("true"),
            ]
        );
    }

    #[test]
    fn test_method_call_named_like_keyword() {
        let tokens = tokenize("foo.class.end").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier,
                Token::Dot,
                Token::Identifier,
                Token::Dot,
                Token::Identifier,
            ]
        );
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(tokenize("foo(").is_none());
        assert!(tokenize("} else {").is_none());
        assert!(tokenize("[1, 2)").is_none());
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("\"abc").is_none());
    }

    #[test]
    fn test_percent_literals() {
        assert_eq!(tokenize("%w[a b c]").unwrap(), vec![Token::Literal]);
        assert_eq!(tokenize("%(if (x))").unwrap(), vec![Token::Str]);
        assert_eq!(
            tokenize("x % 2").unwrap(),
            vec![Token::Identifier, Token::Operator, Token::Number]
        );
        assert_eq!(
            tokenize("puts %w[end]").unwrap(),
            vec![Token::Identifier, Token::Literal]
        );
    }

    #[test]
    fn test_regex_vs_division() {
        assert_eq!(tokenize("/do|end/").unwrap(), vec![Token::Regex]);
        assert_eq!(
            tokenize("a / b").unwrap(),
            vec![Token::Identifier, Token::Operator, Token::Identifier]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokenize("foo # if bar\n").unwrap(),
            vec![Token::Identifier, Token::Terminator]
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            tokenize("@foo + @@bar + $baz").unwrap(),
            vec![
                Token::Variable,
                Token::Operator,
                Token::Variable,
                Token::Operator,
                Token::Variable,
            ]
        );
    }

    #[test]
    fn test_predicate_method() {
        assert_eq!(tokenize("empty?").unwrap(), vec![Token::Identifier]);
        assert_eq!(
            tokenize("a != b").unwrap(),
            vec![Token::Identifier, Token::Operator, Token::Operator, Token::Identifier]
        );
    }
}
