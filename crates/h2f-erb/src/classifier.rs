//! Ruby code classification for directive fragments.
//!
//! The preprocessor asks whether a fragment opens, continues or closes a
//! Ruby block; the renderer asks whether a fragment is a bare expression
//! that can stand in for a value. Both questions sit behind traits so a
//! caller can plug in a real Ruby parser.

use crate::lexer::{Token, tokenize};

/// Block-structure predicates over a code fragment.
pub trait BlockClassifier {
    /// Code opens a block that a later `end` closes (`if x`, `foo do |f|`).
    fn is_block_opener(&self, code: &str) -> bool;

    /// Code closes the innermost block (`end`, `end.join(",")`).
    fn is_block_closer(&self, code: &str) -> bool;

    /// Code closes one branch and opens the next (`else`, `when 1`).
    fn is_mid_block(&self, code: &str) -> bool;
}

/// Value predicate over a code fragment.
pub trait ExpressionClassifier {
    /// Code is a single literal, symbol or argument-less call.
    fn is_bare_expression(&self, code: &str) -> bool;
}

/// Everything the renderer needs to know about directive code.
pub trait CodeClassifier: BlockClassifier + ExpressionClassifier + Send + Sync {}

impl<T: BlockClassifier + ExpressionClassifier + Send + Sync> CodeClassifier for T {}

/// Net block depth change of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockShape {
    /// Lowest depth reached while scanning.
    min: i32,
    /// Depth after the last token.
    last: i32,
}

/// Token-based heuristic classifier for Ruby.
///
/// Code that cannot be tokenized (unbalanced brackets, unterminated
/// literals) or holds no tokens is never a block boundary.
///
/// ```
/// use h2f_erb::{BlockClassifier, ExpressionClassifier, RubyClassifier};
///
/// let ruby = RubyClassifier;
/// assert!(ruby.is_block_opener(" form_for @user do |f| "));
/// assert!(ruby.is_mid_block(" else "));
/// assert!(ruby.is_block_closer(" end "));
/// assert!(ruby.is_bare_expression("title"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyClassifier;

impl RubyClassifier {
    fn shape(code: &str) -> Option<BlockShape> {
        let Some(tokens) = tokenize(code) else {
            tracing::debug!(code, "Unclassifiable directive code");
            return None;
        };
        if tokens.iter().all(|&token| token == Token::Terminator) {
            return None;
        }
        Some(block_shape(&tokens))
    }
}

impl BlockClassifier for RubyClassifier {
    fn is_block_opener(&self, code: &str) -> bool {
        Self::shape(code).is_some_and(|shape| shape.min >= 0 && shape.last == 1)
    }

    fn is_block_closer(&self, code: &str) -> bool {
        Self::shape(code).is_some_and(|shape| shape.min == -1 && shape.last == -1)
    }

    fn is_mid_block(&self, code: &str) -> bool {
        Self::shape(code).is_some_and(|shape| shape.min == -1 && shape.last == 0)
    }
}

impl ExpressionClassifier for RubyClassifier {
    fn is_bare_expression(&self, code: &str) -> bool {
        let Some(tokens) = tokenize(code) else {
            return false;
        };
        let mut significant = tokens.iter().filter(|&&token| token != Token::Terminator);
        matches!(
            (significant.next(), significant.next()),
            (
                Some(Token::Str | Token::Symbol | Token::Number | Token::Regex | Token::Identifier),
                None
            )
        )
    }
}

fn block_shape(tokens: &[Token]) -> BlockShape {
    let mut depth = 0;
    let mut min = 0;
    // `while x do`: the `do` belongs to the loop header
    let mut loop_header = false;
    let mut previous: Option<Token> = None;

    for &token in tokens {
        let statement = previous.is_none_or(|token| !token.ends_value());
        match token {
            Token::Keyword("if" | "unless") if statement => depth += 1,
            Token::Keyword("while" | "until") if statement => {
                depth += 1;
                loop_header = true;
            }
            Token::Keyword("for") => {
                depth += 1;
                loop_header = true;
            }
            Token::Keyword("do") => {
                if loop_header {
                    loop_header = false;
                } else {
                    depth += 1;
                }
            }
            Token::Keyword("begin" | "case" | "def" | "class" | "module") => depth += 1,
            Token::Keyword("end") => {
                depth -= 1;
                min = min.min(depth);
            }
            Token::Keyword("else" | "elsif" | "when" | "ensure") => {
                min = min.min(depth - 1);
            }
            Token::Keyword("in" | "rescue") if statement => {
                min = min.min(depth - 1);
            }
            Token::Terminator => loop_header = false,
            _ => {}
        }
        previous = Some(token);
    }

    BlockShape { min, last: depth }
}
