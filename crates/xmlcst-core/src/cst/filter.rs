//! Trivia filter
//!
//! Wraps the lexer and hides whitespace, comment pieces and bad characters
//! from the structural parser. The unfiltered stream stays available through
//! [`TriviaFilter::original`] for the reinsertion pass.

use std::ops::Range;

use super::lexer::{LexerPosition, LexerState, Token, XmlLexer};
use super::XmlSyntaxKind;

#[derive(Debug, Clone)]
pub struct TriviaFilter<'a> {
    lexer: XmlLexer<'a>,
}

impl<'a> TriviaFilter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: XmlLexer::new(source),
        }
    }

    pub fn start(&mut self, range: Range<usize>, state: LexerState) {
        self.lexer.start(range, state);
        self.skip_trivia();
    }

    /// Current structural token
    pub fn token(&self) -> Option<Token> {
        self.lexer.token()
    }

    pub fn token_kind(&self) -> Option<XmlSyntaxKind> {
        self.lexer.token_kind()
    }

    pub fn at(&self, kind: XmlSyntaxKind) -> bool {
        self.token_kind() == Some(kind)
    }

    /// Text of the current structural token
    pub fn token_text(&self) -> Option<&'a str> {
        let source = self.lexer.source();
        self.token().map(|token| token.text(source))
    }

    pub fn advance(&mut self) {
        self.lexer.advance();
        self.skip_trivia();
    }

    pub fn position(&self) -> LexerPosition {
        self.lexer.position()
    }

    pub fn restore(&mut self, position: LexerPosition) {
        self.lexer.restore(position);
    }

    /// The unfiltered stream over the same buffer, range and start state,
    /// rewound to its first token
    pub fn original(&self) -> XmlLexer<'a> {
        let mut original = self.lexer.clone();
        original.reset();
        original
    }

    fn skip_trivia(&mut self) {
        while self.lexer.token_kind().is_some_and(XmlSyntaxKind::is_trivia) {
            self.lexer.advance();
        }
    }
}
