//! XML lexer producing span-only tokens
//!
//! Every byte of the requested range ends up in exactly one token, trivia
//! included, so the token stream alone is enough to rebuild the input. The
//! lexer never fails: characters that make no sense where they appear are
//! emitted as [`XmlSyntaxKind::BadCharacter`].
//!
//! Tokens are produced eagerly when the lexer is started; advancing and
//! rewinding are then just cursor moves, which keeps the save/restore used
//! by tag recovery trivial.

use std::ops::Range;

use rowan::{TextRange, TextSize};

use super::XmlSyntaxKind;

/// A token: kind plus byte span into the source buffer, no owned text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: XmlSyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: XmlSyntaxKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    pub fn start(&self) -> usize {
        self.range.start().into()
    }

    pub fn end(&self) -> usize {
        self.range.end().into()
    }

    /// Slice the token text out of the buffer it was lexed from
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start()..self.end()]
    }
}

/// State the lexer starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerState {
    /// Document content: prolog, tags, text
    #[default]
    Content,
    /// Inside a DTD internal subset (markup declarations)
    Dtd,
}

/// Saved lexer cursor, see [`XmlLexer::position`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LexerPosition(usize);

/// Restartable token stream over a source buffer
#[derive(Debug, Clone)]
pub struct XmlLexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    index: usize,
    range: Range<usize>,
    state: LexerState,
}

impl<'a> XmlLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            index: 0,
            range: 0..0,
            state: LexerState::Content,
        }
    }

    /// (Re)start lexing `range` of the buffer in the given state
    ///
    /// The range must lie on char boundaries of the buffer.
    pub fn start(&mut self, range: Range<usize>, state: LexerState) {
        self.tokens = tokenize(self.source, range.clone(), state);
        self.index = 0;
        self.range = range;
        self.state = state;
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn state(&self) -> LexerState {
        self.state
    }

    /// Current token, `None` once the range is exhausted
    pub fn token(&self) -> Option<Token> {
        self.tokens.get(self.index).copied()
    }

    pub fn token_kind(&self) -> Option<XmlSyntaxKind> {
        self.token().map(|t| t.kind)
    }

    pub fn advance(&mut self) {
        if self.index < self.tokens.len() {
            self.index += 1;
        }
    }

    pub fn position(&self) -> LexerPosition {
        LexerPosition(self.index)
    }

    pub fn restore(&mut self, position: LexerPosition) {
        self.index = position.0.min(self.tokens.len());
    }

    /// Rewind to the first token of the current range
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// All tokens of the current range
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Tokenize `source[range]` starting in `state`
pub fn tokenize(source: &str, range: Range<usize>, state: LexerState) -> Vec<Token> {
    let base = match state {
        LexerState::Content => Mode::Content,
        LexerState::Dtd => Mode::Markup,
    };
    let mut scanner = Scanner {
        src: &source[..range.end],
        pos: range.start,
        mode: base,
        base,
        stack: Vec::new(),
        tokens: Vec::new(),
    };
    scanner.run();
    scanner.tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Content,
    StartTag { named: bool },
    EndTag,
    AttrValue(char),
    Pi,
    Decl,
    Doctype,
    Markup,
    CondSection,
    DtdDecl,
    DtdValue(char),
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    mode: Mode,
    base: Mode,
    stack: Vec<Mode>,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) {
        while self.pos < self.src.len() {
            match self.mode {
                Mode::Content => self.lex_content(),
                Mode::StartTag { named } => self.lex_start_tag(named),
                Mode::EndTag => self.lex_end_tag(),
                Mode::AttrValue(quote) => self.lex_attr_value(quote),
                Mode::Pi => self.lex_pi(),
                Mode::Decl => self.lex_decl(),
                Mode::Doctype => self.lex_doctype(),
                Mode::Markup => self.lex_markup(),
                Mode::CondSection => self.lex_cond_section(),
                Mode::DtdDecl => self.lex_dtd_decl(),
                Mode::DtdValue(quote) => self.lex_dtd_value(quote),
            }
        }
    }

    fn lex_content(&mut self) {
        let rest = self.rest();
        if rest.starts_with("<!--") {
            self.lex_comment();
        } else if rest.starts_with("<![CDATA[") {
            self.emit(XmlSyntaxKind::CdataStart, 9);
            match self.rest().find("]]>") {
                Some(len) => {
                    if len > 0 {
                        self.emit(XmlSyntaxKind::CdataCharacters, len);
                    }
                    self.emit(XmlSyntaxKind::CdataEnd, 3);
                }
                None => {
                    let len = self.rest().len();
                    if len > 0 {
                        self.emit(XmlSyntaxKind::CdataCharacters, len);
                    }
                }
            }
        } else if rest.starts_with("<!DOCTYPE") {
            self.emit(XmlSyntaxKind::DoctypeStart, 9);
            self.mode = Mode::Doctype;
        } else if rest.starts_with("<?") {
            self.lex_pi_start();
        } else if rest.starts_with("</") {
            self.emit(XmlSyntaxKind::EndTagStart, 2);
            self.mode = Mode::EndTag;
        } else if rest.starts_with('<') {
            self.emit(XmlSyntaxKind::StartTagStart, 1);
            self.mode = Mode::StartTag { named: false };
        } else if rest.starts_with('&') {
            self.lex_reference(XmlSyntaxKind::DataCharacters);
        } else if self.at_whitespace() {
            self.lex_whitespace();
        } else {
            let len = self.run_len(|c| c != '<' && c != '&' && !is_xml_whitespace(c));
            self.emit(XmlSyntaxKind::DataCharacters, len);
        }
    }

    fn lex_comment(&mut self) {
        self.emit(XmlSyntaxKind::CommentStart, 4);
        match self.rest().find("-->") {
            Some(len) => {
                if len > 0 {
                    self.emit(XmlSyntaxKind::CommentCharacters, len);
                }
                self.emit(XmlSyntaxKind::CommentEnd, 3);
            }
            None => {
                let len = self.rest().len();
                if len > 0 {
                    self.emit(XmlSyntaxKind::CommentCharacters, len);
                }
            }
        }
    }

    /// `<?xml` opens the XML declaration, any other `<?` a processing instruction
    fn lex_pi_start(&mut self) {
        let is_decl = self.rest().starts_with("<?xml")
            && self.rest()[5..]
                .chars()
                .next()
                .is_none_or(|c| is_xml_whitespace(c) || c == '?');
        self.stack.push(self.mode);
        if is_decl {
            self.emit(XmlSyntaxKind::DeclStart, 5);
            self.mode = Mode::Decl;
        } else {
            self.emit(XmlSyntaxKind::PiStart, 2);
            let len = self.name_len();
            if len > 0 {
                self.emit(XmlSyntaxKind::PiTarget, len);
            }
            self.mode = Mode::Pi;
        }
    }

    fn lex_start_tag(&mut self, named: bool) {
        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
        } else if rest.starts_with("/>") {
            self.emit(XmlSyntaxKind::EmptyElementEnd, 2);
            self.mode = Mode::Content;
        } else if rest.starts_with('>') {
            self.emit(XmlSyntaxKind::TagEnd, 1);
            self.mode = Mode::Content;
        } else if rest.starts_with('<') {
            self.mode = Mode::Content;
        } else if rest.starts_with('=') {
            self.emit(XmlSyntaxKind::Eq, 1);
        } else if let Some(quote) = self.at_quote() {
            self.emit(XmlSyntaxKind::AttributeValueStartDelimiter, 1);
            self.stack.push(Mode::StartTag { named: true });
            self.mode = Mode::AttrValue(quote);
        } else {
            let len = self.name_len();
            if len == 0 {
                self.emit_bad_char();
            } else if named {
                self.emit(XmlSyntaxKind::Name, len);
            } else {
                self.emit(XmlSyntaxKind::TagName, len);
                self.mode = Mode::StartTag { named: true };
            }
        }
    }

    fn lex_end_tag(&mut self) {
        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
        } else if rest.starts_with('>') {
            self.emit(XmlSyntaxKind::TagEnd, 1);
            self.mode = Mode::Content;
        } else if rest.starts_with('<') {
            self.mode = Mode::Content;
        } else {
            let len = self.name_len();
            if len == 0 {
                self.emit_bad_char();
            } else {
                self.emit(XmlSyntaxKind::TagName, len);
            }
        }
    }

    fn lex_attr_value(&mut self, quote: char) {
        let in_tag = matches!(self.stack.last(), Some(Mode::StartTag { .. }));
        let rest = self.rest();
        if rest.starts_with(quote) {
            self.emit(XmlSyntaxKind::AttributeValueEndDelimiter, 1);
            self.pop_mode();
        } else if rest.starts_with('&') {
            self.lex_reference(XmlSyntaxKind::AttributeValueToken);
        } else if in_tag && rest.starts_with('<') {
            self.pop_mode();
        } else {
            let len = self.run_len(|c| c != quote && c != '&' && !(in_tag && c == '<'));
            self.emit(XmlSyntaxKind::AttributeValueToken, len);
        }
    }

    fn lex_pi(&mut self) {
        if self.rest().starts_with("?>") {
            self.emit(XmlSyntaxKind::PiEnd, 2);
            self.pop_mode();
        } else if self.at_whitespace() {
            self.lex_whitespace();
        } else {
            let rest = self.rest();
            let mut len = rest.len();
            for (index, c) in rest.char_indices() {
                if is_xml_whitespace(c) || (index > 0 && rest[index..].starts_with("?>")) {
                    len = index;
                    break;
                }
            }
            self.emit(XmlSyntaxKind::PiCharacters, len);
        }
    }

    fn lex_decl(&mut self) {
        let rest = self.rest();
        if rest.starts_with("?>") {
            self.emit(XmlSyntaxKind::DeclEnd, 2);
            self.pop_mode();
        } else if self.at_whitespace() {
            self.lex_whitespace();
        } else if rest.starts_with('<') {
            self.pop_mode();
        } else if rest.starts_with('=') {
            self.emit(XmlSyntaxKind::Eq, 1);
        } else if let Some(quote) = self.at_quote() {
            self.emit(XmlSyntaxKind::AttributeValueStartDelimiter, 1);
            self.stack.push(Mode::Decl);
            self.mode = Mode::AttrValue(quote);
        } else {
            let len = self.name_len();
            if len == 0 {
                self.emit_bad_char();
            } else {
                self.emit(XmlSyntaxKind::Name, len);
            }
        }
    }

    fn lex_doctype(&mut self) {
        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
        } else if rest.starts_with('[') {
            self.emit(XmlSyntaxKind::MarkupStart, 1);
            self.stack.push(Mode::Doctype);
            self.mode = Mode::Markup;
        } else if rest.starts_with('>') {
            self.emit(XmlSyntaxKind::DoctypeEnd, 1);
            self.mode = Mode::Content;
        } else if rest.starts_with('<') {
            self.mode = Mode::Content;
        } else if rest.starts_with('%') {
            self.lex_percent_reference(XmlSyntaxKind::BadCharacter);
        } else if let Some(quote) = self.at_quote() {
            // The whole quoted literal, quotes included, is one token here
            let body = &rest[1..];
            let len = match body.find([quote, '>']) {
                Some(index) if body[index..].starts_with(quote) => index + 2,
                Some(index) => index + 1,
                None => rest.len(),
            };
            self.emit(XmlSyntaxKind::AttributeValueToken, len);
        } else {
            let len = self.name_len();
            if len == 0 {
                self.emit_bad_char();
            } else {
                let kind = match &rest[..len] {
                    "SYSTEM" => XmlSyntaxKind::DoctypeSystem,
                    "PUBLIC" => XmlSyntaxKind::DoctypePublic,
                    _ => XmlSyntaxKind::Name,
                };
                self.emit(kind, len);
            }
        }
    }

    fn lex_markup(&mut self) {
        const DECL_STARTS: [(&str, XmlSyntaxKind); 4] = [
            ("<!ELEMENT", XmlSyntaxKind::ElementDeclStart),
            ("<!ATTLIST", XmlSyntaxKind::AttlistDeclStart),
            ("<!ENTITY", XmlSyntaxKind::EntityDeclStart),
            ("<!NOTATION", XmlSyntaxKind::NotationDeclStart),
        ];

        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
            return;
        }
        if rest.starts_with("<!--") {
            self.lex_comment();
            return;
        }
        for (prefix, kind) in DECL_STARTS {
            if rest.starts_with(prefix) {
                self.emit(kind, prefix.len());
                self.stack.push(self.mode);
                self.mode = Mode::DtdDecl;
                return;
            }
        }
        if rest.starts_with("<![") {
            self.emit(XmlSyntaxKind::ConditionalSectionStart, 3);
            self.stack.push(self.mode);
            self.mode = Mode::CondSection;
        } else if rest.starts_with("<?") {
            self.lex_pi_start();
        } else if rest.starts_with("]]>") {
            self.emit(XmlSyntaxKind::ConditionalSectionEnd, 3);
            self.pop_mode();
        } else if rest.starts_with(']') {
            self.emit(XmlSyntaxKind::MarkupEnd, 1);
            self.pop_mode();
        } else if rest.starts_with('%') {
            self.lex_percent_reference(XmlSyntaxKind::Percent);
        } else if rest.starts_with('&') {
            self.lex_reference(XmlSyntaxKind::BadCharacter);
        } else {
            self.emit_bad_char();
        }
    }

    fn lex_cond_section(&mut self) {
        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
        } else if rest.starts_with('[') {
            self.emit(XmlSyntaxKind::MarkupStart, 1);
            self.mode = Mode::Markup;
        } else if rest.starts_with('%') {
            self.lex_percent_reference(XmlSyntaxKind::Percent);
        } else if rest.starts_with('<') {
            self.mode = Mode::Markup;
        } else {
            let len = self.name_len();
            if len == 0 {
                self.emit_bad_char();
            } else {
                let kind = match &rest[..len] {
                    "INCLUDE" => XmlSyntaxKind::ConditionalInclude,
                    "IGNORE" => XmlSyntaxKind::ConditionalIgnore,
                    _ => XmlSyntaxKind::Name,
                };
                self.emit(kind, len);
            }
        }
    }

    fn lex_dtd_decl(&mut self) {
        let rest = self.rest();
        if self.at_whitespace() {
            self.lex_whitespace();
            return;
        }
        let single = match rest.as_bytes()[0] {
            b'(' => Some(XmlSyntaxKind::LeftParen),
            b')' => Some(XmlSyntaxKind::RightParen),
            b'|' => Some(XmlSyntaxKind::Bar),
            b',' => Some(XmlSyntaxKind::Comma),
            b'*' => Some(XmlSyntaxKind::Star),
            b'+' => Some(XmlSyntaxKind::Plus),
            b'?' => Some(XmlSyntaxKind::Question),
            _ => None,
        };
        if let Some(kind) = single {
            self.emit(kind, 1);
        } else if rest.starts_with('>') {
            self.emit(XmlSyntaxKind::TagEnd, 1);
            self.pop_mode();
        } else if rest.starts_with('<') || rest.starts_with(']') {
            // Declaration left open; let the markup level take over
            self.pop_mode();
        } else if rest.starts_with('#') {
            let len = 1 + rest[1..]
                .char_indices()
                .find(|&(_, c)| !is_name_char(c))
                .map_or(rest.len() - 1, |(index, _)| index);
            let kind = match &rest[..len] {
                "#PCDATA" => Some(XmlSyntaxKind::Pcdata),
                "#IMPLIED" => Some(XmlSyntaxKind::AttImplied),
                "#REQUIRED" => Some(XmlSyntaxKind::AttRequired),
                "#FIXED" => Some(XmlSyntaxKind::AttFixed),
                _ => None,
            };
            match kind {
                Some(kind) => self.emit(kind, len),
                None => self.emit_bad_char(),
            }
        } else if rest.starts_with('%') {
            self.lex_percent_reference(XmlSyntaxKind::Percent);
        } else if rest.starts_with('&') {
            self.lex_reference(XmlSyntaxKind::BadCharacter);
        } else if let Some(quote) = self.at_quote() {
            self.emit(XmlSyntaxKind::AttributeValueStartDelimiter, 1);
            self.stack.push(Mode::DtdDecl);
            self.mode = Mode::DtdValue(quote);
        } else {
            // NMTOKEN-like run: DTD names may start with '-' or a digit
            let len = self.run_len(is_name_char);
            if len == 0 {
                self.emit_bad_char();
            } else {
                let kind = match &rest[..len] {
                    "EMPTY" => XmlSyntaxKind::ContentEmpty,
                    "ANY" => XmlSyntaxKind::ContentAny,
                    "SYSTEM" => XmlSyntaxKind::DoctypeSystem,
                    "PUBLIC" => XmlSyntaxKind::DoctypePublic,
                    _ => XmlSyntaxKind::Name,
                };
                self.emit(kind, len);
            }
        }
    }

    fn lex_dtd_value(&mut self, quote: char) {
        let rest = self.rest();
        if rest.starts_with(quote) {
            self.emit(XmlSyntaxKind::AttributeValueEndDelimiter, 1);
            self.pop_mode();
        } else if rest.starts_with('&') {
            self.lex_reference(XmlSyntaxKind::AttributeValueToken);
        } else if rest.starts_with('%') {
            self.lex_percent_reference(XmlSyntaxKind::AttributeValueToken);
        } else {
            let len = self.run_len(|c| c != quote && c != '&' && c != '%');
            self.emit(XmlSyntaxKind::AttributeValueToken, len);
        }
    }

    /// `&name;`, `&#NN;` or `&#xHH;`; a lone `&` becomes one `fallback` byte
    fn lex_reference(&mut self, fallback: XmlSyntaxKind) {
        let rest = self.rest();
        let after = &rest[1..];
        let char_ref_len = if let Some(hex) = after.strip_prefix("#x") {
            digits_then_semicolon(hex, |c| c.is_ascii_hexdigit()).map(|len| len + 3)
        } else if let Some(dec) = after.strip_prefix('#') {
            digits_then_semicolon(dec, |c| c.is_ascii_digit()).map(|len| len + 2)
        } else {
            None
        };
        if let Some(len) = char_ref_len {
            self.emit(XmlSyntaxKind::CharEntityRef, len);
        } else if let Some(len) = named_reference_len(rest) {
            self.emit(XmlSyntaxKind::EntityRefToken, len);
        } else {
            self.emit(fallback, 1);
        }
    }

    /// `%name;` parameter-entity reference, otherwise one `fallback` byte
    fn lex_percent_reference(&mut self, fallback: XmlSyntaxKind) {
        match named_reference_len(self.rest()) {
            Some(len) => self.emit(XmlSyntaxKind::EntityRefToken, len),
            None => self.emit(fallback, 1),
        }
    }

    fn lex_whitespace(&mut self) {
        let len = self.run_len(is_xml_whitespace);
        self.emit(XmlSyntaxKind::WhiteSpace, len);
    }

    fn emit_bad_char(&mut self) {
        let len = self.rest().chars().next().map_or(0, char::len_utf8);
        self.emit(XmlSyntaxKind::BadCharacter, len);
    }

    fn emit(&mut self, kind: XmlSyntaxKind, len: usize) {
        debug_assert!(len > 0, "zero-length {kind:?} token at {}", self.pos);
        let range = TextRange::new(text_size(self.pos), text_size(self.pos + len));
        self.tokens.push(Token::new(kind, range));
        self.pos += len;
    }

    fn pop_mode(&mut self) {
        self.mode = self.stack.pop().unwrap_or(self.base);
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_whitespace(&self) -> bool {
        self.rest().chars().next().is_some_and(is_xml_whitespace)
    }

    fn at_quote(&self) -> Option<char> {
        self.rest().chars().next().filter(|&c| c == '"' || c == '\'')
    }

    fn run_len(&self, mut pred: impl FnMut(char) -> bool) -> usize {
        let rest = self.rest();
        rest.char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(index, _)| index)
    }

    fn name_len(&self) -> usize {
        match self.rest().chars().next() {
            Some(c) if is_name_start(c) => self.run_len(is_name_char),
            _ => 0,
        }
    }
}

fn text_size(offset: usize) -> TextSize {
    TextSize::new(offset as u32)
}

/// Length of `[&%]name;` at the start of `text`
fn named_reference_len(text: &str) -> Option<usize> {
    let body = &text[1..];
    let first = body.chars().next()?;
    if !is_name_start(first) {
        return None;
    }
    let name_len = body
        .char_indices()
        .find(|&(_, c)| !is_name_char(c))
        .map_or(body.len(), |(index, _)| index);
    body[name_len..].starts_with(';').then_some(name_len + 2)
}

/// Length of `digits;` at the start of `text`, `;` included
fn digits_then_semicolon(text: &str, is_digit: impl Fn(char) -> bool) -> Option<usize> {
    let digits = text.chars().take_while(|&c| is_digit(c)).count();
    (digits > 0 && text[digits..].starts_with(';')).then_some(digits + 1)
}

pub(crate) fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_alphanumeric() || c == '-' || c == '.' || c == '\u{B7}'
}

#[cfg(test)]
mod tests {
    use super::*;
    use XmlSyntaxKind::*;

    fn kinds(source: &str, state: LexerState) -> Vec<XmlSyntaxKind> {
        tokenize(source, 0..source.len(), state)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn assert_tiles(source: &str, state: LexerState) {
        let tokens = tokenize(source, 0..source.len(), state);
        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.start(), offset, "gap before {token:?} in {source:?}");
            assert!(token.end() > token.start());
            offset = token.end();
        }
        assert_eq!(offset, source.len(), "tokens do not reach the end of {source:?}");
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds("<a x=\"1\">hi there</a>", LexerState::Content),
            vec![
                StartTagStart,
                TagName,
                WhiteSpace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                AttributeValueEndDelimiter,
                TagEnd,
                DataCharacters,
                WhiteSpace,
                DataCharacters,
                EndTagStart,
                TagName,
                TagEnd,
            ]
        );
    }

    #[test]
    fn test_comment_and_cdata() {
        assert_eq!(
            kinds("<!-- x --><![CDATA[<y>]]>", LexerState::Content),
            vec![CommentStart, CommentCharacters, CommentEnd, CdataStart, CdataCharacters, CdataEnd]
        );
        assert_eq!(
            kinds("<!--", LexerState::Content),
            vec![CommentStart]
        );
    }

    #[test]
    fn test_references() {
        assert_eq!(
            kinds("&amp;&#38;&#x26;& ", LexerState::Content),
            vec![EntityRefToken, CharEntityRef, CharEntityRef, DataCharacters, WhiteSpace]
        );
    }

    #[test]
    fn test_prolog_tokens() {
        assert_eq!(
            kinds("<?xml version='1.0'?><?pi data?>", LexerState::Content),
            vec![
                DeclStart,
                WhiteSpace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                AttributeValueEndDelimiter,
                DeclEnd,
                PiStart,
                PiTarget,
                WhiteSpace,
                PiCharacters,
                PiEnd,
            ]
        );
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        assert_eq!(
            kinds(
                "<!DOCTYPE r SYSTEM \"r.dtd\" [<!ELEMENT r (#PCDATA|b)*>]>",
                LexerState::Content
            ),
            vec![
                DoctypeStart,
                WhiteSpace,
                Name,
                WhiteSpace,
                DoctypeSystem,
                WhiteSpace,
                AttributeValueToken,
                WhiteSpace,
                MarkupStart,
                ElementDeclStart,
                WhiteSpace,
                Name,
                WhiteSpace,
                LeftParen,
                Pcdata,
                Bar,
                Name,
                RightParen,
                Star,
                TagEnd,
                MarkupEnd,
                DoctypeEnd,
            ]
        );
    }

    #[test]
    fn test_dtd_state_declarations() {
        assert_eq!(
            kinds(
                "<!ATTLIST a b CDATA #IMPLIED><!ENTITY % e \"v&x;\">%e;",
                LexerState::Dtd
            ),
            vec![
                AttlistDeclStart,
                WhiteSpace,
                Name,
                WhiteSpace,
                Name,
                WhiteSpace,
                Name,
                WhiteSpace,
                AttImplied,
                TagEnd,
                EntityDeclStart,
                WhiteSpace,
                Percent,
                WhiteSpace,
                Name,
                WhiteSpace,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                EntityRefToken,
                AttributeValueEndDelimiter,
                TagEnd,
                EntityRefToken,
            ]
        );
    }

    #[test]
    fn test_conditional_section() {
        assert_eq!(
            kinds("<![INCLUDE[<!ELEMENT a ANY>]]>", LexerState::Dtd),
            vec![
                ConditionalSectionStart,
                ConditionalInclude,
                MarkupStart,
                ElementDeclStart,
                WhiteSpace,
                Name,
                WhiteSpace,
                ContentAny,
                TagEnd,
                ConditionalSectionEnd,
            ]
        );
    }

    #[test]
    fn test_unterminated_attribute_value_stops_at_tag_open() {
        assert_eq!(
            kinds("<a b=\"x<c/>", LexerState::Content),
            vec![
                StartTagStart,
                TagName,
                WhiteSpace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                StartTagStart,
                TagName,
                EmptyElementEnd,
            ]
        );
    }

    #[test]
    fn test_sub_range() {
        let source = "xx<a/>yy";
        let tokens = tokenize(source, 2..6, LexerState::Content);
        assert_eq!(tokens.first().map(|t| t.start()), Some(2));
        assert_eq!(tokens.last().map(|t| t.end()), Some(6));
    }

    #[test]
    fn test_tokens_tile_garbage() {
        for source in [
            "",
            "   ",
            "<<<>>>",
            "</ >&&;<!<?",
            "<!DOCTYPE [<!ELEMENT (((>]]]>",
            "<a b='c' d=\"e",
            "\u{feff}é<ü 名前=\"値\">テキスト</ü>",
            "<![CDATA[ never closed",
            "<!ATTLIST #BOGUS %%; &",
        ] {
            assert_tiles(source, LexerState::Content);
            assert_tiles(source, LexerState::Dtd);
        }
    }

    #[test]
    fn test_lexer_position_restore() {
        let source = "<a></a>";
        let mut lexer = XmlLexer::new(source);
        lexer.start(0..source.len(), LexerState::Content);
        lexer.advance();
        let saved = lexer.position();
        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.token_kind(), Some(EndTagStart));
        lexer.restore(saved);
        assert_eq!(lexer.token_kind(), Some(TagName));
    }
}
