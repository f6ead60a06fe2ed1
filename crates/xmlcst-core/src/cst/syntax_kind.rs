//! Syntax kinds for the XML CST
//!
//! One enum covers both token kinds (produced by the lexer) and node kinds
//! (composites built by the parser). Token kinds come first; node kinds start
//! at [`XmlSyntaxKind::Document`].

/// Every token and node kind that can appear in an XML syntax tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum XmlSyntaxKind {
    // Trivia
    WhiteSpace = 0,
    CommentStart,
    CommentCharacters,
    CommentEnd,
    BadCharacter,

    // Tags
    StartTagStart,
    EndTagStart,
    TagName,
    TagEnd,
    EmptyElementEnd,
    Name,
    Eq,
    AttributeValueStartDelimiter,
    AttributeValueToken,
    AttributeValueEndDelimiter,

    // Content
    DataCharacters,
    CharEntityRef,
    EntityRefToken,
    CdataStart,
    CdataCharacters,
    CdataEnd,

    // Processing instructions and the XML declaration
    PiStart,
    PiTarget,
    PiCharacters,
    PiEnd,
    DeclStart,
    DeclEnd,

    // DOCTYPE and DTD markup
    DoctypeStart,
    DoctypeEnd,
    DoctypeSystem,
    DoctypePublic,
    MarkupStart,
    MarkupEnd,
    ElementDeclStart,
    AttlistDeclStart,
    EntityDeclStart,
    NotationDeclStart,
    ConditionalSectionStart,
    ConditionalSectionEnd,
    ConditionalInclude,
    ConditionalIgnore,
    LeftParen,
    RightParen,
    Bar,
    Comma,
    Star,
    Plus,
    Question,
    Percent,
    ContentEmpty,
    ContentAny,
    Pcdata,
    AttImplied,
    AttRequired,
    AttFixed,

    // Composite nodes
    Document,
    Fragment,
    Prolog,
    Decl,
    Doctype,
    MarkupDecl,
    ElementDecl,
    ElementContentSpec,
    AttlistDecl,
    AttributeDecl,
    EnumeratedType,
    EntityDecl,
    NotationDecl,
    ConditionalSection,
    EntityRef,
    ProcessingInstruction,
    Tag,
    Attribute,
    AttributeValue,
    Text,
    Cdata,
    Comment,

    /// Zero-width error marker
    Error,
}

impl XmlSyntaxKind {
    /// All kinds in discriminant order; `ALL[k as usize] == k`
    pub const ALL: [XmlSyntaxKind; 78] = {
        use XmlSyntaxKind::*;
        [
            WhiteSpace,
            CommentStart,
            CommentCharacters,
            CommentEnd,
            BadCharacter,
            StartTagStart,
            EndTagStart,
            TagName,
            TagEnd,
            EmptyElementEnd,
            Name,
            Eq,
            AttributeValueStartDelimiter,
            AttributeValueToken,
            AttributeValueEndDelimiter,
            DataCharacters,
            CharEntityRef,
            EntityRefToken,
            CdataStart,
            CdataCharacters,
            CdataEnd,
            PiStart,
            PiTarget,
            PiCharacters,
            PiEnd,
            DeclStart,
            DeclEnd,
            DoctypeStart,
            DoctypeEnd,
            DoctypeSystem,
            DoctypePublic,
            MarkupStart,
            MarkupEnd,
            ElementDeclStart,
            AttlistDeclStart,
            EntityDeclStart,
            NotationDeclStart,
            ConditionalSectionStart,
            ConditionalSectionEnd,
            ConditionalInclude,
            ConditionalIgnore,
            LeftParen,
            RightParen,
            Bar,
            Comma,
            Star,
            Plus,
            Question,
            Percent,
            ContentEmpty,
            ContentAny,
            Pcdata,
            AttImplied,
            AttRequired,
            AttFixed,
            Document,
            Fragment,
            Prolog,
            Decl,
            Doctype,
            MarkupDecl,
            ElementDecl,
            ElementContentSpec,
            AttlistDecl,
            AttributeDecl,
            EnumeratedType,
            EntityDecl,
            NotationDecl,
            ConditionalSection,
            EntityRef,
            ProcessingInstruction,
            Tag,
            Attribute,
            AttributeValue,
            Text,
            Cdata,
            Comment,
            Error,
        ]
    };

    /// Look up a kind by its raw discriminant
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Whitespace, comment pieces and bad characters: hidden from the
    /// structural grammar, restored by trivia reinsertion
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            XmlSyntaxKind::WhiteSpace
                | XmlSyntaxKind::CommentStart
                | XmlSyntaxKind::CommentCharacters
                | XmlSyntaxKind::CommentEnd
                | XmlSyntaxKind::BadCharacter
        )
    }

    /// Tokens that belong inside a `Comment` node
    pub fn is_comment_part(self) -> bool {
        matches!(
            self,
            XmlSyntaxKind::CommentStart
                | XmlSyntaxKind::CommentCharacters
                | XmlSyntaxKind::CommentEnd
        )
    }

    pub fn is_token(self) -> bool {
        (self as u16) < (XmlSyntaxKind::Document as u16)
    }

    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Tokens that open a DTD declaration
    pub fn is_decl_start(self) -> bool {
        matches!(
            self,
            XmlSyntaxKind::ElementDeclStart
                | XmlSyntaxKind::AttlistDeclStart
                | XmlSyntaxKind::EntityDeclStart
                | XmlSyntaxKind::NotationDeclStart
        )
    }
}

impl From<XmlSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: XmlSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}
