//! Rowan language implementation for XML
//!
//! Connects [`XmlSyntaxKind`] to Rowan's generic tree types so a finished
//! arena tree can be frozen into an immutable green tree.

use rowan::Language;

use super::XmlSyntaxKind;

/// Language marker for XML syntax trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XmlLanguage;

impl Language for XmlLanguage {
    type Kind = XmlSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        XmlSyntaxKind::from_raw(raw.0).unwrap_or_else(|| {
            tracing::warn!("Unknown syntax kind: {}", raw.0);
            XmlSyntaxKind::Error
        })
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type XmlSyntaxNode = rowan::SyntaxNode<XmlLanguage>;
pub type XmlSyntaxToken = rowan::SyntaxToken<XmlLanguage>;
pub type XmlSyntaxElement = rowan::SyntaxElement<XmlLanguage>;
