use std::fmt::Write;

/// Token types, named after their markdown-it counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Block level
    OrderedListOpen,
    OrderedListClose,
    BulletListOpen,
    BulletListClose,
    ListItemOpen,
    ListItemClose,
    BlockquoteOpen,
    BlockquoteClose,
    ParagraphOpen,
    ParagraphClose,
    HeadingOpen(u8),
    HeadingClose(u8),
    Fence,
    CodeBlock,
    Hr,
    HtmlBlock,
    Inline,

    // Inline children
    Text,
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    StrikethroughOpen,
    StrikethroughClose,
    LinkOpen,
    LinkClose,
    Image,
    CodeInline,
    Softbreak,
    Hardbreak,
    HtmlInline,
}

impl TokenKind {
    /// The markdown-it type name, e.g. `ordered_list_open`.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::OrderedListOpen => "ordered_list_open",
            TokenKind::OrderedListClose => "ordered_list_close",
            TokenKind::BulletListOpen => "bullet_list_open",
            TokenKind::BulletListClose => "bullet_list_close",
            TokenKind::ListItemOpen => "list_item_open",
            TokenKind::ListItemClose => "list_item_close",
            TokenKind::BlockquoteOpen => "blockquote_open",
            TokenKind::BlockquoteClose => "blockquote_close",
            TokenKind::ParagraphOpen => "paragraph_open",
            TokenKind::ParagraphClose => "paragraph_close",
            TokenKind::HeadingOpen(_) => "heading_open",
            TokenKind::HeadingClose(_) => "heading_close",
            TokenKind::Fence => "fence",
            TokenKind::CodeBlock => "code_block",
            TokenKind::Hr => "hr",
            TokenKind::HtmlBlock => "html_block",
            TokenKind::Inline => "inline",
            TokenKind::Text => "text",
            TokenKind::StrongOpen => "strong_open",
            TokenKind::StrongClose => "strong_close",
            TokenKind::EmOpen => "em_open",
            TokenKind::EmClose => "em_close",
            TokenKind::StrikethroughOpen => "s_open",
            TokenKind::StrikethroughClose => "s_close",
            TokenKind::LinkOpen => "link_open",
            TokenKind::LinkClose => "link_close",
            TokenKind::Image => "image",
            TokenKind::CodeInline => "code_inline",
            TokenKind::Softbreak => "softbreak",
            TokenKind::Hardbreak => "hardbreak",
            TokenKind::HtmlInline => "html_inline",
        }
    }

    /// HTML tag a renderer would emit for this token, empty for tagless kinds.
    pub fn tag(self) -> &'static str {
        match self {
            TokenKind::OrderedListOpen | TokenKind::OrderedListClose => "ol",
            TokenKind::BulletListOpen | TokenKind::BulletListClose => "ul",
            TokenKind::ListItemOpen | TokenKind::ListItemClose => "li",
            TokenKind::BlockquoteOpen | TokenKind::BlockquoteClose => "blockquote",
            TokenKind::ParagraphOpen | TokenKind::ParagraphClose => "p",
            TokenKind::HeadingOpen(level) | TokenKind::HeadingClose(level) => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            TokenKind::Fence | TokenKind::CodeBlock => "code",
            TokenKind::Hr => "hr",
            TokenKind::StrongOpen | TokenKind::StrongClose => "strong",
            TokenKind::EmOpen | TokenKind::EmClose => "em",
            TokenKind::StrikethroughOpen | TokenKind::StrikethroughClose => "s",
            TokenKind::LinkOpen | TokenKind::LinkClose => "a",
            TokenKind::Image => "img",
            TokenKind::CodeInline => "code",
            TokenKind::Hardbreak => "br",
            TokenKind::HtmlBlock
            | TokenKind::Inline
            | TokenKind::Text
            | TokenKind::Softbreak
            | TokenKind::HtmlInline => "",
        }
    }

    /// 1 for opening markers, -1 for closing markers, 0 for everything else.
    pub fn nesting(self) -> i8 {
        match self {
            TokenKind::OrderedListOpen
            | TokenKind::BulletListOpen
            | TokenKind::ListItemOpen
            | TokenKind::BlockquoteOpen
            | TokenKind::ParagraphOpen
            | TokenKind::HeadingOpen(_)
            | TokenKind::StrongOpen
            | TokenKind::EmOpen
            | TokenKind::StrikethroughOpen
            | TokenKind::LinkOpen => 1,
            TokenKind::OrderedListClose
            | TokenKind::BulletListClose
            | TokenKind::ListItemClose
            | TokenKind::BlockquoteClose
            | TokenKind::ParagraphClose
            | TokenKind::HeadingClose(_)
            | TokenKind::StrongClose
            | TokenKind::EmClose
            | TokenKind::StrikethroughClose
            | TokenKind::LinkClose => -1,
            _ => 0,
        }
    }

    pub fn is_list_open(self) -> bool {
        matches!(self, TokenKind::OrderedListOpen | TokenKind::BulletListOpen)
    }

    pub fn is_list_close(self) -> bool {
        matches!(self, TokenKind::OrderedListClose | TokenKind::BulletListClose)
    }
}

/// A single element of the flat token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub attrs: Vec<(String, String)>,
    pub content: String,
    /// Fence info string (language and friends)
    pub info: String,
    /// Suppressed from rendering but kept in the stream
    pub hidden: bool,
    /// Only populated for `inline` tokens
    pub children: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            content: String::new(),
            info: String::new(),
            hidden: false,
            children: Vec::new(),
        }
    }

    /// A token whose content is emitted verbatim by a renderer.
    pub fn html_block(content: impl Into<String>) -> Self {
        Self::with_content(TokenKind::HtmlBlock, content)
    }

    pub fn html_inline(content: impl Into<String>) -> Self {
        Self::with_content(TokenKind::HtmlInline, content)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_content(TokenKind::Text, content)
    }

    pub fn with_content(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(kind)
        }
    }

    pub fn attr_get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any existing value of the same name.
    pub fn attr_set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(attr) => attr.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// Render the token stream as an indented listing, one token per line.
pub fn dump(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for token in tokens {
        if token.kind.nesting() < 0 {
            depth = depth.saturating_sub(1);
        }
        dump_token(token, depth, &mut out);
        if token.kind.nesting() > 0 {
            depth += 1;
        }
    }
    out
}

fn dump_token(token: &Token, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(token.kind.name());
    for (key, value) in &token.attrs {
        let _ = write!(out, " {key}={value:?}");
    }
    if !token.info.is_empty() {
        let _ = write!(out, " info={:?}", token.info);
    }
    if !token.content.is_empty() && token.kind != TokenKind::Inline {
        let _ = write!(out, " {:?}", token.content);
    }
    if token.hidden {
        out.push_str(" [hidden]");
    }
    out.push('\n');

    for child in &token.children {
        dump_token(child, depth + 1, out);
    }
}
