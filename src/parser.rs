use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::token::{Token, TokenKind};

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        let after_frontmatter = &markdown[3 + end + 4..];
        after_frontmatter.trim_start_matches('\n')
    } else {
        markdown
    }
}

/// Parse markdown text into a flat token stream
pub fn parse(markdown: &str) -> Vec<Token> {
    let markdown = strip_frontmatter(markdown);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut state = ParseState::default();

    for event in parser {
        process_event(event, &mut state);
    }

    state.close_implicit_paragraph();
    state.tokens
}

#[derive(Default)]
struct ParseState {
    tokens: Vec<Token>,

    // Children of the inline token currently being built
    inline: Option<Vec<Token>>,
    // Tight list items get a hidden paragraph around their text
    implicit_paragraph: bool,

    // Code block being collected
    code_block: Option<Token>,
    in_html_block: bool,
    // Image whose alt text is being collected
    image: Option<Token>,
}

impl ParseState {
    fn push_block(&mut self, token: Token) {
        self.close_implicit_paragraph();
        self.tokens.push(token);
    }

    fn begin_inline(&mut self) {
        self.inline = Some(Vec::new());
    }

    fn finish_inline(&mut self) {
        if let Some(children) = self.inline.take() {
            let mut inline = Token::new(TokenKind::Inline);
            inline.content = children
                .iter()
                .filter(|child| matches!(child.kind, TokenKind::Text | TokenKind::CodeInline))
                .map(|child| child.content.as_str())
                .collect();
            inline.children = children;
            self.tokens.push(inline);
        }
    }

    fn push_child(&mut self, token: Token) {
        if self.inline.is_none() {
            let mut open = Token::new(TokenKind::ParagraphOpen);
            open.hidden = true;
            self.tokens.push(open);
            self.implicit_paragraph = true;
            self.begin_inline();
        }
        let Some(children) = self.inline.as_mut() else {
            return;
        };
        // pulldown-cmark splits text at special characters; join it back
        if token.kind == TokenKind::Text {
            if let Some(last) = children.last_mut() {
                if last.kind == TokenKind::Text {
                    last.content.push_str(&token.content);
                    return;
                }
            }
        }
        children.push(token);
    }

    fn close_implicit_paragraph(&mut self) {
        if self.implicit_paragraph {
            self.implicit_paragraph = false;
            self.finish_inline();
            let mut close = Token::new(TokenKind::ParagraphClose);
            close.hidden = true;
            self.tokens.push(close);
        }
    }
}

fn process_event(event: Event, state: &mut ParseState) {
    match event {
        // Paragraphs
        Event::Start(Tag::Paragraph) => {
            state.push_block(Token::new(TokenKind::ParagraphOpen));
            state.begin_inline();
        }
        Event::End(TagEnd::Paragraph) => {
            state.finish_inline();
            state.tokens.push(Token::new(TokenKind::ParagraphClose));
        }

        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            let level = heading_level_to_u8(level);
            state.push_block(Token::new(TokenKind::HeadingOpen(level)));
            state.begin_inline();
        }
        Event::End(TagEnd::Heading(level)) => {
            state.finish_inline();
            let level = heading_level_to_u8(level);
            state.tokens.push(Token::new(TokenKind::HeadingClose(level)));
        }

        // Block quotes
        Event::Start(Tag::BlockQuote(_)) => {
            state.push_block(Token::new(TokenKind::BlockquoteOpen));
        }
        Event::End(TagEnd::BlockQuote(_)) => {
            state.push_block(Token::new(TokenKind::BlockquoteClose));
        }

        // Lists
        Event::Start(Tag::List(first_item)) => {
            let token = match first_item {
                Some(start) => {
                    let mut open = Token::new(TokenKind::OrderedListOpen);
                    if start != 1 {
                        open.attr_set("start", start.to_string());
                    }
                    open
                }
                None => Token::new(TokenKind::BulletListOpen),
            };
            state.push_block(token);
        }
        Event::End(TagEnd::List(ordered)) => {
            let kind = if ordered {
                TokenKind::OrderedListClose
            } else {
                TokenKind::BulletListClose
            };
            state.push_block(Token::new(kind));
        }
        Event::Start(Tag::Item) => {
            state.push_block(Token::new(TokenKind::ListItemOpen));
        }
        Event::End(TagEnd::Item) => {
            state.push_block(Token::new(TokenKind::ListItemClose));
        }

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.close_implicit_paragraph();
            let token = match kind {
                CodeBlockKind::Fenced(info) => {
                    let mut fence = Token::new(TokenKind::Fence);
                    fence.info = info.into_string();
                    fence
                }
                CodeBlockKind::Indented => Token::new(TokenKind::CodeBlock),
            };
            state.code_block = Some(token);
        }
        Event::End(TagEnd::CodeBlock) => {
            if let Some(token) = state.code_block.take() {
                state.tokens.push(token);
            }
        }

        // Raw HTML
        Event::Start(Tag::HtmlBlock) => {
            state.push_block(Token::new(TokenKind::HtmlBlock));
            state.in_html_block = true;
        }
        Event::End(TagEnd::HtmlBlock) => {
            state.in_html_block = false;
        }
        Event::Html(html) => {
            let continues_block = state.in_html_block
                && state
                    .tokens
                    .last()
                    .is_some_and(|last| last.kind == TokenKind::HtmlBlock);
            if !continues_block {
                state.push_block(Token::html_block(html.into_string()));
            } else if let Some(last) = state.tokens.last_mut() {
                last.content.push_str(&html);
            }
        }
        Event::InlineHtml(html) => {
            state.push_child(Token::html_inline(html.into_string()));
        }

        // Text content
        Event::Text(text) => {
            if let Some(code) = state.code_block.as_mut() {
                code.content.push_str(&text);
            } else if let Some(image) = state.image.as_mut() {
                image.content.push_str(&text);
            } else {
                state.push_child(Token::text(text.into_string()));
            }
        }
        Event::Code(code) => {
            state.push_child(Token::with_content(TokenKind::CodeInline, code.into_string()));
        }

        // Emphasis
        Event::Start(Tag::Strong) => state.push_child(Token::new(TokenKind::StrongOpen)),
        Event::End(TagEnd::Strong) => state.push_child(Token::new(TokenKind::StrongClose)),
        Event::Start(Tag::Emphasis) => state.push_child(Token::new(TokenKind::EmOpen)),
        Event::End(TagEnd::Emphasis) => state.push_child(Token::new(TokenKind::EmClose)),
        Event::Start(Tag::Strikethrough) => {
            state.push_child(Token::new(TokenKind::StrikethroughOpen));
        }
        Event::End(TagEnd::Strikethrough) => {
            state.push_child(Token::new(TokenKind::StrikethroughClose));
        }

        // Links
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => {
            let mut open = Token::new(TokenKind::LinkOpen);
            open.attr_set("href", dest_url.into_string());
            if !title.is_empty() {
                open.attr_set("title", title.into_string());
            }
            state.push_child(open);
        }
        Event::End(TagEnd::Link) => state.push_child(Token::new(TokenKind::LinkClose)),

        // Images collect their alt text until the end tag
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            let mut image = Token::new(TokenKind::Image);
            image.attr_set("src", dest_url.into_string());
            if !title.is_empty() {
                image.attr_set("title", title.into_string());
            }
            state.image = Some(image);
        }
        Event::End(TagEnd::Image) => {
            if let Some(image) = state.image.take() {
                state.push_child(image);
            }
        }

        // Soft/hard breaks
        Event::SoftBreak => state.push_child(Token::new(TokenKind::Softbreak)),
        Event::HardBreak => state.push_child(Token::new(TokenKind::Hardbreak)),

        // Horizontal rule
        Event::Rule => state.push_block(Token::new(TokenKind::Hr)),

        // Ignore other events
        _ => {}
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::token::TokenKind::{self, *};

    fn kinds(markdown: &str) -> Vec<TokenKind> {
        parse(markdown).iter().map(|token| token.kind).collect()
    }

    #[test]
    fn paragraph() {
        let tokens = parse("Hello world");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![ParagraphOpen, Inline, ParagraphClose]
        );
        assert_eq!(tokens[1].children.len(), 1);
        assert_eq!(tokens[1].children[0].content, "Hello world");
        assert!(!tokens[0].hidden);
    }

    #[test]
    fn quoted_list_item() {
        let tokens = parse("1. > **Host (NZ)** Hello");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                OrderedListOpen,
                ListItemOpen,
                BlockquoteOpen,
                ParagraphOpen,
                Inline,
                ParagraphClose,
                BlockquoteClose,
                ListItemClose,
                OrderedListClose,
            ]
        );
        let children: Vec<_> = tokens[4]
            .children
            .iter()
            .map(|c| (c.kind, c.content.as_str()))
            .collect();
        assert_eq!(
            children,
            vec![
                (StrongOpen, ""),
                (Text, "Host (NZ)"),
                (StrongClose, ""),
                (Text, " Hello"),
            ]
        );
    }

    #[test]
    fn tight_list_items_get_hidden_paragraphs() {
        let tokens = parse("- one\n- two");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                BulletListOpen,
                ListItemOpen,
                ParagraphOpen,
                Inline,
                ParagraphClose,
                ListItemClose,
                ListItemOpen,
                ParagraphOpen,
                Inline,
                ParagraphClose,
                ListItemClose,
                BulletListClose,
            ]
        );
        assert!(tokens[2].hidden);
        assert!(tokens[4].hidden);
    }

    #[test]
    fn tight_item_with_nested_list() {
        assert_eq!(
            kinds("1. one\n   - two"),
            vec![
                OrderedListOpen,
                ListItemOpen,
                ParagraphOpen,
                Inline,
                ParagraphClose,
                BulletListOpen,
                ListItemOpen,
                ParagraphOpen,
                Inline,
                ParagraphClose,
                ListItemClose,
                BulletListClose,
                ListItemClose,
                OrderedListClose,
            ]
        );
    }

    #[test]
    fn ordered_list_start() {
        let tokens = parse("3. three\n4. four");
        assert_eq!(tokens[0].attr_get("start"), Some("3"));
        assert_eq!(parse("1. one")[0].attr_get("start"), None);
    }

    #[test]
    fn adjacent_text_is_joined() {
        let tokens = parse("a [b c");
        assert_eq!(tokens[1].children.len(), 1);
        assert_eq!(tokens[1].children[0].content, "a [b c");
    }

    #[test]
    fn frontmatter_is_stripped() {
        let tokens = parse("---\ntitle: x\n---\n\nBody");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].content, "Body");
    }

    #[test]
    fn heading_and_rule() {
        assert_eq!(
            kinds("## Title\n\n---"),
            vec![HeadingOpen(2), Inline, HeadingClose(2), Hr]
        );
    }

    #[test]
    fn code_block_keeps_info() {
        let tokens = parse("```rust\nlet x = 1;\n```");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, Fence);
        assert_eq!(tokens[0].info, "rust");
        assert_eq!(tokens[0].content, "let x = 1;\n");
    }

    #[test]
    fn html_block_content() {
        let tokens = parse("<div>\nhi\n</div>");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, HtmlBlock);
        assert!(tokens[0].content.starts_with("<div>\nhi\n</div>"));
    }

    #[test]
    fn links_and_images() {
        let tokens = parse("[a](/x \"t\") ![alt](/i.png)");
        let children = &tokens[1].children;
        assert_eq!(children[0].kind, LinkOpen);
        assert_eq!(children[0].attr_get("href"), Some("/x"));
        assert_eq!(children[0].attr_get("title"), Some("t"));
        let image = children.iter().find(|c| c.kind == Image).unwrap();
        assert_eq!(image.attr_get("src"), Some("/i.png"));
        assert_eq!(image.content, "alt");
    }
}
