//! Decorates recognized conversations in place.
//!
//! All indices in the descriptors refer to the stream as the recognizer saw
//! it. Attribute, `hidden` and content changes are made first, then new
//! tokens are spliced in from the highest index down so no pending index
//! moves.

use tracing::{debug, trace};

use crate::config::Config;
use crate::conversation::{Conversation, Exchange};
use crate::token::Token;

pub fn rewrite(tokens: &mut Vec<Token>, conversations: &[Conversation], config: &Config) {
    let mut insertions: Vec<(usize, Token)> = Vec::new();

    for conversation in conversations {
        if conversation.complete_exchanges().next().is_none() {
            trace!(open = conversation.open, "conversation has no complete exchange");
            continue;
        }

        insertions.push((conversation.open, wrapper_open(config)));
        for exchange in &conversation.exchanges {
            if !exchange.is_complete() {
                trace!(item = exchange.item_open, "skipping incomplete exchange");
                continue;
            }
            if let Some(cite) = rewrite_exchange(tokens, exchange, config) {
                insertions.push(cite);
            }
        }
        insertions.push((conversation.close + 1, wrapper_close(config)));

        debug!(
            open = conversation.open,
            exchanges = conversation.complete_exchanges().count(),
            "decorated conversation"
        );
    }

    splice_back_to_front(tokens, insertions);
}

/// Insert each token before the given index. Entries sharing an index keep
/// their relative order.
fn splice_back_to_front(tokens: &mut Vec<Token>, mut insertions: Vec<(usize, Token)>) {
    insertions.sort_by_key(|(index, _)| *index);
    for (index, token) in insertions.into_iter().rev() {
        let index = index.min(tokens.len());
        tokens.insert(index, token);
    }
}

/// Mutate one exchange's tokens and return the citation to insert.
fn rewrite_exchange(
    tokens: &mut [Token],
    exchange: &Exchange,
    config: &Config,
) -> Option<(usize, Token)> {
    let quote_open = exchange.quote_open?;
    let paragraph_open = exchange.paragraph_open?;
    let inline = exchange.inline?;

    tokens
        .get_mut(exchange.item_open)?
        .attr_set("class", config.element_class("exchange"));
    tokens
        .get_mut(quote_open)?
        .attr_set("class", config.element_class("speaker"));
    tokens
        .get_mut(paragraph_open)?
        .attr_set("class", config.element_class("speech"));

    let inline = tokens.get_mut(inline)?;
    for index in [exchange.label_open, exchange.label_close].into_iter().flatten() {
        if let Some(child) = inline.children.get_mut(index) {
            child.hidden = true;
        }
    }
    for index in [exchange.label_text, exchange.speech_text].into_iter().flatten() {
        if let Some(child) = inline.children.get_mut(index) {
            child.content.clear();
        }
    }
    inline.children.insert(0, speech_liner(exchange, config));

    Some((quote_open + 1, citation(exchange, config)))
}

// `wrapper_tag` is checked by `Config::validate` when loaded from TOML
fn wrapper_open(config: &Config) -> Token {
    Token::html_block(format!(
        "<{} class=\"{}\">",
        config.wrapper_tag,
        escape_html(&config.wrapper_class)
    ))
}

fn wrapper_close(config: &Config) -> Token {
    Token::html_block(format!("</{}>", config.wrapper_tag))
}

fn citation(exchange: &Exchange, config: &Config) -> Token {
    let speaker = exchange.speaker.as_deref().unwrap_or_default();
    let (title, icon) = exchange
        .country
        .as_ref()
        .map(|country| (country.title.as_str(), country.icon.as_str()))
        .unwrap_or_default();

    Token::html_block(format!(
        "<cite class=\"{}\">\n{}\n<img src=\"{}\" alt=\"{}.\">\n</cite>\n",
        config.element_class("name"),
        escape_html(speaker),
        escape_html(icon),
        escape_html(title),
    ))
}

fn speech_liner(exchange: &Exchange, config: &Config) -> Token {
    let speech = exchange.speech.as_deref().unwrap_or_default();
    Token::html_inline(format!(
        "\n<span class=\"{}\">{}</span>\n",
        config.element_class("speech-liner"),
        escape_html(speech),
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::recognizer::recognize;
    use crate::token::TokenKind;

    fn transform(markdown: &str, config: &Config) -> Vec<Token> {
        let mut tokens = parse(markdown);
        let conversations = recognize(&tokens, config);
        rewrite(&mut tokens, &conversations, config);
        tokens
    }

    fn count_containing(tokens: &[Token], needle: &str) -> usize {
        tokens
            .iter()
            .flat_map(|token| std::iter::once(token).chain(token.children.iter()))
            .filter(|token| token.content.contains(needle))
            .count()
    }

    #[test]
    fn host_scenario() {
        let config = Config {
            wrapper_class: "chat".to_string(),
            ..Config::default()
        };
        let tokens = transform("1. > **Host (NZ)** Hello", &config);

        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::HtmlBlock,
                TokenKind::OrderedListOpen,
                TokenKind::ListItemOpen,
                TokenKind::BlockquoteOpen,
                TokenKind::HtmlBlock,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::BlockquoteClose,
                TokenKind::ListItemClose,
                TokenKind::OrderedListClose,
                TokenKind::HtmlBlock,
            ]
        );

        assert_eq!(tokens[0].content, "<Conversation class=\"chat\">");
        assert_eq!(tokens[11].content, "</Conversation>");
        assert_eq!(
            tokens[2].attr_get("class"),
            Some("wpdtrt-conversation__exchange")
        );
        assert_eq!(
            tokens[3].attr_get("class"),
            Some("wpdtrt-conversation__speaker")
        );
        assert_eq!(
            tokens[4].content,
            "<cite class=\"wpdtrt-conversation__name\">\nHost\n\
             <img src=\"/site/.vuepress/theme/images/flaticon/new-zealand.svg\" alt=\"New Zealand.\">\n\
             </cite>\n"
        );
        assert_eq!(
            tokens[5].attr_get("class"),
            Some("wpdtrt-conversation__speech")
        );

        let children = &tokens[6].children;
        assert_eq!(children.len(), 5);
        assert_eq!(children[0].kind, TokenKind::HtmlInline);
        assert_eq!(
            children[0].content,
            "\n<span class=\"wpdtrt-conversation__speech-liner\">Hello</span>\n"
        );
        assert_eq!(children[1].kind, TokenKind::StrongOpen);
        assert!(children[1].hidden);
        assert_eq!(children[2].content, "");
        assert!(children[3].hidden);
        assert_eq!(children[4].content, "");
    }

    #[test]
    fn unlabeled_speech_gets_empty_citation() {
        let tokens = transform("1. > Just text", &Config::default());
        assert_eq!(
            tokens[4].content,
            "<cite class=\"wpdtrt-conversation__name\">\n\n<img src=\"\" alt=\".\">\n</cite>\n"
        );
        let children = &tokens[6].children;
        assert_eq!(
            children[0].content,
            "\n<span class=\"wpdtrt-conversation__speech-liner\">Just text</span>\n"
        );
        assert_eq!(children[1].content, "");
    }

    #[test]
    fn one_citation_and_liner_per_exchange() {
        let markdown = "1. > **A (NZ)** one\n2. > **B (MN)** two\n3. > **C (NZ)** three";
        let tokens = transform(markdown, &Config::default());

        assert_eq!(count_containing(&tokens, "<Conversation"), 1);
        assert_eq!(count_containing(&tokens, "</Conversation>"), 1);
        assert_eq!(count_containing(&tokens, "<cite "), 3);
        assert_eq!(count_containing(&tokens, "__speech-liner"), 3);
        assert_eq!(tokens.len(), parse(markdown).len() + 2 + 3);

        // Each citation sits right after its block quote
        for (index, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::BlockquoteOpen {
                assert!(tokens[index + 1].content.starts_with("<cite "));
            }
        }
    }

    #[test]
    fn two_conversations_get_their_own_wrappers() {
        let tokens = transform(
            "1. > **A (NZ)** one\n\nBetween.\n\n1. > **B (MN)** two",
            &Config::default(),
        );
        let wrappers: Vec<_> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TokenKind::HtmlBlock && t.content.contains("Conversation"))
            .map(|(i, t)| (i, tokens[i + 1..].first().map(|n| n.kind), t.content.as_str()))
            .collect();
        assert_eq!(wrappers.len(), 4);
        assert_eq!(wrappers[0].1, Some(TokenKind::OrderedListOpen));
        assert_eq!(wrappers[1].2, "</Conversation>");
        assert_eq!(wrappers[1].1, Some(TokenKind::ParagraphOpen));
        assert_eq!(wrappers[2].1, Some(TokenKind::OrderedListOpen));
        assert_eq!(wrappers[3].2, "</Conversation>");
        assert_eq!(wrappers[3].0, tokens.len() - 1);
    }

    #[test]
    fn incomplete_exchanges_are_left_alone() {
        use TokenKind::*;
        let mut tokens: Vec<Token> = [
            OrderedListOpen,
            ListItemOpen,
            BlockquoteOpen,
            BlockquoteClose,
            ListItemClose,
            OrderedListClose,
        ]
        .into_iter()
        .map(Token::new)
        .collect();
        let before = tokens.clone();

        let conversations = recognize(&tokens, &Config::default());
        assert_eq!(conversations.len(), 1);
        rewrite(&mut tokens, &conversations, &Config::default());
        assert_eq!(tokens, before);
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let tokens = transform("1. > **A & B (NZ)** 1 < 2", &Config::default());
        assert!(tokens[4].content.contains("\nA &amp; B\n"));
        assert!(tokens[6].children[0].content.contains(">1 &lt; 2</span>"));
    }

    #[test]
    fn splice_keeps_order_for_shared_index() {
        let mut tokens = vec![Token::text("a"), Token::text("b")];
        splice_back_to_front(
            &mut tokens,
            vec![
                (1, Token::text("x")),
                (1, Token::text("y")),
                (0, Token::text("z")),
            ],
        );
        let contents: Vec<_> = tokens.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["z", "a", "x", "y", "b"]);
    }
}
