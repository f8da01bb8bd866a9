//! Finds conversation lists in a token stream.
//!
//! A conversation is an ordered list whose first item opens with a block
//! quote. Each item is expected to look like:
//!
//! ```text
//! list_item_open
//!   blockquote_open
//!     paragraph_open
//!       inline: strong_open, text (speaker label), strong_close, text (speech)
//!     paragraph_close
//!   blockquote_close
//! list_item_close
//! ```
//!
//! The scan is a single pass that never mutates the stream.

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::conversation::{Conversation, Country, Exchange};
use crate::token::{Token, TokenKind};

/// Collect every conversation in `tokens`, in document order.
pub fn recognize(tokens: &[Token], config: &Config) -> Vec<Conversation> {
    let mut conversations = Vec::new();
    let mut scan = Scan::Outside;

    for (index, token) in tokens.iter().enumerate() {
        scan = match scan {
            Scan::Outside => {
                if starts_conversation(tokens, index) {
                    Scan::Inside(Pending::new(index))
                } else {
                    if token.kind == TokenKind::OrderedListOpen {
                        trace!(index, "ordered list is not a conversation");
                    }
                    Scan::Outside
                }
            }
            Scan::Inside(mut pending) => match pending.step(index, token, config) {
                Some(_) if pending.decorated => {
                    trace!(open = pending.open, "conversation already decorated");
                    Scan::Outside
                }
                Some(conversation) => {
                    debug!(
                        open = conversation.open,
                        close = conversation.close,
                        exchanges = conversation.exchanges.len(),
                        "recognized conversation"
                    );
                    conversations.push(conversation);
                    Scan::Outside
                }
                None => Scan::Inside(pending),
            },
        };
    }

    if let Scan::Inside(pending) = scan {
        warn!(open = pending.open, "conversation list never closed, ignoring it");
    }

    conversations
}

/// `ordered_list_open`, `list_item_open`, `blockquote_open` in a row.
fn starts_conversation(tokens: &[Token], index: usize) -> bool {
    let Some([list, item, quote]) = tokens.get(index..index + 3) else {
        return false;
    };
    list.kind == TokenKind::OrderedListOpen
        && item.kind == TokenKind::ListItemOpen
        && quote.kind == TokenKind::BlockquoteOpen
}

enum Scan {
    Outside,
    Inside(Pending),
}

/// A conversation whose closing token has not been seen yet.
struct Pending {
    open: usize,
    exchanges: Vec<Exchange>,
    current: Option<ItemScan>,
    // Lists nested inside an exchange; their tokens are skipped
    nested_lists: usize,
    // Some item already carries the exchange class from an earlier run
    decorated: bool,
}

impl Pending {
    fn new(open: usize) -> Self {
        Self {
            open,
            exchanges: Vec::new(),
            current: None,
            nested_lists: 0,
            decorated: false,
        }
    }

    /// Feed one token. Returns the finished conversation at its list close.
    fn step(&mut self, index: usize, token: &Token, config: &Config) -> Option<Conversation> {
        if self.nested_lists > 0 {
            if token.kind.is_list_open() {
                self.nested_lists += 1;
            } else if token.kind.is_list_close() {
                self.nested_lists -= 1;
            }
            return None;
        }

        match token.kind {
            TokenKind::OrderedListClose => {
                return Some(Conversation {
                    open: self.open,
                    close: index,
                    exchanges: std::mem::take(&mut self.exchanges),
                });
            }
            kind if kind.is_list_open() => {
                self.nested_lists += 1;
            }
            TokenKind::ListItemOpen => {
                let exchange_class = config.element_class("exchange");
                if token.attr_get("class") == Some(exchange_class.as_str()) {
                    self.decorated = true;
                }
                self.current = Some(ItemScan::new(index));
            }
            TokenKind::ListItemClose => {
                if let Some(item) = self.current.take() {
                    let mut exchange = item.exchange;
                    exchange.item_close = Some(index);
                    self.exchanges.push(exchange);
                }
            }
            _ => {
                if let Some(item) = self.current.as_mut() {
                    item.step(index, token, config);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Item,
    Quoted,
    InParagraph,
    Spoken,
    ParagraphDone,
    QuoteDone,
}

struct ItemScan {
    exchange: Exchange,
    stage: Stage,
    // Quotes inside (or after) the exchange's own quote
    nested_quotes: usize,
}

impl ItemScan {
    fn new(item_open: usize) -> Self {
        Self {
            exchange: Exchange::new(item_open),
            stage: Stage::Item,
            nested_quotes: 0,
        }
    }

    fn step(&mut self, index: usize, token: &Token, config: &Config) {
        match (self.stage, token.kind) {
            (Stage::Item, TokenKind::BlockquoteOpen) => {
                self.exchange.quote_open = Some(index);
                self.stage = Stage::Quoted;
            }
            (_, TokenKind::BlockquoteOpen) => {
                self.nested_quotes += 1;
            }
            (_, TokenKind::BlockquoteClose) if self.nested_quotes > 0 => {
                self.nested_quotes -= 1;
            }
            (
                Stage::Quoted | Stage::InParagraph | Stage::Spoken | Stage::ParagraphDone,
                TokenKind::BlockquoteClose,
            ) => {
                self.exchange.quote_close = Some(index);
                self.stage = Stage::QuoteDone;
            }
            (Stage::Quoted, TokenKind::ParagraphOpen) if self.nested_quotes == 0 => {
                self.exchange.paragraph_open = Some(index);
                self.stage = Stage::InParagraph;
            }
            (Stage::InParagraph, TokenKind::Inline) => {
                self.exchange.inline = Some(index);
                read_inline(&mut self.exchange, token, config);
                self.stage = Stage::Spoken;
            }
            (Stage::InParagraph | Stage::Spoken, TokenKind::ParagraphClose) => {
                self.exchange.paragraph_close = Some(index);
                self.stage = Stage::ParagraphDone;
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Label {
    Before,
    Open,
    Closed,
}

/// Pull the speaker label and speech out of the paragraph's inline children.
fn read_inline(exchange: &mut Exchange, inline: &Token, config: &Config) {
    let mut label = Label::Before;

    for (index, child) in inline.children.iter().enumerate() {
        match (child.kind, label) {
            (TokenKind::StrongOpen, Label::Before) => {
                exchange.label_open = Some(index);
                label = Label::Open;
            }
            (TokenKind::StrongClose, Label::Open) => {
                exchange.label_close = Some(index);
                label = Label::Closed;
            }
            (TokenKind::Text, Label::Open) => {
                exchange.label_text = Some(index);
                read_label(exchange, &child.content, config);
            }
            // After the label, or with no label at all
            (TokenKind::Text, _) => {
                exchange.speech_text = Some(index);
                exchange.speech = Some(child.content.trim().to_string());
            }
            _ => {}
        }
    }
}

fn read_label(exchange: &mut Exchange, label: &str, config: &Config) {
    let label = label.trim();
    match config.match_icon(label) {
        Some((at, icon)) => {
            exchange.speaker = Some(label[..at].trim().to_string());
            exchange.country = Some(Country {
                title: icon.title.clone(),
                icon: icon.icon.clone(),
            });
        }
        None => {
            exchange.speaker = None;
            exchange.country = None;
        }
    }
}
