//! Descriptors produced by the recognizer and consumed by the rewriter.
//!
//! Every reference into the token stream is an index taken before any
//! rewriting happens. Indices inside an `inline` token refer to its children.

/// Country matched from a speaker label.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub title: String,
    pub icon: String,
}

/// One list item of a conversation: a speaker and what they said.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    pub item_open: usize,
    pub item_close: Option<usize>,
    pub quote_open: Option<usize>,
    pub quote_close: Option<usize>,
    pub paragraph_open: Option<usize>,
    pub paragraph_close: Option<usize>,
    pub inline: Option<usize>,

    // Children of `inline`
    pub label_open: Option<usize>,
    pub label_close: Option<usize>,
    pub label_text: Option<usize>,
    pub speech_text: Option<usize>,

    pub speaker: Option<String>,
    pub speech: Option<String>,
    pub country: Option<Country>,
}

impl Exchange {
    pub fn new(item_open: usize) -> Self {
        Self {
            item_open,
            ..Self::default()
        }
    }

    /// Whether every structural marker the rewriter touches was captured.
    pub fn is_complete(&self) -> bool {
        self.item_close.is_some()
            && self.quote_open.is_some()
            && self.quote_close.is_some()
            && self.paragraph_open.is_some()
            && self.paragraph_close.is_some()
            && self.inline.is_some()
    }
}

/// An ordered list recognized as a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub open: usize,
    pub close: usize,
    pub exchanges: Vec<Exchange>,
}

impl Conversation {
    pub fn complete_exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|exchange| exchange.is_complete())
    }
}
