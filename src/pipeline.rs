use tracing::debug;

use crate::config::Config;
use crate::parser;
use crate::recognizer::recognize;
use crate::rewriter::rewrite;
use crate::token::Token;

/// A pass over the complete token stream, run after parsing and before
/// rendering.
pub trait CoreRule: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, tokens: &mut Vec<Token>);
}

/// Parser followed by a chain of core rules, run in the order they were pushed.
#[derive(Default)]
pub struct Pipeline {
    rules: Vec<Box<dyn CoreRule>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the end of the chain.
    pub fn push(mut self, rule: impl CoreRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Parse markdown and run every rule over the resulting tokens.
    pub fn process(&self, markdown: &str) -> Vec<Token> {
        let mut tokens = parser::parse(markdown);
        self.run(&mut tokens);
        tokens
    }

    /// Run every rule over an already parsed stream.
    pub fn run(&self, tokens: &mut Vec<Token>) {
        for rule in &self.rules {
            debug!(rule = rule.name(), tokens = tokens.len(), "running core rule");
            rule.apply(tokens);
        }
    }
}

/// Wraps conversation lists and decorates their exchanges.
#[derive(Debug, Clone, Default)]
pub struct ConversationRule {
    config: Config,
}

impl ConversationRule {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl CoreRule for ConversationRule {
    fn name(&self) -> &str {
        "conversation"
    }

    fn apply(&self, tokens: &mut Vec<Token>) {
        let conversations = recognize(tokens, &self.config);
        rewrite(tokens, &conversations, &self.config);
    }
}
