mod config;
mod conversation;
mod parser;
mod pipeline;
mod recognizer;
mod rewriter;
mod token;

pub use config::{Config, ConfigError, Icon};
pub use conversation::{Conversation, Country, Exchange};
pub use pipeline::{ConversationRule, CoreRule, Pipeline};
pub use recognizer::recognize;
pub use rewriter::rewrite;
pub use token::{Token, TokenKind, dump};

/// Parse markdown text into a flat token stream.
pub fn parse(markdown: &str) -> Vec<Token> {
    parser::parse(markdown)
}

/// Decorate every conversation in `tokens` using default config.
pub fn transform(tokens: &mut Vec<Token>) {
    transform_with_config(tokens, &Config::default())
}

/// Decorate every conversation in `tokens` with custom config.
pub fn transform_with_config(tokens: &mut Vec<Token>, config: &Config) {
    let conversations = recognize(tokens, config);
    rewrite(tokens, &conversations, config);
}

/// Parse markdown and decorate conversations using default config.
pub fn markdown_to_tokens(markdown: &str) -> Vec<Token> {
    markdown_to_tokens_with_config(markdown, &Config::default())
}

/// Parse markdown and decorate conversations with custom config.
pub fn markdown_to_tokens_with_config(markdown: &str, config: &Config) -> Vec<Token> {
    Pipeline::new()
        .push(ConversationRule::new(config.clone()))
        .process(markdown)
}
