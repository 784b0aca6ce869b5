use super::{LexHandler, LexPattern, LexRule, Lexer, TokenSelector};
use crate::{GrammarError, ValueImpl, EOF_TOKEN};

/// A fluent builder assembling the ordered lexeme rule list of a [Lexer].
///
/// Rules are matched in the order they are added; place the more specific rule first when
/// two rules can match the same prefix.
///
/// # Example
/// ```
/// use lang_lr::{LexerBuilder, TokenSelector};
/// use serde_json::Value;
///
/// let mut lexer = LexerBuilder::<Value>::new()
///     .skip(r"\s+")
///     .unwrap()
///     .select(
///         r"[a-z]+",
///         TokenSelector::new(|_, lexeme| match lexeme {
///             "if" | "else" => Some("keyword".to_string()),
///             _ => Some("id".to_string()),
///         }),
///     )
///     .unwrap()
///     .build();
///
/// lexer.reset("if x");
/// assert_eq!(lexer.next_token().unwrap().name, "keyword");
/// assert_eq!(lexer.next_token().unwrap().name, "id");
/// ```
pub struct LexerBuilder<V: ValueImpl> {
    rules: Vec<LexRule<V>>,
    eof_name: String,
    eof_value: V,
}

impl<V: ValueImpl> LexerBuilder<V> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            eof_name: EOF_TOKEN.to_string(),
            eof_value: V::null(),
        }
    }

    fn rule(mut self, rule: LexRule<V>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a regex rule producing tokens of the given name with the default
    /// [from_lexeme](ValueImpl::from_lexeme) value.
    pub fn token(self, name: &str, pattern: &str) -> Result<Self, GrammarError> {
        Ok(self.rule(LexRule {
            name: Some(name.to_string()),
            pattern: LexPattern::regexp(pattern)?,
            handler: None,
            selector: None,
        }))
    }

    /// Add a regex rule with a handler computing the token value.
    pub fn token_with(
        self,
        name: &str,
        pattern: &str,
        handler: LexHandler<V>,
    ) -> Result<Self, GrammarError> {
        Ok(self.rule(LexRule {
            name: Some(name.to_string()),
            pattern: LexPattern::regexp(pattern)?,
            handler: Some(handler),
            selector: None,
        }))
    }

    /// Add a regex rule whose token name is chosen per match by the selector.
    pub fn select(self, pattern: &str, selector: TokenSelector<V>) -> Result<Self, GrammarError> {
        Ok(self.rule(LexRule {
            name: None,
            pattern: LexPattern::regexp(pattern)?,
            handler: None,
            selector: Some(selector),
        }))
    }

    /// Add a regex rule with both a value handler and a name selector.
    pub fn select_with(
        self,
        pattern: &str,
        handler: LexHandler<V>,
        selector: TokenSelector<V>,
    ) -> Result<Self, GrammarError> {
        Ok(self.rule(LexRule {
            name: None,
            pattern: LexPattern::regexp(pattern)?,
            handler: Some(handler),
            selector: Some(selector),
        }))
    }

    /// Add a literal string rule.
    pub fn literal(self, name: &str, value: &str) -> Self {
        self.rule(LexRule {
            name: Some(name.to_string()),
            pattern: LexPattern::Literal(value.to_string()),
            handler: None,
            selector: None,
        })
    }

    /// Add a literal string rule with a handler computing the token value.
    pub fn literal_with(self, name: &str, value: &str, handler: LexHandler<V>) -> Self {
        self.rule(LexRule {
            name: Some(name.to_string()),
            pattern: LexPattern::Literal(value.to_string()),
            handler: Some(handler),
            selector: None,
        })
    }

    /// Add a regex rule whose matches are discarded (whitespace, comments).
    pub fn skip(self, pattern: &str) -> Result<Self, GrammarError> {
        Ok(self.rule(LexRule {
            name: None,
            pattern: LexPattern::regexp(pattern)?,
            handler: None,
            selector: None,
        }))
    }

    /// Configure the name and value of the end-of-input token.
    pub fn eof(mut self, name: &str, value: V) -> Self {
        self.eof_name = name.to_string();
        self.eof_value = value;
        self
    }

    /// Append all rules of another builder after the rules of this one.
    pub fn merge(mut self, other: Self) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn build(self) -> Lexer<V> {
        Lexer::new(self.rules, self.eof_name, self.eof_value)
    }
}

impl<V: ValueImpl> Default for LexerBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ValueImpl> Clone for LexerBuilder<V> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            eof_name: self.eof_name.clone(),
            eof_value: self.eof_value.clone(),
        }
    }
}
