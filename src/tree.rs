use crate::ValueImpl;
use ptree::TreeItem;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A plain syntax tree: the semantic value produced when a grammar carries no handlers.
///
/// Every reduction without a user callback folds the body values into a node named after
/// the produced non-terminal, and every terminal becomes a leaf holding its lexeme.
///
/// # Example
/// ```
/// use lang_lr::{GrammarBuilder, LexerBuilder, SynTree};
///
/// let mut lexer = LexerBuilder::<SynTree>::new()
///     .skip(r"\s+")
///     .unwrap()
///     .token("word", r"[a-z]+")
///     .unwrap()
///     .build();
///
/// let parser = GrammarBuilder::<SynTree>::new()
///     .bnf("S ::= word word ;", vec![])
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let tree = parser.parse_text(&mut lexer, "hello world").unwrap();
/// assert_eq!(tree.name, "S");
/// assert_eq!(tree.children[0].lexeme.as_deref(), Some("hello"));
/// ```
pub struct SynTree {
    pub name: String,
    pub lexeme: Option<String>,
    pub children: Vec<SynTree>,
}

impl SynTree {
    /// Create a leaf node holding the matched lexeme.
    pub fn leaf(lexeme: &str) -> Self {
        Self {
            name: String::new(),
            lexeme: Some(lexeme.to_string()),
            children: Vec::new(),
        }
    }

    /// Create an interior node.
    pub fn node(name: &str, children: Vec<SynTree>) -> Self {
        Self {
            name: name.to_string(),
            lexeme: None,
            children,
        }
    }

    /// Find the first node carrying the given name, searching through all nested children.
    pub fn find(&self, name: &str) -> Option<&SynTree> {
        if self.name == name {
            Some(self)
        } else {
            self.children.iter().find_map(|child| child.find(name))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Lexemes of all leaves below this node, in source order.
    pub fn leaves(&self) -> Vec<&str> {
        let mut collected = Vec::new();
        self.walk(&mut collected);
        collected
    }

    fn walk<'this>(&'this self, collected: &mut Vec<&'this str>) {
        if let Some(lexeme) = &self.lexeme {
            collected.push(lexeme);
        }
        for child in &self.children {
            child.walk(collected);
        }
    }

    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl Display for SynTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.lexeme {
            Some(lexeme) => write!(f, "{:?}", lexeme),
            None => write!(f, "{}", self.name),
        }
    }
}

impl ValueImpl for SynTree {
    fn null() -> Self {
        Self {
            name: String::new(),
            lexeme: None,
            children: Vec::new(),
        }
    }

    fn from_lexeme(lexeme: &str) -> Self {
        Self::leaf(lexeme)
    }

    fn aggregate(values: Vec<Self>) -> Self {
        Self::node("", values)
    }

    fn into_aggregate(self) -> Result<Vec<Self>, Self> {
        if self.lexeme.is_none() && self.name.is_empty() {
            Ok(self.children)
        } else {
            Err(self)
        }
    }

    fn reduce(head: &str, values: Vec<Self>) -> Self {
        Self::node(head, values)
    }
}

impl TreeItem for SynTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match &self.lexeme {
            Some(lexeme) => write!(f, "{:?}", lexeme),
            None => write!(f, "{}", self.name),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children)
    }
}
