//! AST for filter expressions.

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `( expr )`
    Paren(Box<FilterExpr>),
    /// `left && right`
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// `left || right`
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// `field op literal`
    Comparison(Comparison),
}

impl FilterExpr {
    /// The same expression with every parenthetical node removed.
    ///
    /// Grouping is already encoded in the tree shape, so two filters that
    /// differ only in redundant parentheses strip to the same tree.
    pub fn without_parens(&self) -> FilterExpr {
        match self {
            FilterExpr::Paren(inner) => inner.without_parens(),
            FilterExpr::And(l, r) => {
                FilterExpr::And(Box::new(l.without_parens()), Box::new(r.without_parens()))
            }
            FilterExpr::Or(l, r) => {
                FilterExpr::Or(Box::new(l.without_parens()), Box::new(r.without_parens()))
            }
            FilterExpr::Comparison(c) => FilterExpr::Comparison(c.clone()),
        }
    }
}

impl std::fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterExpr::Paren(inner) => write!(f, "({})", inner),
            FilterExpr::And(l, r) => write!(f, "{} && {}", l, r),
            FilterExpr::Or(l, r) => write!(f, "{} || {}", l, r),
            FilterExpr::Comparison(c) => write!(f, "{}", c),
        }
    }
}

/// A single comparison between a field and a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: LeftValue,
    pub op: CompareOp,
    pub right: FilterLiteral,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`: case-insensitive on text.
    Equal,
    /// `===`: exact.
    StrictEqual,
    /// `!=`: case-insensitive on text.
    NotEqual,
    /// `!==`: exact.
    NotStrictEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl CompareOp {
    /// `<`, `<=`, `>`, `>=`
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::Greater | CompareOp::GreaterOrEqual | CompareOp::Less | CompareOp::LessOrEqual
        )
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, CompareOp::NotEqual | CompareOp::NotStrictEqual)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, CompareOp::StrictEqual | CompareOp::NotStrictEqual)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::StrictEqual => "===",
            CompareOp::NotEqual => "!=",
            CompareOp::NotStrictEqual => "!==",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Left-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeftValue {
    /// `field`
    Field(String),
    /// `relation.field`
    DotAccessor { relation: String, field: String },
}

impl LeftValue {
    pub fn relation(&self) -> Option<&str> {
        match self {
            LeftValue::Field(_) => None,
            LeftValue::DotAccessor { relation, .. } => Some(relation),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            LeftValue::Field(field) | LeftValue::DotAccessor { field, .. } => field,
        }
    }
}

impl std::fmt::Display for LeftValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeftValue::Field(field) => write!(f, "{}", field),
            LeftValue::DotAccessor { relation, field } => write!(f, "{}.{}", relation, field),
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterLiteral {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FilterLiteral {
    pub fn kind(&self) -> &'static str {
        match self {
            FilterLiteral::String(_) => "string",
            FilterLiteral::Integer(_) => "integer",
            FilterLiteral::Float(_) => "float",
            FilterLiteral::Bool(_) => "boolean",
            FilterLiteral::Null => "null",
        }
    }
}

impl std::fmt::Display for FilterLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterLiteral::String(s) => write!(f, "'{}'", s),
            FilterLiteral::Integer(n) => write!(f, "{}", n),
            FilterLiteral::Float(n) => write!(f, "{}", n),
            FilterLiteral::Bool(b) => write!(f, "{}", b),
            FilterLiteral::Null => write!(f, "null"),
        }
    }
}
