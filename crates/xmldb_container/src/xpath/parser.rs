//! Recursive-descent parser producing the query AST.

use super::lexer::Token;
use crate::error::{ContainerError, ContainerResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(String),
    Number(f64),
    Path(LocationPath),
    Call(Function, Vec<Expr>),
    Binary(Box<Expr>, Op, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Contains,
    StartsWith,
    Not,
    Count,
    String,
    NormalizeSpace,
    Position,
    Last,
    True,
    False,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "not" => Self::Not,
            "count" => Self::Count,
            "string" => Self::String,
            "normalize-space" => Self::NormalizeSpace,
            "position" => Self::Position,
            "last" => Self::Last,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        })
    }

    fn arity(self) -> (usize, usize) {
        match self {
            Self::Contains | Self::StartsWith => (2, 2),
            Self::Not | Self::Count => (1, 1),
            Self::String | Self::NormalizeSpace => (0, 1),
            Self::Position | Self::Last | Self::True | Self::False => (0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    DescendantOrSelf,
    Attribute,
    SelfAxis,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    AnyName,
    Text,
    AnyNode,
}

/// Parsed form of `collection(...)` followed by predicates and a path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CollectionQuery {
    pub collection: Option<String>,
    pub filters: Vec<Expr>,
    pub path: Option<LocationPath>,
}

/// Bound on nested expressions and operator chains.
const MAX_DEPTH: usize = 128;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub(crate) fn parse_query(mut self) -> ContainerResult<CollectionQuery> {
        match self.advance() {
            Some(Token::Name(name)) if name == "collection" => {}
            _ => return Err(ContainerError::query("query must start with collection()")),
        }
        self.expect(&Token::LParen)?;
        let collection = match self.peek() {
            Some(Token::Literal(alias)) => {
                let alias = alias.clone();
                self.pos += 1;
                Some(alias)
            }
            _ => None,
        };
        self.expect(&Token::RParen)?;

        let filters = self.parse_predicates()?;

        let path = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                Some(self.parse_relative_path(Vec::new())?)
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                Some(self.parse_relative_path(vec![Step::descendant_or_self()])?)
            }
            _ => None,
        };

        if let Some(token) = self.peek() {
            return Err(ContainerError::query(format!("unexpected token {token:?}")));
        }

        Ok(CollectionQuery {
            collection,
            filters,
            path,
        })
    }

    fn parse_expr(&mut self) -> ContainerResult<Expr> {
        let depth = self.depth;
        let result = self.parse_or();
        self.depth = depth;
        result
    }

    fn parse_or(&mut self) -> ContainerResult<Expr> {
        self.descend()?;
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            self.descend()?;
            let right = self.parse_and()?;
            left = Expr::Binary(Box::new(left), Op::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ContainerResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat_keyword("and") {
            self.descend()?;
            let right = self.parse_equality()?;
            left = Expr::Binary(Box::new(left), Op::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ContainerResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => Op::Eq,
                Some(Token::Ne) => Op::Ne,
                _ => return Ok(left),
            };
            self.descend()?;
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
    }

    fn parse_relational(&mut self) -> ContainerResult<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => Op::Lt,
                Some(Token::Le) => Op::Le,
                Some(Token::Gt) => Op::Gt,
                Some(Token::Ge) => Op::Ge,
                _ => return Ok(left),
            };
            self.descend()?;
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
    }

    fn parse_primary(&mut self) -> ContainerResult<Expr> {
        match self.peek().cloned() {
            Some(Token::Literal(s)) => {
                self.pos += 1;
                Ok(Expr::Literal(s))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && !is_node_type(&name) =>
            {
                self.pos += 2;
                self.parse_call(&name)
            }
            Some(_) => Ok(Expr::Path(self.parse_location_path()?)),
            None => Err(ContainerError::query("unexpected end of expression")),
        }
    }

    fn parse_call(&mut self, name: &str) -> ContainerResult<Expr> {
        let function = Function::lookup(name)
            .ok_or_else(|| ContainerError::query(format!("unknown function {name}()")))?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_expr()?);
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                args.push(self.parse_expr()?);
            }
        }
        self.expect(&Token::RParen)?;

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            return Err(ContainerError::query(format!(
                "{name}() takes {min}..={max} arguments, got {}",
                args.len()
            )));
        }
        if function == Function::Count && !matches!(args[0], Expr::Path(_)) {
            return Err(ContainerError::query("count() expects a path"));
        }

        Ok(Expr::Call(function, args))
    }

    fn parse_location_path(&mut self) -> ContainerResult<LocationPath> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.at_step_start() {
                    let mut path = self.parse_relative_path(Vec::new())?;
                    path.absolute = true;
                    Ok(path)
                } else {
                    Ok(LocationPath {
                        absolute: true,
                        steps: Vec::new(),
                    })
                }
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut path = self.parse_relative_path(vec![Step::descendant_or_self()])?;
                path.absolute = true;
                Ok(path)
            }
            _ => self.parse_relative_path(Vec::new()),
        }
    }

    fn parse_relative_path(&mut self, mut steps: Vec<Step>) -> ContainerResult<LocationPath> {
        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self());
                }
                _ => break,
            }
            steps.push(self.parse_step()?);
        }
        Ok(LocationPath {
            absolute: false,
            steps,
        })
    }

    fn parse_step(&mut self) -> ContainerResult<Step> {
        let (axis, test) = match self.advance() {
            Some(Token::Dot) => (Axis::SelfAxis, NodeTest::AnyNode),
            Some(Token::DotDot) => (Axis::Parent, NodeTest::AnyNode),
            Some(Token::At) => match self.advance() {
                Some(Token::Name(name)) => (Axis::Attribute, NodeTest::Name(name)),
                Some(Token::Star) => (Axis::Attribute, NodeTest::AnyName),
                _ => return Err(ContainerError::query("expected attribute name after '@'")),
            },
            Some(Token::Star) => (Axis::Child, NodeTest::AnyName),
            Some(Token::Name(name)) => {
                if is_node_type(&name) && self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.expect(&Token::RParen)?;
                    let test = if name == "text" {
                        NodeTest::Text
                    } else {
                        NodeTest::AnyNode
                    };
                    (Axis::Child, test)
                } else {
                    (Axis::Child, NodeTest::Name(name))
                }
            }
            Some(token) => {
                return Err(ContainerError::query(format!(
                    "expected a location step, found {token:?}"
                )))
            }
            None => return Err(ContainerError::query("expected a location step")),
        };

        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicates(&mut self) -> ContainerResult<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.parse_expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }

    fn descend(&mut self) -> ContainerResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ContainerError::query("expression nested too deeply"));
        }
        Ok(())
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Name(name)) if name == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, expected: &Token) -> ContainerResult<()> {
        match self.advance() {
            Some(token) if &token == expected => Ok(()),
            Some(token) => Err(ContainerError::query(format!(
                "expected {expected:?}, found {token:?}"
            ))),
            None => Err(ContainerError::query(format!(
                "expected {expected:?}, found end of expression"
            ))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn is_node_type(name: &str) -> bool {
    name == "text" || name == "node"
}
