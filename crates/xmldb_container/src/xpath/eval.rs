//! Evaluation of parsed expressions against a `roxmltree` document.

use super::parser::{Axis, Expr, Function, LocationPath, NodeTest, Op, Step};
use roxmltree::{Node, NodeId};
use std::collections::HashSet;

/// A selected item: a tree node or an attribute of an element.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Item<'a, 'i> {
    Node(Node<'a, 'i>),
    Attr {
        owner: Node<'a, 'i>,
        index: usize,
        name: &'a str,
        value: &'a str,
    },
}

impl<'a, 'i> Item<'a, 'i> {
    fn key(&self) -> (NodeId, usize) {
        match self {
            Item::Node(node) => (node.id(), 0),
            Item::Attr { owner, index, .. } => (owner.id(), index + 1),
        }
    }

    fn string_value(&self) -> String {
        match self {
            Item::Node(node) if node.is_text() => node.text().unwrap_or_default().to_string(),
            Item::Node(node) if node.is_element() || node.is_root() => node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
            Item::Node(node) => node.text().unwrap_or_default().to_string(),
            Item::Attr { value, .. } => (*value).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Value<'a, 'i> {
    Items(Vec<Item<'a, 'i>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value<'_, '_> {
    pub(crate) fn boolean(&self) -> bool {
        match self {
            Value::Items(items) => !items.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn string(&self) -> String {
        match self {
            Value::Items(items) => items
                .first()
                .map(Item::string_value)
                .unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }
}

/// Evaluation context: the current item and its position in the
/// surrounding selection (1-based).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a, 'i> {
    pub item: Item<'a, 'i>,
    pub position: usize,
    pub size: usize,
}

impl<'a, 'i> Context<'a, 'i> {
    pub(crate) fn root(node: Node<'a, 'i>) -> Self {
        Self {
            item: Item::Node(node),
            position: 1,
            size: 1,
        }
    }
}

pub(crate) fn evaluate<'a, 'i>(expr: &Expr, ctx: &Context<'a, 'i>) -> Value<'a, 'i> {
    match expr {
        Expr::Literal(s) => Value::Str(s.clone()),
        Expr::Number(n) => Value::Num(*n),
        Expr::Path(path) => Value::Items(select(path, ctx.item)),
        Expr::Call(function, args) => call(*function, args, ctx),
        Expr::Binary(left, Op::Or, right) => {
            Value::Bool(evaluate(left, ctx).boolean() || evaluate(right, ctx).boolean())
        }
        Expr::Binary(left, Op::And, right) => {
            Value::Bool(evaluate(left, ctx).boolean() && evaluate(right, ctx).boolean())
        }
        Expr::Binary(left, op, right) => {
            Value::Bool(compare(&evaluate(left, ctx), &evaluate(right, ctx), *op))
        }
    }
}

/// Evaluates a predicate: numbers select by position, anything else by
/// its boolean value.
pub(crate) fn predicate_holds(expr: &Expr, ctx: &Context<'_, '_>) -> bool {
    match evaluate(expr, ctx) {
        Value::Num(n) => n == ctx.position as f64,
        other => other.boolean(),
    }
}

pub(crate) fn select<'a, 'i>(path: &LocationPath, start: Item<'a, 'i>) -> Vec<Item<'a, 'i>> {
    let origin = match (path.absolute, start) {
        (true, Item::Node(node)) => Item::Node(node.document().root()),
        (true, Item::Attr { owner, .. }) => Item::Node(owner.document().root()),
        (false, item) => item,
    };

    let mut current = vec![origin];
    for step in &path.steps {
        current = apply_step(step, &current);
        if current.is_empty() {
            break;
        }
    }
    current
}

fn apply_step<'a, 'i>(step: &Step, items: &[Item<'a, 'i>]) -> Vec<Item<'a, 'i>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for item in items {
        let mut candidates = axis_items(step, *item);
        for predicate in &step.predicates {
            let size = candidates.len();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(i, candidate)| {
                    let ctx = Context {
                        item: *candidate,
                        position: i + 1,
                        size,
                    };
                    predicate_holds(predicate, &ctx)
                })
                .map(|(_, candidate)| candidate)
                .collect();
        }
        for candidate in candidates {
            if seen.insert(candidate.key()) {
                out.push(candidate);
            }
        }
    }
    out
}

fn axis_items<'a, 'i>(step: &Step, item: Item<'a, 'i>) -> Vec<Item<'a, 'i>> {
    match item {
        Item::Node(node) => match step.axis {
            Axis::Child => node
                .children()
                .filter(|n| node_matches(&step.test, n))
                .map(Item::Node)
                .collect(),
            Axis::DescendantOrSelf => node
                .descendants()
                .filter(|n| node_matches(&step.test, n))
                .map(Item::Node)
                .collect(),
            Axis::Attribute => node
                .attributes()
                .enumerate()
                .filter(|(_, attr)| attribute_matches(&step.test, attr.name()))
                .map(|(index, attr)| Item::Attr {
                    owner: node,
                    index,
                    name: attr.name(),
                    value: attr.value(),
                })
                .collect(),
            Axis::SelfAxis => {
                if node_matches(&step.test, &node) {
                    vec![Item::Node(node)]
                } else {
                    Vec::new()
                }
            }
            Axis::Parent => node
                .parent()
                .filter(|n| node_matches(&step.test, n))
                .map(Item::Node)
                .into_iter()
                .collect(),
        },
        Item::Attr { owner, name, .. } => match step.axis {
            Axis::SelfAxis if attribute_matches(&step.test, name) => vec![item],
            Axis::Parent if node_matches(&step.test, &owner) => vec![Item::Node(owner)],
            _ => Vec::new(),
        },
    }
}

fn node_matches(test: &NodeTest, node: &Node<'_, '_>) -> bool {
    match test {
        NodeTest::Name(name) => node.is_element() && node.tag_name().name() == local_name(name),
        NodeTest::AnyName => node.is_element(),
        NodeTest::Text => node.is_text(),
        NodeTest::AnyNode => true,
    }
}

fn attribute_matches(test: &NodeTest, attr_name: &str) -> bool {
    match test {
        NodeTest::Name(name) => attr_name == local_name(name),
        NodeTest::AnyName | NodeTest::AnyNode => true,
        NodeTest::Text => false,
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn call<'a, 'i>(function: Function, args: &[Expr], ctx: &Context<'a, 'i>) -> Value<'a, 'i> {
    let arg = |i: usize| evaluate(&args[i], ctx);
    let string_arg = || match args.first() {
        Some(expr) => evaluate(expr, ctx).string(),
        None => ctx.item.string_value(),
    };

    match function {
        Function::Contains => Value::Bool(arg(0).string().contains(&arg(1).string())),
        Function::StartsWith => Value::Bool(arg(0).string().starts_with(&arg(1).string())),
        Function::Not => Value::Bool(!arg(0).boolean()),
        Function::Count => match arg(0) {
            Value::Items(items) => Value::Num(items.len() as f64),
            _ => Value::Num(0.0),
        },
        Function::String => Value::Str(string_arg()),
        Function::NormalizeSpace => {
            Value::Str(string_arg().split_whitespace().collect::<Vec<_>>().join(" "))
        }
        Function::Position => Value::Num(ctx.position as f64),
        Function::Last => Value::Num(ctx.size as f64),
        Function::True => Value::Bool(true),
        Function::False => Value::Bool(false),
    }
}

#[derive(Debug)]
enum Atom {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Atom {
    fn number(&self) -> f64 {
        match self {
            Atom::Str(s) => parse_number(s),
            Atom::Num(n) => *n,
            Atom::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    fn boolean(&self) -> bool {
        match self {
            Atom::Str(s) => !s.is_empty(),
            Atom::Num(n) => *n != 0.0 && !n.is_nan(),
            Atom::Bool(b) => *b,
        }
    }
}

fn compare(left: &Value<'_, '_>, right: &Value<'_, '_>, op: Op) -> bool {
    match (left, right) {
        (Value::Items(a), Value::Items(b)) => a.iter().any(|x| {
            b.iter().any(|y| {
                compare_atoms(
                    &Atom::Str(x.string_value()),
                    &Atom::Str(y.string_value()),
                    op,
                )
            })
        }),
        (Value::Items(items), Value::Bool(b)) => {
            compare_atoms(&Atom::Bool(!items.is_empty()), &Atom::Bool(*b), op)
        }
        (Value::Bool(b), Value::Items(items)) => {
            compare_atoms(&Atom::Bool(*b), &Atom::Bool(!items.is_empty()), op)
        }
        (Value::Items(items), other) => {
            let other = atom(other);
            items
                .iter()
                .any(|item| compare_atoms(&item_atom(item, &other), &other, op))
        }
        (other, Value::Items(items)) => {
            let other = atom(other);
            items
                .iter()
                .any(|item| compare_atoms(&other, &item_atom(item, &other), op))
        }
        (l, r) => compare_atoms(&atom(l), &atom(r), op),
    }
}

fn atom(value: &Value<'_, '_>) -> Atom {
    match value {
        Value::Str(s) => Atom::Str(s.clone()),
        Value::Num(n) => Atom::Num(*n),
        Value::Bool(b) => Atom::Bool(*b),
        Value::Items(_) => Atom::Str(value.string()),
    }
}

/// Converts a selected item to the type of the value it is compared with.
fn item_atom(item: &Item<'_, '_>, against: &Atom) -> Atom {
    let text = item.string_value();
    match against {
        Atom::Num(_) => Atom::Num(parse_number(&text)),
        _ => Atom::Str(text),
    }
}

fn compare_atoms(a: &Atom, b: &Atom, op: Op) -> bool {
    match op {
        Op::Eq | Op::Ne => {
            let equal = match (a, b) {
                (Atom::Bool(_), _) | (_, Atom::Bool(_)) => a.boolean() == b.boolean(),
                (Atom::Num(_), _) | (_, Atom::Num(_)) => a.number() == b.number(),
                (Atom::Str(x), Atom::Str(y)) => x == y,
            };
            if op == Op::Eq {
                equal
            } else {
                !equal
            }
        }
        Op::Lt => a.number() < b.number(),
        Op::Le => a.number() <= b.number(),
        Op::Gt => a.number() > b.number(),
        Op::Ge => a.number() >= b.number(),
        Op::Or | Op::And => unreachable!("logical operators are evaluated in evaluate()"),
    }
}

fn parse_number(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
