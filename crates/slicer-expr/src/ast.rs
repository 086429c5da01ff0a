//! Formula syntax tree.

/// Parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Bare name, resolved against the scope and then the builtin table
    Name(String),
    List(Vec<Expr>),
    /// `math.<name>` used as a value (e.g. `math.pi`)
    MathAttr(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Short-circuit `and` / `or`, returning the deciding operand
    Logical {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Chained comparison: `a < b <= c` is `first=a, rest=[(<, b), (<=, c)]`
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },
    /// `body if test else orelse`
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
}

/// Target of a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `name(...)`
    Name(String),
    /// `math.name(...)`
    Math(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }
}

impl Expr {
    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::None
            | Expr::Bool(_)
            | Expr::Int(_)
            | Expr::Float(_)
            | Expr::Str(_)
            | Expr::Name(_)
            | Expr::MathAttr(_) => {}
            Expr::List(items) => items.iter().for_each(|e| e.walk(visit)),
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Compare { first, rest } => {
                first.walk(visit);
                rest.iter().for_each(|(_, e)| e.walk(visit));
            }
            Expr::Conditional { test, body, orelse } => {
                body.walk(visit);
                test.walk(visit);
                orelse.walk(visit);
            }
            Expr::Call { args, .. } => args.iter().for_each(|e| e.walk(visit)),
            Expr::Subscript { value, index } => {
                value.walk(visit);
                index.walk(visit);
            }
        }
    }
}
