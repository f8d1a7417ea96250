//! Verilog IR.

use crate::utils::indent;

const INDENT: usize = 4;

/// Module.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Module {
    /// Module name.
    pub name: String,

    /// Port declarations.
    pub port_decls: Vec<PortDeclaration>,

    /// Module items.
    pub module_items: Vec<ModuleItem>,
}

impl ToString for Module {
    fn to_string(&self) -> String {
        format!(
            "`timescale 1ns / 1ps\n\nmodule {}\n(\n{}\n);\n\n{}\n\nendmodule",
            self.name,
            indent(
                self.port_decls.iter().map(|port_decl| port_decl.to_string()).collect::<Vec<_>>().join(",\n"),
                INDENT
            ),
            gen_verilog_module(&self.module_items)
        )
    }
}

/// Generates Verilog code for module items.
pub fn gen_verilog_module(module: &[ModuleItem]) -> String {
    module.iter().map(|item| item.to_string()).collect::<Vec<_>>().join("\n\n")
}

/// Module item.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ModuleItem {
    /// Declarations.
    Declarations(Vec<Declaration>),

    /// Continuous assignments.
    ContinuousAssigns(Vec<ContinuousAssign>),

    /// Always construct.
    AlwaysConstruct(String, Vec<Statement>),

    /// Comment. (Comment before items, comment after items, items)
    Commented(String, Option<String>, Vec<ModuleItem>),
}

impl ToString for ModuleItem {
    fn to_string(&self) -> String {
        match self {
            ModuleItem::Declarations(decls) => decls.iter().map(|decl| decl.to_string()).collect::<Vec<_>>().join("\n"),
            ModuleItem::ContinuousAssigns(conts) => {
                conts.iter().map(|cont| cont.to_string()).collect::<Vec<_>>().join("\n")
            }
            ModuleItem::AlwaysConstruct(event, stmts) => {
                format!(
                    "{} begin\n{}\nend",
                    event,
                    indent(stmts.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"), INDENT)
                )
            }
            ModuleItem::Commented(comment_before, comment_after, items) => {
                format!(
                    "/*\n{}\n*/\n{}{}",
                    indent(comment_before.clone(), INDENT),
                    items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join("\n\n"),
                    comment_after.as_ref().map_or("".to_string(), |c| format!("\n/* {} */", c))
                )
            }
        }
    }
}

/// Port declaration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PortDeclaration {
    /// Input declaration.
    Input(usize, String),

    /// Output declaration.
    Output(usize, String),
}

impl ToString for PortDeclaration {
    fn to_string(&self) -> String {
        match self {
            Self::Input(width, ident) => {
                if *width > 1 {
                    format!("input wire [{}-1:0] {}", width, ident)
                } else {
                    format!("input wire {}", ident)
                }
            }
            Self::Output(width, ident) => {
                if *width > 1 {
                    format!("output wire [{}-1:0] {}", width, ident)
                } else {
                    format!("output wire {}", ident)
                }
            }
        }
    }
}

impl PortDeclaration {
    /// Creates new input port declaration.
    pub fn input(width: usize, ident: String) -> Self { Self::Input(width, ident) }

    /// Creates new output port declaration.
    pub fn output(width: usize, ident: String) -> Self { Self::Output(width, ident) }
}

/// Declaration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Declaration {
    /// Net declaration. (width, ident, trailing comment)
    Net(usize, String, Option<String>),

    /// Reg declaration. (width, ident, init value, trailing comment)
    Reg(usize, String, Option<Expression>, Option<String>),

    /// Localparam declaration.
    Localparam(String, Expression),
}

impl Declaration {
    /// Net declaration.
    #[inline]
    pub fn net(width: usize, ident: String) -> Self { Declaration::Net(width, ident, None) }

    /// Reg declaration with no init value.
    #[inline]
    pub fn reg(width: usize, ident: String) -> Self { Declaration::Reg(width, ident, None, None) }

    /// Localparam declaration.
    #[inline]
    pub fn localparam(ident: String, value: Expression) -> Self { Declaration::Localparam(ident, value) }

    /// Attaches an init value to a reg declaration.
    #[must_use]
    pub fn with_init(self, init: Expression) -> Self {
        match self {
            Declaration::Reg(width, ident, None, comment) => Declaration::Reg(width, ident, Some(init), comment),
            _ => panic!("with_init: self is not an uninitialized reg"),
        }
    }

    /// Attaches a trailing comment to a net or reg declaration.
    #[must_use]
    pub fn with_comment(self, comment: String) -> Self {
        match self {
            Declaration::Net(width, ident, None) => Declaration::Net(width, ident, Some(comment)),
            Declaration::Reg(width, ident, init, None) => Declaration::Reg(width, ident, init, Some(comment)),
            _ => panic!("with_comment: declaration already carries a comment"),
        }
    }
}

fn fmt_comment(comment: &Option<String>) -> String {
    comment.as_ref().map_or("".to_string(), |c| format!(" // {}", c))
}

impl ToString for Declaration {
    /// Generates verilog code.
    fn to_string(&self) -> String {
        match self {
            Self::Net(width, ident, comment) => {
                if *width > 1 {
                    format!("wire [{}-1:0] {};{}", width, ident, fmt_comment(comment))
                } else {
                    format!("wire {};{}", ident, fmt_comment(comment))
                }
            }
            Self::Reg(width, ident, Some(expr), comment) => {
                if *width > 1 {
                    format!("reg [{}-1:0] {} = {};{}", width, ident, expr.to_string(), fmt_comment(comment))
                } else {
                    format!("reg {} = {};{}", ident, expr.to_string(), fmt_comment(comment))
                }
            }
            Self::Reg(width, ident, None, comment) => {
                if *width > 1 {
                    format!("reg [{}-1:0] {};{}", width, ident, fmt_comment(comment))
                } else {
                    format!("reg {};{}", ident, fmt_comment(comment))
                }
            }
            Self::Localparam(ident, value) => format!("localparam {} = {};", ident, value.to_string()),
        }
    }
}

/// Continuous assign.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContinuousAssign(pub Expression, pub Expression);

impl ToString for ContinuousAssign {
    fn to_string(&self) -> String { format!("assign {} = {};", self.0.to_string(), self.1.to_string()) }
}

impl ContinuousAssign {
    /// Creates new continuous assign.
    pub fn new(lvalue: Expression, expr: Expression) -> Self { Self(lvalue, expr) }
}

/// Statement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    /// Blocking assignment.
    BlockingAssignment(Expression, Expression),

    /// Nonblocking assignment.
    NonblockingAssignment(Expression, Expression),

    /// Conditional statement.
    Conditional(Expression, Vec<Statement>, Vec<Statement>),

    /// Case statement.
    Case(Expression, Vec<(Expression, Vec<Statement>)>, Vec<Statement>),
}

impl Statement {
    /// Blocking assignment.
    #[inline]
    pub fn blocking_assignment(lvalue: Expression, expr: Expression) -> Self {
        assert!(
            matches!(lvalue, Expression::Primary(Primary::HierarchicalIdentifier(_, _))),
            "lvalue should be hierarchical identifier"
        );
        Statement::BlockingAssignment(lvalue, expr)
    }

    /// Nonblocking assignment.
    #[inline]
    pub fn nonblocking_assignment(lvalue: Expression, expr: Expression) -> Self {
        assert!(
            matches!(lvalue, Expression::Primary(Primary::HierarchicalIdentifier(_, _))),
            "lvalue should be hierarchical identifier"
        );
        Statement::NonblockingAssignment(lvalue, expr)
    }
}

impl ToString for Statement {
    fn to_string(&self) -> String {
        match self {
            Self::BlockingAssignment(lvalue, expr) => {
                format!("{} = {};", lvalue.to_string(), expr.to_string())
            }
            Self::NonblockingAssignment(lvalue, expr) => {
                format!("{} <= {};", lvalue.to_string(), expr.to_string())
            }
            Self::Conditional(cond, then_stmt, else_stmt) if else_stmt.is_empty() => {
                format!(
                    "if ({}) begin\n{}\nend",
                    cond.to_string(),
                    indent(then_stmt.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"), INDENT),
                )
            }
            Self::Conditional(cond, then_stmt, else_stmt) => {
                format!(
                    "if ({}) begin\n{}\nend else begin\n{}\nend",
                    cond.to_string(),
                    indent(then_stmt.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"), INDENT),
                    indent(else_stmt.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"), INDENT),
                )
            }
            Self::Case(case_expr, case_items, default) => {
                let case_items_code = case_items.iter().map(|(cond, stmt)| {
                    format!(
                        "{}: begin\n{}\nend",
                        cond.to_string(),
                        indent(stmt.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"), INDENT)
                    )
                });

                format!(
                    "case ({})\n{}{}\nendcase",
                    case_expr.to_string(),
                    indent(case_items_code.collect::<Vec<_>>().join("\n"), INDENT),
                    if default.is_empty() {
                        "".to_string()
                    } else {
                        indent(
                            format!(
                                "\ndefault: begin\n{}\nend",
                                indent(
                                    default.iter().map(|stmt| stmt.to_string()).collect::<Vec<_>>().join("\n"),
                                    INDENT
                                ),
                            ),
                            INDENT,
                        )
                    }
                )
            }
        }
    }
}

/// Unary operator.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum UnaryOp {
    /// Logical negation: `!`
    Negation,
}

impl ToString for UnaryOp {
    fn to_string(&self) -> String {
        match self {
            Self::Negation => "!".to_string(),
        }
    }
}

/// Binary operator.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BinaryOp {
    /// Equality: `==`
    Eq,

    /// Inequality: `!=`
    Neq,

    /// Less-than: `<`
    Lt,

    /// Less-or-equal: `<=`
    Le,

    /// Greater-or-equal: `>=`
    Ge,

    /// Addition: `+`
    Add,

    /// Logical and: `&&`
    LogicalAnd,

    /// Logical or: `||`
    LogicalOr,
}

impl ToString for BinaryOp {
    fn to_string(&self) -> String {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
        }
        .to_string()
    }
}

/// Expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Expression {
    /// Primary.
    Primary(Primary),

    /// Unary expression.
    Unary(UnaryOp, Primary),

    /// Binary expression.
    Binary(Box<Expression>, BinaryOp, Box<Expression>),

    /// Conditional expression.
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
}

/// Range.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Range {
    /// Index: `[index]`
    Index(Box<Expression>),

    /// Range: `[base +: offset]`
    Range(Box<Expression>, Box<Expression>),
}

/// Primary.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Primary {
    /// Number.
    Number(String),

    /// Hierarchical identifier.
    HierarchicalIdentifier(String, Option<Range>),

    /// Function call.
    FunctionCall(FunctionCall),

    /// Mintypmax expression.
    MintypmaxExpression(Box<Expression>),
}

/// Function call.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct FunctionCall {
    /// Function name.
    pub func_name: String,

    /// Function arguments.
    pub args: Vec<Expression>,
}

impl ToString for FunctionCall {
    fn to_string(&self) -> String {
        format!("{}({})", self.func_name, self.args.iter().map(|expr| expr.to_string()).collect::<Vec<_>>().join(", "))
    }
}

impl ToString for Expression {
    fn to_string(&self) -> String {
        match self {
            Self::Primary(prim) => prim.to_string(),
            Self::Unary(op, prim) => format!("{}{}", op.to_string(), prim.to_string()),
            Self::Binary(lhs, op, rhs) => format!("{} {} {}", lhs.to_string(), op.to_string(), rhs.to_string()),
            Self::Conditional(cond, then_expr, else_expr) => {
                format!("{} ? {} : {}", cond.to_string(), then_expr.to_string(), else_expr.to_string(),)
            }
        }
    }
}

impl From<String> for Expression {
    fn from(ident: String) -> Self { Expression::ident(ident) }
}

impl Expression {
    /// Number.
    pub fn number(num: String) -> Self { Self::Primary(Primary::Number(num)) }

    /// Identifier.
    pub fn ident(ident: String) -> Self { Self::Primary(Primary::HierarchicalIdentifier(ident, None)) }

    /// Restricts an identifier expression to a bit range.
    pub fn with_range(self, range: Range) -> Self {
        if let Expression::Primary(Primary::HierarchicalIdentifier(ident, None)) = self {
            Expression::Primary(Primary::HierarchicalIdentifier(ident, Some(range)))
        } else {
            panic!("with_range: self is not an identifier")
        }
    }

    /// Mintypmax expression.
    pub fn mintypmax_expr(expr: Expression) -> Self { Self::Primary(Primary::MintypmaxExpression(Box::new(expr))) }

    /// Function call.
    pub fn function_call(func_name: &str, args: Vec<Expression>) -> Self {
        Self::Primary(Primary::FunctionCall(FunctionCall { func_name: func_name.to_string(), args }))
    }

    /// Unary operation.
    pub fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary(
            op,
            if let Self::Primary(prim) = expr { prim } else { Primary::MintypmaxExpression(Box::new(expr)) },
        )
    }

    /// Binary operation.
    pub fn binary(op: BinaryOp, mut lhs: Expression, mut rhs: Expression) -> Self {
        // Operands of binary operation should be primary.
        if !lhs.is_primary() {
            lhs = Expression::mintypmax_expr(lhs);
        }

        if !rhs.is_primary() {
            rhs = Expression::mintypmax_expr(rhs);
        }

        Self::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    /// Conditional expression.
    pub fn conditional(cond: Expression, then_expr: Expression, else_expr: Expression) -> Self {
        Self::Conditional(Box::new(cond), Box::new(then_expr), Box::new(else_expr))
    }

    /// Returns `true` if the expression is primary.
    pub fn is_primary(&self) -> bool { matches!(self, Self::Primary(_)) }
}

impl ToString for Range {
    fn to_string(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Range(base, offset) => {
                format!("{} +: {}", base.to_string(), offset.to_string())
            }
        }
    }
}

impl Range {
    /// Creates new index.
    pub fn new_index(index: Expression) -> Self { Self::Index(Box::new(index)) }

    /// Creates new range.
    pub fn new_range(base: Expression, offset: Expression) -> Self { Self::Range(Box::new(base), Box::new(offset)) }
}

impl ToString for Primary {
    fn to_string(&self) -> String {
        match self {
            Self::Number(num) => num.clone(),
            Self::HierarchicalIdentifier(ident, Some(range)) => {
                format!("{}[{}]", ident.clone(), range.to_string())
            }
            Self::HierarchicalIdentifier(ident, None) => ident.clone(),
            Self::FunctionCall(function_call) => function_call.to_string(),
            Self::MintypmaxExpression(expr) => format!("({})", expr.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_render_widths_and_comments() {
        assert_eq!(Declaration::net(1, "hit".to_string()).to_string(), "wire hit;");
        assert_eq!(
            Declaration::reg(32, "rdata_reg".to_string())
                .with_init(Expression::number("32'b0".to_string()))
                .with_comment("latched read data".to_string())
                .to_string(),
            "reg [32-1:0] rdata_reg = 32'b0; // latched read data"
        );
        assert_eq!(
            Declaration::localparam("RESP_SLVERR".to_string(), Expression::number("2'b10".to_string())).to_string(),
            "localparam RESP_SLVERR = 2'b10;"
        );
    }

    #[test]
    fn binary_wraps_non_primary_operands() {
        let lhs = Expression::binary(
            BinaryOp::Ge,
            Expression::ident("addr".to_string()),
            Expression::number("0".to_string()),
        );
        let both = Expression::binary(BinaryOp::LogicalAnd, lhs, Expression::ident("hit".to_string()));
        assert_eq!(both.to_string(), "(addr >= 0) && hit", "non-primary operands gain parentheses");
    }

    #[test]
    fn case_statement_renders_default_branch() {
        let stmt = Statement::Case(
            Expression::ident("state".to_string()),
            vec![(Expression::number("0".to_string()), vec![Statement::nonblocking_assignment(
                Expression::ident("state".to_string()),
                Expression::number("1".to_string()),
            )])],
            vec![Statement::nonblocking_assignment(
                Expression::ident("state".to_string()),
                Expression::number("0".to_string()),
            )],
        );
        let text = stmt.to_string();
        assert!(text.contains("case (state)"), "case head present: {}", text);
        assert!(text.contains("default: begin"), "default branch present: {}", text);
    }
}
