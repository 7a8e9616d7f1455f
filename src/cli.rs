//! Dump-format pretty-printing for the `-tok`/`-ast` CLI flags (spec.md §6).
//!
//! Kept separate from `main.rs` so the formatting itself is unit-testable
//! without going through argument parsing or file I/O.

use std::fmt::Write as _;

use crate::ast::{ChannelKind, ConstValue, Expr, Module, Param, Stmt};
use crate::token::Token;

/// One token per line: `({lexeme, TAG}, line) | line: N` — [`Token`]'s
/// `Display` impl already produces exactly this format.
pub fn dump_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        let _ = writeln!(out, "{}", tok);
    }
    out
}

/// Structured, indented AST dump: one node per line, naming the node kind,
/// its resolved type (for expressions), its originating token, and its
/// child fields in the order they're declared on the AST.
pub fn dump_ast(module: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Module");
    for stmt in &module.stmts {
        write_stmt(&mut out, stmt, 1);
    }
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Decl { name, ty, init, token } => {
            let _ = writeln!(out, "Decl {{ name: {:?}, ty: {}, token: {} }}", name, ty, token);
            if let Some(e) = init {
                indent(out, depth + 1);
                let _ = writeln!(out, "init:");
                write_expr(out, e, depth + 2);
            }
        }
        Stmt::Assign { target, value, token } => {
            let _ = writeln!(out, "Assign {{ target: {:?}, token: {} }}", target, token);
            indent(out, depth + 1);
            let _ = writeln!(out, "value:");
            write_expr(out, value, depth + 2);
        }
        Stmt::If { cond, then_branch, else_branch, token } => {
            let _ = writeln!(out, "If {{ token: {} }}", token);
            indent(out, depth + 1);
            let _ = writeln!(out, "cond:");
            write_expr(out, cond, depth + 2);
            indent(out, depth + 1);
            let _ = writeln!(out, "then:");
            for s in then_branch {
                write_stmt(out, s, depth + 2);
            }
            if let Some(else_branch) = else_branch {
                indent(out, depth + 1);
                let _ = writeln!(out, "else:");
                for s in else_branch {
                    write_stmt(out, s, depth + 2);
                }
            }
        }
        Stmt::While { cond, body, token } => {
            let _ = writeln!(out, "While {{ token: {} }}", token);
            indent(out, depth + 1);
            let _ = writeln!(out, "cond:");
            write_expr(out, cond, depth + 2);
            indent(out, depth + 1);
            let _ = writeln!(out, "body:");
            for s in body {
                write_stmt(out, s, depth + 2);
            }
        }
        Stmt::FuncDef { name, params, ret, body, token } => {
            let _ = writeln!(
                out,
                "FuncDef {{ name: {:?}, params: {}, ret: {}, token: {} }}",
                name,
                format_params(params),
                ret,
                token
            );
            indent(out, depth + 1);
            let _ = writeln!(out, "body:");
            for s in body {
                write_stmt(out, s, depth + 2);
            }
        }
        Stmt::Par { body, token } => {
            let _ = writeln!(out, "Par {{ token: {} }}", token);
            for s in body {
                write_stmt(out, s, depth + 1);
            }
        }
        Stmt::Seq { body, token } => {
            let _ = writeln!(out, "Seq {{ token: {} }}", token);
            for s in body {
                write_stmt(out, s, depth + 1);
            }
        }
        Stmt::ChannelDecl { name, kind, host, port, token } => {
            let kind_str = match kind {
                ChannelKind::Client => "client",
                ChannelKind::Server => "server",
            };
            let _ = writeln!(
                out,
                "ChannelDecl {{ name: {:?}, kind: {}, token: {} }}",
                name, kind_str, token
            );
            indent(out, depth + 1);
            let _ = writeln!(out, "host:");
            write_expr(out, host, depth + 2);
            indent(out, depth + 1);
            let _ = writeln!(out, "port:");
            write_expr(out, port, depth + 2);
        }
        Stmt::Return { value, token } => {
            let _ = writeln!(out, "Return {{ token: {} }}", token);
            if let Some(e) = value {
                write_expr(out, e, depth + 1);
            }
        }
        Stmt::Break { token } => {
            let _ = writeln!(out, "Break {{ token: {} }}", token);
        }
        Stmt::Continue { token } => {
            let _ = writeln!(out, "Continue {{ token: {} }}", token);
        }
        Stmt::ExprStmt { expr, token } => {
            let _ = writeln!(out, "ExprStmt {{ token: {} }}", token);
            write_expr(out, expr, depth + 1);
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize) {
    indent(out, depth);
    match expr {
        Expr::Constant { value, ty, token } => {
            let v = match value {
                ConstValue::Number(n) => n.to_string(),
                ConstValue::Str(s) => format!("{:?}", s),
                ConstValue::Bool(b) => b.to_string(),
            };
            let _ = writeln!(out, "Constant {{ value: {}, ty: {}, token: {} }}", v, ty, token);
        }
        Expr::Id { name, ty, token } => {
            let _ = writeln!(out, "Id {{ name: {:?}, ty: {}, token: {} }}", name, ty, token);
        }
        Expr::Arithmetic { op, left, right, ty, token } => {
            let _ = writeln!(out, "Arithmetic {{ op: {:?}, ty: {}, token: {} }}", op, ty, token);
            write_expr(out, left, depth + 1);
            write_expr(out, right, depth + 1);
        }
        Expr::Relational { op, left, right, ty, token } => {
            let _ = writeln!(out, "Relational {{ op: {:?}, ty: {}, token: {} }}", op, ty, token);
            write_expr(out, left, depth + 1);
            write_expr(out, right, depth + 1);
        }
        Expr::Logical { op, left, right, ty, token } => {
            let _ = writeln!(out, "Logical {{ op: {:?}, ty: {}, token: {} }}", op, ty, token);
            write_expr(out, left, depth + 1);
            write_expr(out, right, depth + 1);
        }
        Expr::Unary { op, operand, ty, token } => {
            let _ = writeln!(out, "Unary {{ op: {:?}, ty: {}, token: {} }}", op, ty, token);
            write_expr(out, operand, depth + 1);
        }
        Expr::Call { callee, args, oper, ty, token } => {
            let _ = writeln!(
                out,
                "Call {{ callee: {:?}, oper: {:?}, ty: {}, token: {} }}",
                callee, oper, ty, token
            );
            for a in args {
                write_expr(out, a, depth + 1);
            }
        }
    }
}

fn format_params(params: &[Param]) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect();
    format!("[{}]", rendered.join(", "))
}
