//! Recursive-descent parser with inline type checking (spec §4.2).
//!
//! Parsing and type checking happen in the same pass: every `Expr` is
//! constructed with its resolved `Type` already attached, and a type or
//! scope violation aborts parsing immediately with a `ParseError`.

use crate::ast::{ArithOp, ChannelKind, ConstValue, Expr, LogicOp, Module, Param, RelOp, Stmt, UnaryOp};
use crate::builtins;
use crate::error::ParseError;
use crate::symbol_table::SymbolTable;
use crate::token::{Token, TokenTag};
use crate::types::Type;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    symtab: SymbolTable,
    loop_depth: usize,
    /// `loop_depth` recorded at the start of each currently-open `par`
    /// block's body, innermost last. A `break`/`continue` only targets a
    /// `while` whose depth is *greater* than the top of this stack — one
    /// opened after the nearest enclosing `par`, i.e. inside the same `par`
    /// child's own thread. Otherwise the loop it names is outside the `par`
    /// boundary and the signal could never reach it (the child runs on its
    /// own OS thread), so it's rejected here rather than surfacing as a
    /// runtime error.
    par_boundaries: Vec<usize>,
    return_type_stack: Vec<Type>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            symtab: SymbolTable::new(),
            loop_depth: 0,
            par_boundaries: Vec::new(),
            return_type_stack: Vec::new(),
        }
    }

    pub fn parse_module(mut self) -> Result<Module, ParseError> {
        let mut stmts = Vec::new();
        while !self.at_eof() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Module { stmts })
    }

    // ---- token stream plumbing ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        self.peek().tag == TokenTag::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, tag: &TokenTag) -> bool {
        &self.peek().tag == tag
    }

    fn expect(&mut self, tag: TokenTag, what: &str) -> Result<Token, ParseError> {
        if self.check(&tag) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                self.peek().line,
                format!(
                    "expected {}, found '{}' ({})",
                    what,
                    self.peek().lexeme,
                    self.peek().tag
                ),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<Token, ParseError> {
        if matches!(self.peek().tag, TokenTag::Identifier) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                self.peek().line,
                format!("expected identifier, found '{}'", self.peek().lexeme),
            ))
        }
    }

    fn consume_optional_terminator(&mut self) {
        if self.check(&TokenTag::Semicolon) {
            self.advance();
        }
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let tok = self.advance();
        match tok.tag {
            TokenTag::KwNumber => Ok(Type::Number),
            TokenTag::KwString => Ok(Type::String),
            TokenTag::KwBool => Ok(Type::Bool),
            TokenTag::KwVoid => Ok(Type::Void),
            // A channel-typed variable is always *bound* by a ChannelDecl or
            // by `accept`; this keyword lets a plain Decl also name the
            // type explicitly, e.g. `c: c_channel = accept(s)`.
            TokenTag::KwCChannel => Ok(Type::CChannel),
            TokenTag::KwSChannel => Ok(Type::SChannel),
            _ => Err(ParseError::new(
                tok.line,
                format!("expected a type, found '{}'", tok.lexeme),
            )),
        }
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match &self.peek().tag {
            TokenTag::KwIf => self.parse_if(),
            TokenTag::KwWhile => self.parse_while(),
            TokenTag::KwFunc => self.parse_funcdef(),
            TokenTag::KwPar => self.parse_par(),
            TokenTag::KwSeq => self.parse_seq(),
            TokenTag::KwCChannel => self.parse_channel_decl(ChannelKind::Client),
            TokenTag::KwSChannel => self.parse_channel_decl(ChannelKind::Server),
            TokenTag::KwReturn => self.parse_return(),
            TokenTag::KwBreak => self.parse_break(),
            TokenTag::KwContinue => self.parse_continue(),
            TokenTag::Identifier => match self.peek_at(1).tag {
                TokenTag::Colon => self.parse_decl(),
                TokenTag::Assign => self.parse_assign(),
                TokenTag::LParen => self.parse_call_stmt(),
                _ => Err(ParseError::new(
                    self.peek().line,
                    format!("unexpected identifier '{}' in statement position", self.peek().lexeme),
                )),
            },
            other => Err(ParseError::new(
                self.peek().line,
                format!("unexpected token '{}' ({}) in statement position", self.peek().lexeme, other),
            )),
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.symtab.enter_scope();
        let stmts = self.parse_stmt_list_until_rbrace();
        self.symtab.exit_scope();
        stmts
    }

    fn parse_stmt_list_until_rbrace(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenTag::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenTag::RBrace) {
            if self.at_eof() {
                return Err(ParseError::new(self.peek().line, "unexpected end of file inside block"));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenTag::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_decl(&mut self) -> Result<Stmt, ParseError> {
        let name_tok = self.expect_identifier()?;
        let token = name_tok.clone();
        self.expect(TokenTag::Colon, "':'")?;
        let ty = self.parse_type()?;
        let init = if self.check(&TokenTag::Assign) {
            self.advance();
            let expr = self.parse_expr()?;
            if expr.ty() != &ty {
                return Err(ParseError::new(
                    token.line,
                    format!(
                        "cannot assign {} to '{}' declared as {}",
                        expr.ty(),
                        name_tok.lexeme,
                        ty
                    ),
                ));
            }
            Some(expr)
        } else {
            None
        };
        if !self.symtab.declare(&name_tok.lexeme, ty.clone()) {
            return Err(ParseError::new(
                token.line,
                format!("redeclaration of '{}'", name_tok.lexeme),
            ));
        }
        self.consume_optional_terminator();
        Ok(Stmt::Decl {
            name: name_tok.lexeme,
            ty,
            init,
            token,
        })
    }

    fn parse_assign(&mut self) -> Result<Stmt, ParseError> {
        let name_tok = self.expect_identifier()?;
        let declared_ty = self.symtab.lookup(&name_tok.lexeme).cloned().ok_or_else(|| {
            ParseError::new(
                name_tok.line,
                format!("assignment to undeclared identifier '{}'", name_tok.lexeme),
            )
        })?;
        self.expect(TokenTag::Assign, "'='")?;
        let value = self.parse_expr()?;
        if value.ty() != &declared_ty {
            return Err(ParseError::new(
                name_tok.line,
                format!(
                    "cannot assign {} to '{}' declared as {}",
                    value.ty(),
                    name_tok.lexeme,
                    declared_ty
                ),
            ));
        }
        self.consume_optional_terminator();
        Ok(Stmt::Assign {
            target: name_tok.lexeme.clone(),
            value,
            token: name_tok,
        })
    }

    fn parse_call_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.peek().clone();
        let expr = self.parse_call_expr()?;
        self.consume_optional_terminator();
        Ok(Stmt::ExprStmt { expr, token })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        self.expect(TokenTag::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.require_bool(&cond, "if condition")?;
        self.expect(TokenTag::RParen, "')'")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenTag::KwElse) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            token,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        self.expect(TokenTag::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.require_bool(&cond, "while condition")?;
        self.expect(TokenTag::RParen, "')'")?;
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        Ok(Stmt::While {
            cond,
            body: body?,
            token,
        })
    }

    fn parse_funcdef(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let name_tok = self.expect_identifier()?;
        self.expect(TokenTag::LParen, "'('")?;
        let params = self.parse_params()?;
        self.expect(TokenTag::RParen, "')'")?;
        self.expect(TokenTag::Arrow, "'->'")?;
        let ret = self.parse_type()?;

        let param_types: Vec<Type> = params.iter().map(|p| p.ty.clone()).collect();
        if !self.symtab.declare(&name_tok.lexeme, Type::func(param_types, ret.clone())) {
            return Err(ParseError::new(
                token.line,
                format!("redeclaration of '{}'", name_tok.lexeme),
            ));
        }

        self.symtab.enter_scope();
        for p in &params {
            self.symtab.declare(&p.name, p.ty.clone());
        }
        self.return_type_stack.push(ret.clone());
        let body = self.parse_stmt_list_until_rbrace();
        self.return_type_stack.pop();
        self.symtab.exit_scope();

        Ok(Stmt::FuncDef {
            name: name_tok.lexeme,
            params,
            ret,
            body: body?,
            token,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        if self.check(&TokenTag::RParen) {
            return Ok(params);
        }
        loop {
            let name_tok = self.expect_identifier()?;
            self.expect(TokenTag::Colon, "':'")?;
            let ty = self.parse_type()?;
            let default = if self.check(&TokenTag::Assign) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name: name_tok.lexeme,
                ty,
                default,
            });
            if self.check(&TokenTag::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(params)
    }

    fn parse_par(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        self.par_boundaries.push(self.loop_depth);
        let body = self.parse_block();
        self.par_boundaries.pop();
        Ok(Stmt::Par { body: body?, token })
    }

    fn parse_seq(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let body = self.parse_block()?;
        Ok(Stmt::Seq { body, token })
    }

    fn parse_channel_decl(&mut self, kind: ChannelKind) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let name_tok = self.expect_identifier()?;
        self.expect(TokenTag::LBrace, "'{'")?;
        let host = self.parse_expr()?;
        if host.ty() != &Type::String {
            return Err(ParseError::new(token.line, "channel host must be a string"));
        }
        self.expect(TokenTag::Comma, "','")?;
        let port = self.parse_expr()?;
        if port.ty() != &Type::Number {
            return Err(ParseError::new(token.line, "channel port must be a number"));
        }
        self.expect(TokenTag::RBrace, "'}'")?;

        let ty = match kind {
            ChannelKind::Client => Type::CChannel,
            ChannelKind::Server => Type::SChannel,
        };
        if !self.symtab.declare(&name_tok.lexeme, ty) {
            return Err(ParseError::new(
                token.line,
                format!("redeclaration of '{}'", name_tok.lexeme),
            ));
        }
        self.consume_optional_terminator();
        Ok(Stmt::ChannelDecl {
            name: name_tok.lexeme,
            kind,
            host,
            port,
            token,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let expected = self.return_type_stack.last().cloned().ok_or_else(|| {
            ParseError::new(token.line, "'return' outside a function body")
        })?;
        let value = if self.check(&TokenTag::Semicolon) || self.check(&TokenTag::RBrace) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let actual = value.as_ref().map(|e| e.ty().clone()).unwrap_or(Type::Void);
        if actual != expected {
            return Err(ParseError::new(
                token.line,
                format!("function declared to return {} but this return yields {}", expected, actual),
            ));
        }
        self.consume_optional_terminator();
        Ok(Stmt::Return { value, token })
    }

    fn parse_break(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        self.check_loop_exit_legal(&token, "break")?;
        self.consume_optional_terminator();
        Ok(Stmt::Break { token })
    }

    fn parse_continue(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        self.check_loop_exit_legal(&token, "continue")?;
        self.consume_optional_terminator();
        Ok(Stmt::Continue { token })
    }

    /// Shared legality check for `break`/`continue`: there must be an
    /// enclosing `while`, and that `while` must not lie on the far side of a
    /// `par` block boundary (see `par_boundaries`).
    fn check_loop_exit_legal(&self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.loop_depth == 0 {
            return Err(ParseError::new(token.line, format!("'{}' outside a while loop", what)));
        }
        let boundary = *self.par_boundaries.last().unwrap_or(&0);
        if self.loop_depth <= boundary {
            return Err(ParseError::new(
                token.line,
                format!("'{}' cannot cross a par block boundary into an enclosing while loop", what),
            ));
        }
        Ok(())
    }

    fn require_bool(&self, expr: &Expr, where_: &str) -> Result<(), ParseError> {
        if expr.ty() != &Type::Bool {
            return Err(ParseError::new(
                expr.token().line,
                format!("{} must be bool, found {}", where_, expr.ty()),
            ));
        }
        Ok(())
    }

    // ---- expressions, by ascending precedence ----

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenTag::OrOr) {
            let token = self.advance();
            let right = self.parse_and()?;
            self.require_bool(&left, "'||' operand")?;
            self.require_bool(&right, "'||' operand")?;
            left = Expr::Logical {
                op: LogicOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                ty: Type::Bool,
                token,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenTag::AndAnd) {
            let token = self.advance();
            let right = self.parse_equality()?;
            self.require_bool(&left, "'&&' operand")?;
            self.require_bool(&right, "'&&' operand")?;
            left = Expr::Logical {
                op: LogicOp::And,
                left: Box::new(left),
                right: Box::new(right),
                ty: Type::Bool,
                token,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_rel()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::EqEq => RelOp::Eq,
                TokenTag::NotEq => RelOp::NotEq,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_rel()?;
            if left.ty() != right.ty() || !matches!(left.ty(), Type::Number | Type::String | Type::Bool) {
                return Err(ParseError::new(
                    token.line,
                    format!("cannot compare {} to {}", left.ty(), right.ty()),
                ));
            }
            left = Expr::Relational {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Type::Bool,
                token,
            };
        }
        Ok(left)
    }

    fn parse_rel(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Lt => RelOp::Lt,
                TokenTag::LtEq => RelOp::LtEq,
                TokenTag::Gt => RelOp::Gt,
                TokenTag::GtEq => RelOp::GtEq,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_add()?;
            if left.ty() != right.ty() || !matches!(left.ty(), Type::Number | Type::String) {
                return Err(ParseError::new(
                    token.line,
                    format!("relational operands must both be number or both be string, found {} and {}", left.ty(), right.ty()),
                ));
            }
            left = Expr::Relational {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Type::Bool,
                token,
            };
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Plus => ArithOp::Add,
                TokenTag::Minus => ArithOp::Sub,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_mul()?;
            let ty = match (op, left.ty(), right.ty()) {
                (ArithOp::Add, Type::String, Type::String) => Type::String,
                (_, Type::Number, Type::Number) => Type::Number,
                _ => {
                    return Err(ParseError::new(
                        token.line,
                        format!("operator requires number operands (or string + string), found {} and {}", left.ty(), right.ty()),
                    ))
                }
            };
            left = Expr::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty,
                token,
            };
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Star => ArithOp::Mul,
                TokenTag::Slash => ArithOp::Div,
                TokenTag::Percent => ArithOp::Mod,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_unary()?;
            if left.ty() != &Type::Number || right.ty() != &Type::Number {
                return Err(ParseError::new(
                    token.line,
                    format!("operator requires number operands, found {} and {}", left.ty(), right.ty()),
                ));
            }
            left = Expr::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Type::Number,
                token,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().tag {
            TokenTag::Minus => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                if operand.ty() != &Type::Number {
                    return Err(ParseError::new(
                        token.line,
                        format!("unary '-' requires number, found {}", operand.ty()),
                    ));
                }
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    ty: Type::Number,
                    token,
                })
            }
            TokenTag::Bang => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                if operand.ty() != &Type::Bool {
                    return Err(ParseError::new(
                        token.line,
                        format!("unary '!' requires bool, found {}", operand.ty()),
                    ));
                }
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    ty: Type::Bool,
                    token,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        match tok.tag.clone() {
            TokenTag::Number(n) => {
                self.advance();
                Ok(Expr::Constant {
                    value: ConstValue::Number(n),
                    ty: Type::Number,
                    token: tok,
                })
            }
            TokenTag::String(s) => {
                self.advance();
                Ok(Expr::Constant {
                    value: ConstValue::Str(s),
                    ty: Type::String,
                    token: tok,
                })
            }
            TokenTag::KwTrue => {
                self.advance();
                Ok(Expr::Constant {
                    value: ConstValue::Bool(true),
                    ty: Type::Bool,
                    token: tok,
                })
            }
            TokenTag::KwFalse => {
                self.advance();
                Ok(Expr::Constant {
                    value: ConstValue::Bool(false),
                    ty: Type::Bool,
                    token: tok,
                })
            }
            TokenTag::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenTag::RParen, "')'")?;
                Ok(expr)
            }
            TokenTag::Identifier => {
                if self.peek_at(1).tag == TokenTag::LParen {
                    self.parse_call_expr()
                } else {
                    self.advance();
                    let ty = self.symtab.lookup(&tok.lexeme).cloned().ok_or_else(|| {
                        ParseError::new(tok.line, format!("undeclared identifier '{}'", tok.lexeme))
                    })?;
                    Ok(Expr::Id {
                        name: tok.lexeme.clone(),
                        ty,
                        token: tok,
                    })
                }
            }
            other => Err(ParseError::new(
                tok.line,
                format!("unexpected token '{}' ({}) in expression", tok.lexeme, other),
            )),
        }
    }

    fn parse_call_expr(&mut self) -> Result<Expr, ParseError> {
        let tok = self.advance();
        let name = tok.lexeme.clone();
        self.expect(TokenTag::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&TokenTag::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.check(&TokenTag::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenTag::RParen, "')'")?;

        if builtins::is_channel_op(&name) {
            return self.check_channel_call(name, args, tok);
        }
        if let Some(sig) = builtins::signature(&name) {
            return self.check_builtin_call(name, sig, args, tok);
        }

        let declared = self.symtab.lookup(&name).cloned().ok_or_else(|| {
            ParseError::new(tok.line, format!("undeclared identifier '{}'", name))
        })?;
        match declared {
            Type::Func(ft) => {
                if ft.params.len() != args.len() {
                    return Err(ParseError::new(
                        tok.line,
                        format!(
                            "'{}' expects {} argument(s), got {}",
                            name,
                            ft.params.len(),
                            args.len()
                        ),
                    ));
                }
                for (i, (expected, arg)) in ft.params.iter().zip(args.iter()).enumerate() {
                    if arg.ty() != expected {
                        return Err(ParseError::new(
                            tok.line,
                            format!(
                                "'{}' argument {} expects {}, got {}",
                                name,
                                i + 1,
                                expected,
                                arg.ty()
                            ),
                        ));
                    }
                }
                let ret = ft.ret.clone();
                Ok(Expr::Call {
                    callee: name,
                    args,
                    oper: None,
                    ty: ret,
                    token: tok,
                })
            }
            other => Err(ParseError::new(
                tok.line,
                format!("'{}' is not callable (has type {})", name, other),
            )),
        }
    }

    fn check_builtin_call(
        &self,
        name: String,
        sig: builtins::Signature,
        args: Vec<Expr>,
        tok: Token,
    ) -> Result<Expr, ParseError> {
        match sig.arity {
            builtins::Arity::Variadic => {
                for a in &args {
                    if !builtins::is_printable(a.ty()) {
                        return Err(ParseError::new(
                            tok.line,
                            format!("'{}' cannot print a value of type {}", name, a.ty()),
                        ));
                    }
                }
            }
            builtins::Arity::Fixed(n) => {
                if args.len() != n {
                    return Err(ParseError::new(
                        tok.line,
                        format!("'{}' expects {} argument(s), got {}", name, n, args.len()),
                    ));
                }
                for (i, (expected, arg)) in sig.params.iter().zip(args.iter()).enumerate() {
                    if arg.ty() != expected {
                        return Err(ParseError::new(
                            tok.line,
                            format!(
                                "'{}' argument {} expects {}, got {}",
                                name,
                                i + 1,
                                expected,
                                arg.ty()
                            ),
                        ));
                    }
                }
            }
        }
        Ok(Expr::Call {
            callee: name,
            args,
            oper: None,
            ty: sig.ret,
            token: tok,
        })
    }

    fn check_channel_call(&self, name: String, args: Vec<Expr>, tok: Token) -> Result<Expr, ParseError> {
        let arity_err = |expected: usize| {
            ParseError::new(
                tok.line,
                format!("'{}' expects {} argument(s), got {}", name, expected, args.len()),
            )
        };
        match name.as_str() {
            "accept" => {
                if args.len() != 1 {
                    return Err(arity_err(1));
                }
                if args[0].ty() != &Type::SChannel {
                    return Err(ParseError::new(tok.line, format!("'accept' requires an s_channel, got {}", args[0].ty())));
                }
                let ret = Type::CChannel;
                Ok(Expr::Call {
                    callee: name.clone(),
                    args,
                    oper: Some(name),
                    ty: ret,
                    token: tok,
                })
            }
            "send" => {
                if args.len() != 2 {
                    return Err(arity_err(2));
                }
                if args[0].ty() != &Type::CChannel {
                    return Err(ParseError::new(tok.line, format!("'send' requires a c_channel, got {}", args[0].ty())));
                }
                if args[1].ty() != &Type::String {
                    return Err(ParseError::new(tok.line, format!("'send' payload must be a string, got {}", args[1].ty())));
                }
                Ok(Expr::Call {
                    callee: name.clone(),
                    args,
                    oper: Some(name),
                    ty: Type::Void,
                    token: tok,
                })
            }
            "recv" => {
                if args.len() != 1 {
                    return Err(arity_err(1));
                }
                if args[0].ty() != &Type::CChannel {
                    return Err(ParseError::new(tok.line, format!("'recv' requires a c_channel, got {}", args[0].ty())));
                }
                Ok(Expr::Call {
                    callee: name.clone(),
                    args,
                    oper: Some(name),
                    ty: Type::String,
                    token: tok,
                })
            }
            "close" => {
                if args.len() != 1 {
                    return Err(arity_err(1));
                }
                if !matches!(args[0].ty(), Type::CChannel | Type::SChannel) {
                    return Err(ParseError::new(tok.line, format!("'close' requires a channel, got {}", args[0].ty())));
                }
                Ok(Expr::Call {
                    callee: name.clone(),
                    args,
                    oper: Some(name),
                    ty: Type::Void,
                    token: tok,
                })
            }
            _ => unreachable!("is_channel_op already filtered the name set"),
        }
    }
}

/// Convenience entry point: lexes and parses `source` in one call.
pub fn parse(source: &str) -> Result<Module, crate::error::MiniparError> {
    let tokens = crate::lexer::lex(source)?;
    Ok(Parser::new(tokens).parse_module()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Module {
        parse(src).unwrap_or_else(|e| panic!("expected parse to succeed for {:?}, got {}", src, e))
    }

    fn parse_err(src: &str) -> crate::error::MiniparError {
        parse(src).expect_err(&format!("expected parse to fail for {:?}", src))
    }

    #[test]
    fn decl_with_init() {
        let m = parse_ok("x: number = 3");
        assert_eq!(m.stmts.len(), 1);
        assert!(matches!(m.stmts[0], Stmt::Decl { .. }));
    }

    #[test]
    fn decl_type_mismatch_is_error() {
        parse_err("x: number = \"oops\"");
    }

    #[test]
    fn redeclaration_in_same_scope_is_error() {
        parse_err("x: number = 1\nx: number = 2");
    }

    #[test]
    fn assignment_to_undeclared_is_error() {
        parse_err("x = 1");
    }

    #[test]
    fn while_requires_bool_condition() {
        parse_err("while (1) { }");
    }

    #[test]
    fn break_outside_loop_is_error() {
        parse_err("break");
    }

    #[test]
    fn return_outside_function_is_error() {
        parse_err("return 1");
    }

    #[test]
    fn function_call_arity_and_types_checked() {
        parse_ok("func f(a: number) -> void { }\nf(1)");
        parse_err("func f(a: number) -> void { }\nf(\"x\")");
        parse_err("func f(a: number) -> void { }\nf(1, 2)");
    }

    #[test]
    fn string_concatenation_allowed_for_plus() {
        parse_ok("a: string = \"x\"\nb: string = \"y\"\nc: string = a + b");
    }

    #[test]
    fn string_subtraction_is_error() {
        parse_err("a: string = \"x\"\nb: string = \"y\"\nc: string = a - b");
    }

    #[test]
    fn short_circuit_operands_require_bool() {
        parse_err("x: bool = 1 && true");
    }

    #[test]
    fn channel_decl_and_ops_type_check() {
        parse_ok(
            "s_channel s { \"127.0.0.1\", 0 }\nc: c_channel = accept(s)\nsend(c, \"hi\")\nm: string = recv(c)\nclose(c)\nclose(s)",
        );
    }

    #[test]
    fn channel_echo_scenario_shape_parses() {
        parse_ok(
            "c_channel cc { \"127.0.0.1\", 9000 }\nsend(cc, \"hi\")\nr: string = recv(cc)\nprint(r)\nclose(cc)",
        );
    }

    #[test]
    fn accept_requires_s_channel_argument() {
        parse_err("c_channel cc { \"h\", 1 }\naccept(cc)");
    }

    #[test]
    fn semicolons_and_newlines_both_accepted() {
        parse_ok("x: number = 1; y: number = 2\nz: number = 3;");
    }

    #[test]
    fn statement_terminators_are_optional() {
        parse_ok("x: number = 1 y: number = 2");
    }

    #[test]
    fn par_and_seq_blocks_parse() {
        parse_ok("a: number = 0\npar { a = 1 }");
        parse_ok("a: number = 0\nseq { a = 1 }");
    }

    #[test]
    fn countdown_program_parses() {
        parse_ok(
            "num: number = 3\nfunc count(n: number) -> void { while (n >= 0) { print(n)\nn = n - 1 } }\ncount(num)",
        );
    }

    #[test]
    fn equality_allowed_for_number_string_bool() {
        parse_ok("x: bool = 1 == 1");
        parse_ok("x: bool = \"a\" == \"b\"");
        parse_ok("x: bool = true != false");
    }

    #[test]
    fn equality_rejects_func_operands() {
        parse_err("func f() -> void { }\nx: bool = f == f");
    }

    #[test]
    fn equality_rejects_channel_operands() {
        parse_err("s_channel s { \"127.0.0.1\", 0 }\nx: bool = s == s");
    }

    #[test]
    fn break_crossing_a_par_boundary_is_error() {
        parse_err("while (true) { par { break } }");
        parse_err("while (true) { par { continue } }");
    }

    #[test]
    fn break_inside_a_while_nested_in_par_is_allowed() {
        parse_ok("while (true) { par { while (true) { break } } }");
    }
}
