//! Tree-walking evaluator (spec §4.3).

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ast::{ArithOp, ChannelKind, ConstValue, Expr, LogicOp, Module, RelOp, Stmt, UnaryOp};
use crate::builtins;
use crate::channel::{ChannelHandle, ListenerHandle};
use crate::concurrency;
use crate::env::Environment;
use crate::error::{MiniparError, RuntimeError};
use crate::value::{FuncValue, Value};

/// Non-local control signals that unwind the evaluator stack to the
/// nearest legal handler (spec §4.3: Return/Break/Continue).
enum Flow {
    Error(RuntimeError),
    Return(Value),
    Break,
    Continue,
}

impl From<RuntimeError> for Flow {
    fn from(e: RuntimeError) -> Self {
        Flow::Error(e)
    }
}

type StmtOutcome = Result<(), Flow>;

/// Walks a checked AST, maintaining a runtime [`Environment`] tree and
/// writing `print`/`output` through a shared, lock-guarded sink so
/// concurrent writers from a `par` block never interleave mid-line.
///
/// Generic over the sink `W` rather than boxing it as `dyn Write`: this
/// lets tests hand the evaluator an `Arc<Mutex<Vec<u8>>>` and read the
/// captured bytes back directly, while `Evaluator::stdout` wires up the
/// real process stdout for the CLI.
pub struct Evaluator<W: Write + Send> {
    out: Arc<Mutex<W>>,
}

impl<W: Write + Send> Evaluator<W> {
    pub fn new(out: Arc<Mutex<W>>) -> Self {
        Evaluator { out }
    }

    pub fn eval_module(&self, module: &Module) -> Result<(), MiniparError> {
        let env = Environment::root();
        match self.exec_block(&module.stmts, &env) {
            Ok(()) => Ok(()),
            Err(Flow::Error(e)) => Err(MiniparError::Runtime(e)),
            Err(_) => Err(MiniparError::Runtime(RuntimeError::Internal(
                "return/break/continue escaped to module scope".to_string(),
            ))),
        }
    }

    fn write_line(&self, line: &str) {
        let mut w = self.out.lock();
        let _ = writeln!(w, "{}", line);
    }

    fn exec_block(&self, stmts: &[Stmt], env: &Arc<Environment>) -> StmtOutcome {
        for stmt in stmts {
            self.exec_stmt(stmt, env)?;
        }
        Ok(())
    }

    fn exec_stmt(&self, stmt: &Stmt, env: &Arc<Environment>) -> StmtOutcome {
        match stmt {
            Stmt::Decl { name, ty, init, .. } => {
                let value = match init {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::zero_of(ty),
                };
                env.define(name, value);
                Ok(())
            }
            Stmt::Assign { target, value, .. } => {
                let v = self.eval_expr(value, env)?;
                env.set(target, v).map_err(Flow::from)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let c = self.eval_expr(cond, env)?;
                let frame = Environment::child(env);
                if is_true(&c) {
                    self.exec_block(then_branch, &frame)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, &frame)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body, .. } => {
                loop {
                    let c = self.eval_expr(cond, env)?;
                    if !is_true(&c) {
                        break;
                    }
                    let frame = Environment::child(env);
                    match self.exec_block(body, &frame) {
                        Ok(()) => {}
                        Err(Flow::Break) => break,
                        Err(Flow::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::FuncDef {
                name,
                params,
                ret,
                body,
                ..
            } => {
                let func = Arc::new(FuncValue {
                    name: name.clone(),
                    params: params.clone(),
                    ret: ret.clone(),
                    body: body.clone(),
                    captured_env: Arc::clone(env),
                });
                env.define(name, Value::Func(func));
                Ok(())
            }
            Stmt::Par { body, .. } => {
                concurrency::run_par(body, env, |s, e| self.exec_stmt_to_runtime(s, e)).map_err(Flow::from)
            }
            Stmt::Seq { body, .. } => {
                let frame = Environment::child(env);
                self.exec_block(body, &frame)
            }
            Stmt::ChannelDecl {
                name, kind, host, port, ..
            } => {
                let host_v = self.eval_expr(host, env)?;
                let port_v = self.eval_expr(port, env)?;
                let (host, port) = match (host_v, port_v) {
                    (Value::Str(h), Value::Number(p)) => (h, p),
                    _ => return Err(Flow::from(RuntimeError::Internal("channel endpoint type checked at parse time".to_string()))),
                };
                let value = match kind {
                    ChannelKind::Client => {
                        Value::CChannel(Arc::new(ChannelHandle::connect(&host, port)?))
                    }
                    ChannelKind::Server => {
                        Value::SChannel(Arc::new(ListenerHandle::bind(&host, port)?))
                    }
                };
                env.define(name, value);
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Void,
                };
                Err(Flow::Return(v))
            }
            Stmt::Break { .. } => Err(Flow::Break),
            Stmt::Continue { .. } => Err(Flow::Continue),
            Stmt::ExprStmt { expr, .. } => {
                self.eval_expr(expr, env)?;
                Ok(())
            }
        }
    }

    /// Adapts [`exec_stmt`] for use inside a `par` block's threads, where a
    /// bare `Break`/`Continue`/`Return` escaping the child has no legal
    /// handler (it cannot unwind across a thread boundary). The parser
    /// rejects any `break`/`continue` that would need to cross a `par`
    /// boundary to reach its `while`, so the `Break`/`Continue` arms below
    /// are unreachable for any program that parsed; `Internal` reports a
    /// genuine evaluator bug here, not something a Minipar program can
    /// trigger.
    fn exec_stmt_to_runtime(&self, stmt: &Stmt, env: &Arc<Environment>) -> Result<(), RuntimeError> {
        match self.exec_stmt(stmt, env) {
            Ok(()) => Ok(()),
            Err(Flow::Error(e)) => Err(e),
            Err(Flow::Break) | Err(Flow::Continue) | Err(Flow::Return(_)) => Err(RuntimeError::Internal(
                "break/continue/return cannot escape a par block child".to_string(),
            )),
        }
    }

    fn eval_expr(&self, expr: &Expr, env: &Arc<Environment>) -> Result<Value, Flow> {
        match expr {
            Expr::Constant { value, .. } => Ok(match value {
                ConstValue::Number(n) => Value::Number(*n),
                ConstValue::Str(s) => Value::Str(s.clone()),
                ConstValue::Bool(b) => Value::Bool(*b),
            }),
            Expr::Id { name, .. } => env
                .get(name)
                .ok_or_else(|| Flow::from(RuntimeError::UndeclaredIdentifier(name.clone()))),
            Expr::Arithmetic { op, left, right, .. } => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                eval_arith(*op, l, r).map_err(Flow::from)
            }
            Expr::Relational { op, left, right, .. } => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                Ok(Value::Bool(eval_rel(*op, &l, &r)))
            }
            Expr::Logical { op, left, right, .. } => {
                let l = self.eval_expr(left, env)?;
                let left_true = is_true(&l);
                match op {
                    LogicOp::And if !left_true => Ok(Value::Bool(false)),
                    LogicOp::Or if left_true => Ok(Value::Bool(true)),
                    _ => {
                        let r = self.eval_expr(right, env)?;
                        Ok(Value::Bool(is_true(&r)))
                    }
                }
            }
            Expr::Unary { op, operand, .. } => {
                let v = self.eval_expr(operand, env)?;
                match (op, v) {
                    (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    _ => Err(Flow::from(RuntimeError::Internal(
                        "unary operand type checked at parse time".to_string(),
                    ))),
                }
            }
            Expr::Call {
                callee, args, oper, ..
            } => self.eval_call(callee, args, oper.as_deref(), env),
        }
    }

    fn eval_call(
        &self,
        callee: &str,
        args: &[Expr],
        oper: Option<&str>,
        env: &Arc<Environment>,
    ) -> Result<Value, Flow> {
        let values = args
            .iter()
            .map(|a| self.eval_expr(a, env))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(op) = oper {
            return eval_channel_op(op, values).map_err(Flow::from);
        }

        match callee {
            "print" | "output" => {
                self.write_line(&builtins::console::format_line(&values));
                Ok(Value::Void)
            }
            "to_number" => {
                let s = expect_str(&values[0]);
                Ok(Value::Number(builtins::conversion::to_number(s).map_err(Flow::from)?))
            }
            "to_string" => {
                let n = expect_num(&values[0]);
                Ok(Value::Str(builtins::conversion::to_string(n)))
            }
            "to_bool" => {
                let s = expect_str(&values[0]);
                Ok(Value::Bool(builtins::conversion::to_bool(s).map_err(Flow::from)?))
            }
            "length" => {
                let s = expect_str(&values[0]);
                Ok(Value::Number(builtins::strings::length(s)))
            }
            "exp" => {
                let n = expect_num(&values[0]);
                Ok(Value::Number(builtins::math::exp(n)))
            }
            _ => self.eval_user_call(callee, values, env),
        }
    }

    fn eval_user_call(&self, name: &str, values: Vec<Value>, env: &Arc<Environment>) -> Result<Value, Flow> {
        let func = match env.get(name) {
            Some(Value::Func(f)) => f,
            _ => {
                return Err(Flow::from(RuntimeError::Internal(format!(
                    "'{}' resolved to a non-function value at runtime",
                    name
                ))))
            }
        };
        let call_frame = Environment::child(&func.captured_env);
        for (param, value) in func.params.iter().zip(values.into_iter()) {
            call_frame.define(&param.name, value);
        }
        match self.exec_block(&func.body, &call_frame) {
            Ok(()) => Ok(Value::zero_of(&func.ret)),
            Err(Flow::Return(v)) => Ok(v),
            Err(Flow::Error(e)) => Err(Flow::Error(e)),
            Err(Flow::Break) | Err(Flow::Continue) => Err(Flow::from(RuntimeError::Internal(
                "break/continue escaped a function body".to_string(),
            ))),
        }
    }
}

impl Evaluator<std::io::Stdout> {
    pub fn stdout() -> Self {
        Evaluator::new(Arc::new(Mutex::new(std::io::stdout())))
    }
}

fn is_true(v: &Value) -> bool {
    matches!(v, Value::Bool(true))
}

fn expect_str(v: &Value) -> &str {
    match v {
        Value::Str(s) => s,
        _ => unreachable!("argument type checked at parse time"),
    }
}

fn expect_num(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        _ => unreachable!("argument type checked at parse time"),
    }
}

fn eval_arith(op: ArithOp, l: Value, r: Value) -> Result<Value, RuntimeError> {
    match (op, l, r) {
        (ArithOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (op, Value::Number(a), Value::Number(b)) => match op {
            ArithOp::Add => Ok(Value::Number(a + b)),
            ArithOp::Sub => Ok(Value::Number(a - b)),
            ArithOp::Mul => Ok(Value::Number(a * b)),
            ArithOp::Div => {
                if b == 0.0 {
                    Err(RuntimeError::DivisionByZero)
                } else {
                    Ok(Value::Number(a / b))
                }
            }
            ArithOp::Mod => {
                if b == 0.0 {
                    Err(RuntimeError::DivisionByZero)
                } else {
                    Ok(Value::Number(a % b))
                }
            }
        },
        _ => Err(RuntimeError::Internal("arithmetic operand type checked at parse time".to_string())),
    }
}

fn eval_rel(op: RelOp, l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => match op {
            RelOp::Lt => a < b,
            RelOp::LtEq => a <= b,
            RelOp::Gt => a > b,
            RelOp::GtEq => a >= b,
            RelOp::Eq => a == b,
            RelOp::NotEq => a != b,
        },
        (Value::Str(a), Value::Str(b)) => match op {
            RelOp::Lt => a < b,
            RelOp::LtEq => a <= b,
            RelOp::Gt => a > b,
            RelOp::GtEq => a >= b,
            RelOp::Eq => a == b,
            RelOp::NotEq => a != b,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            RelOp::Eq => a == b,
            RelOp::NotEq => a != b,
            _ => unreachable!("only == / != are defined over bool"),
        },
        _ => unreachable!("relational operand types checked at parse time"),
    }
}

fn eval_channel_op(op: &str, mut values: Vec<Value>) -> Result<Value, RuntimeError> {
    match op {
        "accept" => {
            let listener = match values.remove(0) {
                Value::SChannel(l) => l,
                _ => unreachable!("argument type checked at parse time"),
            };
            let conn = listener.accept()?;
            Ok(Value::CChannel(Arc::new(conn)))
        }
        "send" => {
            let payload = match values.pop().expect("send takes 2 args") {
                Value::Str(s) => s,
                _ => unreachable!("argument type checked at parse time"),
            };
            let chan = match values.pop().expect("send takes 2 args") {
                Value::CChannel(c) => c,
                _ => unreachable!("argument type checked at parse time"),
            };
            chan.send(&payload)?;
            Ok(Value::Void)
        }
        "recv" => {
            let chan = match values.remove(0) {
                Value::CChannel(c) => c,
                _ => unreachable!("argument type checked at parse time"),
            };
            Ok(Value::Str(chan.recv()?))
        }
        "close" => {
            match values.remove(0) {
                Value::CChannel(c) => c.close(),
                Value::SChannel(s) => s.close(),
                _ => unreachable!("argument type checked at parse time"),
            }
            Ok(Value::Void)
        }
        _ => unreachable!("parser only tags oper with the four channel op names"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run_capturing(src: &str) -> String {
        let module = parse(src).unwrap();
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let evaluator = Evaluator::new(Arc::clone(&buf));
        evaluator.eval_module(&module).unwrap();
        let bytes = buf.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn run_err(src: &str) -> MiniparError {
        let module = parse(src).unwrap();
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let evaluator = Evaluator::new(buf);
        evaluator.eval_module(&module).unwrap_err()
    }

    #[test]
    fn countdown_scenario() {
        let out = run_capturing(
            "num: number = 3\nfunc count(n: number) -> void { while (n >= 0) { print(n)\nn = n - 1 } }\ncount(num)",
        );
        assert_eq!(out, "3\n2\n1\n0\n");
    }

    #[test]
    fn closure_capture_scenario() {
        let out = run_capturing(
            "x: number = 1\nfunc inc() -> void { x = x + 1 }\ninc()\ninc()\nprint(x)",
        );
        assert_eq!(out, "3\n");
    }

    #[test]
    fn string_concat_and_conversion_scenario() {
        let out = run_capturing("a: string = \"val=\"\nn: number = 7\nprint(a + to_string(n))");
        assert_eq!(out, "val=7\n");
    }

    #[test]
    fn par_barrier_scenario() {
        let out = run_capturing("a: number = 0\nb: number = 0\npar { a = 1\nb = 2 }\nprint(a + b)");
        assert_eq!(out, "3\n");
    }

    #[test]
    fn short_circuit_safety_scenario() {
        let out = run_capturing(
            "n: number = 0\nif (n != 0 && (10 / n) > 0) { print(1) } else { print(0) }",
        );
        assert_eq!(out, "0\n");
    }

    #[test]
    fn division_by_zero_is_runtime_error_with_exit_code_3() {
        let err = run_err("a: number = 1\nb: number = 0\nprint(a / b)");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn while_break_and_continue() {
        let out = run_capturing(
            "i: number = 0\nwhile (i < 5) { i = i + 1\nif (i == 2) { continue }\nif (i == 4) { break }\nprint(i) }",
        );
        assert_eq!(out, "1\n3\n");
    }

    #[test]
    fn if_else_branches() {
        let out = run_capturing("x: bool = false\nif (x) { print(1) } else { print(0) }");
        assert_eq!(out, "0\n");
    }

    #[test]
    fn missing_explicit_return_yields_zero_value() {
        let out = run_capturing("func f() -> number { }\nprint(f())");
        assert_eq!(out, "0\n");
    }

    #[test]
    fn seq_runs_in_the_current_environment_not_a_nested_frame() {
        let out = run_capturing("a: number = 0\nseq { a = 1 }\nprint(a)");
        assert_eq!(out, "1\n");
    }
}
