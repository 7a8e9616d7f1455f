//! `par`/`seq` block semantics, task isolation, and the join barrier
//! (spec §4.4).
//!
//! `seq` needs no runtime support beyond ordinary sequential execution of
//! its children in a nested frame; this module only has work to do for
//! `par`. Each direct child statement of a `par` block runs on its own
//! scoped OS thread, all sharing the enclosing environment by cloning the
//! `Arc`. `std::thread::scope`'s implicit join on exit is the barrier; no
//! child is cancelled early on a sibling's failure (spec §4.4: "the
//! remaining children are allowed to finish").

use std::sync::Arc;
use std::thread;

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::RuntimeError;

/// Runs each statement in `body` on its own thread, sharing `env`, and
/// returns the first error encountered (in source order among the
/// children), after every child has finished.
pub fn run_par<F>(body: &[Stmt], env: &Arc<Environment>, exec: F) -> Result<(), RuntimeError>
where
    F: Fn(&Stmt, &Arc<Environment>) -> Result<(), RuntimeError> + Sync,
{
    let results = thread::scope(|scope| {
        let handles: Vec<_> = body
            .iter()
            .map(|stmt| {
                let child_env = Arc::clone(env);
                let exec = &exec;
                scope.spawn(move || exec(stmt, &child_env))
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(RuntimeError::Internal("a par child thread panicked".to_string()))
                })
            })
            .collect::<Vec<_>>()
    });

    results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConstValue, Stmt};
    use crate::token::{Token, TokenTag};

    fn dummy_token() -> Token {
        Token::new("x", TokenTag::Identifier, 1)
    }

    fn noop_stmt() -> Stmt {
        Stmt::ExprStmt {
            expr: crate::ast::Expr::Constant {
                value: ConstValue::Number(1.0),
                ty: crate::types::Type::Number,
                token: dummy_token(),
            },
            token: dummy_token(),
        }
    }

    #[test]
    fn all_children_run_and_success_propagates() {
        let env = Environment::root();
        let body = vec![noop_stmt(), noop_stmt(), noop_stmt()];
        let count = std::sync::atomic::AtomicUsize::new(0);
        let result = run_par(&body, &env, |_s, _e| {
            count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn first_failure_by_source_order_is_propagated() {
        let env = Environment::root();
        let body = vec![noop_stmt(), noop_stmt()];
        let result = run_par(&body, &env, |_s, _e| Err(RuntimeError::DivisionByZero));
        assert!(matches!(result, Err(RuntimeError::DivisionByZero)));
    }

    #[test]
    fn siblings_still_run_to_completion_after_a_failure() {
        let env = Environment::root();
        let body = vec![noop_stmt(), noop_stmt(), noop_stmt()];
        let ran = std::sync::atomic::AtomicUsize::new(0);
        let _ = run_par(&body, &env, |_s, _e| {
            ran.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(RuntimeError::ChannelClosed)
        });
        assert_eq!(ran.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
