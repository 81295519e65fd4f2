use crate::{
    member::MemberError,
    path::{
        PathExpr,
        ast::Expr,
        context::HistoryEntry,
        eval::{EvalError, EvalErrorKind, Failure, PathEvaluator, receiver_type},
    },
    traits::Object,
    value::{Slot, Value},
};
use std::collections::VecDeque;

impl PathEvaluator {
    /// Write `value` into the member named by the last node of `expr`.
    ///
    /// Preceding nodes are navigated to find the target object and must be
    /// attributes (or a leading `this`). Returns `Ok(false)` when an optional
    /// step made the target unreachable, in which case nothing is written.
    pub fn assign(
        &self,
        expr: &PathExpr,
        root: &mut dyn Object,
        value: Value,
    ) -> Result<bool, EvalError> {
        let mut trail = Trail::new(self.config().history_limit);

        self.assign_steps(expr.root(), root, value, &mut trail)
            .map_err(|failure| failure.into_error(expr, trail.into_history()))
    }

    fn assign_steps(
        &self,
        root_expr: &Expr,
        root: &mut dyn Object,
        value: Value,
        trail: &mut Trail,
    ) -> Result<bool, Failure> {
        let steps = root_expr.steps();
        let Some((last, prefix)) = steps.split_last() else {
            return Err(not_assignable(root_expr, "empty expression"));
        };
        let optional_chain = steps.iter().any(Expr::is_optional);

        let mut target = root;
        for (idx, node) in prefix.iter().enumerate() {
            let name = match node {
                Expr::This if idx == 0 => continue,
                Expr::Attribute(name) => name,
                _ => return Err(not_assignable(node, "only attributes can be navigated")),
            };

            let Some(descriptor) = self.resolver.resolve_member(&*target, &name.name) else {
                if name.exists_optionally {
                    return Ok(false);
                }
                return Err(Failure::at(
                    node,
                    EvalErrorKind::MemberNotFound {
                        name: name.name.clone(),
                        type_name: receiver_type(&Slot::Ref(&*target)),
                    },
                ));
            };

            let slot = (descriptor.get)(&*target).map_err(|err| member(node, err))?;
            trail.record(node, &slot);
            if slot.is_null() {
                if optional_chain {
                    return Ok(false);
                }
                return Err(Failure::at(node, EvalErrorKind::NullNavigation));
            }

            let Some(child_mut) = descriptor.child_mut else {
                return Err(not_assignable(node, "member cannot be navigated mutably"));
            };
            match child_mut(target).map_err(|err| member(node, err))? {
                Some(child) => target = child,
                None => return Err(not_assignable(node, "member is not an object")),
            }
        }

        let Expr::Attribute(name) = last else {
            return Err(not_assignable(last, "last element must be an attribute"));
        };

        let Some(descriptor) = self.resolver.resolve_member(&*target, &name.name) else {
            if name.exists_optionally {
                return Ok(false);
            }
            return Err(Failure::at(
                last,
                EvalErrorKind::MemberNotFound {
                    name: name.name.clone(),
                    type_name: receiver_type(&Slot::Ref(&*target)),
                },
            ));
        };

        let Some(set) = descriptor.set else {
            return Err(member(
                last,
                MemberError::ReadOnly {
                    member: name.name.clone(),
                },
            ));
        };

        set(target, value).map_err(|err| member(last, err))?;

        Ok(true)
    }
}

// Rendered navigation history. Entries are rendered as they are produced
// because the navigated objects are borrowed mutably afterwards.
struct Trail {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Trail {
    const fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    fn record(&mut self, node: &Expr, slot: &Slot<'_>) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            node: node.to_string(),
            value: slot.describe(),
        });
    }

    fn into_history(self) -> Vec<HistoryEntry> {
        self.entries.into()
    }
}

fn not_assignable(node: &Expr, reason: &'static str) -> Failure {
    Failure::at(node, EvalErrorKind::NotAssignable { reason })
}

fn member(node: &Expr, err: MemberError) -> Failure {
    Failure::at(node, EvalErrorKind::Member(err))
}
