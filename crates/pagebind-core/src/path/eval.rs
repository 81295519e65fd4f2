use crate::{
    config::EvalConfig,
    member::{MemberError, MemberResolver, builtin, default_resolver},
    obs::sink::{self, MetricsEvent},
    path::{
        PathExpr,
        ast::{Expr, NameWithModifier},
        context::{EvalContext, HistoryEntry, Variables},
        parser::ParseError,
    },
    traits::Object,
    value::{Slot, Value},
};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// EvalError
///
/// Evaluation failure with the full expression, the sub-expression that
/// failed, and the (node, value) pairs produced before the failure.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("cannot evaluate '{expression}' at '{failing}': {kind}")]
pub struct EvalError {
    pub expression: String,
    pub failing: String,
    pub history: Vec<HistoryEntry>,
    pub kind: EvalErrorKind,
}

///
/// EvalErrorKind
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalErrorKind {
    #[error("navigation through null")]
    NullNavigation,

    #[error("member '{name}' not found on {type_name}")]
    MemberNotFound { name: String, type_name: String },

    #[error("method '{name}' not found on {type_name}")]
    MethodNotFound { name: String, type_name: String },

    #[error("variable '#{name}' is not defined")]
    VariableNotFound { name: String },

    #[error("expression is not assignable: {reason}")]
    NotAssignable { reason: &'static str },

    #[error(transparent)]
    Member(#[from] MemberError),
}

// Failure before the expression-level context is attached.
pub(super) struct Failure {
    pub failing: String,
    pub kind: EvalErrorKind,
}

impl Failure {
    pub(super) fn at(node: &Expr, kind: EvalErrorKind) -> Self {
        Self {
            failing: node.to_string(),
            kind,
        }
    }

    pub(super) fn into_error(self, expr: &PathExpr, history: Vec<HistoryEntry>) -> EvalError {
        EvalError {
            expression: expr.source().to_string(),
            failing: self.failing,
            history,
            kind: self.kind,
        }
    }
}

// Outcome of one chain step.
enum Flow<'a> {
    Value(Slot<'a>),

    // Missing member tolerated by `x`; the rest of the chain is skipped.
    Absent,
}

///
/// PathEvaluator
///
/// Walks parsed expressions against runtime objects. Member lookup goes
/// through the configured `MemberResolver`; non-object values fall back to
/// builtin members.
///

#[derive(Clone)]
pub struct PathEvaluator {
    pub(super) resolver: Arc<dyn MemberResolver>,
    config: EvalConfig,
}

impl PathEvaluator {
    /// Evaluator over the process-wide caching resolver.
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        Self::with_resolver(default_resolver(), config)
    }

    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn MemberResolver>, config: EvalConfig) -> Self {
        Self { resolver, config }
    }

    #[must_use]
    pub const fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Parse with the configured syntax version.
    pub fn parse(&self, source: &str) -> Result<PathExpr, ParseError> {
        PathExpr::parse(source, self.config.syntax)
    }

    pub fn evaluate(&self, expr: &PathExpr, root: &dyn Object) -> Result<Value, EvalError> {
        let mut ctx = EvalContext::for_start(Slot::Ref(root), self.config.history_limit);
        self.evaluate_in(expr, &mut ctx)
    }

    /// Evaluate against an arbitrary value; object values are borrowed.
    pub fn evaluate_value(&self, expr: &PathExpr, root: &Value) -> Result<Value, EvalError> {
        let start = match root {
            Value::Object(object) => Slot::Ref(object.get()),
            other => Slot::Owned(other.clone()),
        };
        let mut ctx = EvalContext::for_start(start, self.config.history_limit);

        self.evaluate_in(expr, &mut ctx)
    }

    pub fn evaluate_with<'a>(
        &self,
        expr: &'a PathExpr,
        start: Slot<'a>,
        variables: &'a Variables,
    ) -> Result<Value, EvalError> {
        let mut ctx = EvalContext::new(start, variables, self.config.history_limit);
        self.evaluate_in(expr, &mut ctx)
    }

    /// Evaluate inside a caller-provided context.
    pub fn evaluate_in<'a>(
        &self,
        expr: &'a PathExpr,
        ctx: &mut EvalContext<'a>,
    ) -> Result<Value, EvalError> {
        let result = self.eval_expr(expr.root(), ctx);
        sink::record(MetricsEvent::PathEval {
            failed: result.is_err(),
        });

        result
            .map(Slot::into_value)
            .map_err(|failure| failure.into_error(expr, ctx.history()))
    }

    fn eval_expr<'a>(&self, expr: &'a Expr, ctx: &mut EvalContext<'a>) -> Result<Slot<'a>, Failure> {
        match expr {
            Expr::Chain(nodes) => self.eval_chain(nodes, ctx),
            Expr::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    let mut sub = ctx.sub_context();
                    let result = self.eval_expr(part, &mut sub);
                    ctx.absorb(sub);
                    text.push_str(&concat_text(&result?));
                }

                let slot = Slot::Owned(Value::Text(text));
                ctx.record(expr, &slot);
                ctx.set_current(slot.clone());

                Ok(slot)
            }
            single => self.eval_chain(std::slice::from_ref(single), ctx),
        }
    }

    // Null navigation anywhere in a chain is tolerated as soon as one
    // element of the chain is optional.
    fn eval_chain<'a>(
        &self,
        nodes: &'a [Expr],
        ctx: &mut EvalContext<'a>,
    ) -> Result<Slot<'a>, Failure> {
        let optional_chain = nodes.iter().any(Expr::is_optional);

        for node in nodes {
            if node.needs_receiver() && ctx.current().is_null() {
                if optional_chain {
                    ctx.set_current(Slot::null());
                    return Ok(Slot::null());
                }
                return Err(Failure::at(node, EvalErrorKind::NullNavigation));
            }

            match self.step(node, ctx)? {
                Flow::Value(slot) => {
                    ctx.record(node, &slot);
                    ctx.set_current(slot);
                }
                Flow::Absent => {
                    ctx.record(node, &Slot::null());
                    ctx.set_current(Slot::null());
                    return Ok(Slot::null());
                }
            }
        }

        Ok(ctx.current().clone())
    }

    fn step<'a>(&self, node: &'a Expr, ctx: &mut EvalContext<'a>) -> Result<Flow<'a>, Failure> {
        match node {
            Expr::Literal(value) => Ok(Flow::Value(Slot::Owned(value.clone()))),
            Expr::This => Ok(Flow::Value(ctx.start().clone())),
            Expr::Variable(name) => match ctx.variables().get(&name.name) {
                Some(value) => Ok(Flow::Value(Slot::Owned(value.clone()))),
                None if name.optional => Ok(Flow::Absent),
                None => absent(
                    node,
                    name,
                    EvalErrorKind::VariableNotFound {
                        name: name.name.clone(),
                    },
                ),
            },
            Expr::Attribute(name) => self.attribute(node, name, ctx.current().clone()),
            Expr::Method { name, args } => {
                // Hold the receiver before arguments run in their own contexts.
                let receiver = ctx.current().clone();
                let args = self.arguments(args, ctx)?;

                self.invoke(node, name, receiver, &args)
            }
            Expr::Chain(_) | Expr::Concat(_) => self.eval_expr(node, ctx).map(Flow::Value),
        }
    }

    fn arguments<'a>(
        &self,
        args: &'a [Expr],
        ctx: &mut EvalContext<'a>,
    ) -> Result<Vec<Value>, Failure> {
        args.iter()
            .map(|arg| {
                let mut sub = ctx.sub_context();
                let result = self.eval_expr(arg, &mut sub);
                ctx.absorb(sub);

                result.map(Slot::into_value)
            })
            .collect()
    }

    fn attribute<'a>(
        &self,
        node: &Expr,
        name: &NameWithModifier,
        receiver: Slot<'a>,
    ) -> Result<Flow<'a>, Failure> {
        let type_name = receiver_type(&receiver);

        let resolved = match receiver {
            Slot::Ref(object) => self.read_member(node, object, &name.name)?,
            Slot::Owned(Value::Object(object)) => self
                .read_member(node, object.get(), &name.name)?
                .map(Slot::into_owned),
            Slot::Owned(value) => builtin::attribute(&value, &name.name).map(Slot::Owned),
        };

        match resolved {
            Some(slot) => Ok(Flow::Value(slot)),
            None => absent(
                node,
                name,
                EvalErrorKind::MemberNotFound {
                    name: name.name.clone(),
                    type_name,
                },
            ),
        }
    }

    fn read_member<'b>(
        &self,
        node: &Expr,
        object: &'b dyn Object,
        name: &str,
    ) -> Result<Option<Slot<'b>>, Failure> {
        let Some(descriptor) = self.resolver.resolve_member(object, name) else {
            return Ok(None);
        };

        (descriptor.get)(object)
            .map(Some)
            .map_err(|err| Failure::at(node, EvalErrorKind::Member(err)))
    }

    fn invoke<'a>(
        &self,
        node: &Expr,
        name: &NameWithModifier,
        receiver: Slot<'a>,
        args: &[Value],
    ) -> Result<Flow<'a>, Failure> {
        let type_name = receiver_type(&receiver);

        let result = match &receiver {
            Slot::Ref(object) => self.call_method(*object, &name.name, args),
            Slot::Owned(Value::Object(object)) => self.call_method(object.get(), &name.name, args),
            Slot::Owned(value) => builtin::invoke(value, &name.name, args),
        }
        // Objects still answer the value-level builtins such as `toString`.
        .or_else(|| builtin::invoke(&receiver.clone().into_value(), &name.name, args));

        match result {
            Some(Ok(value)) => Ok(Flow::Value(Slot::Owned(value))),
            Some(Err(err)) => Err(Failure::at(node, EvalErrorKind::Member(err))),
            None => absent(
                node,
                name,
                EvalErrorKind::MethodNotFound {
                    name: name.name.clone(),
                    type_name,
                },
            ),
        }
    }

    fn call_method(
        &self,
        object: &dyn Object,
        name: &str,
        args: &[Value],
    ) -> Option<Result<Value, MemberError>> {
        self.resolver
            .resolve_method(object, name)
            .map(|method| method.call(object, args))
    }
}

impl Default for PathEvaluator {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

impl fmt::Debug for PathEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathEvaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// Missing members degrade to null only under `x`.
fn absent<'a>(
    node: &Expr,
    name: &NameWithModifier,
    kind: EvalErrorKind,
) -> Result<Flow<'a>, Failure> {
    if name.exists_optionally {
        Ok(Flow::Absent)
    } else {
        Err(Failure::at(node, kind))
    }
}

pub(super) fn receiver_type(slot: &Slot<'_>) -> String {
    match slot {
        Slot::Ref(object) => object.type_name().to_string(),
        Slot::Owned(Value::Object(object)) => object.type_name().to_string(),
        Slot::Owned(value) => format!("{:?}", value.value_type()),
    }
}

fn concat_text(slot: &Slot<'_>) -> String {
    match slot {
        Slot::Ref(object) => object.type_name().to_string(),
        Slot::Owned(value) => value.to_concat_string(),
    }
}
