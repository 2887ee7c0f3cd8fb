//! Tree-walking evaluation of parsed expressions.

use lang::{Expression, Ident, Literal};

use crate::{
    context::RenderContext,
    error::{Error, Reason, Result},
    functions::{replacement_of, FunctionRegistry},
    ops::{apply_binary, apply_unary},
    series::SeriesId,
    value::Value,
};

/// Evaluate `expression` against `ctx` with the built-in functions.
pub fn evaluate(expression: &Expression, ctx: &RenderContext) -> Result<Value> {
    Evaluator::new(ctx).evaluate(expression)
}

/// Parse then evaluate `input`.
pub fn evaluate_str(input: &str, ctx: &RenderContext) -> Result<Value> {
    let expression = lang::parse(input)?;
    evaluate(&expression, ctx)
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    ctx: &'a RenderContext,
    registry: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a RenderContext) -> Self {
        Self::with_registry(ctx, FunctionRegistry::builtins())
    }

    pub fn with_registry(ctx: &'a RenderContext, registry: &'a FunctionRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        match expression {
            Expression::Primary(literal) => self.literal(literal),
            Expression::Identifier(ident) => Err(self.identifier(ident)),
            Expression::Unary { op, operand, .. } => {
                let operand = self.evaluate(operand)?;
                apply_unary(*op, &operand)
            }
            Expression::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                apply_binary(*op, &left, &right)
            }
            Expression::Call { callee, args, .. } => self.call(callee, args),
            Expression::Group { expression, .. } => self.evaluate(expression),
        }
    }

    fn literal(&self, literal: &Literal) -> Result<Value> {
        match literal {
            Literal::Number(_, n) => Ok(Value::Number(*n)),
            Literal::String(..) => Err(Error::Operand { found: "string" }),
            Literal::Bool(..) => Err(Error::Operand { found: "boolean" }),
        }
    }

    /// Bare names are leftovers of the old `{{max}}` template syntax, which
    /// only existed for value functions.
    fn identifier(&self, ident: &Ident) -> Error {
        let name = ident.name.as_str();
        let replacement = match replacement_of(name) {
            Some(replacement) => replacement,
            None if name == "dataset" || self.registry.value_fn(name).is_some() => name,
            None => {
                return Error::Function {
                    name: name.to_string(),
                    reason: Reason::Unknown,
                }
            }
        };
        log::warn!("deprecated template variable '{name}'");
        Error::DeprecatedVariable {
            name: name.to_string(),
            replacement: replacement.to_string(),
        }
    }

    fn call(&self, callee: &Ident, args: &[Expression]) -> Result<Value> {
        let name = callee.name.as_str();
        log::debug!("calling {name} with {} argument(s)", args.len());

        if name == "dataset" {
            return self.dataset(args);
        }
        if let Some(function) = self.registry.value_fn(name) {
            let series = match args {
                [] => self
                    .ctx
                    .collection()
                    .default_series()
                    .ok_or(Error::NoDataset)?
                    .clone(),
                [arg] => match self.evaluate(arg)? {
                    Value::Series(series) => series,
                    _ => return Err(argument_type(name, "a dataset")),
                },
                _ => {
                    return Err(Error::TooManyArguments {
                        name: name.to_string(),
                    })
                }
            };
            return function(&series, self.ctx);
        }
        if let Some(function) = self.registry.transform_fn(name) {
            let (first, rest) = args.split_first().ok_or_else(|| Error::Argument {
                name: name.to_string(),
                reason: Reason::Missing,
            })?;
            let series = match self.evaluate(first)? {
                Value::Series(series) => series,
                _ => return Err(argument_type(name, "a dataset")),
            };
            let params = rest
                .iter()
                .map(|arg| self.evaluate(arg))
                .collect::<Result<Vec<_>>>()?;
            return function(&series, &params, self.ctx).map(Value::Series);
        }

        Err(Error::Function {
            name: name.to_string(),
            reason: Reason::Unknown,
        })
    }

    fn dataset(&self, args: &[Expression]) -> Result<Value> {
        let arg = match args {
            [] => {
                return Err(Error::Argument {
                    name: "dataset".to_string(),
                    reason: Reason::Missing,
                })
            }
            [arg] => arg,
            _ => {
                return Err(Error::TooManyArguments {
                    name: "dataset".to_string(),
                })
            }
        };
        let id = match self.evaluate(arg)? {
            Value::Number(id) => id,
            _ => return Err(argument_type("dataset", "a dataset id in number")),
        };
        if id < 0.0 {
            return Err(Error::Dataset {
                id: id.to_string(),
                reason: Reason::Negative,
            });
        }

        let series = (id.fract() == 0.0)
            .then(|| self.ctx.dataset(id as SeriesId))
            .flatten()
            .ok_or_else(|| Error::Dataset {
                id: id.to_string(),
                reason: Reason::NotFound,
            })?;
        Ok(Value::Series(series.clone()))
    }
}

fn argument_type(name: &str, expected: &'static str) -> Error {
    Error::ArgumentType {
        name: name.to_string(),
        expected,
    }
}
