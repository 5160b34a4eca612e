//! Expression evaluation

use super::{Context, Interpreter, ScopeKind};
use crate::ast::*;
use crate::error::{messages, Error, Result};
use crate::runtime::number::{number_to_string, to_int32, to_uint32};
use crate::runtime::{
    ArrayStorage, JsString, ObjectRef, PropertyDescriptor, PropertyFlags, PropertyKey, Value,
};

/// The target of an assignment, `delete`, `typeof` or call
enum Reference {
    /// Name with no binding anywhere on the scope chain
    Unresolvable(String),
    /// Name bound in a scope record
    Binding {
        record: ObjectRef,
        key: PropertyKey,
        with_base: bool,
    },
    /// Property of a value
    Property { base: Value, key: PropertyKey },
}

/// Printable name of a callee for error messages
fn callee_name(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.clone(),
        Expression::Member(m) => {
            let object = callee_name(&m.object);
            match &m.property {
                MemberProperty::Identifier(id) => format!("{}.{}", object, id.name),
                MemberProperty::Expression(_) => format!("{}[...]", object),
            }
        }
        Expression::This(_) => "this".to_string(),
        Expression::Parenthesized(inner) => callee_name(inner),
        _ => "expression".to_string(),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match &lit.value {
        LiteralValue::Null => Value::Null,
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::String(s.clone()),
    }
}

impl Interpreter {
    /// Evaluate an expression to a value
    pub(crate) fn eval_expression(&mut self, expr: &Expression, ctx: &Context) -> Result<Value> {
        crate::stack::guard(|| self.eval_expression_unguarded(expr, ctx))
    }

    fn eval_expression_unguarded(&mut self, expr: &Expression, ctx: &Context) -> Result<Value> {
        match expr {
            Expression::Identifier(id) => self.lookup_identifier(id, ctx),
            Expression::Literal(lit) => Ok(literal_value(lit)),
            Expression::Array(array) => self.eval_array_literal(array, ctx),
            Expression::Object(object) => self.eval_object_literal(object, ctx),
            Expression::Function(func) => {
                Ok(Value::Object(self.create_function_expression(func, ctx)))
            }
            Expression::This(_) => Ok(ctx.this.clone()),
            Expression::Member(member) => {
                let (base, key) = self.eval_member_parts(member, ctx)?;
                self.get_value(&base, &key)
            }
            Expression::Call(call) => self.eval_call(call, ctx),
            Expression::New(new) => self.eval_new(new, ctx),
            Expression::Unary(unary) => self.eval_unary(unary, ctx),
            Expression::Update(update) => self.eval_update(update, ctx),
            Expression::Binary(binary) => {
                let left = self.eval_expression(&binary.left, ctx)?;
                let right = self.eval_expression(&binary.right, ctx)?;
                self.apply_binary(binary.operator, &left, &right)
            }
            Expression::Logical(logical) => {
                let left = self.eval_expression(&logical.left, ctx)?;
                let short_circuit = match logical.operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval_expression(&logical.right, ctx)
                }
            }
            Expression::Assignment(assign) => self.eval_assignment(assign, ctx),
            Expression::Conditional(cond) => {
                if self.eval_expression(&cond.test, ctx)?.to_boolean() {
                    self.eval_expression(&cond.consequent, ctx)
                } else {
                    self.eval_expression(&cond.alternate, ctx)
                }
            }
            Expression::Sequence(seq) => {
                let mut last = Value::Undefined;
                for e in &seq.expressions {
                    last = self.eval_expression(e, ctx)?;
                }
                Ok(last)
            }
            Expression::Parenthesized(inner) => self.eval_expression(inner, ctx),
        }
    }

    // ---------------------------------------------------------------------
    // Identifiers and references
    // ---------------------------------------------------------------------

    fn resolve(&self, id: &Identifier, ctx: &Context) -> Reference {
        let key = PropertyKey::from(id.key.clone());
        for scope in ctx.scope.chain() {
            if self.has_property(&scope.record, &key) {
                return Reference::Binding {
                    record: scope.record.clone(),
                    key,
                    with_base: scope.kind == ScopeKind::With,
                };
            }
        }
        Reference::Unresolvable(id.name.clone())
    }

    fn lookup_identifier(&mut self, id: &Identifier, ctx: &Context) -> Result<Value> {
        let reference = self.resolve(id, ctx);
        self.get_reference(&reference)
    }

    /// Assign to a name, creating a global in sloppy code
    pub(crate) fn assign_identifier(&mut self, id: &Identifier, value: Value, ctx: &Context) -> Result<()> {
        let reference = self.resolve(id, ctx);
        self.put_reference(reference, value, ctx)
    }

    /// Assign to any valid assignment target
    pub(crate) fn assign_to(&mut self, target: &Expression, value: Value, ctx: &Context) -> Result<()> {
        let reference = self.eval_reference(target, ctx)?;
        self.put_reference(reference, value, ctx)
    }

    fn eval_member_parts(&mut self, member: &MemberExpression, ctx: &Context) -> Result<(Value, PropertyKey)> {
        let base = self.eval_expression(&member.object, ctx)?;
        let key = match &member.property {
            MemberProperty::Identifier(id) => {
                if base.is_nullish() {
                    return Err(Error::type_error(messages::cannot_read_property(
                        &id.name,
                        &base.describe(),
                    )));
                }
                PropertyKey::from(id.key.clone())
            }
            MemberProperty::Expression(expr) => {
                let name = self.eval_expression(expr, ctx)?;
                if base.is_nullish() {
                    return Err(Error::type_error(messages::cannot_read_property(
                        &name.describe(),
                        &base.describe(),
                    )));
                }
                self.to_property_key(&name)?
            }
        };
        Ok((base, key))
    }

    fn eval_reference(&mut self, expr: &Expression, ctx: &Context) -> Result<Reference> {
        match expr {
            Expression::Identifier(id) => Ok(self.resolve(id, ctx)),
            Expression::Member(member) => {
                let (base, key) = self.eval_member_parts(member, ctx)?;
                Ok(Reference::Property { base, key })
            }
            Expression::Parenthesized(inner) => self.eval_reference(inner, ctx),
            _ => Err(Error::reference_error("Invalid left-hand side in assignment")),
        }
    }

    fn get_reference(&mut self, reference: &Reference) -> Result<Value> {
        match reference {
            Reference::Unresolvable(name) => {
                Err(Error::reference_error(messages::not_defined(name)))
            }
            Reference::Binding { record, key, .. } => self.get(record, key),
            Reference::Property { base, key } => self.get_value(base, key),
        }
    }

    fn put_reference(&mut self, reference: Reference, value: Value, ctx: &Context) -> Result<()> {
        match reference {
            Reference::Unresolvable(name) => {
                if ctx.strict {
                    return Err(Error::reference_error(messages::not_defined(&name)));
                }
                let global = self.realm.global.clone();
                self.put(&global, PropertyKey::from(name.as_str()), value, false)
            }
            Reference::Binding { record, key, .. } => self.put(&record, key, value, ctx.strict),
            Reference::Property { base, key } => self.put_value(&base, key, value, ctx.strict),
        }
    }

    // ---------------------------------------------------------------------
    // Literals
    // ---------------------------------------------------------------------

    fn eval_array_literal(&mut self, array: &ArrayExpression, ctx: &Context) -> Result<Value> {
        let mut elements = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            elements.push(match element {
                Some(e) => Some(self.eval_expression(e, ctx)?),
                None => None,
            });
        }
        Ok(Value::Object(
            self.new_array_with(ArrayStorage::from_elements(elements)),
        ))
    }

    fn eval_object_literal(&mut self, object: &ObjectExpression, ctx: &Context) -> Result<Value> {
        let obj = self.new_object();
        for prop in &object.properties {
            let key = match &prop.key {
                PropertyName::Identifier(id) => PropertyKey::from(id.key.clone()),
                PropertyName::String(s) => PropertyKey::from(s.clone()),
                PropertyName::Number(n) => PropertyKey::from(JsString::from(number_to_string(*n))),
            };
            let desc = match &prop.kind {
                ObjectPropertyKind::Init(expr) => {
                    let value = self.eval_expression(expr, ctx)?;
                    PropertyDescriptor::data(value, PropertyFlags::DEFAULT)
                }
                ObjectPropertyKind::Get(func) => PropertyDescriptor {
                    get: Some(Value::Object(self.create_function(func, &ctx.scope))),
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..Default::default()
                },
                ObjectPropertyKind::Set(func) => PropertyDescriptor {
                    set: Some(Value::Object(self.create_function(func, &ctx.scope))),
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..Default::default()
                },
            };
            obj.borrow_mut().define_own_property(key, &desc);
        }
        Ok(Value::Object(obj))
    }

    // ---------------------------------------------------------------------
    // Calls
    // ---------------------------------------------------------------------

    fn eval_arguments(&mut self, args: &[Expression], ctx: &Context) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expression(arg, ctx)?);
        }
        Ok(values)
    }

    fn eval_call(&mut self, call: &CallExpression, ctx: &Context) -> Result<Value> {
        let (func, this) = match call.callee.unparenthesized() {
            Expression::Member(member) => {
                let (base, key) = self.eval_member_parts(member, ctx)?;
                (self.get_value(&base, &key)?, base)
            }
            Expression::Identifier(id) => match self.resolve(id, ctx) {
                Reference::Binding {
                    record,
                    key,
                    with_base,
                } => {
                    let func = self.get(&record, &key)?;
                    let this = if with_base {
                        Value::Object(record)
                    } else {
                        Value::Undefined
                    };
                    (func, this)
                }
                reference => (self.get_reference(&reference)?, Value::Undefined),
            },
            other => (self.eval_expression(other, ctx)?, Value::Undefined),
        };
        let args = self.eval_arguments(&call.arguments, ctx)?;
        if !func.is_callable() {
            return Err(Error::type_error(messages::not_a_function(&callee_name(
                &call.callee,
            ))));
        }
        self.call(&func, this, &args)
    }

    fn eval_new(&mut self, new: &NewExpression, ctx: &Context) -> Result<Value> {
        let callee = self.eval_expression(&new.callee, ctx)?;
        let args = self.eval_arguments(&new.arguments, ctx)?;
        let constructible = callee
            .as_object()
            .is_some_and(|f| f.borrow().is_constructor());
        if !constructible {
            return Err(Error::type_error(messages::not_a_constructor(&callee_name(
                &new.callee,
            ))));
        }
        self.construct(&callee, &args)
    }

    // ---------------------------------------------------------------------
    // Operators
    // ---------------------------------------------------------------------

    fn eval_unary(&mut self, unary: &UnaryExpression, ctx: &Context) -> Result<Value> {
        match unary.operator {
            UnaryOperator::Delete => return self.eval_delete(&unary.argument, ctx),
            UnaryOperator::Typeof => {
                if let Expression::Identifier(id) = unary.argument.unparenthesized() {
                    let reference = self.resolve(id, ctx);
                    if matches!(reference, Reference::Unresolvable(_)) {
                        return Ok(Value::string("undefined"));
                    }
                    let value = self.get_reference(&reference)?;
                    return Ok(Value::string(value.type_of()));
                }
                let value = self.eval_expression(&unary.argument, ctx)?;
                return Ok(Value::string(value.type_of()));
            }
            _ => {}
        }
        let value = self.eval_expression(&unary.argument, ctx)?;
        Ok(match unary.operator {
            UnaryOperator::Void => Value::Undefined,
            UnaryOperator::Not => Value::Boolean(!value.to_boolean()),
            UnaryOperator::Minus => Value::Number(-self.to_number(&value)?),
            UnaryOperator::Plus => Value::Number(self.to_number(&value)?),
            UnaryOperator::BitwiseNot => Value::Number(!self.to_int32(&value)? as f64),
            UnaryOperator::Delete | UnaryOperator::Typeof => Value::Undefined,
        })
    }

    fn eval_delete(&mut self, target: &Expression, ctx: &Context) -> Result<Value> {
        let deleted = match target.unparenthesized() {
            Expression::Identifier(id) => match self.resolve(id, ctx) {
                Reference::Binding { record, key, .. } => {
                    self.delete_property(&record, &key, false)?
                }
                _ => true,
            },
            Expression::Member(member) => {
                let (base, key) = self.eval_member_parts(member, ctx)?;
                let obj = self.to_object(&base)?;
                self.delete_property(&obj, &key, ctx.strict)?
            }
            other => {
                self.eval_expression(other, ctx)?;
                true
            }
        };
        Ok(Value::Boolean(deleted))
    }

    fn eval_update(&mut self, update: &UpdateExpression, ctx: &Context) -> Result<Value> {
        let reference = self.eval_reference(&update.argument, ctx)?;
        let old_value = self.get_reference(&reference)?;
        let old = self.to_number(&old_value)?;
        let new = match update.operator {
            UpdateOperator::Increment => old + 1.0,
            UpdateOperator::Decrement => old - 1.0,
        };
        self.put_reference(reference, Value::Number(new), ctx)?;
        Ok(Value::Number(if update.prefix { new } else { old }))
    }

    fn eval_assignment(&mut self, assign: &AssignmentExpression, ctx: &Context) -> Result<Value> {
        let reference = self.eval_reference(&assign.left, ctx)?;
        let value = match assign.operator.binary_operator() {
            None => self.eval_expression(&assign.right, ctx)?,
            Some(op) => {
                let current = self.get_reference(&reference)?;
                let rhs = self.eval_expression(&assign.right, ctx)?;
                self.apply_binary(op, &current, &rhs)?
            }
        };
        self.put_reference(reference, value.clone(), ctx)?;
        Ok(value)
    }

    /// Apply a binary operator to evaluated operands
    pub(crate) fn apply_binary(&mut self, op: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
        use BinaryOperator::*;
        Ok(match op {
            Add => return self.add(left, right),
            Sub | Mul | Div | Mod => {
                let a = self.to_number(left)?;
                let b = self.to_number(right)?;
                Value::Number(match op {
                    Sub => a - b,
                    Mul => a * b,
                    Div => a / b,
                    _ => a % b,
                })
            }
            Shl | Shr | UShr | BitwiseAnd | BitwiseOr | BitwiseXor => {
                let a = self.to_number(left)?;
                let b = self.to_number(right)?;
                let shift = to_uint32(b) & 31;
                Value::Number(match op {
                    Shl => to_int32(a).wrapping_shl(shift) as f64,
                    Shr => (to_int32(a) >> shift) as f64,
                    UShr => (to_uint32(a) >> shift) as f64,
                    BitwiseAnd => (to_int32(a) & to_int32(b)) as f64,
                    BitwiseOr => (to_int32(a) | to_int32(b)) as f64,
                    _ => (to_int32(a) ^ to_int32(b)) as f64,
                })
            }
            Eq => Value::Boolean(self.loose_equals(left, right)?),
            Ne => Value::Boolean(!self.loose_equals(left, right)?),
            StrictEq => Value::Boolean(left.strict_equals(right)),
            StrictNe => Value::Boolean(!left.strict_equals(right)),
            Lt => Value::Boolean(self.less_than(left, right, true)? == Some(true)),
            Gt => Value::Boolean(self.less_than(right, left, false)? == Some(true)),
            Le => Value::Boolean(self.less_than(right, left, false)? == Some(false)),
            Ge => Value::Boolean(self.less_than(left, right, true)? == Some(false)),
            In => {
                let Value::Object(obj) = right else {
                    return Err(Error::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        left.describe(),
                        right.describe()
                    )));
                };
                let key = self.to_property_key(left)?;
                Value::Boolean(self.has_property(obj, &key))
            }
            Instanceof => Value::Boolean(self.instance_of(left, right)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::runtime::RuntimeConfig;

    fn eval(source: &str) -> Result<Value> {
        let mut interp = Interpreter::new(RuntimeConfig::default());
        let program = parse(source)?;
        interp.eval_program(&program)
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(eval("'a' + 1").unwrap(), Value::string("a1"));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Number(-1.0));
        assert_eq!(eval("-1 >>> 0").unwrap(), Value::Number(4294967295.0));
        assert_eq!(eval("1 << 31").unwrap(), Value::Number(-2147483648.0));
    }

    #[test]
    fn test_comparisons_with_nan() {
        assert_eq!(eval("NaN < 1").unwrap(), Value::Boolean(false));
        assert_eq!(eval("NaN >= 1").unwrap(), Value::Boolean(false));
        assert_eq!(eval("'b' > 'a'").unwrap(), Value::Boolean(true));
        assert_eq!(eval("2 <= 2").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_typeof_undeclared() {
        assert_eq!(eval("typeof nope").unwrap(), Value::string("undefined"));
        assert!(eval("nope").is_err());
    }

    #[test]
    fn test_in_requires_object() {
        let err = eval("'x' in 'str'").unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::TypeError));
    }

    #[test]
    fn test_compound_assignment_and_update() {
        assert_eq!(eval("var a = 5; a += 2; a *= 3; a").unwrap(), Value::Number(21.0));
        assert_eq!(eval("var i = 1; var j = i++; j * 10 + i").unwrap(), Value::Number(12.0));
        assert_eq!(eval("var o = {n: 1}; ++o.n").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_accessor_literal() {
        let src = "var o = { _v: 1, get v() { return this._v; }, set v(x) { this._v = x * 2; } };
                   o.v = 5; o.v";
        assert_eq!(eval(src).unwrap(), Value::Number(10.0));
    }

    #[test]
    fn test_not_a_function_message() {
        let err = eval("var o = {}; o.missing()").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: o.missing is not a function");
    }
}
