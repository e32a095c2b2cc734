use crate::ast::FunctionDecl;
use crate::error::SpudError;
use crate::evaluator::Environment;
use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// A user-declared function paired with the environment that was active at
/// its declaration. Cloning the `Value` aliases this same pair, so two copies
/// of a function compare equal and see the same captured variables.
pub struct FunctionValue {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
}

/// A host-supplied operation exposed to guest programs under a fixed name.
/// `arity` of `None` means variadic. The callable receives the interpreter's
/// output sink and the already-evaluated arguments.
pub struct NativeFunction {
    pub name: String,
    pub arity: Option<usize>,
    pub func: Box<dyn Fn(&mut dyn Write, &[Value]) -> Result<Value, SpudError>>,
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Number(f64),
    Bool(bool),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionValue>),
    Native(Rc<NativeFunction>),
}

impl Value {
    pub fn new_list() -> Self {
        Value::List(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// `==`/`!=` semantics: numbers, bools and strings compare by value,
    /// lists and functions by identity, and any cross-kind comparison is
    /// simply unequal rather than an error.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::List(l), Value::List(r)) => Rc::ptr_eq(l, r),
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::Native(l), Value::Native(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

pub fn as_number(v: &Value) -> Result<f64, SpudError> {
    match v {
        Value::Number(n) => Ok(*n),
        _ => Err(SpudError::runtime("Expected number")),
    }
}

pub fn as_string(v: &Value) -> Result<&str, SpudError> {
    match v {
        Value::Str(s) => Ok(s),
        _ => Err(SpudError::runtime("Expected string")),
    }
}

pub fn as_list(v: &Value) -> Result<Rc<RefCell<Vec<Value>>>, SpudError> {
    match v {
        Value::List(l) => Ok(Rc::clone(l)),
        _ => Err(SpudError::runtime("Expected list")),
    }
}

/// Renders a number to 15 significant digits in fixed notation (no exponent,
/// no trailing `.0`), trimming trailing zeros after the decimal point.
pub fn number_to_string(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    // Significant digits, not fractional: the fractional precision depends on
    // how many digits sit before the decimal point.
    let magnitude = x.abs().log10().floor() as i32;
    let precision = (15 - 1 - magnitude).max(0) as usize;
    let mut s = format!("{:.*}", precision, x);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            // Composite and callable values render as opaque placeholders
            Value::List(_) => write!(f, "<list>"),
            Value::Function(_) => write!(f, "<fun>"),
            Value::Native(_) => write!(f, "<native>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(l) => write!(f, "List({:?})", l.borrow()),
            Value::Function(func) => write!(f, "Function({})", func.decl.name),
            Value::Native(nf) => write!(f, "Native({})", nf.name),
        }
    }
}
