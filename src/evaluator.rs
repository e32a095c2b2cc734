use crate::ast::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::error::SpudError;
use crate::lexer::{Lexer, TokenKind};
use crate::parser::Parser;
use crate::value::{as_list, as_number, as_string, FunctionValue, NativeFunction, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// One link in the scope chain. Environments are shared (`Rc<RefCell<_>>`)
/// between the evaluator's current scope and every closure created while the
/// scope was active; closures can make the chain cyclic, which reference
/// counting tolerates at the cost of not reclaiming the cycle eagerly.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Binds in this environment only, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Walks outward to the first environment defining `name`. Returns false
    /// if no binding exists anywhere on the chain; assignment never creates
    /// a new binding.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}

/// How a statement finished. `Return` unwinds through enclosing blocks and
/// loops up to the nearest call boundary; checking it explicitly after every
/// statement keeps environment restoration unconditional.
pub enum Flow {
    Normal,
    Return(Value),
}

/// A single interpreter session: global scope, current scope, the native
/// registry, and the module-import bookkeeping. Lives for one `run` call
/// (or a whole REPL session).
pub struct Evaluator<'a> {
    out: &'a mut dyn Write,
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    imported: HashSet<String>,
    /// Parsed module statements are retained for the whole session; function
    /// declarations executed from a module keep `Rc` references into them.
    modules: HashMap<String, Rc<Vec<Stmt>>>,
    module_base: PathBuf,
}

impl<'a> Evaluator<'a> {
    pub fn new(out: &'a mut dyn Write, input: &str) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        let mut evaluator = Self {
            out,
            environment: Rc::clone(&globals),
            globals,
            imported: HashSet::new(),
            modules: HashMap::new(),
            module_base: PathBuf::from("modules"),
        };

        evaluator
            .globals
            .borrow_mut()
            .define("input", Value::Str(input.to_string()));
        evaluator.install_builtins();
        evaluator
    }

    /// Base directory for bare (non-path) module names.
    pub fn set_module_base(&mut self, path: impl Into<PathBuf>) {
        self.module_base = path.into();
    }

    /// Registers a host operation under `name`. `arity` of `None` accepts any
    /// argument count; a fixed arity is checked before the callable runs.
    pub fn register_native<F>(&mut self, name: &str, arity: Option<usize>, func: F)
    where
        F: Fn(&mut dyn Write, &[Value]) -> Result<Value, SpudError> + 'static,
    {
        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func: Box::new(func),
        };
        self.globals
            .borrow_mut()
            .define(name, Value::Native(Rc::new(native)));
    }

    fn install_builtins(&mut self) {
        self.register_native("list", Some(0), |_, _| Ok(Value::new_list()));

        self.register_native("push", Some(2), |_, args| {
            let list = as_list(&args[0])?;
            list.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        });

        // Out-of-range reads yield nil rather than failing
        self.register_native("get", Some(2), |_, args| {
            let list = as_list(&args[0])?;
            let index = as_number(&args[1])? as i64;
            let items = list.borrow();
            if index < 0 || index >= items.len() as i64 {
                return Ok(Value::Nil);
            }
            Ok(items[index as usize].clone())
        });

        self.register_native("set", Some(3), |_, args| {
            let list = as_list(&args[0])?;
            let index = as_number(&args[1])? as i64;
            let mut items = list.borrow_mut();
            if index < 0 || index >= items.len() as i64 {
                return Err(SpudError::runtime("Index out of range"));
            }
            items[index as usize] = args[2].clone();
            Ok(args[0].clone())
        });

        self.register_native("len", Some(1), |_, args| match &args[0] {
            Value::Str(s) => Ok(Value::Number(s.len() as f64)),
            Value::List(l) => Ok(Value::Number(l.borrow().len() as f64)),
            _ => Err(SpudError::runtime("len() expects string or list")),
        });

        // Ranges clamp instead of failing
        self.register_native("substr", Some(3), |_, args| {
            let s = as_string(&args[0])?;
            let start = as_number(&args[1])? as i64;
            let count = as_number(&args[2])? as i64;
            if count <= 0 {
                return Ok(Value::Str(String::new()));
            }
            let len = s.len() as i64;
            let start = start.clamp(0, len);
            let end = (start + count).min(len);
            let slice = s.get(start as usize..end as usize).unwrap_or("");
            Ok(Value::Str(slice.to_string()))
        });

        self.register_native("char_at", Some(2), |_, args| {
            let s = as_string(&args[0])?;
            let index = as_number(&args[1])? as i64;
            if index < 0 || index >= s.len() as i64 {
                return Ok(Value::Str(String::new()));
            }
            let slice = s.get(index as usize..index as usize + 1).unwrap_or("");
            Ok(Value::Str(slice.to_string()))
        });

        self.register_native("to_string", Some(1), |_, args| {
            Ok(Value::Str(args[0].to_string()))
        });

        self.register_native("write", Some(1), |out, args| {
            let _ = write!(out, "{}", args[0]);
            let _ = out.flush();
            Ok(Value::Nil)
        });

        self.register_native("is_digit", Some(1), |_, args| {
            let s = as_string(&args[0])?;
            Ok(Value::Bool(
                s.len() == 1 && s.as_bytes()[0].is_ascii_digit(),
            ))
        });

        self.register_native("is_alpha", Some(1), |_, args| {
            let s = as_string(&args[0])?;
            Ok(Value::Bool(
                s.len() == 1 && (s.as_bytes()[0].is_ascii_alphabetic() || s.as_bytes()[0] == b'_'),
            ))
        });

        self.register_native("is_alnum", Some(1), |_, args| {
            let s = as_string(&args[0])?;
            Ok(Value::Bool(
                s.len() == 1 && (s.as_bytes()[0].is_ascii_alphanumeric() || s.as_bytes()[0] == b'_'),
            ))
        });
    }

    /// Executes top-level statements. A `return` outside any function stops
    /// execution quietly instead of erroring.
    pub fn run(&mut self, program: &Program) -> Result<(), SpudError> {
        for stmt in &program.statements {
            match self.execute_statement(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => break,
            }
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, SpudError> {
        match stmt {
            Stmt::Let { name, init } => {
                let value = self.evaluate_expression(init)?;
                self.environment.borrow_mut().define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.evaluate_expression(value)?;
                if !self.environment.borrow_mut().assign(name, value) {
                    return Err(SpudError::runtime(format!("Undefined variable: {}", name)));
                }
                Ok(Flow::Normal)
            }
            Stmt::Print { expr } => {
                let value = self.evaluate_expression(expr)?;
                let _ = writeln!(self.out, "{}", value);
                Ok(Flow::Normal)
            }
            Stmt::Expression { expr } => {
                self.evaluate_expression(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Block { statements } => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                self.execute_block(statements, env)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute_statement(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    match self.execute_statement(body)? {
                        Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                let function = FunctionValue {
                    decl: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                };
                self.environment
                    .borrow_mut()
                    .define(&decl.name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Import { module, .. } => {
                self.import_module(module)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `env` as the innermost scope. The previous
    /// scope is restored on every exit path, including early returns and
    /// propagated errors.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<Flow, SpudError> {
        let previous = Rc::clone(&self.environment);
        self.environment = env;

        let mut result = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute_statement(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, SpudError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name } => self
                .environment
                .borrow()
                .get(name)
                .ok_or_else(|| SpudError::runtime(format!("Undefined variable: {}", name))),
            Expr::Grouping { expr } => self.evaluate_expression(expr),
            Expr::Unary { operator, operand } => {
                let operand = self.evaluate_expression(operand)?;
                match operator {
                    UnaryOp::Negate => Ok(Value::Number(-as_number(&operand)?)),
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.evaluate_binary_op(*operator, left, right)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate_expression(left)?;
                match operator {
                    LogicalOp::Or => {
                        if left.is_truthy() {
                            Ok(left)
                        } else {
                            self.evaluate_expression(right)
                        }
                    }
                    LogicalOp::And => {
                        if !left.is_truthy() {
                            Ok(left)
                        } else {
                            self.evaluate_expression(right)
                        }
                    }
                }
            }
            Expr::Call { callee, args } => {
                let callee = self.evaluate_expression(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate_expression(arg)?);
                }
                self.call_value(callee, arg_values)
            }
        }
    }

    fn evaluate_binary_op(
        &self,
        operator: BinaryOp,
        left: Value,
        right: Value,
    ) -> Result<Value, SpudError> {
        match operator {
            BinaryOp::Add => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{}{}", l, r))),
                _ => Err(SpudError::runtime(
                    "Operator + expects two numbers or two strings",
                )),
            },
            BinaryOp::Subtract => Ok(Value::Number(as_number(&left)? - as_number(&right)?)),
            BinaryOp::Multiply => Ok(Value::Number(as_number(&left)? * as_number(&right)?)),
            // Division by zero follows IEEE semantics rather than erroring
            BinaryOp::Divide => Ok(Value::Number(as_number(&left)? / as_number(&right)?)),
            BinaryOp::Greater => Ok(Value::Bool(as_number(&left)? > as_number(&right)?)),
            BinaryOp::GreaterEqual => Ok(Value::Bool(as_number(&left)? >= as_number(&right)?)),
            BinaryOp::Less => Ok(Value::Bool(as_number(&left)? < as_number(&right)?)),
            BinaryOp::LessEqual => Ok(Value::Bool(as_number(&left)? <= as_number(&right)?)),
            BinaryOp::Equal => Ok(Value::Bool(left.equals(&right))),
            BinaryOp::NotEqual => Ok(Value::Bool(!left.equals(&right))),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, SpudError> {
        match callee {
            Value::Native(native) => {
                if let Some(arity) = native.arity {
                    if args.len() != arity {
                        return Err(SpudError::runtime(format!(
                            "Arity mismatch calling {}",
                            native.name
                        )));
                    }
                }
                (native.func)(&mut *self.out, &args)
            }
            Value::Function(function) => {
                let decl = &function.decl;
                if args.len() != decl.params.len() {
                    return Err(SpudError::runtime(format!(
                        "Arity mismatch calling {}",
                        decl.name
                    )));
                }

                // Lexical scoping: the call frame chains to the function's
                // captured closure, not the caller's environment.
                let mut call_env = Environment::with_enclosing(Rc::clone(&function.closure));
                for (param, arg) in decl.params.iter().zip(args) {
                    call_env.define(param, arg);
                }

                match self.execute_block(&decl.body, Rc::new(RefCell::new(call_env)))? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                }
            }
            _ => Err(SpudError::runtime("Can only call functions")),
        }
    }

    /// Resolves and executes a module, once per session per name. The mark is
    /// taken before execution so circular imports become no-ops; any failure
    /// removes the mark and the retained parse together, allowing a corrected
    /// retry later.
    fn import_module(&mut self, name: &str) -> Result<(), SpudError> {
        if self.imported.contains(name) {
            return Ok(());
        }
        self.imported.insert(name.to_string());

        let path = self.resolve_module_path(name);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(_) => {
                self.imported.remove(name);
                return Err(SpudError::runtime(format!(
                    "Failed to import module: {}",
                    name
                )));
            }
        };

        let result = self.load_module(name, source);
        if result.is_err() {
            self.imported.remove(name);
            self.modules.remove(name);
        }
        result
    }

    fn load_module(&mut self, name: &str, source: String) -> Result<(), SpudError> {
        let tokens = Lexer::new(source).scan();
        if tokens.iter().any(|t| t.kind == TokenKind::Invalid) {
            return Err(SpudError::runtime(format!(
                "Lex error importing module: {}",
                name
            )));
        }

        let program = Parser::new(tokens)
            .parse()
            .map_err(|e| SpudError::runtime(e.to_string()))?;
        let statements = Rc::new(program.statements);
        self.modules.insert(name.to_string(), Rc::clone(&statements));

        // Module top level always executes against the global scope,
        // regardless of how deeply nested the importing statement was.
        let previous = Rc::clone(&self.environment);
        self.environment = Rc::clone(&self.globals);

        let mut result = Ok(());
        for stmt in statements.iter() {
            match self.execute_statement(stmt) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(_)) => break,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    /// Absolute and relative paths are used verbatim; bare names resolve
    /// under the module base directory. The source extension is appended
    /// when absent.
    fn resolve_module_path(&self, name: &str) -> PathBuf {
        let mut path = if name.starts_with('/') || name.starts_with("./") || name.starts_with("../")
        {
            name.to_string()
        } else {
            self.module_base.join(name).to_string_lossy().into_owned()
        };
        if !path.ends_with(".spud") {
            path.push_str(".spud");
        }
        PathBuf::from(path)
    }
}
