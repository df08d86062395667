//! Instantiation: linking a decoded [`Module`] against host-provided imports.
use crate::config::Config;
use crate::core::types::{FuncType, Limits, ValType};
use crate::core::{DataMode, ElemInit, ElemMode, ExportDesc, Expr, ImportDesc, Module};
use crate::exec::compile::compile;
use crate::exec::{ExecError, Executor, eval_const};
use crate::runtime::store::Store;
use crate::runtime::{
    FuncRef, Function, GlobalValue, Memory, SharedGlobal, SharedMemory, SharedTable, Table,
    Value, ValueStack, WasmFunction,
};
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Something a module can import or export.
#[derive(Debug, Clone)]
pub enum Extern {
    Func(FuncRef),
    Table(SharedTable),
    Memory(SharedMemory),
    Global(SharedGlobal),
}

impl Extern {
    fn kind(&self) -> &'static str {
        match self {
            Extern::Func(_) => "function",
            Extern::Table(_) => "table",
            Extern::Memory(_) => "memory",
            Extern::Global(_) => "global",
        }
    }
}

impl From<FuncRef> for Extern {
    fn from(f: FuncRef) -> Self {
        Extern::Func(f)
    }
}

impl From<SharedTable> for Extern {
    fn from(t: SharedTable) -> Self {
        Extern::Table(t)
    }
}

impl From<SharedMemory> for Extern {
    fn from(m: SharedMemory) -> Self {
        Extern::Memory(m)
    }
}

impl From<SharedGlobal> for Extern {
    fn from(g: SharedGlobal) -> Self {
        Extern::Global(g)
    }
}

/// The host side of linking: values keyed by module name, then field name.
///
/// Tables, memories and globals are shared, not copied. Keep a clone of the `Rc` to observe
/// what the guest does to them.
#[derive(Debug, Default, Clone)]
pub struct Imports {
    modules: BTreeMap<String, BTreeMap<String, Extern>>,
}

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, module: &str, name: &str, value: impl Into<Extern>) -> &mut Self {
        self.modules
            .entry(module.to_owned())
            .or_default()
            .insert(name.to_owned(), value.into());
        self
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&Extern> {
        self.modules.get(module)?.get(name)
    }
}

#[derive(Debug, Error)]
pub enum InstantiateError {
    #[error("unknown import: {module}.{name}")]
    UnknownImport { module: String, name: String },

    #[error("import {module}.{name}: expected a {expected}; got a {actual}")]
    ImportKindMismatch {
        module: String,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("import {module}.{name} has an incompatible type: {reason}")]
    ImportTypeMismatch {
        module: String,
        name: String,
        reason: String,
    },

    #[error("unknown type {0}")]
    InvalidType(u32),

    #[error("unknown function {0}")]
    InvalidFunction(u32),

    #[error("unknown table {0}")]
    InvalidTable(u32),

    #[error("unknown memory {0}")]
    InvalidMemory(u32),

    #[error("unknown global {0}")]
    InvalidGlobal(u32),

    #[error("function {func} has {count} locals; the limit is {limit}")]
    TooManyLocals { func: u32, count: u64, limit: usize },

    #[error("table {index} has a minimum size of {min}; the limit is {limit}")]
    TableTooLarge { index: u32, min: u32, limit: u32 },

    #[error("failed compiling function {func}")]
    Compile {
        func: u32,
        #[source]
        source: ExecError,
    },

    #[error("failed allocating memory {index}")]
    Memory {
        index: u32,
        #[source]
        source: ExecError,
    },

    #[error("failed initializing global {index}")]
    GlobalInit {
        index: u32,
        #[source]
        source: ExecError,
    },

    #[error("failed initializing from {kind} segment {index}")]
    Segment {
        kind: &'static str,
        index: u32,
        #[source]
        source: ExecError,
    },

    #[error("start function failed")]
    Start(#[source] ExecError),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("no export named {0:?}")]
    UnknownExport(String),

    #[error("export {0:?} is not a function")]
    NotAFunction(String),

    #[error("expected {expected} arguments; got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// A module linked to its imports, with its state initialized and its start function run.
pub struct Instance {
    store: Rc<Store>,
    exports: BTreeMap<String, Extern>,
    stack: ValueStack,
    config: Config,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .field("stack", &self.stack)
            .field("config", &self.config)
            .finish()
    }
}

impl Module {
    /// Instantiate with the default [`Config`].
    pub fn instantiate(&self, imports: &Imports) -> Result<Instance, InstantiateError> {
        self.instantiate_with(imports, Config::default())
    }

    pub fn instantiate_with(
        &self,
        imports: &Imports,
        config: Config,
    ) -> Result<Instance, InstantiateError> {
        let types = self.types().to_vec();
        let mut funcs = Vec::new();
        let mut tables = Vec::new();
        let mut mems = Vec::new();
        let mut globals = Vec::new();

        for import in self.imports() {
            let (module, name) = (&import.module, &import.name);
            let provided =
                imports
                    .get(module, name)
                    .ok_or_else(|| InstantiateError::UnknownImport {
                        module: module.clone(),
                        name: name.clone(),
                    })?;
            let type_mismatch = |reason: String| InstantiateError::ImportTypeMismatch {
                module: module.clone(),
                name: name.clone(),
                reason,
            };
            let kind_mismatch = |expected| InstantiateError::ImportKindMismatch {
                module: module.clone(),
                name: name.clone(),
                expected,
                actual: provided.kind(),
            };

            match (&import.desc, provided) {
                (ImportDesc::Func(idx), Extern::Func(f)) => {
                    let expected = types
                        .get(idx.index())
                        .ok_or(InstantiateError::InvalidType(idx.0))?;
                    let func = match f.ty() {
                        Some(actual) if actual != expected => {
                            return Err(type_mismatch(format!(
                                "expected {expected}; got {actual}"
                            )));
                        }
                        Some(_) => Rc::clone(f),
                        None => f.bind_host_type(expected).unwrap_or_else(|| Rc::clone(f)),
                    };
                    funcs.push(func);
                }
                (ImportDesc::Table(ty), Extern::Table(t)) => {
                    let table = t.borrow();
                    if table.reftype() != ty.reftype {
                        return Err(type_mismatch(format!(
                            "expected a table of {:?}; got {:?}",
                            ty.reftype,
                            table.reftype()
                        )));
                    }
                    check_limits(ty.limits, table.size(), None).map_err(type_mismatch)?;
                    tables.push(Rc::clone(t));
                }
                (ImportDesc::Mem(ty), Extern::Memory(m)) => {
                    let mem = m.borrow();
                    check_limits(ty.limits, mem.size(), mem.max()).map_err(type_mismatch)?;
                    mems.push(Rc::clone(m));
                }
                (ImportDesc::Global(ty), Extern::Global(g)) => {
                    let actual = g.borrow().ty();
                    if actual != *ty {
                        return Err(type_mismatch(format!(
                            "expected {ty:?}; got {actual:?}"
                        )));
                    }
                    globals.push(Rc::clone(g));
                }
                (ImportDesc::Func(_), _) => return Err(kind_mismatch("function")),
                (ImportDesc::Table(_), _) => return Err(kind_mismatch("table")),
                (ImportDesc::Mem(_), _) => return Err(kind_mismatch("memory")),
                (ImportDesc::Global(_), _) => return Err(kind_mismatch("global")),
            }
            debug!("resolved import {module}.{name} as {}", provided.kind());
        }

        let imported_funcs = funcs.len() as u32;
        let imported_globals = globals.len() as u32;

        for ty in self.tables() {
            if ty.limits.min > config.max_table_elements {
                return Err(InstantiateError::TableTooLarge {
                    index: tables.len() as u32,
                    min: ty.limits.min,
                    limit: config.max_table_elements,
                });
            }
            tables.push(Rc::new(RefCell::new(Table::new(*ty))));
        }
        for ty in self.mems() {
            let mem = Memory::new(ty.limits).map_err(|source| InstantiateError::Memory {
                index: mems.len() as u32,
                source,
            })?;
            mems.push(Rc::new(RefCell::new(mem)));
        }
        globals.extend(
            self.globals()
                .iter()
                .map(|g| Rc::new(RefCell::new(GlobalValue::declared(g.r#type, g.init.clone())))),
        );

        let mut compiled = Vec::with_capacity(self.codes().len());
        for (i, (idx, code)) in self.functions().iter().zip(self.codes()).enumerate() {
            let func = imported_funcs + i as u32;
            let ty = types
                .get(idx.index())
                .ok_or(InstantiateError::InvalidType(idx.0))?
                .clone();
            let count = ty.parameters.len() as u64 + code.local_count();
            if count > config.max_locals as u64 {
                return Err(InstantiateError::TooManyLocals {
                    func,
                    count,
                    limit: config.max_locals,
                });
            }
            let ops = compile(&code.body, &types)
                .map_err(|source| InstantiateError::Compile { func, source })?;
            compiled.push((ty, code.local_types().collect::<Vec<_>>(), ops));
        }

        let store = Rc::new_cyclic(|weak| {
            funcs.extend(compiled.into_iter().map(|(ty, locals, code)| {
                Rc::new(Function::Wasm(WasmFunction {
                    ty,
                    locals,
                    code: code.into(),
                    store: weak.clone(),
                }))
            }));
            Store {
                types,
                funcs,
                tables,
                mems,
                globals,
            }
        });

        for i in 0..self.globals().len() as u32 {
            let index = imported_globals + i;
            let global_init = |source| InstantiateError::GlobalInit { index, source };
            let cell = store.global(index).map_err(global_init)?;
            let init = cell.borrow().initializer().map_err(global_init)?.clone();
            let value = eval_const(&init, &store, &config).map_err(global_init)?;
            cell.borrow_mut().initialize(value).map_err(global_init)?;
            debug!("initialized global {index}");
        }

        for (index, elem) in self.elems().iter().enumerate() {
            let ElemMode::Active { table, offset } = &elem.mode else {
                continue;
            };
            let segment = |source| InstantiateError::Segment {
                kind: "element",
                index: index as u32,
                source,
            };
            let table = table.map_or(0, |t| t.0);
            let offset = eval_offset(offset, &store, &config).map_err(segment)?;
            let items = elem_items(&elem.init, &store, &config).map_err(segment)?;
            fill_table(store.table(table).map_err(segment)?, offset, items).map_err(segment)?;
            debug!("initialized table {table} from element segment {index} at {offset}");
        }

        for (index, data) in self.datas().iter().enumerate() {
            let DataMode::Active { memory, offset } = &data.mode else {
                continue;
            };
            let segment = |source| InstantiateError::Segment {
                kind: "data",
                index: index as u32,
                source,
            };
            let memory = memory.map_or(0, |m| m.0);
            let offset = eval_offset(offset, &store, &config).map_err(segment)?;
            store
                .memory(memory)
                .map_err(segment)?
                .borrow_mut()
                .write(u64::from(offset), &data.init)
                .map_err(segment)?;
            debug!(
                "initialized memory {memory} from data segment {index}: {} bytes at {offset}",
                data.init.len()
            );
        }

        let mut exports = BTreeMap::new();
        for export in self.exports() {
            let value = match export.desc {
                ExportDesc::Func(idx) => Extern::Func(
                    store
                        .func(idx.0)
                        .map_err(|_| InstantiateError::InvalidFunction(idx.0))?
                        .clone(),
                ),
                ExportDesc::Table(idx) => Extern::Table(
                    store
                        .table(idx.0)
                        .map_err(|_| InstantiateError::InvalidTable(idx.0))?
                        .clone(),
                ),
                ExportDesc::Mem(idx) => Extern::Memory(
                    store
                        .memory(idx.0)
                        .map_err(|_| InstantiateError::InvalidMemory(idx.0))?
                        .clone(),
                ),
                ExportDesc::Global(idx) => Extern::Global(
                    store
                        .global(idx.0)
                        .map_err(|_| InstantiateError::InvalidGlobal(idx.0))?
                        .clone(),
                ),
            };
            exports.insert(export.name.clone(), value);
        }

        let mut stack = ValueStack::new();
        if let Some(start) = self.start() {
            let func = store
                .func(start.0)
                .map_err(|_| InstantiateError::InvalidFunction(start.0))?
                .clone();
            debug!("running start function {}", start.0);
            Executor::new(&mut stack, &config)
                .invoke(&func, None)
                .map_err(InstantiateError::Start)?;
        }

        Ok(Instance {
            store,
            exports,
            stack,
            config,
        })
    }
}

/// Check a provided table or memory of `size` (and optional `max`) against the declared limits.
fn check_limits(limits: Limits, size: u32, max: Option<u32>) -> Result<(), String> {
    if size < limits.min {
        return Err(format!("size {size} is below the minimum {}", limits.min));
    }
    if let Some(declared) = limits.max {
        match max {
            Some(max) if max <= declared => {}
            Some(max) => return Err(format!("maximum {max} exceeds {declared}")),
            None => return Err(format!("unbounded where a maximum of {declared} is required")),
        }
    }
    Ok(())
}

fn eval_offset(expr: &Expr, store: &Rc<Store>, config: &Config) -> Result<u32, ExecError> {
    match eval_const(expr, store, config)? {
        Value::I32(n) => Ok(n as u32),
        other => Err(ExecError::TypeMismatch {
            expected: ValType::I32,
            actual: other.ty(),
        }),
    }
}

fn elem_items(
    init: &ElemInit,
    store: &Rc<Store>,
    config: &Config,
) -> Result<Vec<Option<FuncRef>>, ExecError> {
    match init {
        ElemInit::Funcs(idxs) => idxs
            .iter()
            .map(|idx| store.func(idx.0).cloned().map(Some))
            .collect(),
        ElemInit::Exprs(_, exprs) => exprs
            .iter()
            .map(|expr| match eval_const(expr, store, config)? {
                Value::FuncRef(f) => Ok(f),
                Value::ExternRef(None) => Ok(None),
                other => Err(ExecError::TypeMismatch {
                    expected: ValType::FUNCREF,
                    actual: other.ty(),
                }),
            })
            .collect(),
    }
}

fn fill_table(
    table: &SharedTable,
    offset: u32,
    items: Vec<Option<FuncRef>>,
) -> Result<(), ExecError> {
    let mut table = table.borrow_mut();
    let size = table.size();
    let end = u64::from(offset) + items.len() as u64;
    if end > u64::from(size) {
        return Err(ExecError::TableOutOfBounds {
            index: u32::try_from(end).unwrap_or(u32::MAX),
            size,
        });
    }
    for (slot, func) in (offset..).zip(items) {
        table.set(slot, func)?;
    }
    Ok(())
}

impl Instance {
    /// Call the exported function `name` and return its results.
    ///
    /// With [`Config::backfill_args`] set, a call with fewer arguments than the function
    /// declares takes the missing trailing ones off the instance's operand stack, one pop per
    /// argument. Otherwise the count must match exactly. When the stack holds too few values the
    /// call fails without popping any of them.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>, CallError> {
        let func = match self.exports.get(name) {
            Some(Extern::Func(f)) => Rc::clone(f),
            Some(_) => return Err(CallError::NotAFunction(name.to_owned())),
            None => return Err(CallError::UnknownExport(name.to_owned())),
        };
        let ty: FuncType = func.ty().cloned().ok_or(ExecError::UntypedHostFunction)?;

        let expected = ty.parameters.len();
        if args.len() > expected || (args.len() < expected && !self.config.backfill_args) {
            return Err(CallError::ArityMismatch {
                expected,
                actual: args.len(),
            });
        }

        let missing = expected - args.len();
        if self.stack.len() < missing {
            return Err(CallError::ArityMismatch {
                expected,
                actual: args.len() + self.stack.len(),
            });
        }
        let mut params = args.to_vec();
        for _ in 0..missing {
            params.push(self.stack.pop()?);
        }

        debug!("calling export {name:?} with {} arguments", params.len());
        let base = self.stack.len();
        for param in params {
            self.stack.push(param);
        }

        let result = Executor::new(&mut self.stack, &self.config).invoke(&func, None);
        let result = result.and_then(|()| self.stack.pop_n(ty.results.len()));
        if result.is_err() {
            self.stack.truncate(base);
        }
        Ok(result?)
    }

    /// The export map, built from the module's export section.
    pub fn exports(&self) -> &BTreeMap<String, Extern> {
        &self.exports
    }

    pub fn export(&self, name: &str) -> Option<&Extern> {
        self.exports.get(name)
    }

    /// Current value of the exported global `name`.
    pub fn global_value(&self, name: &str) -> Option<Value> {
        match self.exports.get(name)? {
            Extern::Global(g) => Some(g.borrow().value().clone()),
            _ => None,
        }
    }

    pub fn memory(&self, name: &str) -> Option<SharedMemory> {
        match self.exports.get(name)? {
            Extern::Memory(m) => Some(Rc::clone(m)),
            _ => None,
        }
    }

    pub fn table(&self, name: &str) -> Option<SharedTable> {
        match self.exports.get(name)? {
            Extern::Table(t) => Some(Rc::clone(t)),
            _ => None,
        }
    }

    /// The operand stack shared by every call into this instance. Values left here are what
    /// argument backfilling draws from.
    pub fn operand_stack_mut(&mut self) -> &mut ValueStack {
        &mut self.stack
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of functions in the instance's index space, imports included.
    pub fn func_count(&self) -> usize {
        self.store.funcs.len()
    }
}
