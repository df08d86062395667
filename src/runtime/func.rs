use crate::core::types::{FuncType, ValType};
use crate::exec::ExecError;
use crate::exec::compile::Op;
use crate::runtime::store::Store;
use crate::runtime::value::Value;
use std::fmt;
use std::rc::{Rc, Weak};

/// A reference to a function, as held by tables, values and export maps.
pub type FuncRef = Rc<Function>;

/// The callable behind a host function.
pub type HostCallable = Rc<dyn Fn(&[Value]) -> Result<Vec<Value>, ExecError>>;

/// A function as the engine sees it: either compiled WebAssembly code bound to the instance it
/// came from, or a host callable. Calls treat both alike.
pub enum Function {
    Wasm(WasmFunction),
    Host(HostFunction),
}

pub struct WasmFunction {
    pub(crate) ty: FuncType,
    pub(crate) locals: Vec<ValType>,
    pub(crate) code: Rc<[Op]>,
    pub(crate) store: Weak<Store>,
}

pub struct HostFunction {
    /// `None` for host functions whose type is only known at the call site, such as closures
    /// placed in a table.
    pub(crate) ty: Option<FuncType>,
    pub(crate) callable: HostCallable,
}

impl Function {
    /// Wrap a host callable with a known type.
    pub fn host<F>(ty: FuncType, f: F) -> FuncRef
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, ExecError> + 'static,
    {
        Rc::new(Function::Host(HostFunction {
            ty: Some(ty),
            callable: Rc::new(f),
        }))
    }

    /// Wrap a host callable that adopts whatever type it is called with.
    pub fn host_untyped<F>(f: F) -> FuncRef
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, ExecError> + 'static,
    {
        Rc::new(Function::Host(HostFunction {
            ty: None,
            callable: Rc::new(f),
        }))
    }

    pub fn ty(&self) -> Option<&FuncType> {
        match self {
            Function::Wasm(f) => Some(&f.ty),
            Function::Host(f) => f.ty.as_ref(),
        }
    }

    /// A host function sharing this one's callable, with its type fixed to `ty`.
    pub(crate) fn bind_host_type(&self, ty: &FuncType) -> Option<FuncRef> {
        match self {
            Function::Host(HostFunction { ty: None, callable }) => {
                Some(Rc::new(Function::Host(HostFunction {
                    ty: Some(ty.clone()),
                    callable: Rc::clone(callable),
                })))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Wasm(w) => f
                .debug_struct("WasmFunction")
                .field("ty", &w.ty)
                .field("locals", &w.locals)
                .field("ops", &w.code.len())
                .finish(),
            Function::Host(h) => f.debug_struct("HostFunction").field("ty", &h.ty).finish(),
        }
    }
}
