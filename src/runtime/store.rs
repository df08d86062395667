use crate::core::types::FuncType;
use crate::exec::ExecError;
use crate::runtime::func::FuncRef;
use crate::runtime::global::GlobalValue;
use crate::runtime::memory::Memory;
use crate::runtime::table::Table;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedMemory = Rc<RefCell<Memory>>;
pub type SharedTable = Rc<RefCell<Table>>;
pub type SharedGlobal = Rc<RefCell<GlobalValue>>;

/// The runtime state of one instance: its index spaces, imports first. Imported memories,
/// tables and globals are the same cells the host holds, so writes are visible on both sides.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) types: Vec<FuncType>,
    pub(crate) funcs: Vec<FuncRef>,
    pub(crate) tables: Vec<SharedTable>,
    pub(crate) mems: Vec<SharedMemory>,
    pub(crate) globals: Vec<SharedGlobal>,
}

impl Store {
    pub(crate) fn func_type(&self, idx: u32) -> Result<&FuncType, ExecError> {
        self.types
            .get(idx as usize)
            .ok_or(ExecError::MissingType(idx))
    }

    pub(crate) fn func(&self, idx: u32) -> Result<&FuncRef, ExecError> {
        self.funcs
            .get(idx as usize)
            .ok_or(ExecError::MissingFunction(idx))
    }

    pub(crate) fn table(&self, idx: u32) -> Result<&SharedTable, ExecError> {
        self.tables
            .get(idx as usize)
            .ok_or(ExecError::MissingTable(idx))
    }

    pub(crate) fn memory(&self, idx: u32) -> Result<&SharedMemory, ExecError> {
        self.mems
            .get(idx as usize)
            .ok_or(ExecError::MissingMemory(idx))
    }

    pub(crate) fn global(&self, idx: u32) -> Result<&SharedGlobal, ExecError> {
        self.globals
            .get(idx as usize)
            .ok_or(ExecError::MissingGlobal(idx))
    }
}
