use crate::core::types::{RefType, TableType};
use crate::exec::ExecError;
use crate::runtime::func::{FuncRef, Function};
use crate::runtime::value::Value;

/// A table of nullable function references.
#[derive(Debug)]
pub struct Table {
    elements: Vec<Option<FuncRef>>,
    reftype: RefType,
}

impl Table {
    pub fn new(ty: TableType) -> Self {
        Table {
            elements: vec![None; ty.limits.min as usize],
            reftype: ty.reftype,
        }
    }

    /// A funcref table holding one untyped host function per callable, in order. Each function
    /// takes on the type named by the `call_indirect` that calls it.
    pub fn from_host_funcs<I, F>(funcs: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Fn(&[Value]) -> Result<Vec<Value>, ExecError> + 'static,
    {
        Table {
            elements: funcs
                .into_iter()
                .map(|f| Some(Function::host_untyped(f)))
                .collect(),
            reftype: RefType::Func,
        }
    }

    pub fn reftype(&self) -> RefType {
        self.reftype
    }

    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    pub fn get(&self, index: u32) -> Result<Option<FuncRef>, ExecError> {
        self.elements
            .get(index as usize)
            .cloned()
            .ok_or(ExecError::TableOutOfBounds {
                index,
                size: self.size(),
            })
    }

    /// The function at `index`, failing for both out-of-range and empty slots.
    pub fn element_at(&self, index: u32) -> Result<FuncRef, ExecError> {
        self.get(index)?
            .ok_or(ExecError::UninitializedElement(index))
    }

    pub fn set(&mut self, index: u32, func: Option<FuncRef>) -> Result<(), ExecError> {
        let size = self.size();
        let slot = self
            .elements
            .get_mut(index as usize)
            .ok_or(ExecError::TableOutOfBounds { index, size })?;
        *slot = func;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Limits;
    use std::rc::Rc;

    #[test]
    fn new_tables_start_empty() {
        let table = Table::new(TableType {
            reftype: RefType::Func,
            limits: Limits { min: 2, max: None },
        });
        assert_eq!(table.size(), 2);
        assert!(matches!(
            table.element_at(1),
            Err(ExecError::UninitializedElement(1))
        ));
        assert!(matches!(
            table.element_at(2),
            Err(ExecError::TableOutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn host_funcs_fill_the_table_in_order() {
        let table =
            Table::from_host_funcs((5..7).map(|n| move |_: &[Value]| Ok(vec![Value::I32(n)])));
        assert_eq!(table.size(), 2);

        let second = table.element_at(1).unwrap();
        assert!(second.ty().is_none());
        match &*second {
            Function::Host(h) => assert_eq!((h.callable)(&[]).unwrap(), [Value::I32(6)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn set_replaces_a_slot() {
        let mut table = Table::from_host_funcs([|_: &[Value]| Ok(vec![])]);
        let f = table.element_at(0).unwrap();
        table.set(0, None).unwrap();
        assert!(table.get(0).unwrap().is_none());
        table.set(0, Some(Rc::clone(&f))).unwrap();
        assert!(Rc::ptr_eq(&table.element_at(0).unwrap(), &f));
        assert!(table.set(1, None).is_err());
    }
}
