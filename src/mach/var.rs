use super::{Val, MAX_VARIABLES};
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// Flat store, visible to the whole program. A name's kind comes from
/// its suffix and is fixed the moment it is first bound; the stored
/// value carries the kind so it is never re-derived from the name.
#[derive(Debug, Default)]
pub struct Var {
    vars: HashMap<Rc<str>, Val>,
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// First reference creates the binding with the kind's default.
    pub fn fetch(&self, name: &Rc<str>) -> Val {
        match self.vars.get(name) {
            Some(val) => val.clone(),
            None => {
                if name.ends_with('$') {
                    Val::Text("".into())
                } else {
                    Val::Number(0.0)
                }
            }
        }
    }

    pub fn store(&mut self, name: &Rc<str>, value: Val) -> Result<()> {
        let text_name = name.ends_with('$');
        let text_value = matches!(value, Val::Text(_));
        if text_name != text_value {
            return Err(error!(TypeMismatch));
        }
        if self.vars.len() >= MAX_VARIABLES && !self.vars.contains_key(name) {
            return Err(error!(OutOfMemory; "VARIABLE SPACE FULL"));
        }
        match self.vars.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.vars.insert(name.clone(), value);
            }
        }
        Ok(())
    }
}
