use super::{Address, MAX_PROGRAM_LINES};
use crate::error;
use crate::lang::{Cursor, Error, LineNumber, MaxValue, MAX_LINE_LEN};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Program store and line index
///
/// Lines live in numeric order; the index is the jump table, rebuilt
/// eagerly on every edit so a resolved Address stays valid for a whole
/// run and GOTO never re-scans program text.
#[derive(Debug, Default)]
pub struct Program {
    source: BTreeMap<u16, Rc<str>>,
    index: Vec<(u16, Rc<str>)>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.index.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Store or replace a line; empty text deletes it.
    pub fn insert(&mut self, number: u16, text: &str) -> Result<()> {
        if text.is_empty() {
            self.remove(number);
            return Ok(());
        }
        if text.len() > MAX_LINE_LEN {
            return Err(error!(LineBufferOverflow));
        }
        if self.source.len() >= MAX_PROGRAM_LINES && !self.source.contains_key(&number) {
            return Err(error!(OutOfMemory; "PROGRAM SPACE FULL"));
        }
        self.source.insert(number, text.into());
        self.rebuild();
        Ok(())
    }

    pub fn remove(&mut self, number: u16) -> bool {
        let removed = self.source.remove(&number).is_some();
        if removed {
            self.rebuild();
        }
        removed
    }

    fn rebuild(&mut self) {
        self.index = self
            .source
            .iter()
            .map(|(&number, text)| (number, text.clone()))
            .collect();
    }

    /// Resolve a line number to its execution address.
    pub fn address_of(&self, number: u16) -> Result<Address> {
        debug_assert_eq!(self.index.len(), self.source.len());
        match self.index.binary_search_by_key(&number, |&(n, _)| n) {
            Ok(addr) => Ok(addr),
            Err(_) => Err(error!(UndefinedLine)),
        }
    }

    pub fn line_at(&self, addr: Address) -> Option<(u16, Rc<str>)> {
        self.index.get(addr).cloned()
    }

    pub fn first(&self) -> Option<Address> {
        if self.index.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// All lines in ascending numeric order, for SAVE and round trips.
    pub fn lines(&self) -> impl Iterator<Item = (u16, &str)> + '_ {
        self.source.iter().map(|(&number, text)| (number, &**text))
    }

    /// One LIST line, advancing `range` so the next call resumes where
    /// this one left off. Restartable: callers own the range state.
    pub fn list_line(&self, range: &mut RangeInclusive<u16>) -> Option<String> {
        let mut source_range = self.source.range(range.clone());
        if let Some((&number, text)) = source_range.next() {
            let last = *range.end();
            if number < last {
                *range = (number + 1)..=last;
            } else {
                let sentinel = LineNumber::max_value() + 1;
                *range = sentinel..=sentinel;
            }
            return Some(format!("{} {}", number, text));
        }
        None
    }

    /// Accept one line of a stored program file.
    pub fn load_str(&mut self, line: &str) -> Result<()> {
        if line.len() > MAX_LINE_LEN {
            return Err(error!(LineBufferOverflow));
        }
        let mut cursor = Cursor::new(line);
        match cursor.match_line_number() {
            Some(number) => {
                let text = line[cursor.pos()..].trim();
                self.insert(number, text)
            }
            None => {
                if cursor.match_eol() {
                    Ok(())
                } else {
                    Err(error!(DirectStatementInFile))
                }
            }
        }
    }

    /// Unused store capacity in bytes, for the MEM diagnostic.
    pub fn free_bytes(&self) -> usize {
        let capacity = MAX_PROGRAM_LINES * (MAX_LINE_LEN + 2);
        let used: usize = self.source.values().map(|text| text.len() + 2).sum();
        capacity - used
    }
}
