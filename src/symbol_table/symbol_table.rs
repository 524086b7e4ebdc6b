use crate::ast::types::DataType;

/// Bucket count used when no explicit size is requested.
pub const DEFAULT_BUCKET_COUNT: usize = 101;

struct Entry<T> {
    name: String,
    scope_level: usize,
    stamp: usize,
    value: T,
}

impl<T> Entry<T> {
    fn visible_at(&self, mark: Mark) -> bool {
        self.scope_level <= mark.depth && self.stamp < mark.stamp
    }
}

/// The set of bindings a table held at one moment: everything bound at
/// depth `depth` or shallower before `stamp`. Only meaningful while that
/// depth is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    depth: usize,
    stamp: usize,
}

/// A chained hash table of named entries tagged with the scope depth they
/// were bound at.
///
/// Inner bindings shadow outer ones with the same name; `leave_scope`
/// removes exactly the entries of the innermost depth. The code generator
/// and the interpreter store their own payloads in the same structure.
pub struct ScopeTable<T> {
    buckets: Vec<Vec<Entry<T>>>,
    current_scope: usize,
    next_stamp: usize,
}

fn hash(name: &str, bucket_count: usize) -> usize {
    let hash = name
        .bytes()
        .fold(0usize, |hash, byte| hash.wrapping_mul(31).wrapping_add(byte as usize));
    hash % bucket_count
}

impl<T> ScopeTable<T> {
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    pub fn with_buckets(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        ScopeTable {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
            current_scope: 0,
            next_stamp: 0,
        }
    }

    pub fn current_scope(&self) -> usize {
        self.current_scope
    }

    pub fn enter_scope(&mut self) {
        self.current_scope += 1;
        tracing::trace!(depth = self.current_scope, "enter scope");
    }

    /// Drops every entry bound at the current depth, then steps out.
    /// Does nothing at depth 0.
    pub fn leave_scope(&mut self) {
        if self.current_scope == 0 {
            return;
        }

        let depth = self.current_scope;
        for bucket in self.buckets.iter_mut() {
            bucket.retain(|entry| entry.scope_level != depth);
        }

        self.current_scope -= 1;
        tracing::trace!(depth = self.current_scope, "leave scope");
    }

    /// Binds `name` at the current depth. Returns false, leaving the table
    /// untouched, when the name is already bound at this depth.
    pub fn insert(&mut self, name: &str, value: T) -> bool {
        if self.lookup_current_scope(name).is_some() {
            return false;
        }

        let index = hash(name, self.buckets.len());
        self.buckets[index].push(Entry {
            name: String::from(name),
            scope_level: self.current_scope,
            stamp: self.next_stamp,
            value,
        });
        self.next_stamp += 1;
        true
    }

    /// Binds `name` at the current depth, replacing any binding of that
    /// name at the same depth.
    pub fn bind(&mut self, name: &str, value: T) {
        match self.lookup_current_scope_mut(name) {
            Some(existing) => *existing = value,
            None => {
                self.insert(name, value);
            }
        }
    }

    /// Innermost binding of `name` visible from the current depth.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.buckets[hash(name, self.buckets.len())]
            .iter()
            .filter(|entry| entry.name == name)
            .max_by_key(|entry| entry.scope_level)
            .map(|entry| &entry.value)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        let index = hash(name, self.buckets.len());
        self.buckets[index]
            .iter_mut()
            .filter(|entry| entry.name == name)
            .max_by_key(|entry| entry.scope_level)
            .map(|entry| &mut entry.value)
    }

    pub fn mark(&self) -> Mark {
        Mark {
            depth: self.current_scope,
            stamp: self.next_stamp,
        }
    }

    /// Innermost binding of `name` that was visible when `mark` was taken.
    /// Bindings made since are skipped, even where they now shadow it.
    pub fn lookup_at(&self, name: &str, mark: Mark) -> Option<&T> {
        self.buckets[hash(name, self.buckets.len())]
            .iter()
            .filter(|entry| entry.name == name && entry.visible_at(mark))
            .max_by_key(|entry| entry.scope_level)
            .map(|entry| &entry.value)
    }

    pub fn lookup_at_mut(&mut self, name: &str, mark: Mark) -> Option<&mut T> {
        let index = hash(name, self.buckets.len());
        self.buckets[index]
            .iter_mut()
            .filter(|entry| entry.name == name && entry.visible_at(mark))
            .max_by_key(|entry| entry.scope_level)
            .map(|entry| &mut entry.value)
    }

    pub fn lookup_current_scope(&self, name: &str) -> Option<&T> {
        let depth = self.current_scope;
        self.buckets[hash(name, self.buckets.len())]
            .iter()
            .find(|entry| entry.name == name && entry.scope_level == depth)
            .map(|entry| &entry.value)
    }

    pub fn lookup_current_scope_mut(&mut self, name: &str) -> Option<&mut T> {
        let depth = self.current_scope;
        let index = hash(name, self.buckets.len());
        self.buckets[index]
            .iter_mut()
            .find(|entry| entry.name == name && entry.scope_level == depth)
            .map(|entry| &mut entry.value)
    }

    /// Number of live bindings across all depths.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ScopeTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub param_types: Vec<DataType>,
    pub return_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// The declared type; for functions, the return type.
    pub data_type: DataType,
    pub scope_level: usize,
    /// Present only for `SymbolKind::Function`.
    pub signature: Option<FunctionSignature>,
}

impl Symbol {
    pub fn arity(&self) -> usize {
        self.signature
            .as_ref()
            .map_or(0, |signature| signature.param_types.len())
    }
}

/// The checker's view of the scope table: names mapped to typed symbols.
pub struct SymbolTable {
    table: ScopeTable<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    pub fn with_buckets(bucket_count: usize) -> Self {
        SymbolTable {
            table: ScopeTable::with_buckets(bucket_count),
        }
    }

    pub fn current_scope(&self) -> usize {
        self.table.current_scope()
    }

    pub fn enter_scope(&mut self) {
        self.table.enter_scope();
    }

    pub fn leave_scope(&mut self) {
        self.table.leave_scope();
    }

    pub fn insert(&mut self, name: &str, kind: SymbolKind, data_type: DataType) -> bool {
        let symbol = Symbol {
            name: String::from(name),
            kind,
            data_type,
            scope_level: self.table.current_scope(),
            signature: None,
        };
        self.table.insert(name, symbol)
    }

    pub fn insert_function(
        &mut self,
        name: &str,
        param_types: Vec<DataType>,
        return_type: DataType,
    ) -> bool {
        if !self.insert(name, SymbolKind::Function, return_type) {
            return false;
        }

        match self.table.lookup_current_scope_mut(name) {
            Some(function) => {
                function.signature = Some(FunctionSignature {
                    param_types,
                    return_type,
                });
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.table.lookup(name)
    }

    pub fn lookup_current_scope(&self, name: &str) -> Option<&Symbol> {
        self.table.lookup_current_scope(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
