use crate::token::SourceLocation;

/// Tags values that need more than primitive handling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpecialValue {
    #[default]
    None,
    String,
    Enumeration,
    Structure,
    Boolean,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    /// The value is the address of a slot and must be loaded to be read.
    pub is_pointer: bool,
    pub is_mutable: bool,
    /// Declared, but the body is not compiled yet.
    pub is_prototype: bool,
    pub is_anonymous: bool,
    pub special: SpecialValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol<V> {
    /// `None` for anonymous symbols.
    pub name: Option<Box<str>>,
    pub value: V,
    pub location: SourceLocation,
    pub flags: SymbolFlags,
}

impl<V> Symbol<V> {
    pub fn named(name: impl Into<Box<str>>, value: V, location: SourceLocation) -> Symbol<V> {
        Symbol {
            name: Some(name.into()),
            value,
            location,
            flags: SymbolFlags::default(),
        }
    }

    pub fn anonymous(value: V, location: SourceLocation) -> Symbol<V> {
        Symbol {
            name: None,
            value,
            location,
            flags: SymbolFlags {
                is_anonymous: true,
                ..SymbolFlags::default()
            },
        }
    }

    #[must_use]
    pub fn pointer(mut self) -> Symbol<V> {
        self.flags.is_pointer = true;
        self
    }

    #[must_use]
    pub fn mutable(mut self, is_mutable: bool) -> Symbol<V> {
        self.flags.is_mutable = is_mutable;
        self
    }

    #[must_use]
    pub fn prototype(mut self) -> Symbol<V> {
        self.flags.is_prototype = true;
        self
    }

    #[must_use]
    pub fn special(mut self, special: SpecialValue) -> Symbol<V> {
        self.flags.special = special;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("attempted to pop the global scope")]
    GlobalScope,
    #[error("symbol '{0}' was captured multiple times")]
    DuplicateCapture(Box<str>),
}

#[derive(Clone, Debug)]
pub struct Scope<V, F> {
    symbols: Vec<Symbol<V>>,
    captures: Vec<Box<str>>,
    /// Set on the scope of a function body.
    function: Option<F>,
}

impl<V, F> Scope<V, F> {
    fn new(function: Option<F>) -> Scope<V, F> {
        Scope {
            symbols: Vec::new(),
            captures: Vec::new(),
            function,
        }
    }

    /// Latest symbol with the given name in this scope.
    pub fn find(&self, name: &str) -> Option<&Symbol<V>> {
        self.symbols.iter().rev().find(|s| s.name() == Some(name))
    }

    pub fn capture(&mut self, name: &str) -> Result<(), ScopeError> {
        if self.captures.iter().any(|c| &**c == name) {
            return Err(ScopeError::DuplicateCapture(name.into()));
        }
        self.captures.push(name.into());
        Ok(())
    }

    pub fn captures(&self) -> &[Box<str>] {
        &self.captures
    }

    pub fn function(&self) -> Option<&F> {
        self.function.as_ref()
    }
}

/// Stack of lexical scopes over a permanent global scope.
///
/// `V` is the value handle symbols bind to, `F` the handle of the function
/// owning a function scope. Lookups walk from the innermost scope outwards and
/// return the latest matching symbol, so later definitions shadow earlier
/// ones.
#[derive(Clone, Debug)]
pub struct SymbolTable<V, F> {
    scopes: Vec<Scope<V, F>>,
}

impl<V, F> Default for SymbolTable<V, F> {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl<V, F> SymbolTable<V, F> {
    pub fn new() -> SymbolTable<V, F> {
        SymbolTable {
            scopes: vec![Scope::new(None)],
        }
    }

    /// Number of scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new(None));
    }

    pub fn push_function_scope(&mut self, function: F) {
        self.scopes.push(Scope::new(Some(function)));
    }

    pub fn pop_scope(&mut self) -> Result<Scope<V, F>, ScopeError> {
        if self.is_global() {
            return Err(ScopeError::GlobalScope);
        }
        self.scopes.pop().ok_or(ScopeError::GlobalScope)
    }

    pub fn current_scope(&mut self) -> &mut Scope<V, F> {
        self.scopes
            .last_mut()
            .expect("the global scope is never popped")
    }

    pub fn add_symbol(&mut self, symbol: Symbol<V>) {
        self.current_scope().symbols.push(symbol);
    }

    pub fn find_symbol(&self, name: &str) -> Option<&Symbol<V>> {
        self.scopes.iter().rev().find_map(|scope| scope.find(name))
    }

    pub fn find_in_current_scope(&self, name: &str) -> Option<&Symbol<V>> {
        self.scopes.last().and_then(|scope| scope.find(name))
    }

    /// Finds a symbol along with the function owning the scope it lives in
    /// (`None` for symbols outside any function).
    pub fn find_symbol_with_owner(&self, name: &str) -> Option<(&Symbol<V>, Option<&F>)> {
        let (depth, symbol) = self
            .scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.find(name).map(|symbol| (depth, symbol)))?;
        let owner = self.scopes[..=depth]
            .iter()
            .rev()
            .find_map(Scope::function);
        Some((symbol, owner))
    }

    /// The function owning the innermost function scope.
    pub fn current_function(&self) -> Option<&F> {
        self.scopes.iter().rev().find_map(Scope::function)
    }
}

impl<V: PartialEq, F> SymbolTable<V, F> {
    pub fn find_symbol_by_value_handle(&self, value: &V) -> Option<&Symbol<V>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.iter().rev().find(|s| s.value == *value))
    }
}
