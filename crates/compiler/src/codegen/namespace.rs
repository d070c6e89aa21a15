//! Scope and overload table
//!
//! The scope is the ordered list of names declared so far; child scopes
//! start from a copy of the parent so nested emissions cannot pollute
//! their siblings. The overload table is shared across a whole module
//! pipeline: it maps `(name, signature)` to the function record chosen
//! at declaration time, with a by-name index kept for existence checks
//! and diagnostics.

use crate::ast::{Hint, TypedName};
use std::collections::HashMap;

/// Replace the dots of a dotted source name with double underscores,
/// yielding the C identifier it compiles to. `str.__iter__` becomes
/// `str____iter__`.
pub fn mangle_name(name: &str) -> String {
    name.replace('.', "__")
}

/// Variables visible to the emission in progress, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: Vec<TypedName>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    /// A child scope seeded with the parent's variables.
    pub fn child(&self) -> Scope {
        self.clone()
    }

    pub fn declare(&mut self, variable: TypedName) {
        self.variables.push(variable);
    }

    /// The first declaration of `name`, if any. Repeated declarations
    /// never shadow the original.
    pub fn lookup(&self, name: &str) -> Option<&TypedName> {
        self.variables.iter().find(|var| var.name == name)
    }
}

/// One callable overload: the identifier it was emitted under and its
/// return hint.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub c_name: String,
    pub rethint: Option<Hint>,
}

/// Flat overload table. Signatures are tuples of compiled C type names,
/// both at registration and at lookup, so the two sides always meet in
/// the same space.
#[derive(Debug, Default)]
pub struct FunctionTable {
    records: HashMap<(String, Vec<String>), FunctionRecord>,
    by_name: HashMap<String, Vec<Vec<String>>>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable::default()
    }

    /// Register an overload. A duplicate `(name, signature)` replaces the
    /// earlier record, matching source order: the last definition wins.
    pub fn register(&mut self, name: &str, signature: Vec<String>, record: FunctionRecord) {
        let known = self.by_name.entry(name.to_string()).or_default();
        if !known.contains(&signature) {
            known.push(signature.clone());
        }
        self.records.insert((name.to_string(), signature), record);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn lookup(&self, name: &str, signature: &[String]) -> Option<&FunctionRecord> {
        self.records.get(&(name.to_string(), signature.to_vec()))
    }

    /// Registered signatures for a name, in declaration order.
    pub fn signatures(&self, name: &str) -> &[Vec<String>] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
