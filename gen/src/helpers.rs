//! Registry of shell helper functions emitted into a script.
//!
//! Static helpers are templates written against the placeholder `@@`, which
//! is replaced by the program's identifier prefix. A helper is emitted once
//! no matter how often it is requested, together with every helper it
//! depends on, and in the order of first registration.
//!
//! Dynamic helpers are generated on the fly from a function body; identical
//! bodies share one function.

use std::collections::{BTreeSet, HashMap};

use crate::preprocessor::{PreprocessError, preprocess};

/// Placeholder for the program prefix in helper templates.
pub const PREFIX_PLACEHOLDER: &str = "@@";

/// A static helper function template.
#[derive(Debug)]
pub struct HelperDef {
    /// Name suffix; the emitted function is `__<prefix>_<name>`.
    pub name: &'static str,
    /// Function code with `@@` placeholders and optional `#ifdef` blocks.
    pub code: &'static str,
    /// Helpers that must be emitted as well.
    pub deps: &'static [&'static HelperDef],
}

#[derive(Debug)]
struct Entry {
    code: String,
    defines: BTreeSet<String>,
}

/// Collects the helper functions a script needs.
#[derive(Debug)]
pub struct HelperRegistry {
    prefix: String,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    dynamic: HashMap<String, String>,
    counters: HashMap<String, usize>,
}

impl HelperRegistry {
    /// Creates an empty registry for the given identifier prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Vec::new(),
            index: HashMap::new(),
            dynamic: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Returns the emitted name of `def` without registering it.
    pub fn name_of(&self, def: &HelperDef) -> String {
        format!("__{}_{}", self.prefix, def.name)
    }

    /// Registers `def` and its dependencies, returning the function name.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_schema_gen::helpers::{HelperDef, HelperRegistry};
    ///
    /// static INNER: HelperDef = HelperDef { name: "inner", code: "__@@_inner() { :; }", deps: &[] };
    /// static OUTER: HelperDef = HelperDef { name: "outer", code: "__@@_outer() { __@@_inner; }", deps: &[&INNER] };
    ///
    /// let mut registry = HelperRegistry::new("example");
    /// assert_eq!(registry.use_helper(&OUTER), "__example_outer");
    /// registry.use_helper(&OUTER);
    /// assert_eq!(registry.len(), 2);
    /// ```
    pub fn use_helper(&mut self, def: &HelperDef) -> String {
        let name = self.name_of(def);
        if self.index.contains_key(&name) {
            return name;
        }
        for dep in def.deps {
            self.use_helper(dep);
        }
        let code = def.code.replace(PREFIX_PLACEHOLDER, &self.prefix);
        self.push(name.clone(), code);
        name
    }

    /// Registers `def` and enables the conditional block `define` in it.
    pub fn use_helper_with(&mut self, def: &HelperDef, define: &str) -> String {
        let name = self.use_helper(def);
        self.define(&name, define);
        name
    }

    /// Enables `define` in the already registered function `name`.
    pub fn define(&mut self, name: &str, define: &str) {
        if let Some(&i) = self.index.get(name) {
            self.entries[i].defines.insert(define.to_string());
        }
    }

    /// Registers a fully generated function under `name`.
    ///
    /// A second registration of the same name is ignored.
    pub fn add_function(&mut self, name: &str, code: String) {
        if !self.index.contains_key(name) {
            self.push(name.to_string(), code);
        }
    }

    /// Registers a generated function for `body`, reusing an existing one
    /// with an identical body.
    ///
    /// The name is `__<prefix>_<base>_<n>`; `wrap` receives the name and the
    /// body and returns the complete function definition.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_schema_gen::helpers::HelperRegistry;
    ///
    /// let wrap = |name: &str, body: &str| format!("{name}() {{\n  {body}\n}}");
    /// let mut registry = HelperRegistry::new("example");
    /// let a = registry.add_dynamic("choices", "echo a", wrap);
    /// let b = registry.add_dynamic("choices", "echo b", wrap);
    /// let c = registry.add_dynamic("choices", "echo a", wrap);
    /// assert_eq!(a, "__example_choices_1");
    /// assert_eq!(b, "__example_choices_2");
    /// assert_eq!(a, c);
    /// ```
    pub fn add_dynamic<F>(&mut self, base: &str, body: &str, wrap: F) -> String
    where
        F: FnOnce(&str, &str) -> String,
    {
        if let Some(name) = self.dynamic.get(body) {
            return name.clone();
        }
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        *counter += 1;
        let name = format!("__{}_{}_{}", self.prefix, base, counter);
        let code = wrap(&name, body);
        self.dynamic.insert(body.to_string(), name.clone());
        self.push(name.clone(), code);
        name
    }

    /// Returns `true` if a function called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Preprocesses every function with its defines and joins them with
    /// blank lines.
    ///
    /// # Errors
    ///
    /// Returns the first malformed template.
    pub fn render(&self) -> Result<String, PreprocessError> {
        let mut parts = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let code = preprocess(&entry.code, &entry.defines)?;
            parts.push(code.trim_end().to_string());
        }
        Ok(parts.join("\n\n"))
    }

    fn push(&mut self, name: String, code: String) {
        self.index.insert(name, self.entries.len());
        self.entries.push(Entry {
            code,
            defines: BTreeSet::new(),
        });
    }
}
