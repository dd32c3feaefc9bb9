//! Minimal in-memory shapes for the data the decoder borrows but never
//! owns: the enclosing algorithm/dependency scope and the program version
//! it belongs to. These are faithful but deliberately thin analogues of
//! the source system's `Algorithm`/`DependencyBase`/`ProgramVersion`
//! Pydantic models — loading them from a ZIP/XML package is out of scope
//! (see `spec.md` §1); only the shape the resolver and driver need to
//! walk is carried here.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Instruction {
    pub step: u32,
    pub ins_type: i32,
    pub ins: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ins_tar: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub seq_t: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub seq_f: Option<i32>,
    /// The decoded AST, attached in place once the driver has decoded this
    /// instruction (spec.md §3's "mutated in place to attach their AST").
    /// Absent until then; never round-tripped through the on-disk program
    /// version format, since it's a decode-time cache, not program data.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub ast: Option<Vec<crate::ast::Node>>,
}

/// What kind of scoping table a [`Dependency`] belongs to, mirroring the
/// `ib_type`-discriminated `CalculatedVariable | TableVariable |
/// ResultVariable | InputVariable` union.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DependencyKind {
    Calculated,
    Table,
    Result,
    Input,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub index: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub calc_index: Option<u32>,
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dependency_vars: Vec<Dependency>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub steps: Vec<Instruction>,
}

impl Dependency {
    pub fn is_calculated_variable(&self) -> bool {
        self.kind == DependencyKind::Calculated
    }

    pub fn is_result_variable(&self) -> bool {
        self.kind == DependencyKind::Result
    }

    pub fn is_table_variable(&self) -> bool {
        self.kind == DependencyKind::Table
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Algorithm {
    pub description: String,
    pub index: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dependency_vars: Vec<Dependency>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub steps: Vec<Instruction>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct InputVariable {
    pub line: String,
    pub index: u32,
    pub description: String,
    pub data_type: String,
    pub category_id: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct DataDictionary {
    pub inputs: Vec<InputVariable>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ProgramVersion {
    pub line: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_dictionary: DataDictionary,
    #[cfg_attr(feature = "serde", serde(default))]
    pub algorithms: Vec<Algorithm>,
}

/// The scope the resolver looks a variable token up against: the sibling
/// dependency list to search (an algorithm's or dependency's
/// `dependency_vars`), and, when recursing into a single dependency's own
/// steps, the dependency itself (so a `PC_<calc_index>` token referring to
/// its own calculated variable resolves without a list scan).
///
/// Grounded on `helpers/var_lookup.py::get_var_desc`'s `deps` parameter and
/// `get_target_var_desc`'s `dep` parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scope<'a> {
    pub dependencies: &'a [Dependency],
    pub current: Option<&'a Dependency>,
}

impl<'a> Scope<'a> {
    pub fn for_algorithm(algorithm: &'a Algorithm) -> Scope<'a> {
        Scope { dependencies: &algorithm.dependency_vars, current: None }
    }

    pub fn for_dependency(dependency: &'a Dependency) -> Scope<'a> {
        Scope { dependencies: &dependency.dependency_vars, current: Some(dependency) }
    }

    pub fn empty() -> Scope<'a> {
        Scope { dependencies: &[], current: None }
    }
}
