//! Fortran statement parsing.
//!
//! This module turns the logical lines of one source file into an entity tree:
//! - [`patterns`]: Precompiled regex patterns for Fortran statements
//! - [`statement`]: Ordered classification of a single statement
//! - [`declaration`]: Type specifications and declaration lists
//! - [`calls`]: Lexical scan of executable statements for procedure references
//! - [`container`]: The recursive-descent parser that builds and seals entities
//!
//! Parsing a file has no side effects beyond its result, so files can be
//! parsed concurrently and merged afterwards.

pub mod calls;
pub mod container;
pub mod declaration;
pub mod patterns;
pub mod statement;
pub mod text;

use std::path::PathBuf;

use log::debug;

use crate::entity::{Entity, EntityId, EntityKind, EntityTree, SourceFileData};
use crate::error::{Diagnostic, Result};
use crate::reader::{LineCursor, Reader, ReaderOptions};

pub use container::{Parser, MAX_NESTING};
pub use patterns::VariablePattern;

/// Parser configuration, derived from the project settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSettings {
    pub reader: ReaderOptions,
    /// Additional type keywords accepted in declarations
    pub extra_vartypes: Vec<String>,
    /// Lower-case statement text before parsing
    pub lower: bool,
    /// Fail on unrecognized statements instead of recording a diagnostic
    pub strict: bool,
}

/// The entity tree of one source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub tree: EntityTree,
    /// The `SourceFile` entity
    pub root: EntityId,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse one file's (already decoded and preprocessed) source text.
pub fn parse_source(
    source: &str,
    path: impl Into<PathBuf>,
    settings: &ParseSettings,
) -> Result<ParsedFile> {
    let path = path.into();
    let reader = Reader::from_source(source, path.clone(), settings.reader.clone());
    let cursor = LineCursor::new(reader);

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let root = Entity::new(
        name,
        EntityKind::SourceFile(SourceFileData {
            path: path.clone(),
            fixed: settings.reader.fixed,
        }),
    );
    let (tree, root, diagnostics) = Parser::new(cursor, settings).parse(root)?;
    debug!(
        file:? = path, entities = tree.len(), diagnostics = diagnostics.len();
        "parsed source file"
    );
    Ok(ParsedFile {
        tree,
        root,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityClass, InterfaceKind, Permission, ProcedureKind};
    use crate::error::{DiagnosticKind, Error};

    fn parse(src: &str) -> ParsedFile {
        parse_source(src, "test.f90", &ParseSettings::default()).unwrap()
    }

    fn child(file: &ParsedFile, parent: EntityId, name: &str) -> EntityId {
        file.tree.find_child(parent, name, None).unwrap()
    }

    #[test]
    fn test_variable_following_doc() {
        let file = parse("module m\n  integer :: x\n    !! doc for x\nend module m\n");
        let m = child(&file, file.root, "m");
        assert_eq!(file.tree[m].class(), EntityClass::Module);
        assert_eq!(file.tree[m].children.len(), 1);
        let x = file.tree[m].children[0];
        assert_eq!(file.tree[x].name, "x");
        assert_eq!(file.tree[x].doc, "doc for x");
    }

    #[test]
    fn test_inline_doc_goes_to_last_name() {
        let file = parse("module m\n  integer :: a, b !! doc for b\nend module m\n");
        let m = child(&file, file.root, "m");
        let a = child(&file, m, "a");
        let b = child(&file, m, "b");
        assert_eq!(file.tree[a].doc, "");
        assert_eq!(file.tree[b].doc, "doc for b");
    }

    #[test]
    fn test_inline_doc_per_continued_name() {
        let src = "module m\n  real :: a, & !! first\n          b     !! second\nend module m\n";
        let file = parse(src);
        let m = child(&file, file.root, "m");
        assert_eq!(file.tree[child(&file, m, "a")].doc, "first");
        assert_eq!(file.tree[child(&file, m, "b")].doc, "second");
    }

    #[test]
    fn test_continuation_after_doc_is_error() {
        let err = parse_source(
            "subroutine x()\n  !! doc\n  &continued_from_nothing\nend subroutine\n",
            "bad.f90",
            &ParseSettings::default(),
        )
        .unwrap_err();
        let Error::Parse(e) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(e.line, 3);
    }

    #[test]
    fn test_empty_module() {
        let file = parse("module m\nend module m\n");
        let m = child(&file, file.root, "m");
        assert!(file.tree[m].children.is_empty());
        assert!(file.tree[m].doc.is_empty());
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn test_module_documentation_and_metadata() {
        let src = "!> author: Ada\n!> date: 2020\n!>\n!> A geometry module.\n\
                   module geo\nend module geo\n";
        let file = parse(src);
        let m = child(&file, file.root, "geo");
        assert_eq!(file.tree[m].meta.author.as_deref(), Some("Ada"));
        assert_eq!(file.tree[m].doc, "A geometry module.");
    }

    #[test]
    fn test_end_name_mismatch() {
        let err = parse_source(
            "module alpha\nend module beta\n",
            "m.f90",
            &ParseSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse(ref e) if e.line == 2));
        let settings = ParseSettings::default();
        assert!(parse_source("module Alpha\nEND MODULE ALPHA\n", "m.f90", &settings).is_ok());
    }

    #[test]
    fn test_unterminated_and_stray_end() {
        let err = parse_source("module m\ninteger :: x\n", "m.f90", &ParseSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("still nested"));
        let err = parse_source("end\n", "m.f90", &ParseSettings::default()).unwrap_err();
        assert!(err.to_string().contains("outside of any nesting"));
    }

    #[test]
    fn test_nesting_cap() {
        let mut src = String::from("program p\ncontains\n");
        for i in 0..70 {
            src.push_str(&format!("subroutine s{i}()\ncontains\n"));
        }
        let err = parse_source(&src, "deep.f90", &ParseSettings::default()).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_procedure_arguments_and_result() {
        let src = "\
module m
contains
  function area(w, h) result(a)
    real, intent(in) :: w
    real :: a
    a = w * h
  end function area
  integer function count_items(list)
    integer :: list(:)
  end function
end module m
";
        let file = parse(src);
        let m = child(&file, file.root, "m");
        let area = child(&file, m, "area");
        let data = file.tree[area].as_procedure().unwrap();
        assert_eq!(data.proc_kind, ProcedureKind::Function);
        assert_eq!(data.args.len(), 2);
        let w = file.tree[data.args[0]].as_variable().unwrap();
        assert_eq!(w.intent.as_deref(), Some("in"));
        // `h` is implicitly typed
        let h = file.tree[data.args[1]].as_variable().unwrap();
        assert_eq!(h.vartype, "real");
        let result = data.return_variable.unwrap();
        assert_eq!(file.tree[result].name, "a");

        let count = child(&file, m, "count_items");
        let data = file.tree[count].as_procedure().unwrap();
        let result = file.tree[data.return_variable.unwrap()].as_variable().unwrap();
        assert_eq!(result.vartype, "integer");
    }

    #[test]
    fn test_calls_collected() {
        let src = "\
subroutine driver()
  call setup(1)
  x = compute(y) + sqrt(z)
  print *, 'call fake(1)'
end subroutine driver
";
        let file = parse(src);
        let driver = child(&file, file.root, "driver");
        let calls = file.tree[driver].kind.calls();
        let names: Vec<_> = calls.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["setup", "compute"]);
    }

    #[test]
    fn test_derived_type_with_bindings() {
        let src = "\
module shapes
  type, abstract :: shape
  contains
    procedure(area_iface), deferred :: area
  end type shape
  type, extends(shape) :: circle
    private
    real :: r
  contains
    procedure :: area => circle_area !! circle area
    generic :: operator(+) => add
    final :: destroy
  end type circle
end module shapes
";
        let file = parse(src);
        let m = child(&file, file.root, "shapes");
        let circle = child(&file, m, "circle");
        let data = file.tree[circle].as_type().unwrap();
        assert_eq!(data.extends.as_ref().unwrap().name, "shape");
        assert_eq!(data.bindings.len(), 2);
        assert_eq!(data.bindings[0].permission, Permission::Public);
        assert_eq!(data.bindings[0].doc, "circle area");
        assert!(data.bindings[1].generic);
        assert_eq!(data.finals[0].name, "destroy");
        let r = child(&file, circle, "r");
        assert_eq!(file.tree[r].permission, Permission::Private);

        let shape = child(&file, m, "shape");
        assert!(file.tree[shape].as_type().unwrap().bindings[0].deferred);
    }

    #[test]
    fn test_interfaces() {
        let src = "\
module ops
  interface
    !! external solver
    subroutine solve(x)
      real :: x
    end subroutine solve
  end interface
  abstract interface
    function f_iface(x)
      real :: x, f_iface
    end function
  end interface
  interface norm
    module procedure norm_real, norm_int
  end interface norm
end module ops
";
        let file = parse(src);
        let m = child(&file, file.root, "ops");
        let solve = child(&file, m, "solve");
        let iface = file.tree[solve].as_interface().unwrap();
        assert_eq!(iface.interface_kind, InterfaceKind::Explicit);
        assert_eq!(file.tree[solve].children.len(), 1);
        assert_eq!(file.tree[solve].doc, "external solver");

        let abs = child(&file, m, "f_iface");
        assert_eq!(file.tree[abs].class(), EntityClass::AbstractInterface);

        let norm = child(&file, m, "norm");
        let generic = file.tree[norm].as_interface().unwrap();
        assert_eq!(generic.interface_kind, InterfaceKind::Generic);
        assert_eq!(generic.procedures.len(), 2);
    }

    #[test]
    fn test_enum_numbering() {
        let src = "\
module colors
  enum, bind(c)
    enumerator :: red, green = 5, blue
    enumerator :: bad = huge_k
  end enum
end module colors
";
        let file = parse(src);
        let m = child(&file, file.root, "colors");
        let e = file.tree[m].children[0];
        let initial = |name: &str| {
            let id = child(&file, e, name);
            file.tree[id].as_variable().unwrap().initial.clone().unwrap()
        };
        assert_eq!(initial("red"), "0");
        assert_eq!(initial("green"), "5");
        assert_eq!(initial("blue"), "6");
        assert!(file
            .diagnostics
            .iter()
            .any(|d| d.message.contains("non-integer")));
        assert!(public_names(&file, m).contains(&"red".to_string()));
    }

    fn public_names(file: &ParsedFile, m: EntityId) -> Vec<String> {
        match &file.tree[m].kind {
            EntityKind::Module(data) => data.public_names.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_permissions_and_public_names() {
        let src = "\
module store
  use helpers, only: helper
  private
  public :: get, helper
  integer, public :: counter
  integer :: hidden
contains
  subroutine get()
  end subroutine get
  subroutine put()
  end subroutine put
end module store
";
        let file = parse(src);
        let m = child(&file, file.root, "store");
        assert_eq!(file.tree[child(&file, m, "hidden")].permission, Permission::Private);
        assert_eq!(file.tree[child(&file, m, "put")].permission, Permission::Private);
        assert_eq!(file.tree[child(&file, m, "get")].permission, Permission::Public);
        let mut names = public_names(&file, m);
        names.sort();
        assert_eq!(names, vec!["counter", "get", "helper"]);
    }

    #[test]
    fn test_parameter_attribute_statement() {
        let src = "module c\n  integer :: n\n  parameter (n = 3)\nend module c\n";
        let file = parse(src);
        let m = child(&file, file.root, "c");
        let n = file.tree[child(&file, m, "n")].as_variable().unwrap();
        assert!(n.parameter);
        assert_eq!(n.initial.as_deref(), Some("3"));
    }

    #[test]
    fn test_submodule_procedures() {
        let src = "\
submodule (geo) geo_impl
contains
  module procedure area
    area = 1.0
  end procedure area
end submodule geo_impl
";
        let file = parse(src);
        let sub = child(&file, file.root, "geo_impl");
        let area = child(&file, sub, "area");
        let data = file.tree[area].as_procedure().unwrap();
        assert_eq!(data.proc_kind, ProcedureKind::ModuleProcedure);
        assert_eq!(data.module_interface.as_ref().unwrap().name, "area");
        assert_eq!(file.tree[area].permission, Permission::Private);
    }

    #[test]
    fn test_unrecognized_statement_diagnostic_and_strict() {
        let src = "module m\n  x = 1\nend module m\n";
        let file = parse(src);
        assert_eq!(file.diagnostics.len(), 1);
        assert_eq!(file.diagnostics[0].kind, DiagnosticKind::UnrecognizedStatement);
        assert_eq!(file.diagnostics[0].line, Some(2));

        let strict = ParseSettings {
            strict: true,
            ..ParseSettings::default()
        };
        let err = parse_source(src, "m.f90", &strict).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedStatement { line: 2, .. }));
    }

    #[test]
    fn test_namelist_group() {
        let file = parse(
            "subroutine s(a)\n  integer :: a, b\n  namelist /cfg/ a, b !! run config\n  \
             namelist /cfg/ c\nend subroutine s\n",
        );
        let s = child(&file, file.root, "s");
        let cfg = file
            .tree
            .find_child(s, "cfg", Some(EntityClass::Namelist))
            .unwrap();
        assert_eq!(file.tree[cfg].doc, "run config");
        let EntityKind::Namelist(data) = &file.tree[cfg].kind else {
            panic!("not a namelist");
        };
        let members: Vec<&str> = data.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(members, vec!["a", "b", "c"]);
        assert!(file.diagnostics.is_empty());

        let misplaced =
            parse("module m\n  type :: t\n    namelist /g/ x\n  end type t\nend module m\n");
        assert_eq!(misplaced.diagnostics.len(), 1);
        assert_eq!(misplaced.diagnostics[0].kind, DiagnosticKind::Structure);
        let t = child(&misplaced, child(&misplaced, misplaced.root, "m"), "t");
        assert!(misplaced.tree[t].children.is_empty());
    }

    #[test]
    fn test_blocks_and_associate() {
        let src = "\
subroutine run(state)
  type(state_t) :: state
  block
    integer :: tmp
    call inner(tmp)
  end block
  associate (p => state%particles)
    call p%push(1)
  end associate
end subroutine run
";
        let file = parse(src);
        let run = child(&file, file.root, "run");
        assert!(file.tree.find_child(run, "tmp", None).is_none());
        let chains: Vec<_> = file.tree[run]
            .kind
            .calls()
            .iter()
            .map(|c| c.chain.join("%"))
            .collect();
        assert_eq!(chains, vec!["inner", "state%particles%push"]);
    }

    #[test]
    fn test_lower_setting() {
        let settings = ParseSettings {
            lower: true,
            ..ParseSettings::default()
        };
        let file = parse_source("MODULE Mixed\nEND MODULE Mixed\n", "m.f90", &settings).unwrap();
        assert_eq!(file.tree[file.tree[file.root].children[0]].name, "mixed");
    }

    #[test]
    fn test_source_file_root() {
        let settings = ParseSettings::default();
        let file = parse_source("program p\nend program p\n", "dir/main.f90", &settings).unwrap();
        assert_eq!(file.tree[file.root].name, "main.f90");
        assert_eq!(file.tree[file.root].class(), EntityClass::SourceFile);
    }
}
