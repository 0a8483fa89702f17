//! Integration tests for fordoc
//!
//! These tests drive whole projects through parsing and correlation

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::path::{Path, PathBuf};

use fordoc::{
    DiagnosticKind, EntityClass, EntityId, Error, Link, LinkDirectory, Project, Settings,
    Severity,
};

fn correlated(sources: &[(&str, &str)], settings: Settings) -> Project {
    let mut project = Project::from_sources(
        sources.iter().map(|(p, s)| (*p, (*s).to_string())),
        settings,
    )
    .unwrap();
    project.correlate();
    project
}

fn named(project: &Project, name: &str, class: EntityClass) -> EntityId {
    project
        .lookup(name, Some(class))
        .unwrap_or_else(|| panic!("no {class} named {name}"))
}

fn child(project: &Project, parent: EntityId, name: &str) -> EntityId {
    project
        .tree()
        .find_child(parent, name, None)
        .unwrap_or_else(|| panic!("no child named {name}"))
}

#[test]
fn test_variable_documented_by_following_line() {
    let p = correlated(
        &[("m.f90", "module m\n  integer :: x\n    !! doc for x\nend module m\n")],
        Settings::default(),
    );
    let m = named(&p, "m", EntityClass::Module);
    assert_eq!(p.children(m).len(), 1);
    let x = p.children(m)[0];
    assert_eq!(p.entity(x).class(), EntityClass::Variable);
    assert_eq!(p.entity(x).name, "x");
    assert_eq!(p.entity(x).doc, "doc for x");
}

#[test]
fn test_extends_resolves_to_earlier_type() {
    let p = correlated(
        &[(
            "t.f90",
            "module shapes\n  type :: base\n  end type base\n  type, extends(base) :: derived\n  \
             end type derived\nend module shapes\n",
        )],
        Settings::default(),
    );
    let shapes = named(&p, "shapes", EntityClass::Module);
    let base = child(&p, shapes, "base");
    let derived = child(&p, shapes, "derived");
    let extends = p.entity(derived).as_type().unwrap().extends.clone().unwrap();
    assert_eq!(extends.name, "base");
    assert_eq!(extends.link, Link::Entity(base));
}

#[test]
fn test_call_resolves_to_same_file_procedure() {
    let p = correlated(
        &[(
            "c.f90",
            "subroutine foo(x, y)\n  real :: x, y\nend subroutine foo\n\
             subroutine bar()\n  real :: x, y\n  call foo(x, y)\n  call nowhere(x)\nend subroutine bar\n",
        )],
        Settings::default(),
    );
    let foo = named(&p, "foo", EntityClass::Procedure);
    let bar = named(&p, "bar", EntityClass::Procedure);
    let calls = p.entity(bar).kind.calls();
    assert_eq!(calls[0].link, Link::Entity(foo));
    assert_eq!(calls[1].name(), "nowhere");
    assert_eq!(calls[1].link, Link::Unresolved);
    assert_eq!(p.callees(bar), vec![foo]);
}

#[test]
fn test_inline_doc_documents_last_name_only() {
    let p = correlated(
        &[("d.f90", "module m\n  integer :: a, b !! doc for b\nend module m\n")],
        Settings::default(),
    );
    let m = named(&p, "m", EntityClass::Module);
    assert_eq!(p.entity(child(&p, m, "a")).doc, "");
    assert_eq!(p.entity(child(&p, m, "b")).doc, "doc for b");
}

#[test]
fn test_continuation_after_documentation_fails() {
    let result = Project::from_sources(
        [(
            "e.f90",
            "subroutine x()\n  !! doc\n  &continued_from_nothing\nend subroutine x\n".to_string(),
        )],
        Settings::default(),
    );
    match result {
        Err(Error::Parse(e)) => {
            assert_eq!(e.line, 3);
            assert_eq!(e.file, PathBuf::from("e.f90"));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_empty_module() {
    let p = correlated(&[("m.f90", "module m\nend module m\n")], Settings::default());
    let m = named(&p, "m", EntityClass::Module);
    assert!(p.children(m).is_empty());
    assert!(p.entity(m).doc.is_empty());
    assert_eq!(p.diagnostics().count(), 0);
}

#[test]
fn test_names_are_case_insensitive() {
    let p = correlated(
        &[
            (
                "a.f90",
                "MODULE Solver\nCONTAINS\n  SUBROUTINE Run()\n  END SUBROUTINE Run\nEND MODULE Solver\n",
            ),
            ("b.f90", "program main\n  use SOLVER\n  call RUN()\nend program main\n"),
        ],
        Settings::default(),
    );
    let solver = named(&p, "solver", EntityClass::Module);
    let run = child(&p, solver, "run");
    let main = named(&p, "MAIN", EntityClass::Program);
    assert_eq!(p.entity(main).kind.uses()[0].module.link, Link::Entity(solver));
    assert_eq!(p.callees(main), vec![run]);
}

#[test]
fn test_use_rename_resolution() {
    let p = correlated(
        &[
            (
                "lib.f90",
                "module lib\ncontains\n  subroutine compute()\n  end subroutine compute\nend module lib\n",
            ),
            (
                "app.f90",
                "program app\n  use lib, only: calc => compute\n  call calc()\nend program app\n",
            ),
        ],
        Settings::default(),
    );
    let lib = named(&p, "lib", EntityClass::Module);
    let compute = child(&p, lib, "compute");
    let app = named(&p, "app", EntityClass::Program);
    assert_eq!(p.callees(app), vec![compute]);
}

#[test]
fn test_generic_binding_through_parent_type() {
    let p = correlated(
        &[(
            "g.f90",
            "module algebra\n  type :: base\n  contains\n    procedure :: add_base\n  end type base\n  \
             type, extends(base) :: child\n  contains\n    generic :: operator(+) => add_base\n  \
             end type child\ncontains\n  function add_base(a, b) result(c)\n    class(base), intent(in) :: a, b\n    \
             type(base) :: c\n  end function add_base\nend module algebra\n",
        )],
        Settings::default(),
    );
    let algebra = named(&p, "algebra", EntityClass::Module);
    let add_base = child(&p, algebra, "add_base");
    let ty = p
        .tree()
        .find_child(algebra, "child", Some(EntityClass::DerivedType))
        .unwrap();
    let generic = p.entity(ty).as_type().unwrap().bindings[0].clone();
    assert!(generic.generic);
    assert_eq!(generic.targets[0].link, Link::Entity(add_base));
}

#[test]
fn test_link_directory_round_trip() {
    let upstream = correlated(
        &[(
            "geometry.f90",
            "module geometry\n  type :: circle\n    real :: r\n  end type circle\ncontains\n  \
             function area(c)\n    type(circle) :: c\n    real :: area\n  end function area\n\
             end module geometry\n",
        )],
        Settings::default(),
    );
    let tmp = tempfile::tempdir().unwrap();
    let links = tmp.path().join("geometry.json");
    upstream.link_directory("https://geo.example").save(&links).unwrap();

    let mut settings = Settings::default();
    settings.external.insert("geometry".to_string(), links);
    let downstream = correlated(
        &[(
            "app.f90",
            "program app\n  use geometry\n  type(circle) :: c\n  print *, area(c)\nend program app\n",
        )],
        settings,
    );
    let app = named(&downstream, "app", EntityClass::Program);
    assert!(matches!(
        &downstream.entity(app).kind.uses()[0].module.link,
        Link::External { url } if url == "https://geo.example/module/geometry.html"
    ));
    let c = child(&downstream, app, "c");
    let proto = downstream.entity(c).as_variable().unwrap().proto.clone().unwrap();
    assert_eq!(
        proto.link,
        Link::External {
            url: "https://geo.example/type/circle.html".to_string()
        }
    );
    let calls = downstream.entity(app).kind.calls();
    assert_eq!(
        calls[0].link,
        Link::External {
            url: "https://geo.example/proc/area.html".to_string()
        }
    );
}

#[test]
fn test_missing_link_directory_is_error() {
    let mut settings = Settings::default();
    settings
        .external
        .insert("gone".to_string(), PathBuf::from("/nonexistent/links.json"));
    let err = Project::from_sources(Vec::<(PathBuf, String)>::new(), settings).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_force_mode_drops_broken_file() {
    let sources = [
        ("good.f90", "module good\nend module good\n"),
        ("broken.f90", "module broken\n  type :: t\nend module broken\n"),
    ];
    let settings = Settings {
        force: true,
        ..Default::default()
    };
    let p = correlated(&sources, settings);
    assert_eq!(p.files().len(), 1);
    assert!(p.lookup("good", Some(EntityClass::Module)).is_some());
    assert!(p.lookup("broken", None).is_none());
    let errors: Vec<_> = p
        .diagnostics()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, DiagnosticKind::StructuralParse);
    assert_eq!(errors[0].file.as_deref(), Some(Path::new("broken.f90")));
}

#[test]
fn test_correlation_twice_gives_same_graph() {
    let mut p = correlated(
        &[
            (
                "a.f90",
                "module a\n  use b\n  type, extends(bt) :: at\n  contains\n    procedure :: go\n  end type at\n\
                 contains\n  subroutine go(self)\n    class(at) :: self\n    call self%go()\n    call helper()\n  \
                 end subroutine go\nend module a\n",
            ),
            (
                "b.f90",
                "module b\n  type :: bt\n  end type bt\ncontains\n  subroutine helper()\n  end subroutine helper\n\
                 end module b\n",
            ),
        ],
        Settings::default(),
    );
    let first = p.tree().clone();
    p.correlate();
    assert_eq!(p.tree(), &first);
}

#[test]
fn test_parallel_parse_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    for i in 0..24 {
        let text = format!(
            "module m{i:02}\ncontains\n  subroutine s{i:02}()\n    call s{next:02}()\n  end subroutine s{i:02}\n\
             end module m{i:02}\n",
            next = (i + 1) % 24
        );
        std::fs::write(src.join(format!("m{i:02}.f90")), text).unwrap();
    }

    let load = |jobs: usize| {
        let settings = Settings {
            src_dir: vec![src.clone()],
            jobs,
            ..Default::default()
        };
        let mut project = Project::load(settings).unwrap();
        project.correlate();
        project
    };
    let sequential = load(0);
    let parallel = load(4);
    assert_eq!(sequential.files().len(), 24);
    assert_eq!(sequential.registry(), parallel.registry());
    assert_eq!(sequential.tree(), parallel.tree());
    let first = sequential.entity(sequential.modules()[0]);
    assert_eq!(first.name, "m00");
}

#[test]
fn test_link_directory_json_shape() {
    let p = correlated(
        &[("m.f90", "module m\n  integer, parameter :: n = 3\nend module m\n")],
        Settings::default(),
    );
    let json = p.link_directory("https://x").to_json().unwrap();
    let parsed = LinkDirectory::from_json(&json, Path::new("inline.json")).unwrap();
    assert_eq!(parsed.version, LinkDirectory::VERSION);
    assert_eq!(parsed.entries[1].name, "m::n");
    assert_eq!(parsed.entries[1].url, "https://x/module/m.html#variable-n");
}
