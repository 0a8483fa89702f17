//! Statement classification.
//!
//! [`classify`] decides what a single logical statement is. Patterns are
//! tried in a fixed order and the first match wins; where a pattern alone is
//! ambiguous (`type is`, `module procedure`, function prefixes) the candidate
//! is checked further before it is accepted.

use regex::Captures;

use super::declaration::{parse_declaration, parse_type, Declaration};
use super::patterns::{
    VariablePattern, ARITH_GOTO_RE, ASSOCIATE_RE, ATTRIB_RE, BIND_RE, BLOCK_DATA_RE, BLOCK_RE,
    BOUNDPROC_RE, COMMON_RE, COMMON_SPLIT_RE, CONTAINS_RE, END_RE, ENUM_RE, EXTENDS_RE, FINAL_RE,
    FORMAT_RE, FUNCTION_RE, IGNORED_RE, INTERFACE_RE, LABEL_RE, MODPROC_RE, MODULE_RE,
    NAMELIST_RE, ONLY_RE, PERMISSION_RE, PROGRAM_RE, RENAME_RE, RESULT_RE, SEQUENCE_RE,
    SUBMODULE_RE, SUBROUTINE_RE, TYPE_RE, USE_RE,
};
use super::text::{group_after, mask_strings, paren_split, split_list, squeeze};
use crate::entity::{Binding, Permission, ProcedureKind, Reference, UseName, UseStatement};

/// Words allowed before `subroutine` or `function` besides a type.
const PROC_PREFIXES: &[&str] = &[
    "impure",
    "pure",
    "elemental",
    "non_recursive",
    "recursive",
    "module",
];

/// Where the statement appears, for the patterns that depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementContext {
    /// Inside a `block` construct, where declarations are local to the block
    pub in_block: bool,
    pub in_interface: bool,
    /// After `contains` in a derived type
    pub in_type_contains: bool,
}

/// A `subroutine` or `function` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureHeader {
    pub proc_kind: ProcedureKind,
    pub name: String,
    /// Prefix words such as `pure` or `module`
    pub attributes: Vec<String>,
    /// Type written before `function`
    pub prefix_type: Option<String>,
    pub arguments: Vec<String>,
    pub result_name: Option<String>,
    /// Contents of `bind(...)`
    pub bind: Option<String>,
}

/// A derived-type definition header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHeader {
    pub name: String,
    pub extends: Option<String>,
    pub permission: Option<Permission>,
    pub attributes: Vec<String>,
    pub parameters: Vec<String>,
}

/// A type-bound `procedure` or `generic` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingStatement {
    pub generic: bool,
    pub proto: Option<String>,
    pub attributes: Vec<String>,
    pub names: String,
}

impl BindingStatement {
    /// Expand into one binding per declared name.
    #[must_use]
    pub fn into_bindings(self, default_permission: Permission) -> Vec<Binding> {
        let mut permission = default_permission;
        let mut attributes = Vec::new();
        for attribute in &self.attributes {
            match attribute.parse::<Permission>() {
                Ok(p) => permission = p,
                Err(_) => attributes.push(attribute.clone()),
            }
        }
        let deferred = attributes.iter().any(|a| a.eq_ignore_ascii_case("deferred"));
        let binding = |name: &str, targets: Vec<Reference>| Binding {
            name: name.trim().to_string(),
            generic: self.generic,
            deferred,
            permission,
            attributes: attributes.clone(),
            proto: self.proto.as_deref().map(Reference::new),
            targets,
            doc: String::new(),
        };

        if self.generic {
            let (name, targets) = self.names.split_once("=>").unwrap_or((&self.names, ""));
            let targets = split_list(targets).into_iter().map(Reference::new).collect();
            return vec![binding(name, targets)];
        }

        split_list(&self.names)
            .into_iter()
            .map(|item| match item.split_once("=>") {
                Some((name, target)) => binding(name, vec![Reference::new(target.trim())]),
                None if deferred => binding(&item, Vec::new()),
                None => binding(&item, vec![Reference::new(item.trim())]),
            })
            .collect()
    }
}

/// One named (or blank, `""`) group of a `common` or `namelist` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedGroup {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Contains,
    /// Bare `public`, `private` or `protected`
    Permission(Permission),
    Sequence,
    Format,
    /// `attribute :: names`, e.g. `public :: a, b` or `parameter (n = 3)`
    Attribute { attribute: String, names: String },
    End { kind: Option<String>, name: Option<String> },
    /// `[module] procedure` list, or the header of a separate module procedure
    ModuleProcedures { module: bool, names: Vec<String> },
    BlockData { name: Option<String> },
    Block,
    Associate { associations: String },
    Module { name: String },
    Submodule { ancestor: String, parent: Option<String>, name: String },
    Program { name: Option<String> },
    Procedure(ProcedureHeader),
    Type(TypeHeader),
    Interface { is_abstract: bool, name: Option<String> },
    Enum,
    Binding(BindingStatement),
    Common(Vec<NamedGroup>),
    Namelist(Vec<NamedGroup>),
    Final(Vec<String>),
    Declaration(Declaration),
    Use(UseStatement),
    Ignored,
    Executable,
}

/// Slice `text` at the range of capture group `name`.
fn group<'t>(text: &'t str, caps: &Captures, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| &text[m.range()])
}

fn group_at<'t>(text: &'t str, caps: &Captures, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| &text[m.range()])
}

/// Classify one statement.
///
/// Byte offsets in the result (declared name offsets) are relative to `text`.
#[must_use]
pub fn classify(text: &str, vars: &VariablePattern, ctx: StatementContext) -> Statement {
    if FORMAT_RE.is_match(text) {
        return Statement::Format;
    }
    let label = LABEL_RE.find(text).map_or(0, |m| m.end());
    let body = &text[label..];
    let masked = mask_strings(body);

    let statement = classify_body(body, &masked, vars, ctx);
    match statement {
        Statement::Declaration(mut declaration) if label > 0 => {
            for name in &mut declaration.names {
                name.offset += label;
            }
            Statement::Declaration(declaration)
        }
        other => other,
    }
}

fn classify_body(
    body: &str,
    masked: &str,
    vars: &VariablePattern,
    ctx: StatementContext,
) -> Statement {
    if CONTAINS_RE.is_match(masked) {
        return Statement::Contains;
    }
    if PERMISSION_RE.is_match(masked) {
        if let Ok(permission) = masked.parse() {
            return Statement::Permission(permission);
        }
    }
    if SEQUENCE_RE.is_match(masked) {
        return Statement::Sequence;
    }
    if !ctx.in_block {
        if let Some(caps) = ATTRIB_RE.captures(masked) {
            return Statement::Attribute {
                attribute: group_at(body, &caps, 1).unwrap_or_default().to_string(),
                names: group_at(body, &caps, 2).unwrap_or_default().to_string(),
            };
        }
    }
    if let Some(caps) = END_RE.captures(masked) {
        return Statement::End {
            kind: caps.get(1).map(|m| squeeze(m.as_str()).to_ascii_lowercase()),
            name: caps.get(2).map(|m| m.as_str().trim().to_string()),
        };
    }
    if let Some(caps) = MODPROC_RE.captures(masked) {
        let module = caps.name("module").is_some();
        if module || ctx.in_interface {
            return Statement::ModuleProcedures {
                module,
                names: split_list(group(body, &caps, "names").unwrap_or_default()),
            };
        }
    }
    if let Some(caps) = BLOCK_DATA_RE.captures(masked) {
        return Statement::BlockData {
            name: group_at(body, &caps, 1).map(ToString::to_string),
        };
    }
    if BLOCK_RE.is_match(masked) {
        return Statement::Block;
    }
    if let Some(caps) = ASSOCIATE_RE.captures(masked) {
        return Statement::Associate {
            associations: group(body, &caps, "associations")
                .unwrap_or_default()
                .to_string(),
        };
    }
    if let Some(caps) = MODULE_RE.captures(masked) {
        if let Some(name) = group(body, &caps, "name") {
            return Statement::Module {
                name: name.to_string(),
            };
        }
    }
    if let Some(caps) = SUBMODULE_RE.captures(masked) {
        return Statement::Submodule {
            ancestor: group(body, &caps, "ancestor").unwrap_or_default().to_string(),
            parent: group(body, &caps, "parent").map(ToString::to_string),
            name: group(body, &caps, "name").unwrap_or_default().to_string(),
        };
    }
    if let Some(caps) = PROGRAM_RE.captures(masked) {
        return Statement::Program {
            name: group_at(body, &caps, 1).map(ToString::to_string),
        };
    }
    if let Some(header) = subroutine_header(body, masked) {
        return Statement::Procedure(header);
    }
    if NAMELIST_RE.is_match(masked) {
        return Statement::Namelist(named_groups(body, "namelist"));
    }
    if let Some(header) = function_header(body, masked, vars) {
        return Statement::Procedure(header);
    }
    if let Some(header) = type_header(body, masked) {
        return Statement::Type(header);
    }
    if let Some(caps) = INTERFACE_RE.captures(masked) {
        return Statement::Interface {
            is_abstract: caps.get(1).is_some(),
            name: group_at(body, &caps, 2).map(|n| n.trim().to_string()),
        };
    }
    if ENUM_RE.is_match(masked) {
        return Statement::Enum;
    }
    if ctx.in_type_contains {
        if let Some(caps) = BOUNDPROC_RE.captures(masked) {
            let generic = caps["generic"].eq_ignore_ascii_case("generic");
            return Statement::Binding(BindingStatement {
                generic,
                proto: caps
                    .name("prototype")
                    .map(|m| squeeze(m.as_str()).trim_matches(['(', ')']).to_string()),
                attributes: split_list(group(body, &caps, "attributes").unwrap_or_default()),
                names: group(body, &caps, "names").unwrap_or_default().to_string(),
            });
        }
    }
    if COMMON_RE.is_match(masked) {
        return Statement::Common(named_groups(body, "common"));
    }
    if ctx.in_type_contains {
        if let Some(caps) = FINAL_RE.captures(masked) {
            return Statement::Final(split_list(group_at(body, &caps, 1).unwrap_or_default()));
        }
    }
    if vars.is_match(masked) {
        if ctx.in_block {
            return Statement::Ignored;
        }
        if let Some(declaration) = parse_declaration(body, vars) {
            return Statement::Declaration(declaration);
        }
    }
    if let Some(caps) = USE_RE.captures(masked) {
        return Statement::Use(use_statement(
            group_at(body, &caps, 1).unwrap_or_default(),
            group_at(body, &caps, 2).unwrap_or_default(),
        ));
    }
    if IGNORED_RE.is_match(masked) || ARITH_GOTO_RE.is_match(masked) {
        return Statement::Ignored;
    }
    Statement::Executable
}

/// Split a prefix on whitespace outside parentheses.
fn prefix_words(prefix: &str) -> Vec<String> {
    paren_split(&prefix.replace('\t', " "), ' ')
        .into_iter()
        .filter(|w| !w.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn is_proc_prefix(word: &str) -> bool {
    PROC_PREFIXES.iter().any(|p| p.eq_ignore_ascii_case(word))
}

fn header_tail(body: &str, caps: &Captures) -> (Vec<String>, Option<String>, Option<String>) {
    let arguments = group(body, caps, "arguments")
        .map(|a| split_list(&a[1..a.len() - 1]))
        .unwrap_or_default();
    let rest = group(body, caps, "rest").unwrap_or_default();
    let result_name = RESULT_RE.captures(rest).map(|c| c[1].to_string());
    let bind = BIND_RE
        .find(rest)
        .and_then(|m| group_after(rest, m.start()))
        .map(|b| b.trim().to_string());
    (arguments, result_name, bind)
}

fn subroutine_header(body: &str, masked: &str) -> Option<ProcedureHeader> {
    let caps = SUBROUTINE_RE.captures(masked)?;
    let attributes = prefix_words(group(body, &caps, "prefix").unwrap_or_default());
    if !attributes.iter().all(|w| is_proc_prefix(w)) {
        return None;
    }
    let (arguments, _, bind) = header_tail(body, &caps);
    Some(ProcedureHeader {
        proc_kind: ProcedureKind::Subroutine,
        name: group(body, &caps, "name")?.to_string(),
        attributes,
        prefix_type: None,
        arguments,
        result_name: None,
        bind,
    })
}

fn function_header(body: &str, masked: &str, vars: &VariablePattern) -> Option<ProcedureHeader> {
    let caps = FUNCTION_RE.captures(masked)?;
    let (attributes, rest): (Vec<String>, Vec<String>) =
        prefix_words(group(body, &caps, "prefix").unwrap_or_default())
            .into_iter()
            .partition(|w| is_proc_prefix(w));
    let prefix_type = if rest.is_empty() {
        None
    } else {
        let written = rest.join(" ");
        let parsed = parse_type(&written, vars)?;
        if parsed.end != written.len() {
            return None;
        }
        Some(written)
    };
    let (arguments, result_name, bind) = header_tail(body, &caps);
    Some(ProcedureHeader {
        proc_kind: ProcedureKind::Function,
        name: group(body, &caps, "name")?.to_string(),
        attributes,
        prefix_type,
        arguments,
        result_name,
        bind,
    })
}

fn type_header(body: &str, masked: &str) -> Option<TypeHeader> {
    let caps = TYPE_RE.captures(masked)?;
    let name = group(body, &caps, "name")?;
    let parameters = group(body, &caps, "parameters");
    if name.eq_ignore_ascii_case("is") && parameters.is_some() {
        return None;
    }

    let mut header = TypeHeader {
        name: name.to_string(),
        extends: None,
        permission: None,
        attributes: Vec::new(),
        parameters: parameters
            .map(|p| split_list(&p[1..p.len() - 1]))
            .unwrap_or_default(),
    };
    let attributes = group(body, &caps, "attributes").unwrap_or_default();
    for attribute in split_list(attributes.trim_start_matches(',')) {
        if let Some(ext) = EXTENDS_RE.captures(&attribute) {
            header.extends = Some(ext["base"].to_string());
        } else if let Ok(permission) = attribute.parse() {
            header.permission = Some(permission);
        } else {
            header.attributes.push(attribute);
        }
    }
    Some(header)
}

fn use_statement(module: &str, rest: &str) -> UseStatement {
    let (only, list) = match ONLY_RE.find(rest) {
        Some(m) => (true, &rest[m.end()..]),
        None => (false, rest.trim_start().trim_start_matches(',')),
    };
    let names = split_list(list)
        .into_iter()
        .map(|item| match RENAME_RE.captures(&item) {
            Some(caps) => UseName {
                local: caps[1].to_string(),
                original: caps[2].to_string(),
            },
            None => UseName {
                local: item.clone(),
                original: item,
            },
        })
        .collect();
    UseStatement {
        module: Reference::new(module),
        only,
        names,
    }
}

/// Groups of a `common` or `namelist` statement with their member names,
/// dimensions dropped.
fn named_groups(body: &str, keyword: &str) -> Vec<NamedGroup> {
    let list = body.trim_start()[keyword.len()..].trim();
    let mut groups = Vec::new();
    let mut name = String::new();
    let mut last = 0;
    let push = |name: &str, segment: &str, groups: &mut Vec<NamedGroup>| {
        let members: Vec<String> = split_list(segment)
            .into_iter()
            .map(|m| m.split('(').next().unwrap_or_default().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !members.is_empty() {
            groups.push(NamedGroup {
                name: name.to_string(),
                members,
            });
        }
    };
    for caps in COMMON_SPLIT_RE.captures_iter(list) {
        let Some(whole) = caps.get(0) else { continue };
        push(&name, &list[last..whole.start()], &mut groups);
        name = caps[1].to_string();
        last = whole.end();
    }
    push(&name, &list[last..], &mut groups);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(text: &str) -> Statement {
        classify(text, &VariablePattern::default(), StatementContext::default())
    }

    fn in_ctx(text: &str, ctx: StatementContext) -> Statement {
        classify(text, &VariablePattern::default(), ctx)
    }

    #[test]
    fn test_structure_statements() {
        assert_eq!(class("contains"), Statement::Contains);
        assert_eq!(class("PRIVATE"), Statement::Permission(Permission::Private));
        assert_eq!(class("sequence"), Statement::Sequence);
        assert_eq!(class("100 format(a, i3)"), Statement::Format);
        assert_eq!(
            class("end subroutine foo"),
            Statement::End {
                kind: Some("subroutine".to_string()),
                name: Some("foo".to_string()),
            }
        );
        assert_eq!(class("end"), Statement::End { kind: None, name: None });
        assert_eq!(class("block"), Statement::Block);
        assert_eq!(class("outer: block"), Statement::Block);
        assert_eq!(
            class("block data init"),
            Statement::BlockData {
                name: Some("init".to_string())
            }
        );
    }

    #[test]
    fn test_units() {
        assert_eq!(class("module m"), Statement::Module { name: "m".to_string() });
        assert_eq!(class("program main"), Statement::Program { name: Some("main".to_string()) });
        assert_eq!(
            class("submodule (m) impl"),
            Statement::Submodule {
                ancestor: "m".to_string(),
                parent: None,
                name: "impl".to_string(),
            }
        );
    }

    #[test]
    fn test_subroutine_header() {
        let header = "recursive subroutine walk(node, depth) bind(c, name='walk')";
        let Statement::Procedure(h) = class(header) else {
            panic!("not a procedure");
        };
        assert_eq!(h.proc_kind, ProcedureKind::Subroutine);
        assert_eq!(h.name, "walk");
        assert_eq!(h.attributes, vec!["recursive"]);
        assert_eq!(h.arguments, vec!["node", "depth"]);
        assert_eq!(h.bind.as_deref(), Some("c, name='walk'"));
        assert_eq!(class("x = subroutine y"), Statement::Executable);
    }

    #[test]
    fn test_function_header_prefixes() {
        let Statement::Procedure(h) = class("pure real(kind=dp) function norm(v) result(n)") else {
            panic!("not a procedure");
        };
        assert_eq!(h.proc_kind, ProcedureKind::Function);
        assert_eq!(h.attributes, vec!["pure"]);
        assert_eq!(h.prefix_type.as_deref(), Some("real(kind=dp)"));
        assert_eq!(h.result_name.as_deref(), Some("n"));

        let Statement::Procedure(h) = class("function f()") else {
            panic!("not a procedure");
        };
        assert!(h.arguments.is_empty());
        assert!(h.prefix_type.is_none());

        assert!(matches!(
            class("double precision function d(x)"),
            Statement::Procedure(ProcedureHeader { prefix_type: Some(_), .. })
        ));
        assert_eq!(class("y = bogus function q(x)"), Statement::Executable);
    }

    #[test]
    fn test_type_header() {
        let Statement::Type(h) = class("type, extends(shape), public :: circle") else {
            panic!("not a type");
        };
        assert_eq!(h.name, "circle");
        assert_eq!(h.extends.as_deref(), Some("shape"));
        assert_eq!(h.permission, Some(Permission::Public));

        let Statement::Type(h) = class("type :: matrix(k, n)") else {
            panic!("not a type");
        };
        assert_eq!(h.parameters, vec!["k", "n"]);
        assert!(!matches!(class("type is (circle)"), Statement::Type(_)));
        assert!(matches!(class("type(circle) :: c"), Statement::Declaration(_)));
    }

    #[test]
    fn test_interfaces_and_module_procedures() {
        assert_eq!(
            class("abstract interface"),
            Statement::Interface { is_abstract: true, name: None }
        );
        assert_eq!(
            class("interface operator(+)"),
            Statement::Interface {
                is_abstract: false,
                name: Some("operator(+)".to_string()),
            }
        );
        assert_eq!(
            class("module procedure a, b"),
            Statement::ModuleProcedures {
                module: true,
                names: vec!["a".to_string(), "b".to_string()],
            }
        );
        let in_interface = StatementContext {
            in_interface: true,
            ..StatementContext::default()
        };
        assert_eq!(
            in_ctx("procedure :: c", in_interface),
            Statement::ModuleProcedures {
                module: false,
                names: vec!["c".to_string()],
            }
        );
        assert_eq!(class("enum, bind(c)"), Statement::Enum);
    }

    #[test]
    fn test_bindings() {
        let contains = StatementContext {
            in_type_contains: true,
            ..StatementContext::default()
        };
        let text = "procedure, private :: area => circle_area, draw";
        let Statement::Binding(b) = in_ctx(text, contains) else {
            panic!("not a binding");
        };
        let bindings = b.into_bindings(Permission::Public);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "area");
        assert_eq!(bindings[0].permission, Permission::Private);
        assert_eq!(bindings[0].targets[0].name, "circle_area");
        assert_eq!(bindings[1].targets[0].name, "draw");

        let text = "procedure(area_iface), deferred :: area";
        let Statement::Binding(b) = in_ctx(text, contains) else {
            panic!("not a binding");
        };
        let bindings = b.into_bindings(Permission::Public);
        assert!(bindings[0].deferred);
        assert!(bindings[0].targets.is_empty());
        assert_eq!(bindings[0].proto.as_ref().map(|p| p.name.as_str()), Some("area_iface"));

        let Statement::Binding(b) = in_ctx("generic :: operator(+) => add_int, add_real", contains)
        else {
            panic!("not a binding");
        };
        let bindings = b.into_bindings(Permission::Public);
        assert!(bindings[0].generic);
        assert_eq!(bindings[0].name, "operator(+)");
        assert_eq!(bindings[0].targets.len(), 2);

        assert_eq!(
            in_ctx("final :: cleanup", contains),
            Statement::Final(vec!["cleanup".to_string()])
        );
    }

    #[test]
    fn test_declarations_and_attributes() {
        assert!(matches!(class("integer :: i, j"), Statement::Declaration(_)));
        assert_eq!(
            class("public :: a, b"),
            Statement::Attribute {
                attribute: "public".to_string(),
                names: "a, b".to_string(),
            }
        );
        let Statement::Declaration(d) = class("10 real :: x") else {
            panic!("not a declaration");
        };
        assert_eq!(d.names[0].offset, 11);

        let in_block = StatementContext {
            in_block: true,
            ..StatementContext::default()
        };
        assert_eq!(in_ctx("integer :: tmp", in_block), Statement::Ignored);
        assert!(matches!(in_ctx("dimension x(3)", in_block), Statement::Executable));
    }

    #[test]
    fn test_use_statements() {
        let Statement::Use(u) = class("use geometry, only: area, vol => volume") else {
            panic!("not a use");
        };
        assert_eq!(u.module.name, "geometry");
        assert!(u.only);
        assert_eq!(u.names.len(), 2);
        assert_eq!(u.names[1].local, "vol");
        assert_eq!(u.names[1].original, "volume");

        let Statement::Use(u) = class("use, intrinsic :: iso_c_binding") else {
            panic!("not a use");
        };
        assert!(!u.only);
        assert!(u.names.is_empty());
    }

    #[test]
    fn test_common_blocks() {
        let Statement::Common(groups) = class("common /state/ a, b(10) /flags/ c") else {
            panic!("not a common");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "state");
        assert_eq!(groups[0].members, vec!["a", "b"]);
        assert_eq!(groups[1].members, vec!["c"]);

        let Statement::Common(groups) = class("common x, y") else {
            panic!("not a common");
        };
        assert_eq!(groups[0].name, "");
    }

    #[test]
    fn test_namelist_groups() {
        let Statement::Namelist(groups) = class("namelist /cfg/ a, b /out/ c") else {
            panic!("not a namelist");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "cfg");
        assert_eq!(groups[0].members, vec!["a", "b"]);
        assert_eq!(groups[1].name, "out");
        assert_eq!(groups[1].members, vec!["c"]);
        assert_eq!(class("namelist_count = 2"), Statement::Executable);
    }

    #[test]
    fn test_ignored_and_executable() {
        assert_eq!(class("implicit none"), Statement::Ignored);
        assert_eq!(class("save"), Statement::Ignored);
        assert_eq!(class("go to (10, 20) i"), Statement::Ignored);
        assert_eq!(class("x = y + 1"), Statement::Executable);
        assert_eq!(class("print *, 'end module'"), Statement::Executable);
    }
}
