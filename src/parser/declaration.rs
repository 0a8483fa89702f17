//! Variable declarations: type specification, attributes and the list of
//! declared names.

use crate::entity::Permission;

use super::patterns::{ATTRIBSPLIT_RE, KIND_RE, LEN_RE, PROTO_RE, VariablePattern};
use super::text::{leading_group, mask_strings, paren_split, paren_split_spans, squeeze};

/// Base type of a declaration or function prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedType {
    /// Lower-cased keyword, with `double precision` and `double complex` normalized
    pub vartype: String,
    pub kind: Option<String>,
    pub strlen: Option<String>,
    /// Type, class or interface named in `type(...)`, `class(...)`, `procedure(...)`
    pub proto: Option<String>,
    /// Byte offset where the type specification ends
    pub end: usize,
}

/// One name in a declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredName {
    pub name: String,
    pub dimension: Option<String>,
    pub strlen: Option<String>,
    pub initial: Option<String>,
    pub points: bool,
    /// Byte offset of the name in the statement text
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub base: ParsedType,
    pub attributes: Vec<String>,
    pub permission: Option<Permission>,
    pub intent: Option<String>,
    pub optional: bool,
    pub value: bool,
    pub parameter: bool,
    /// Shape given by a `dimension(...)` attribute
    pub dimension: Option<String>,
    pub names: Vec<DeclaredName>,
}

/// Parse the type specification at the start of `text`.
///
/// Returns `None` when `text` does not start with a type keyword or the kind
/// selector is malformed.
#[must_use]
pub fn parse_type(text: &str, vars: &VariablePattern) -> Option<ParsedType> {
    let masked = mask_strings(text);
    let (keyword, after) = vars.split(&masked)?;
    let vartype = normalize_vartype(keyword);

    let skipped = after.len() - after.trim_start().len();
    let selector_start = keyword.len() + skipped;
    let selector = selector_len(&masked[selector_start..]);
    let end = selector_start + selector.unwrap_or(0);
    let selector_text = &text[selector_start..end];

    let mut parsed = ParsedType {
        vartype,
        end,
        ..ParsedType::default()
    };

    let star = selector_text.starts_with('*');
    let args = if star {
        let inner = selector_text[1..].trim();
        inner
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(inner)
            .to_string()
    } else if selector_text.len() >= 2 {
        selector_text[1..selector_text.len() - 1].to_string()
    } else {
        String::new()
    };
    let args = squeeze(&args);

    match parsed.vartype.as_str() {
        "type" | "class" | "procedure" => {
            if selector_text.is_empty() {
                return Some(parsed);
            }
            let caps = PROTO_RE.captures(&args)?;
            parsed.proto = Some(caps[1].to_string());
            parsed.kind = caps.get(2).map(|m| m.as_str().to_string()).filter(|k| !k.is_empty());
        }
        "character" => {
            if selector_text.is_empty() {
                parsed.strlen = Some("1".to_string());
            } else if star {
                parsed.strlen = Some(args);
            } else {
                let (strlen, kind) = character_selector(&args)?;
                parsed.strlen = Some(strlen);
                parsed.kind = kind;
            }
        }
        _ => {
            if !args.is_empty() {
                parsed.kind = Some(
                    KIND_RE
                        .captures(&args)
                        .map_or_else(|| args.clone(), |caps| caps[1].to_string()),
                );
            }
        }
    }
    Some(parsed)
}

/// Length of the kind selector (`(...)`, `*8`, `*(*)`) at the start of `text`.
fn selector_len(text: &str) -> Option<usize> {
    if text.starts_with('(') {
        return leading_group(text).map(str::len);
    }
    let rest = text.strip_prefix('*')?;
    let trimmed = rest.trim_start();
    let skipped = 1 + rest.len() - trimmed.len();
    if let Some(group) = leading_group(trimmed) {
        return Some(skipped + group.len());
    }
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    (digits > 0).then_some(skipped + digits)
}

/// `len` and `kind` of a `character(...)` selector, in either order.
fn character_selector(args: &str) -> Option<(String, Option<String>)> {
    let parts: Vec<&str> = args.split(',').collect();
    if parts.len() > 2 {
        return None;
    }
    let mut length: Option<String> = None;
    let mut kind: Option<String> = None;
    for arg in parts {
        if length.is_none() {
            if let Some(caps) = LEN_RE.captures(arg) {
                length = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_string());
                continue;
            }
        }
        if kind.is_none() {
            if let Some(caps) = KIND_RE.captures(arg) {
                kind = Some(caps[1].to_string());
                continue;
            }
        }
        if length.is_none() {
            length = Some(arg.to_string());
        } else if kind.is_none() {
            kind = Some(arg.to_string());
        }
    }
    Some((length.unwrap_or_else(|| "1".to_string()), kind))
}

fn normalize_vartype(keyword: &str) -> String {
    let lower = squeeze(keyword).to_ascii_lowercase();
    match lower.as_str() {
        "doubleprecision" => "double precision".to_string(),
        "doublecomplex" => "double complex".to_string(),
        _ => lower,
    }
}

/// Parse a full declaration statement such as
/// `real(dp), intent(in), optional :: a(3), b = 1.0`.
#[must_use]
pub fn parse_declaration(text: &str, vars: &VariablePattern) -> Option<Declaration> {
    let base = parse_type(text, vars)?;
    let masked = mask_strings(text);
    let rest = &masked[base.end..];
    let rest_start = base.end + (rest.len() - rest.trim_start().len());
    let rest = rest.trim_start();

    let mut declaration = Declaration {
        base,
        attributes: Vec::new(),
        permission: None,
        intent: None,
        optional: false,
        value: false,
        parameter: false,
        dimension: None,
        names: Vec::new(),
    };

    let list_start = if let Some(caps) = ATTRIBSPLIT_RE.captures(rest) {
        let attrs = caps.get(1)?;
        let attr_text = &text[rest_start + attrs.start()..rest_start + attrs.end()];
        for attribute in paren_split(attr_text, ',') {
            declaration.apply_attribute(attribute.trim());
        }
        rest_start + caps.get(2)?.start()
    } else {
        let without_colons = rest.strip_prefix("::").unwrap_or(rest);
        let colons = rest.len() - without_colons.len();
        rest_start + colons + (without_colons.len() - without_colons.trim_start().len())
    };

    let list_masked = masked[list_start..].trim_end();
    for span in paren_split_spans(list_masked, ',') {
        let piece = &list_masked[span.clone()];
        let lead = piece.len() - piece.trim_start().len();
        let start = list_start + span.start + lead;
        let end = list_start + span.end;
        if start >= end {
            continue;
        }
        declaration
            .names
            .push(declared_name(&text[start..end], &masked[start..end], start)?);
    }

    if declaration.names.is_empty() {
        return None;
    }
    Some(declaration)
}

impl Declaration {
    fn apply_attribute(&mut self, attribute: &str) {
        let lower = squeeze(attribute).to_ascii_lowercase();
        match lower.as_str() {
            "public" => self.permission = Some(Permission::Public),
            "private" => self.permission = Some(Permission::Private),
            "protected" => self.permission = Some(Permission::Protected),
            "optional" => self.optional = true,
            "value" => self.value = true,
            "parameter" => self.parameter = true,
            "" => {}
            _ => {
                if let Some(intent) = lower
                    .strip_prefix("intent(")
                    .and_then(|s| s.strip_suffix(')'))
                {
                    self.intent = Some(intent.to_string());
                } else if lower.starts_with("dimension(") {
                    let shape = attribute.trim_start()["dimension".len()..].trim();
                    self.dimension = Some(shape.to_string());
                } else {
                    self.attributes.push(attribute.to_string());
                }
            }
        }
    }
}

/// One entry of a declaration list: `name(dims)*len = initial`.
fn declared_name(text: &str, masked: &str, offset: usize) -> Option<DeclaredName> {
    let name_len = masked
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(masked.len(), |(i, _)| i);
    if name_len == 0 {
        return None;
    }

    let mut declared = DeclaredName {
        name: text[..name_len].to_string(),
        dimension: None,
        strlen: None,
        initial: None,
        points: false,
        offset,
    };

    let mut pos = name_len;
    let skip_ws = |pos: usize| pos + (masked[pos..].len() - masked[pos..].trim_start().len());

    pos = skip_ws(pos);
    if let Some(group) = leading_group(&masked[pos..]) {
        declared.dimension = Some(text[pos..pos + group.len()].to_string());
        pos = skip_ws(pos + group.len());
    }
    if masked[pos..].starts_with('[') {
        let close = masked[pos..].find(']')?;
        pos = skip_ws(pos + close + 1);
    }
    if masked[pos..].starts_with('*') {
        pos = skip_ws(pos + 1);
        let len = leading_group(&masked[pos..]).map_or_else(
            || {
                masked[pos..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(masked.len() - pos)
            },
            str::len,
        );
        declared.strlen = Some(text[pos..pos + len].to_string());
        pos = skip_ws(pos + len);
    }

    if let Some(value) = masked[pos..].strip_prefix('=') {
        let value_start = masked.len() - value.len();
        if let Some(target) = value.strip_prefix('>') {
            declared.points = true;
            let target_start = masked.len() - target.len();
            declared.initial = Some(text[target_start..].trim().to_string());
        } else {
            declared.initial = Some(text[value_start..].trim().to_string());
        }
    } else if !masked[pos..].trim().is_empty() {
        return None;
    }
    Some(declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(text: &str) -> Declaration {
        parse_declaration(text, &VariablePattern::default()).unwrap()
    }

    #[test]
    fn test_parse_type_kinds() {
        let vars = VariablePattern::default();
        let t = parse_type("real(kind=dp) :: x", &vars).unwrap();
        assert_eq!(t.vartype, "real");
        assert_eq!(t.kind.as_deref(), Some("dp"));

        let t = parse_type("integer*8 x", &vars).unwrap();
        assert_eq!(t.kind.as_deref(), Some("8"));

        let t = parse_type("double  precision :: d", &vars).unwrap();
        assert_eq!(t.vartype, "double precision");
        assert_eq!(t.kind, None);

        let t = parse_type("type(point), pointer :: p", &vars).unwrap();
        assert_eq!(t.vartype, "type");
        assert_eq!(t.proto.as_deref(), Some("point"));

        let t = parse_type("class(*), allocatable :: q", &vars).unwrap();
        assert_eq!(t.proto.as_deref(), Some("*"));
    }

    #[test]
    fn test_character_lengths() {
        let vars = VariablePattern::default();
        let t = parse_type("character(len=*), intent(in) :: s", &vars).unwrap();
        assert_eq!(t.strlen.as_deref(), Some("*"));
        let t = parse_type("character(kind=ck, len=10) :: s", &vars).unwrap();
        assert_eq!(t.strlen.as_deref(), Some("10"));
        assert_eq!(t.kind.as_deref(), Some("ck"));
        let t = parse_type("character*20 name", &vars).unwrap();
        assert_eq!(t.strlen.as_deref(), Some("20"));
        let t = parse_type("character :: c", &vars).unwrap();
        assert_eq!(t.strlen.as_deref(), Some("1"));
    }

    #[test]
    fn test_attributes_and_names() {
        let d = decl("real(dp), intent(in), optional, dimension(3) :: a, b(2, 2)");
        assert_eq!(d.intent.as_deref(), Some("in"));
        assert!(d.optional);
        assert_eq!(d.dimension.as_deref(), Some("(3)"));
        assert_eq!(d.names.len(), 2);
        assert_eq!(d.names[0].name, "a");
        assert_eq!(d.names[1].name, "b");
        assert_eq!(d.names[1].dimension.as_deref(), Some("(2, 2)"));
    }

    #[test]
    fn test_initializers_keep_strings() {
        let d = decl(r#"character(len=*), parameter, private :: s = "hi, there", x = 'a(b'"#);
        assert!(d.parameter);
        assert_eq!(d.permission, Some(Permission::Private));
        assert_eq!(d.names[0].initial.as_deref(), Some(r#""hi, there""#));
        assert_eq!(d.names[1].initial.as_deref(), Some("'a(b'"));
    }

    #[test]
    fn test_pointer_initialization() {
        let d = decl("procedure(iface), pointer :: p => null()");
        assert_eq!(d.base.proto.as_deref(), Some("iface"));
        assert!(d.names[0].points);
        assert_eq!(d.names[0].initial.as_deref(), Some("null()"));
    }

    #[test]
    fn test_name_offsets() {
        let text = "integer :: a, b";
        let d = decl(text);
        assert_eq!(d.names[0].offset, 11);
        assert_eq!(d.names[1].offset, 14);
        assert_eq!(&text[d.names[1].offset..], "b");
    }

    #[test]
    fn test_declaration_without_colons() {
        let d = decl("integer i, j");
        assert_eq!(d.names.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), ["i", "j"]);
        let d = decl("character c*8");
        assert_eq!(d.names[0].strlen.as_deref(), Some("8"));
    }
}
