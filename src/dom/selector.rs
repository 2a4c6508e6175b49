use crate::dom::dom_model::{Document, NodeId};
use crate::error::{EngineError, Result};

// ============================================================================
// Selector model: the CSS subset discovery and locators rely on
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// Compounds left to right; each carries its relation to the previous one.
    pub parts: Vec<(Option<Combinator>, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
    pub pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
    Dash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrCondition {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pseudo {
    Not(Vec<Compound>),
    NthOfType(usize),
    Checked,
    Disabled,
}

// ============================================================================
// Parsing
// ============================================================================

pub fn parse_selector(selector: &str) -> Result<SelectorList> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(invalid(selector, "empty selector"));
    }
    let mut list = Vec::new();
    for branch in split_top_level(trimmed, ',') {
        list.push(parse_complex(selector, branch.trim())?);
    }
    Ok(SelectorList(list))
}

fn invalid(selector: &str, reason: &str) -> EngineError {
    EngineError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

/// Split on `sep` outside brackets, parentheses and quotes.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => depth -= 1,
            (None, c) if c == sep && depth == 0 => {
                out.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&input[start..]);
    out
}

fn parse_complex(selector: &str, branch: &str) -> Result<ComplexSelector> {
    if branch.is_empty() {
        return Err(invalid(selector, "empty selector branch"));
    }
    let chars: Vec<char> = branch.chars().collect();
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            if !parts.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            i += 1;
            continue;
        }
        if ch == '>' {
            if parts.is_empty() {
                return Err(invalid(selector, "combinator without left-hand side"));
            }
            pending = Some(Combinator::Child);
            i += 1;
            continue;
        }
        if ch == '+' || ch == '~' {
            return Err(invalid(selector, "sibling combinators are not supported"));
        }

        let start = i;
        let mut depth = 0i32;
        let mut quote: Option<char> = None;
        while i < chars.len() {
            let c = chars[i];
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '[') | (None, '(') => depth += 1,
                (None, ']') | (None, ')') => depth -= 1,
                (None, c) if depth == 0 && (c.is_whitespace() || c == '>') => break,
                _ => {}
            }
            i += 1;
        }
        if depth != 0 || quote.is_some() {
            return Err(invalid(selector, "unbalanced brackets or quotes"));
        }
        let token: String = chars[start..i].iter().collect();
        let compound = parse_compound(selector, &token)?;
        let combinator = if parts.is_empty() { None } else { pending.take() };
        parts.push((combinator, compound));
    }

    if parts.is_empty() || pending == Some(Combinator::Child) {
        return Err(invalid(selector, "dangling combinator"));
    }
    Ok(ComplexSelector { parts })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == '\\' || !c.is_ascii()
}

fn read_ident(chars: &[char], i: &mut usize) -> String {
    let mut out = String::new();
    while *i < chars.len() && is_ident_char(chars[*i]) {
        if chars[*i] == '\\' && *i + 1 < chars.len() {
            *i += 1;
        }
        out.push(chars[*i]);
        *i += 1;
    }
    out
}

fn parse_compound(selector: &str, token: &str) -> Result<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0usize;

    if i < chars.len() && chars[i] == '*' {
        i += 1;
    } else if i < chars.len() && is_ident_char(chars[i]) {
        compound.tag = Some(read_ident(&chars, &mut i).to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let ident = read_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(invalid(selector, "empty id selector"));
                }
                compound.ids.push(ident);
            }
            '.' => {
                i += 1;
                let ident = read_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(invalid(selector, "empty class selector"));
                }
                compound.classes.push(ident);
            }
            '[' => {
                let close = find_close(&chars, i, '[', ']')
                    .ok_or_else(|| invalid(selector, "unterminated attribute selector"))?;
                let body: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr(selector, &body)?);
                i = close + 1;
            }
            ':' => {
                i += 1;
                let name = read_ident(&chars, &mut i).to_ascii_lowercase();
                let mut argument = None;
                if i < chars.len() && chars[i] == '(' {
                    let close = find_close(&chars, i, '(', ')')
                        .ok_or_else(|| invalid(selector, "unterminated pseudo-class"))?;
                    argument = Some(chars[i + 1..close].iter().collect::<String>());
                    i = close + 1;
                }
                compound.pseudos.push(parse_pseudo(selector, &name, argument.as_deref())?);
            }
            other => {
                return Err(invalid(selector, &format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(compound)
}

fn find_close(chars: &[char], open_at: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (offset, c) in chars[open_at..].iter().enumerate() {
        match (quote, *c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(*c),
            (None, c) if c == open => depth += 1,
            (None, c) if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_at + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_attr(selector: &str, body: &str) -> Result<AttrCondition> {
    let body = body.trim();
    let op_at = body.find(['=', '*', '^', '$', '~', '|']);
    let Some(op_at) = op_at else {
        if body.is_empty() || !body.chars().all(is_ident_char) {
            return Err(invalid(selector, "bad attribute name"));
        }
        return Ok(AttrCondition {
            name: body.to_ascii_lowercase(),
            op: AttrOp::Exists,
            value: String::new(),
            case_insensitive: false,
        });
    };

    let name = body[..op_at].trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(invalid(selector, "missing attribute name"));
    }
    let rest = &body[op_at..];
    let (op, value_part) = if let Some(v) = rest.strip_prefix("*=") {
        (AttrOp::Contains, v)
    } else if let Some(v) = rest.strip_prefix("^=") {
        (AttrOp::Prefix, v)
    } else if let Some(v) = rest.strip_prefix("$=") {
        (AttrOp::Suffix, v)
    } else if let Some(v) = rest.strip_prefix("~=") {
        (AttrOp::Word, v)
    } else if let Some(v) = rest.strip_prefix("|=") {
        (AttrOp::Dash, v)
    } else if let Some(v) = rest.strip_prefix('=') {
        (AttrOp::Equals, v)
    } else {
        return Err(invalid(selector, "unknown attribute operator"));
    };

    let value_part = value_part.trim();
    let (value, flags) = match value_part.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let end = value_part[1..]
                .find(q)
                .ok_or_else(|| invalid(selector, "unterminated attribute value"))?;
            (
                value_part[1..1 + end].to_string(),
                value_part[2 + end..].trim().to_string(),
            )
        }
        Some(_) => {
            let mut pieces = value_part.split_whitespace();
            let value = pieces.next().unwrap_or("").to_string();
            (value, pieces.collect::<Vec<_>>().join(" "))
        }
        None => return Err(invalid(selector, "missing attribute value")),
    };

    let case_insensitive = match flags.as_str() {
        "" => false,
        "i" | "I" => true,
        "s" | "S" => false,
        _ => return Err(invalid(selector, "unknown attribute flag")),
    };

    Ok(AttrCondition {
        name,
        op,
        value,
        case_insensitive,
    })
}

fn parse_pseudo(selector: &str, name: &str, argument: Option<&str>) -> Result<Pseudo> {
    match (name, argument) {
        ("not", Some(arg)) => {
            let mut inner = Vec::new();
            for branch in split_top_level(arg, ',') {
                inner.push(parse_compound(selector, branch.trim())?);
            }
            Ok(Pseudo::Not(inner))
        }
        ("nth-of-type", Some(arg)) => arg
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(Pseudo::NthOfType)
            .ok_or_else(|| invalid(selector, "nth-of-type supports positive integers only")),
        ("checked", None) => Ok(Pseudo::Checked),
        ("disabled", None) => Ok(Pseudo::Disabled),
        _ => Err(invalid(selector, &format!("unsupported pseudo-class ':{}'", name))),
    }
}

// ============================================================================
// Matching
// ============================================================================

impl SelectorList {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(doc, node))
    }
}

impl ComplexSelector {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.parts.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Some(Combinator::Child) => doc
                .parent_element(node)
                .is_some_and(|p| self.matches_at(doc, p, index - 1)),
            _ => doc
                .ancestors(node)
                .into_iter()
                .any(|a| self.matches_at(doc, a, index - 1)),
        }
    }
}

impl Compound {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if el.tag != *tag {
                return false;
            }
        }
        if !self.ids.iter().all(|id| el.attr("id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        if !self.attrs.iter().all(|cond| cond.matches(el.attr(&cond.name))) {
            return false;
        }
        self.pseudos.iter().all(|p| match p {
            Pseudo::Not(inner) => !inner.iter().any(|c| c.matches(doc, node)),
            Pseudo::NthOfType(n) => nth_of_type(doc, node) == *n,
            Pseudo::Checked => doc.checked(node) || doc.is_selected(node),
            Pseudo::Disabled => doc.is_disabled(node),
        })
    }
}

impl AttrCondition {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        if self.op == AttrOp::Exists {
            return true;
        }
        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Contains => !expected.is_empty() && actual.contains(&expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Word => actual.split_whitespace().any(|w| w == expected),
            AttrOp::Dash => actual == expected || actual.starts_with(&format!("{}-", expected)),
        }
    }
}

/// 1-based position among same-tag element siblings.
pub fn nth_of_type(doc: &Document, node: NodeId) -> usize {
    let tag = doc.tag(node);
    let Some(parent) = doc.parent(node) else {
        return 1;
    };
    doc.children(parent)
        .iter()
        .filter(|c| doc.tag(**c) == tag)
        .position(|c| *c == node)
        .map(|p| p + 1)
        .unwrap_or(1)
}

// ============================================================================
// Queries
// ============================================================================

impl Document {
    /// `scope.querySelectorAll(selector)`: light-tree descendants of `scope` only.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let compiled = parse_selector(selector)?;
        Ok(self.select_all(scope, &compiled))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(scope, selector)?.into_iter().next())
    }

    pub fn select_all(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendant_elements(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    pub fn matches_selector(&self, node: NodeId, selector: &str) -> Result<bool> {
        Ok(parse_selector(selector)?.matches(self, node))
    }
}
