//! A small CSS selector subset.
//!
//! Supported: type selectors and `*`, `.class`, `#id`, attribute selectors
//! (`[a]`, `[a="v"]`, `[a*="v"]`, `[a^="v"]`, `[a$="v"]`), the descendant
//! combinator, and comma-separated lists. Other combinators and
//! pseudo-classes are rejected at parse time.

use std::fmt;

use crate::error::SelectorError;

/// View of an element that selectors can be matched against.
pub trait Element: Copy {
    fn local_name(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn parent_element(&self) -> Option<Self>;
}

/// Comma-separated list of selectors; matches if any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

/// Compounds joined by descendant combinators, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut p = Parser { src: input, pos: 0 };
        let mut selectors = Vec::new();
        loop {
            p.skip_ws();
            selectors.push(p.complex()?);
            p.skip_ws();
            match p.peek() {
                None => break,
                Some(',') => p.bump(),
                Some(_) => return Err(p.error("expected ',' or end of input")),
            }
        }
        Ok(Self { selectors })
    }

    /// Join several selector strings into one list.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Self, SelectorError> {
        let mut selectors = Vec::new();
        for input in inputs {
            selectors.extend(Self::parse(input.as_ref())?.selectors);
        }
        Ok(Self { selectors })
    }

    /// Selector list matching elements carrying any of the given classes.
    pub fn any_class<S: AsRef<str>>(classes: &[S]) -> Result<Self, SelectorError> {
        let sources: Vec<String> = classes.iter().map(|c| format!(".{}", c.as_ref())).collect();
        Self::parse_all(&sources)
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn matches<E: Element>(&self, el: E) -> bool {
        self.selectors.iter().any(|s| s.matches(el))
    }
}

impl Complex {
    fn matches<E: Element>(&self, el: E) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(el) {
            return false;
        }
        // Descendant-only chains can be matched greedily right to left.
        let mut ancestor = el.parent_element();
        for compound in rest.iter().rev() {
            loop {
                match ancestor {
                    None => return false,
                    Some(a) => {
                        ancestor = a.parent_element();
                        if compound.matches(a) {
                            break;
                        }
                    }
                }
            }
        }
        true
    }
}

impl Compound {
    fn matches<E: Element>(&self, el: E) -> bool {
        if let Some(tag) = &self.tag {
            if !el.local_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let Some(class_attr) = el.attr("class") else {
                return false;
            };
            let has = |c: &String| class_attr.split_ascii_whitespace().any(|x| x == c);
            if !self.classes.iter().all(has) {
                return false;
            }
        }
        self.attrs.iter().all(|a| a.matches(el.attr(&a.name)))
    }
}

impl AttrSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => value == self.value,
            // Empty needles never match for substring operators.
            AttrOp::Contains => !self.value.is_empty() && value.contains(&self.value),
            AttrOp::Prefix => !self.value.is_empty() && value.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && value.ends_with(&self.value),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.src[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: &'static str) -> SelectorError {
        SelectorError {
            source_text: self.src.to_string(),
            offset: self.pos,
            message,
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.compound()?];
        loop {
            match self.peek() {
                None | Some(',') => break,
                Some(c) if c.is_whitespace() => {
                    self.skip_ws();
                    if matches!(self.peek(), None | Some(',')) {
                        break;
                    }
                    compounds.push(self.compound()?);
                }
                Some(_) => return Err(self.error("unsupported combinator or pseudo-class")),
            }
        }
        Ok(Complex { compounds })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => self.bump(),
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.ident()?);
                }
                Some('[') => compound.attrs.push(self.attr()?),
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.error("expected selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn attr(&mut self) -> Result<AttrSelector, SelectorError> {
        self.bump(); // '['
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = if self.eat("]") {
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            });
        } else if self.eat("*=") {
            AttrOp::Contains
        } else if self.eat("^=") {
            AttrOp::Prefix
        } else if self.eat("$=") {
            AttrOp::Suffix
        } else if self.eat("=") {
            AttrOp::Equals
        } else {
            return Err(self.error("expected attribute operator"));
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c != q) {
                    self.bump();
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value = self.src[start..self.pos].to_string();
                self.bump();
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        if !self.eat("]") {
            return Err(self.error("expected ']'"));
        }
        Ok(AttrSelector { name, op, value })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, complex) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for (j, compound) in complex.compounds.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{compound}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => f.write_str(tag)?,
            None if self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty() => {
                f.write_str("*")?
            }
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for a in &self.attrs {
            let op = match a.op {
                AttrOp::Exists => {
                    write!(f, "[{}]", a.name)?;
                    continue;
                }
                AttrOp::Equals => "=",
                AttrOp::Contains => "*=",
                AttrOp::Prefix => "^=",
                AttrOp::Suffix => "$=",
            };
            write!(f, "[{}{}\"{}\"]", a.name, op, a.value)?;
        }
        Ok(())
    }
}
