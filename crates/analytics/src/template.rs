//! `{placeholder}` prompt templates.
//!
//! `{name}` is replaced by the bound value, verbatim. `{{` and `}}` render
//! as literal braces. Rendering fails on any placeholder without a binding;
//! bindings the template does not reference are ignored.

use salespulse_core::TemplateError;
use std::collections::HashMap;

/// Named values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment<'t> {
    Literal(&'t str),
    Placeholder(&'t str),
}

/// A named prompt with `{placeholder}` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub source: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    /// Placeholder names in order of appearance, duplicates removed.
    pub fn placeholders(&self) -> Result<Vec<&'static str>, TemplateError> {
        let mut names = Vec::new();
        for segment in self.parse()? {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in self.parse()? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        bindings
                            .get(name)
                            .ok_or_else(|| TemplateError::UnboundPlaceholder {
                                template: self.name.to_string(),
                                name: name.to_string(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn parse(&self) -> Result<Vec<Segment<'static>>, TemplateError> {
        let src = self.source;
        let bytes = src.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    segments.push(Segment::Literal(&src[literal_start..=i]));
                    i += 2;
                    literal_start = i;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    segments.push(Segment::Literal(&src[literal_start..=i]));
                    i += 2;
                    literal_start = i;
                }
                b'{' => {
                    let close = src[i + 1..].find('}').map(|n| i + 1 + n).ok_or_else(|| {
                        TemplateError::UnterminatedPlaceholder {
                            template: self.name.to_string(),
                            offset: i,
                        }
                    })?;
                    let name = src[i + 1..close].trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder {
                            template: self.name.to_string(),
                            offset: i,
                        });
                    }
                    segments.push(Segment::Literal(&src[literal_start..i]));
                    segments.push(Segment::Placeholder(name));
                    i = close + 1;
                    literal_start = i;
                }
                _ => i += 1,
            }
        }
        segments.push(Segment::Literal(&src[literal_start..]));
        Ok(segments)
    }
}
