use std::collections::HashMap;

use crate::errors::TemplateError;

/// Placeholders a prompt template may reference as `{{name}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    RoleDescription,
    Domain,
    Schema,
    Examples,
    History,
    Question,
    Query,
    Evidence,
    EvidenceStatus,
    PreviousError,
}

impl Placeholder {
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::RoleDescription => "role_description",
            Placeholder::Domain => "domain",
            Placeholder::Schema => "schema",
            Placeholder::Examples => "examples",
            Placeholder::History => "history",
            Placeholder::Question => "question",
            Placeholder::Query => "query",
            Placeholder::Evidence => "evidence",
            Placeholder::EvidenceStatus => "evidence_status",
            Placeholder::PreviousError => "previous_error",
        }
    }
}

impl std::str::FromStr for Placeholder {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role_description" => Ok(Placeholder::RoleDescription),
            "domain" => Ok(Placeholder::Domain),
            "schema" => Ok(Placeholder::Schema),
            "examples" => Ok(Placeholder::Examples),
            "history" => Ok(Placeholder::History),
            "question" => Ok(Placeholder::Question),
            "query" => Ok(Placeholder::Query),
            "evidence" => Ok(Placeholder::Evidence),
            "evidence_status" => Ok(Placeholder::EvidenceStatus),
            "previous_error" => Ok(Placeholder::PreviousError),
            other => Err(TemplateError::UnknownPlaceholder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// A prompt template whose placeholders were validated at parse time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

/// Values substituted into a template
pub type Bindings<'a> = HashMap<Placeholder, &'a str>;

impl PromptTemplate {
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let placeholder = after_open[..end].trim().parse::<Placeholder>()?;
            segments.push(Segment::Slot(placeholder));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Placeholders referenced by this template, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder; bound values are inserted verbatim
    pub fn render(&self, bindings: &Bindings<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(p) => {
                    let value = bindings
                        .get(p)
                        .ok_or(TemplateError::MissingBinding(p.name()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render a template in one step
pub fn render(template: &str, bindings: &Bindings<'_>) -> Result<String, TemplateError> {
    PromptTemplate::parse(template)?.render(bindings)
}
