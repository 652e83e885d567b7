use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find zero or more elements on a page.
///
/// `%s` inside a CSS expression or a match text is a parameter slot, filled
/// positionally by [`Locator::bind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    /// Elements of one of `tags` whose normalized text contains `text`.
    TextMatch { tags: Vec<String>, text: String },
    /// Alternatives tried left to right; the first one matching anything wins.
    #[serde(rename = "any")]
    Compound(Vec<Locator>),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text_match<I, S>(tags: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Locator::TextMatch {
            tags: tags.into_iter().map(Into::into).collect(),
            text: text.into(),
        }
    }

    pub fn any(alternatives: Vec<Locator>) -> Self {
        Locator::Compound(alternatives)
    }

    /// Number of `%s` slots across the whole locator.
    pub fn param_slots(&self) -> usize {
        match self {
            Locator::Css(css) => css.matches("%s").count(),
            Locator::TextMatch { text, .. } => text.matches("%s").count(),
            Locator::Compound(alternatives) => alternatives
                .iter()
                .map(Locator::param_slots)
                .max()
                .unwrap_or(0),
        }
    }

    /// Fill `%s` slots in order. Every alternative of a compound locator
    /// receives the same parameters. Surplus slots are left untouched.
    pub fn bind(&self, params: &[&str]) -> Locator {
        match self {
            Locator::Css(css) => Locator::Css(fill_slots(css, params)),
            Locator::TextMatch { tags, text } => Locator::TextMatch {
                tags: tags.clone(),
                text: fill_slots(text, params),
            },
            Locator::Compound(alternatives) => {
                Locator::Compound(alternatives.iter().map(|alt| alt.bind(params)).collect())
            }
        }
    }
}

fn fill_slots(template: &str, params: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut params = params.iter();
    while let Some(pos) = rest.find("%s") {
        let Some(param) = params.next() else {
            break;
        };
        out.push_str(&rest[..pos]);
        out.push_str(param);
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "css({})", css),
            Locator::TextMatch { tags, text } => write!(f, "text({}: {:?})", tags.join("|"), text),
            Locator::Compound(alternatives) => {
                f.write_str("any[")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A locator plus the name used in logs, errors and screenshot labels.
/// The name never takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTarget {
    pub locator: Locator,
    pub name: String,
}

impl NamedTarget {
    pub fn new(locator: Locator, name: impl Into<String>) -> Self {
        Self {
            locator,
            name: name.into(),
        }
    }
}

impl fmt::Display for NamedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
