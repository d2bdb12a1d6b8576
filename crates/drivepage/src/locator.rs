// Locator - Declarative, lazily-resolved element query
//
// A Locator is a description of how to find element(s), never a handle to
// them. It is rendered to a Playwright selector string on every use, so an
// element that is re-rendered between two actions is simply found again.
//
// Key characteristics:
// - Immutable: builder methods return a new Locator
// - Declarative: built from roles, text, labels and test ids
// - Chainable: sub-locators via locator(), has(), has_text(), nth()
//
// Rendering follows the selector engines Playwright's own getBy* helpers
// produce (internal:role, internal:text, internal:label, ...).

use std::fmt;

/// One selector engine query.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    Role {
        role: String,
        name: Option<String>,
        exact: bool,
    },
    Text {
        text: String,
        exact: bool,
    },
    Label(String),
    Placeholder(String),
    TestId(String),
    Css(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Query(Query),
    Has(Box<Locator>),
    HasText(String),
    Nth(i32),
}

/// Declarative description of zero or more elements on a page.
///
/// # Example
///
/// ```ignore
/// use drivepage::Locator;
///
/// let dialog = Locator::role_named("dialog", "New folder");
/// let create = dialog.locator(&Locator::role_named("button", "Create"));
/// assert_eq!(
///     create.selector(),
///     r#"internal:role=dialog[name="New folder"i] >> internal:role=button[name="Create"i]"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    fn from_query(query: Query) -> Self {
        Self {
            steps: vec![Step::Query(query)],
        }
    }

    fn push(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Elements with the given ARIA role, regardless of accessible name.
    pub fn role(role: &str) -> Self {
        Self::from_query(Query::Role {
            role: role.to_string(),
            name: None,
            exact: false,
        })
    }

    /// Elements with the given ARIA role whose accessible name contains `name`
    /// (case-insensitive).
    pub fn role_named(role: &str, name: &str) -> Self {
        Self::from_query(Query::Role {
            role: role.to_string(),
            name: Some(name.to_string()),
            exact: false,
        })
    }

    /// Elements with the given ARIA role whose accessible name is exactly `name`.
    pub fn role_exact(role: &str, name: &str) -> Self {
        Self::from_query(Query::Role {
            role: role.to_string(),
            name: Some(name.to_string()),
            exact: true,
        })
    }

    /// Elements whose text contains `text` (case-insensitive).
    pub fn text(text: &str) -> Self {
        Self::from_query(Query::Text {
            text: text.to_string(),
            exact: false,
        })
    }

    /// Elements whose whole text is exactly `text`.
    pub fn exact_text(text: &str) -> Self {
        Self::from_query(Query::Text {
            text: text.to_string(),
            exact: true,
        })
    }

    /// Form controls associated with a `<label>` or `aria-label` containing `label`.
    pub fn label(label: &str) -> Self {
        Self::from_query(Query::Label(label.to_string()))
    }

    /// Inputs by placeholder text.
    pub fn placeholder(placeholder: &str) -> Self {
        Self::from_query(Query::Placeholder(placeholder.to_string()))
    }

    /// Elements by `data-testid` attribute.
    pub fn test_id(id: &str) -> Self {
        Self::from_query(Query::TestId(id.to_string()))
    }

    /// Raw CSS selector. Prefer the semantic constructors where the
    /// application exposes roles or labels.
    pub fn css(selector: &str) -> Self {
        Self::from_query(Query::Css(selector.to_string()))
    }

    /// Matches `child` inside the elements matched by this locator.
    pub fn locator(&self, child: &Locator) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(child.steps.iter().cloned());
        Self { steps }
    }

    /// Narrows to elements that contain a descendant matching `inner`.
    pub fn has(&self, inner: &Locator) -> Self {
        self.push(Step::Has(Box::new(inner.clone())))
    }

    /// Narrows to elements containing `text` somewhere inside (case-insensitive).
    pub fn has_text(&self, text: &str) -> Self {
        self.push(Step::HasText(text.to_string()))
    }

    /// The nth match (0-indexed; negative counts from the end).
    pub fn nth(&self, index: i32) -> Self {
        self.push(Step::Nth(index))
    }

    /// The first match.
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// The last match.
    pub fn last(&self) -> Self {
        self.nth(-1)
    }

    /// Renders the Playwright selector string for this locator.
    pub fn selector(&self) -> String {
        self.steps
            .iter()
            .map(render_step)
            .collect::<Vec<_>>()
            .join(" >> ")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

fn render_step(step: &Step) -> String {
    match step {
        Step::Query(query) => render_query(query),
        Step::Has(inner) => format!("internal:has={}", quote(&inner.selector())),
        Step::HasText(text) => format!("internal:has-text={}i", quote(text)),
        Step::Nth(index) => format!("nth={index}"),
    }
}

fn render_query(query: &Query) -> String {
    match query {
        Query::Role { role, name, exact } => match name {
            Some(name) => format!(
                "internal:role={role}[name={}{}]",
                quote(name),
                case_flag(*exact)
            ),
            None => format!("internal:role={role}"),
        },
        Query::Text { text, exact } => {
            format!("internal:text={}{}", quote(text), case_flag(*exact))
        }
        Query::Label(label) => format!("internal:label={}i", quote(label)),
        Query::Placeholder(text) => format!("internal:attr=[placeholder={}i]", quote(text)),
        Query::TestId(id) => format!("internal:testid=[data-testid={}s]", quote(id)),
        Query::Css(css) => css.clone(),
    }
}

fn case_flag(exact: bool) -> &'static str {
    if exact { "s" } else { "i" }
}

/// JSON string quoting, which is what Playwright's selector engines expect.
fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
