use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, ordered list of declarative UI actions.
///
/// Serialized as one entry of the flat JSON collection kept by
/// [`TestCaseStore`](crate::case::store::TestCaseStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Unique name of the case
    pub name: String,

    /// Steps, executed strictly in this order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// One declarative action plus its pacing and occurrence index.
///
/// The action tag and its fields sit at the same level as `wait`/`index`:
///
/// ```json
/// {"action": "click", "selector_type": "id", "selector_value": "submit", "wait": 2, "index": 0}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,

    /// Seconds to pause after the step completes
    #[serde(default)]
    pub wait: u64,

    /// Zero-based occurrence among matched elements
    #[serde(default)]
    pub index: usize,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            wait: 0,
            index: 0,
        }
    }

    pub fn with_wait(mut self, wait: u64) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn visit(url: impl Into<String>) -> Self {
        Self::new(StepAction::Visit { url: url.into() })
    }

    pub fn click(selector_type: SelectorKind, selector_value: impl Into<String>) -> Self {
        Self::new(StepAction::Click {
            selector_type,
            selector_value: selector_value.into(),
        })
    }

    pub fn input(
        selector_type: SelectorKind,
        selector_value: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(StepAction::Input {
            selector_type,
            selector_value: selector_value.into(),
            text: text.into(),
        })
    }

    pub fn assert_text(text: impl Into<String>) -> Self {
        Self::new(StepAction::Assert { text: text.into() })
    }

    pub fn select_dropdown(selector_value: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(StepAction::SelectDropdown {
            selector_type: SelectorKind::Id,
            selector_value: selector_value.into(),
            text: text.into(),
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }
}

/// The declarative action carried by a [`Step`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Navigate to a URL (may contain placeholders)
    Visit { url: String },

    /// Click the located element
    Click {
        selector_type: SelectorKind,
        selector_value: String,
    },

    /// Clear the located element and type text (may contain placeholders)
    Input {
        selector_type: SelectorKind,
        selector_value: String,
        text: String,
    },

    /// Require text (may contain placeholders) to be present in the page source
    Assert { text: String },

    /// Open a dropdown and pick the option whose label equals `text`
    SelectDropdown {
        #[serde(default = "default_dropdown_kind")]
        selector_type: SelectorKind,
        selector_value: String,
        text: String,
    },
}

fn default_dropdown_kind() -> SelectorKind {
    SelectorKind::Id
}

impl StepAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            StepAction::Visit { .. } => ActionKind::Visit,
            StepAction::Click { .. } => ActionKind::Click,
            StepAction::Input { .. } => ActionKind::Input,
            StepAction::Assert { .. } => ActionKind::Assert,
            StepAction::SelectDropdown { .. } => ActionKind::SelectDropdown,
        }
    }

    /// Fields that go through placeholder substitution.
    pub fn templates(&self) -> Vec<&str> {
        match self {
            StepAction::Visit { url } => vec![url.as_str()],
            StepAction::Input { text, .. }
            | StepAction::Assert { text }
            | StepAction::SelectDropdown { text, .. } => vec![text.as_str()],
            StepAction::Click { .. } => Vec::new(),
        }
    }

    /// Selector fields, for actions that locate an element.
    pub fn selector(&self) -> Option<(SelectorKind, &str)> {
        match self {
            StepAction::Click {
                selector_type,
                selector_value,
            }
            | StepAction::Input {
                selector_type,
                selector_value,
                ..
            }
            | StepAction::SelectDropdown {
                selector_type,
                selector_value,
                ..
            } => Some((*selector_type, selector_value.as_str())),
            StepAction::Visit { .. } | StepAction::Assert { .. } => None,
        }
    }
}

/// Tag of a [`StepAction`] without its payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Visit,
    Click,
    Input,
    Assert,
    SelectDropdown,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Visit => "visit",
            ActionKind::Click => "click",
            ActionKind::Input => "input",
            ActionKind::Assert => "assert",
            ActionKind::SelectDropdown => "select_dropdown",
        }
    }

    /// Whether transient notifications are consulted after this action.
    pub fn consults_notifications(&self) -> bool {
        matches!(
            self,
            ActionKind::Visit | ActionKind::Click | ActionKind::SelectDropdown
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy used to locate a UI element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Id,
    Name,
    Xpath,
    CssSelector,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
    /// Sugar for `//*[@placeholder='<value>']`
    Placeholder,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 9] = [
        SelectorKind::Id,
        SelectorKind::Name,
        SelectorKind::Xpath,
        SelectorKind::CssSelector,
        SelectorKind::ClassName,
        SelectorKind::TagName,
        SelectorKind::LinkText,
        SelectorKind::PartialLinkText,
        SelectorKind::Placeholder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Id => "id",
            SelectorKind::Name => "name",
            SelectorKind::Xpath => "xpath",
            SelectorKind::CssSelector => "css_selector",
            SelectorKind::ClassName => "class_name",
            SelectorKind::TagName => "tag_name",
            SelectorKind::LinkText => "link_text",
            SelectorKind::PartialLinkText => "partial_link_text",
            SelectorKind::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
