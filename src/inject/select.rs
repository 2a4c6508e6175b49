use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::classify::select::{aria_option_value, popup_of};
use crate::config::InjectionConfig;
use crate::dom::dom_model::{Document, NodeId};
use crate::dom::events::DomEvent;
use crate::dom::selector::{SelectorList, parse_selector};
use crate::field::test_values::is_placeholder_text;
use crate::inject::strategy::{
    ApplyOptions, AttemptOutcome, InjectionStrategy, InjectionTarget, Recorder, run_cascade,
};

// ============================================================================
// Component-library dropdown profiles
// ============================================================================

/// How one dropdown library renders its trigger and option list.
#[derive(Debug, Clone, Copy)]
pub struct LibraryProfile {
    pub name: &'static str,
    /// Matches the widget root
    pub root: &'static str,
    /// Element to click to open, searched inside the root
    pub trigger: &'static str,
    /// Rendered option elements
    pub option: &'static str,
}

pub const LIBRARY_PROFILES: &[LibraryProfile] = &[
    LibraryProfile {
        name: "ant-design",
        root: ".ant-select",
        trigger: ".ant-select-selector",
        option: ".ant-select-item-option",
    },
    LibraryProfile {
        name: "mui",
        root: ".MuiSelect-select, .MuiAutocomplete-root, .MuiInputBase-root",
        trigger: ".MuiSelect-select, .MuiAutocomplete-input",
        option: r#".MuiMenuItem-root, .MuiAutocomplete-option, li[role="option"]"#,
    },
    LibraryProfile {
        name: "react-select",
        root: ".react-select__control, .react-select-container",
        trigger: ".react-select__control, .react-select__dropdown-indicator",
        option: ".react-select__option",
    },
    LibraryProfile {
        name: "select2",
        root: ".select2-container, .select2-selection",
        trigger: ".select2-selection",
        option: ".select2-results__option",
    },
    LibraryProfile {
        name: "vue-select",
        root: ".v-select",
        trigger: ".vs__dropdown-toggle",
        option: ".vs__dropdown-option",
    },
    LibraryProfile {
        name: "element-ui",
        root: ".el-select",
        trigger: ".el-input__inner, .el-select__wrapper",
        option: ".el-select-dropdown__item",
    },
    LibraryProfile {
        name: "aria",
        root: r#"[role="combobox"], [role="listbox"], [aria-haspopup="listbox"]"#,
        trigger: r#"[role="combobox"], [aria-haspopup="listbox"]"#,
        option: r#"[role="option"]"#,
    },
];

struct CompiledProfile {
    profile: LibraryProfile,
    root: SelectorList,
    trigger: SelectorList,
    option: SelectorList,
}

static COMPILED_PROFILES: Lazy<Vec<CompiledProfile>> = Lazy::new(|| {
    LIBRARY_PROFILES
        .iter()
        .filter_map(|p| match compile_profile(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                debug!(library = p.name, error = %e, "dropdown profile skipped");
                None
            }
        })
        .collect()
});

fn compile_profile(profile: &LibraryProfile) -> crate::error::Result<CompiledProfile> {
    Ok(CompiledProfile {
        profile: *profile,
        root: parse_selector(profile.root)?,
        trigger: parse_selector(profile.trigger)?,
        option: parse_selector(profile.option)?,
    })
}

/// How many composed ancestors may carry the library root class.
const ROOT_SEARCH_DEPTH: usize = 4;

/// Library adapters in order, then the native `<select>` writer.
pub fn select_strategies(config: &InjectionConfig) -> Vec<Box<dyn InjectionStrategy>> {
    let delay = Duration::from_millis(config.dropdown_open_delay_ms);
    let mut strategies: Vec<Box<dyn InjectionStrategy>> = COMPILED_PROFILES
        .iter()
        .map(|compiled| {
            Box::new(DropdownAdapter {
                compiled,
                open_delay: delay,
                chosen: RefCell::new(vec![]),
            }) as Box<dyn InjectionStrategy>
        })
        .collect();
    strategies.push(Box::new(NativeSelect::default()));
    strategies
}

pub async fn apply_select(
    doc: &mut Document,
    target: &InjectionTarget,
    options: &ApplyOptions,
    recorder: &mut Recorder<'_>,
) -> bool {
    let strategies = select_strategies(&options.config.injection);
    run_cascade(doc, target, &strategies, options, recorder).await
}

// ============================================================================
// Option matching
// ============================================================================

fn is_unavailable(doc: &Document, option: NodeId) -> bool {
    doc.has_attr(option, "disabled")
        || doc.attr(option, "aria-disabled") == Some("true")
        || doc.has_class(option, "disabled")
}

/// data-value, value attribute, exact text, substring, then the first real option.
pub fn match_option(doc: &Document, options: &[NodeId], wanted: &str) -> Option<NodeId> {
    let wanted_trim = wanted.trim();
    let wanted_lower = wanted_trim.to_lowercase();
    let usable: Vec<NodeId> = options.iter().copied().filter(|o| !is_unavailable(doc, *o)).collect();

    let by_attr = |attr: &str| {
        usable
            .iter()
            .copied()
            .find(|o| doc.attr(*o, attr).is_some_and(|v| v.trim() == wanted_trim))
    };
    by_attr("data-value")
        .or_else(|| by_attr("value"))
        .or_else(|| {
            usable
                .iter()
                .copied()
                .find(|o| doc.normalized_text(*o).to_lowercase() == wanted_lower)
        })
        .or_else(|| {
            if wanted_lower.is_empty() {
                return None;
            }
            usable
                .iter()
                .copied()
                .find(|o| doc.normalized_text(*o).to_lowercase().contains(&wanted_lower))
        })
        .or_else(|| {
            usable
                .iter()
                .copied()
                .find(|o| !is_placeholder_text(&doc.normalized_text(*o)))
        })
}

// ============================================================================
// Library dropdown adapter
// ============================================================================

/// Open the widget, wait for the list, click the best option.
pub struct DropdownAdapter {
    compiled: &'static CompiledProfile,
    open_delay: Duration,
    chosen: RefCell<Vec<NodeId>>,
}

impl DropdownAdapter {
    pub fn library(&self) -> &'static str {
        self.compiled.profile.name
    }

    fn widget_root(&self, doc: &Document, element: NodeId) -> Option<NodeId> {
        let root = &self.compiled.root;
        if let Some(found) = std::iter::once(element)
            .chain(doc.composed_ancestors(element).into_iter().take(ROOT_SEARCH_DEPTH))
            .find(|n| doc.is_element(*n) && root.matches(doc, *n))
        {
            return Some(found);
        }
        // Select2 hides the native select and renders its widget as the next sibling
        if doc.tag(element) == "select" && doc.has_class(element, "select2-hidden-accessible") {
            let parent = doc.parent(element)?;
            let siblings = doc.element_children(parent);
            let index = siblings.iter().position(|s| *s == element)?;
            return siblings.get(index + 1).copied().filter(|s| root.matches(doc, *s));
        }
        None
    }

    fn trigger(&self, doc: &Document, widget: NodeId) -> NodeId {
        if self.compiled.trigger.matches(doc, widget) {
            return widget;
        }
        doc.composed_descendant_elements(widget)
            .into_iter()
            .find(|d| self.compiled.trigger.matches(doc, *d))
            .unwrap_or(widget)
    }

    /// Options in the popup the trigger points at, else rendered options anywhere.
    fn rendered_options(&self, doc: &Document, widget: NodeId, trigger: NodeId) -> Vec<NodeId> {
        let is_option = |n: NodeId| {
            self.compiled.option.matches(doc, n) || doc.role(n).as_deref() == Some("option")
        };
        let popup = popup_of(doc, trigger).or_else(|| popup_of(doc, widget));
        if let Some(popup) = popup {
            let inside: Vec<NodeId> = doc
                .composed_descendant_elements(popup)
                .into_iter()
                .filter(|n| is_option(*n))
                .collect();
            if !inside.is_empty() {
                return inside;
            }
        }
        let own: Vec<NodeId> = doc
            .composed_descendant_elements(widget)
            .into_iter()
            .filter(|n| is_option(*n) && doc.is_rendered(*n))
            .collect();
        if !own.is_empty() {
            return own;
        }
        doc.composed_descendant_elements(doc.root())
            .into_iter()
            .filter(|n| self.compiled.option.matches(doc, *n) && doc.is_rendered(*n))
            .collect()
    }

    fn shows_option(doc: &Document, widget: NodeId, element: NodeId, option: NodeId) -> bool {
        if doc.attr(option, "aria-selected") == Some("true")
            || doc.has_class(option, "selected")
            || doc.has_class(option, "is-selected")
            || doc.has_class(option, "ant-select-item-option-selected")
        {
            return true;
        }
        let text = doc.normalized_text(option);
        let value = aria_option_value(doc, option);
        if text.is_empty() {
            return false;
        }
        [element, widget].iter().any(|n| {
            doc.normalized_text(*n).contains(&text)
                || doc.value(*n) == text
                || (!value.is_empty()
                    && (doc.value(*n) == value || doc.attr(*n, "data-value") == Some(value.as_str())))
        })
    }
}

#[async_trait(?Send)]
impl InjectionStrategy for DropdownAdapter {
    fn name(&self) -> &'static str {
        self.compiled.profile.name
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        if doc.is_disabled(target.element) {
            return false;
        }
        match self.widget_root(doc, target.element) {
            // A bare native select is handled by the native writer
            Some(widget) => doc.tag(widget) != "select",
            None => false,
        }
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let Some(widget) = self.widget_root(doc, target.element) else {
            return AttemptOutcome::NoEffect;
        };
        let wanted: Vec<String> = if target.values.is_empty() {
            vec![target.value.clone()]
        } else {
            target.values.clone()
        };

        let mut chosen = Vec::new();
        for value in &wanted {
            let trigger = self.trigger(doc, widget);
            doc.click(trigger);
            tokio::time::sleep(self.open_delay).await;

            let options = self.rendered_options(doc, widget, trigger);
            debug!(library = self.library(), options = options.len(), "dropdown opened");
            let Some(option) = match_option(doc, &options, value) else {
                continue;
            };
            doc.click(option);
            chosen.push(option);
        }
        let found = !chosen.is_empty();
        *self.chosen.borrow_mut() = chosen;

        if found {
            AttemptOutcome::Applied
        } else {
            AttemptOutcome::Failed(format!("{}: no option rendered", self.library()))
        }
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        let Some(widget) = self.widget_root(doc, target.element) else {
            return false;
        };
        let chosen = self.chosen.borrow();
        !chosen.is_empty()
            && chosen
                .iter()
                .all(|o| Self::shows_option(doc, widget, target.element, *o))
    }
}

// ============================================================================
// Native <select>
// ============================================================================

fn numeric_eq(a: &str, b: &str) -> bool {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => (x - y).abs() < f64::EPSILON,
        _ => false,
    }
}

/// Exact value, text, numeric equivalence.
fn native_match(doc: &Document, options: &[NodeId], wanted: &str) -> Option<NodeId> {
    let wanted = wanted.trim();
    let usable = || options.iter().copied().filter(|o| !doc.is_disabled(*o));
    usable()
        .find(|o| doc.option_value(*o) == wanted)
        .or_else(|| usable().find(|o| doc.option_text(*o).eq_ignore_ascii_case(wanted)))
        .or_else(|| usable().find(|o| numeric_eq(&doc.option_value(*o), wanted)))
}

fn first_real_option(doc: &Document, options: &[NodeId]) -> Option<NodeId> {
    options.iter().copied().find(|o| {
        !doc.is_disabled(*o) && !doc.option_value(*o).is_empty() && !is_placeholder_text(&doc.option_text(*o))
    })
}

#[derive(Default)]
pub struct NativeSelect {
    chosen: RefCell<Vec<NodeId>>,
}

#[async_trait(?Send)]
impl InjectionStrategy for NativeSelect {
    fn name(&self) -> &'static str {
        "native-select"
    }

    fn applies(&self, doc: &Document, target: &InjectionTarget) -> bool {
        doc.tag(target.element) == "select" && !doc.is_disabled(target.element)
    }

    async fn attempt(&self, doc: &mut Document, target: &InjectionTarget) -> AttemptOutcome {
        let el = target.element;
        let options = doc.options_of(el);
        if options.is_empty() {
            return AttemptOutcome::Failed("select has no options".to_string());
        }

        let chosen: Vec<NodeId> = if doc.has_attr(el, "multiple") {
            let wanted = if target.values.is_empty() {
                vec![target.value.clone()]
            } else {
                target.values.clone()
            };
            let mut matched: Vec<NodeId> = wanted
                .iter()
                .filter_map(|w| native_match(doc, &options, w))
                .collect();
            matched.sort();
            matched.dedup();
            for option in &options {
                doc.set_selected(*option, matched.contains(option));
            }
            matched
        } else {
            let Some(option) =
                native_match(doc, &options, &target.value).or_else(|| first_real_option(doc, &options))
            else {
                return AttemptOutcome::Failed("no selectable option".to_string());
            };
            for other in &options {
                doc.set_selected(*other, *other == option);
            }
            vec![option]
        };

        *self.chosen.borrow_mut() = chosen;
        doc.dispatch_event(DomEvent::input(el, None));
        doc.dispatch_event(DomEvent::change(el));
        AttemptOutcome::Applied
    }

    fn verify(&self, doc: &Document, target: &InjectionTarget) -> bool {
        let chosen = self.chosen.borrow();
        let selected = doc.selected_options(target.element);
        if doc.has_attr(target.element, "multiple") {
            let mut expected = chosen.clone();
            expected.sort();
            let mut actual = selected;
            actual.sort();
            expected == actual
        } else {
            chosen.first().is_some_and(|c| selected.first() == Some(c))
        }
    }
}
