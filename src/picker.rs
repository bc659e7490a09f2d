//! Hierarchical question picker.
//!
//! The picker is either browsing (empty search text) or searching. While
//! browsing it shows breadcrumbs, the child collections of the current
//! location, and the questions stored there. While searching it shows only the
//! search hits. The location survives a search so browsing resumes in place.
//!
//! Data loading belongs to the host: it asks [`HierarchicalPicker::query`] what
//! to fetch and hands the outcome back to [`HierarchicalPicker::view`].

use crate::collections::{CollectionTree, Identifier, Node};
use crate::search::{Loadable, SearchQuery, SearchResult};
use tracing::{debug, warn};

pub const EMPTY_MESSAGE: &str = "No questions found";

/// Switches for the two collection rules that are not derivable from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerPolicy {
    /// The `personal` collection lists no questions until a search term is typed.
    pub personal_requires_search: bool,
    /// Children identified as the root never appear in a child list.
    pub hide_nested_root: bool,
}

impl Default for PickerPolicy {
    fn default() -> Self {
        PickerPolicy {
            personal_requires_search: true,
            hide_nested_root: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerState {
    current_location: Identifier,
    search_text: String,
}

impl PickerState {
    pub fn current_location(&self) -> &Identifier {
        &self.current_location
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn is_searching(&self) -> bool {
        !self.search_text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Opens the collection.
    Expand,
    /// Hands the id to the selection callback.
    Select,
    /// Shown but inert.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub id: Identifier,
    pub name: String,
    pub icon: String,
    pub affordance: Affordance,
}

impl PickerItem {
    fn from_node(node: &Node) -> Self {
        PickerItem {
            id: node.id.clone(),
            name: node.name.clone(),
            icon: node.icon.clone(),
            affordance: if node.has_children() {
                Affordance::Expand
            } else {
                Affordance::Select
            },
        }
    }

    fn from_result(result: &SearchResult) -> Self {
        PickerItem {
            id: result.id.clone(),
            name: result.name.clone(),
            icon: result.icon.clone(),
            affordance: if result.selectable {
                Affordance::Select
            } else {
                Affordance::Disabled
            },
        }
    }
}

/// A breadcrumb; the last one has no target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub target: Option<Identifier>,
}

/// What sits below the child collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListArea {
    /// Nothing at all, not even an empty state.
    Suppressed,
    Loading,
    Failed(String),
    /// The query finished with no hits.
    Empty,
    Items(Vec<PickerItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerView {
    /// `None` while searching.
    pub breadcrumbs: Option<Vec<Crumb>>,
    pub children: Vec<PickerItem>,
    pub list: ListArea,
}

impl PickerView {
    /// Every activatable row, child collections first.
    pub fn rows(&self) -> Vec<&PickerItem> {
        let listed: &[PickerItem] = match &self.list {
            ListArea::Items(items) => items.as_slice(),
            _ => &[],
        };
        self.children.iter().chain(listed).collect()
    }
}

pub struct HierarchicalPicker<'t> {
    tree: &'t CollectionTree,
    state: PickerState,
    policy: PickerPolicy,
    on_select: Box<dyn FnMut(Identifier) + 't>,
}

impl<'t> HierarchicalPicker<'t> {
    /// Open a picker at `initial_location`, or at the root when it is absent
    /// or unknown to `tree`.
    pub fn new(
        tree: &'t CollectionTree,
        initial_location: Option<Identifier>,
        policy: PickerPolicy,
        on_select: impl FnMut(Identifier) + 't,
    ) -> Self {
        let current_location = match initial_location {
            Some(id) if tree.contains(&id) => id,
            Some(id) => {
                warn!(location = %id, "unknown initial location, starting at root");
                Identifier::root()
            }
            None => Identifier::root(),
        };
        HierarchicalPicker {
            tree,
            state: PickerState {
                current_location,
                search_text: String::new(),
            },
            policy,
            on_select: Box::new(on_select),
        }
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn current_node(&self) -> &Node {
        self.tree
            .get(&self.state.current_location)
            .unwrap_or_else(|| self.tree.root())
    }

    /// Replace the search text. The location is left alone.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.state.search_text {
            debug!(%text, "search text changed");
            self.state.search_text = text;
        }
    }

    /// Open a non-root collection that has children. Other targets are ignored.
    pub fn navigate_into(&mut self, id: &Identifier) -> bool {
        match self.tree.get(id) {
            Some(node) if !node.id.is_root() && node.has_children() => self.move_to(id),
            _ => false,
        }
    }

    /// Jump to any known collection, typically a breadcrumb.
    pub fn navigate_to(&mut self, id: &Identifier) -> bool {
        if self.tree.contains(id) {
            self.move_to(id)
        } else {
            false
        }
    }

    /// Go to the parent of the current collection. No-op at the root.
    pub fn navigate_up(&mut self) -> bool {
        match self.current_node().parent_path.last().cloned() {
            Some(parent) => self.navigate_to(&parent),
            None => false,
        }
    }

    pub fn select_leaf(&mut self, id: Identifier) {
        debug!(%id, "question selected");
        (self.on_select)(id);
    }

    /// Act on a row the way a click would.
    pub fn activate(&mut self, item: &PickerItem) {
        match item.affordance {
            Affordance::Expand => {
                self.navigate_into(&item.id);
            }
            Affordance::Select => self.select_leaf(item.id.clone()),
            Affordance::Disabled => {}
        }
    }

    /// The query whose results belong in the list area.
    pub fn query(&self) -> SearchQuery {
        if self.state.is_searching() {
            SearchQuery::ByText(self.state.search_text.clone())
        } else {
            SearchQuery::ByCollection(self.state.current_location.clone())
        }
    }

    pub fn view(&self, results: &Loadable<Vec<SearchResult>>) -> PickerView {
        if self.state.is_searching() {
            return PickerView {
                breadcrumbs: None,
                children: Vec::new(),
                list: list_area(results),
            };
        }

        let node = self.current_node();
        let children = self
            .tree
            .children_of(&node.id)
            .filter(|child| !(self.policy.hide_nested_root && child.id.is_root()))
            .map(PickerItem::from_node)
            .collect();

        let list = if self.policy.personal_requires_search && node.id.is_personal() {
            ListArea::Suppressed
        } else {
            list_area(results)
        };

        PickerView {
            breadcrumbs: Some(self.breadcrumbs(node)),
            children,
            list,
        }
    }

    fn breadcrumbs(&self, node: &Node) -> Vec<Crumb> {
        let mut crumbs: Vec<Crumb> = node
            .parent_path
            .iter()
            .filter_map(|id| self.tree.get(id))
            .map(|ancestor| Crumb {
                name: ancestor.name.clone(),
                target: Some(ancestor.id.clone()),
            })
            .collect();
        crumbs.push(Crumb {
            name: node.name.clone(),
            target: None,
        });
        crumbs
    }

    fn move_to(&mut self, id: &Identifier) -> bool {
        if &self.state.current_location == id {
            return false;
        }
        debug!(from = %self.state.current_location, to = %id, "location changed");
        self.state.current_location = id.clone();
        true
    }
}

fn list_area(results: &Loadable<Vec<SearchResult>>) -> ListArea {
    match results {
        Loadable::Loading => ListArea::Loading,
        Loadable::Failed(message) => ListArea::Failed(message.clone()),
        Loadable::Ready(hits) if hits.is_empty() => ListArea::Empty,
        Loadable::Ready(hits) => {
            ListArea::Items(hits.iter().map(PickerItem::from_result).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::tests::record;
    use crate::collections::CollectionRecord;
    use crate::search::tests::question;
    use crate::search::{QuestionIndex, SearchSupplier};
    use std::cell::RefCell;

    /// root -> Sales(1) -> EMEA(3); root -> Q1 Report(2); Bob's collection under personal.
    fn tree() -> CollectionTree {
        let bob = CollectionRecord {
            personal_owner_id: Some(Identifier::from(200)),
            ..record(20, "Bob's Personal Collection", "/")
        };
        CollectionTree::from_records(
            &[
                record(1, "Sales", "/"),
                record(2, "Q1 Report", "/"),
                record(3, "EMEA", "/1/"),
                bob,
            ],
            None,
        )
    }

    fn index() -> QuestionIndex {
        QuestionIndex::new(vec![
            question(100, "Budget overview", Some(20)),
            question(101, "Pipeline", Some(1)),
            question(102, "Regional budget", Some(3)),
        ])
    }

    fn run(picker: &HierarchicalPicker<'_>, index: &QuestionIndex) -> Loadable<Vec<SearchResult>> {
        match index.search(&picker.query().to_wire()) {
            Ok(hits) => Loadable::Ready(hits),
            Err(err) => Loadable::Failed(err.to_string()),
        }
    }

    fn at(tree: &CollectionTree, location: i64) -> HierarchicalPicker<'_> {
        let location = Some(Identifier::from(location));
        HierarchicalPicker::new(tree, location, PickerPolicy::default(), |_| {})
    }

    fn child<'v>(view: &'v PickerView, name: &str) -> &'v PickerItem {
        view.children
            .iter()
            .find(|item| item.name == name)
            .unwrap_or_else(|| panic!("no child named {name}"))
    }

    #[test]
    fn root_scenario_marks_expandable_and_selectable_children() {
        let tree = tree();
        let selected = RefCell::new(Vec::new());
        let mut picker = HierarchicalPicker::new(
            &tree,
            Some(Identifier::root()),
            PickerPolicy::default(),
            |id| selected.borrow_mut().push(id),
        );
        let view = picker.view(&Loadable::Ready(Vec::new()));

        assert_eq!(child(&view, "Sales").affordance, Affordance::Expand);
        let report = child(&view, "Q1 Report").clone();
        assert_eq!(report.affordance, Affordance::Select);

        picker.activate(&report);
        drop(picker);
        assert_eq!(selected.into_inner(), vec![Identifier::from(2)]);
    }

    #[test]
    fn nested_root_child_follows_policy() {
        let nested = CollectionRecord {
            id: Some(Identifier::root()),
            ..record(0, "Nested root", "/1/")
        };
        let tree = CollectionTree::from_records(
            &[record(1, "Sales", "/"), nested, record(3, "EMEA", "/1/")],
            None,
        );
        let names = |policy: PickerPolicy| -> Vec<String> {
            let picker = HierarchicalPicker::new(&tree, Some(Identifier::from(1)), policy, |_| {});
            picker
                .view(&Loadable::Ready(Vec::new()))
                .children
                .into_iter()
                .map(|item| item.name)
                .collect()
        };

        assert_eq!(names(PickerPolicy::default()), ["EMEA"]);
        let shown = PickerPolicy {
            hide_nested_root: false,
            ..PickerPolicy::default()
        };
        assert_eq!(names(shown), ["Nested root", "EMEA"]);
    }

    #[test]
    fn expanding_keeps_search_text() {
        let tree = tree();
        let mut picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        picker.set_search_text("pipe");
        assert!(picker.navigate_into(&Identifier::from(1)));
        assert_eq!(picker.state().current_location(), &Identifier::from(1));
        assert_eq!(picker.state().search_text(), "pipe");
    }

    #[test]
    fn navigate_into_rejects_leaves_root_and_unknown() {
        let tree = tree();
        let mut picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        assert!(!picker.navigate_into(&Identifier::from(2)));
        assert!(!picker.navigate_into(&Identifier::root()));
        assert!(!picker.navigate_into(&Identifier::from(999)));
        assert_eq!(picker.state().current_location(), &Identifier::root());
    }

    #[test]
    fn clearing_search_twice_is_idempotent() {
        let tree = tree();
        let mut picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        picker.set_search_text("x");
        picker.set_search_text("");
        let after_first = picker.state().clone();
        picker.set_search_text("");
        assert_eq!(picker.state(), &after_first);
    }

    enum Step {
        Search(&'static str),
        Into(i64),
        Up,
    }

    #[test]
    fn query_always_has_exactly_one_scope() {
        let tree = tree();
        let mut picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        let steps = [
            Step::Search("bud"),
            Step::Into(1),
            Step::Search(""),
            Step::Up,
            Step::Search("q"),
        ];
        for step in steps {
            match step {
                Step::Search(text) => picker.set_search_text(text),
                Step::Into(id) => {
                    picker.navigate_into(&Identifier::from(id));
                }
                Step::Up => {
                    picker.navigate_up();
                }
            }
            let wire = picker.query().to_wire();
            assert!(wire.q.is_some() != wire.collection.is_some(), "{wire:?}");
        }
    }

    #[test]
    fn browsing_lists_collection_questions_and_breadcrumbs() {
        let tree = tree();
        let index = index();
        let picker = at(&tree, 3);
        let view = picker.view(&run(&picker, &index));

        let crumbs = view.breadcrumbs.expect("breadcrumbs while browsing");
        let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Our analytics", "Sales", "EMEA"]);
        assert_eq!(crumbs[1].target, Some(Identifier::from(1)));
        assert_eq!(crumbs[2].target, None);

        match view.list {
            ListArea::Items(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].name, "Regional budget");
            }
            other => panic!("unexpected list {other:?}"),
        }
    }

    #[test]
    fn personal_collection_requires_search() {
        let tree = tree();
        let index = index();
        let mut picker = HierarchicalPicker::new(
            &tree,
            Some(Identifier::personal()),
            PickerPolicy::default(),
            |_| {},
        );
        let view = picker.view(&run(&picker, &index));
        assert_eq!(view.list, ListArea::Suppressed);
        assert_eq!(view.children.len(), 1);

        picker.set_search_text("budget");
        assert_eq!(picker.query(), SearchQuery::ByText("budget".into()));
        let view = picker.view(&run(&picker, &index));
        assert!(view.breadcrumbs.is_none());
        assert!(view.children.is_empty());
        let ListArea::Items(items) = view.list else {
            panic!("expected search hits");
        };
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Budget overview", "Regional budget"]);
    }

    #[test]
    fn personal_rule_can_be_disabled() {
        let tree = tree();
        let policy = PickerPolicy {
            personal_requires_search: false,
            ..PickerPolicy::default()
        };
        let picker = HierarchicalPicker::new(&tree, Some(Identifier::personal()), policy, |_| {});
        assert_eq!(picker.view(&Loadable::Ready(Vec::new())).list, ListArea::Empty);
    }

    #[test]
    fn zero_hits_render_empty_state() {
        let tree = tree();
        let index = index();
        let mut picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        picker.set_search_text("zzz");
        assert_eq!(picker.view(&run(&picker, &index)).list, ListArea::Empty);
    }

    #[test]
    fn loading_and_failure_pass_through() {
        let tree = tree();
        let picker = HierarchicalPicker::new(&tree, None, PickerPolicy::default(), |_| {});
        assert_eq!(picker.view(&Loadable::Loading).list, ListArea::Loading);
        assert_eq!(
            picker.view(&Loadable::Failed("offline".into())).list,
            ListArea::Failed("offline".into())
        );
    }

    #[test]
    fn unknown_initial_location_falls_back_to_root() {
        let tree = tree();
        let picker = at(&tree, 404);
        assert_eq!(picker.state().current_location(), &Identifier::root());
    }

    #[test]
    fn navigate_up_follows_parent_path() {
        let tree = tree();
        let mut picker = at(&tree, 3);
        assert!(picker.navigate_up());
        assert_eq!(picker.state().current_location(), &Identifier::from(1));
        assert!(picker.navigate_up());
        assert!(!picker.navigate_up());
        assert_eq!(picker.state().current_location(), &Identifier::root());
    }
}
