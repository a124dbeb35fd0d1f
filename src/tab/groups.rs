//! Tab groups derived from opener lineage.
//!
//! A group is the set of tabs in one partition sharing a `root_id`: the tab
//! the user opened directly, plus everything opened out of it, transitively.
//! Groups are never stored; they are recomputed from the strip on demand, so
//! they can never drift out of sync with tab membership.

use super::{Tab, TabId};
use std::collections::HashMap;

/// One derived group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup {
    /// Id of the tab that started the group. The root tab itself may already
    /// be closed; the id still names the group.
    pub root_id: TabId,
    /// Member tab ids in strip order.
    pub tab_ids: Vec<TabId>,
}

/// Derive the groups present in a strip.
///
/// Group order follows the first appearance of each root in the strip, and
/// members keep strip order. Pass `include_singletons = false` to keep only
/// groups with two or more tabs (the usual tab strip presentation collapses
/// singletons into plain tabs).
pub fn derive_groups(tabs: &[Tab], include_singletons: bool) -> Vec<TabGroup> {
    let mut order: Vec<TabId> = Vec::new();
    let mut members: HashMap<TabId, Vec<TabId>> = HashMap::new();
    for tab in tabs {
        members
            .entry(tab.root_id)
            .or_insert_with(|| {
                order.push(tab.root_id);
                Vec::new()
            })
            .push(tab.id);
    }

    order
        .into_iter()
        .map(|root_id| TabGroup {
            root_id,
            tab_ids: members.remove(&root_id).unwrap_or_default(),
        })
        .filter(|group| include_singletons || group.tab_ids.len() > 1)
        .collect()
}

/// The group containing `id`, or None when the tab is not in the strip.
pub fn group_for(tabs: &[Tab], id: TabId) -> Option<TabGroup> {
    let root_id = tabs.iter().find(|t| t.id == id)?.root_id;
    let tab_ids = tabs
        .iter()
        .filter(|t| t.root_id == root_id)
        .map(|t| t.id)
        .collect();
    Some(TabGroup { root_id, tab_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Build a strip where `roots[i]` names which root tab `i` belongs to.
    fn strip(roots: &[usize]) -> (Vec<Tab>, Vec<TabId>) {
        let ids: Vec<TabId> = roots.iter().map(|_| Uuid::new_v4()).collect();
        let tabs = roots
            .iter()
            .enumerate()
            .map(|(i, &root)| {
                let mut tab = Tab::new_stub(ids[i]);
                tab.root_id = ids[root];
                tab
            })
            .collect();
        (tabs, ids)
    }

    #[test]
    fn groups_follow_first_appearance_order() {
        // Strip: a, b, child-of-a, c, child-of-b
        let (tabs, ids) = strip(&[0, 1, 0, 3, 1]);
        let groups = derive_groups(&tabs, true);

        let roots: Vec<TabId> = groups.iter().map(|g| g.root_id).collect();
        assert_eq!(roots, vec![ids[0], ids[1], ids[3]]);
    }

    #[test]
    fn members_keep_strip_order() {
        let (tabs, ids) = strip(&[0, 1, 0, 0]);
        let groups = derive_groups(&tabs, true);
        assert_eq!(groups[0].tab_ids, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn singletons_can_be_filtered() {
        let (tabs, ids) = strip(&[0, 1, 0]);
        let groups = derive_groups(&tabs, false);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].root_id, ids[0]);

        let all = derive_groups(&tabs, true);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn group_survives_closing_the_root_tab() {
        let (mut tabs, ids) = strip(&[0, 0, 0]);
        tabs.remove(0);
        let groups = derive_groups(&tabs, true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].root_id, ids[0], "closed root still names the group");
        assert_eq!(groups[0].tab_ids, vec![ids[1], ids[2]]);
    }

    #[test]
    fn group_for_returns_the_whole_group() {
        let (tabs, ids) = strip(&[0, 1, 0]);
        let group = group_for(&tabs, ids[2]).unwrap();
        assert_eq!(group.root_id, ids[0]);
        assert_eq!(group.tab_ids, vec![ids[0], ids[2]]);
    }

    #[test]
    fn group_for_unknown_tab_is_none() {
        let (tabs, _ids) = strip(&[0, 1]);
        assert!(group_for(&tabs, Uuid::new_v4()).is_none());
    }

    #[test]
    fn empty_strip_has_no_groups() {
        assert!(derive_groups(&[], true).is_empty());
    }
}
