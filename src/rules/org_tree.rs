use std::collections::HashMap;

/// Whether making `new_parent` the parent of `org_id` closes a loop.
///
/// `parents` maps every organization id to its current parent.
pub fn would_create_cycle(org_id: i64, new_parent: i64, parents: &HashMap<i64, Option<i64>>) -> bool {
    if org_id == new_parent {
        return true;
    }
    let mut cursor = Some(new_parent);
    // a corrupt table could already hold a loop; never walk more than every node once
    let mut remaining = parents.len() + 1;
    while let Some(id) = cursor {
        if id == org_id {
            return true;
        }
        if remaining == 0 {
            return true;
        }
        remaining -= 1;
        cursor = parents.get(&id).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> HashMap<i64, Option<i64>> {
        // 1 -> 2 -> 3, 1 -> 4
        HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(1))])
    }

    #[test]
    fn self_parent_is_a_cycle() {
        assert!(would_create_cycle(2, 2, &tree()));
    }

    #[test]
    fn moving_under_own_descendant_is_a_cycle() {
        assert!(would_create_cycle(1, 3, &tree()));
        assert!(would_create_cycle(2, 3, &tree()));
    }

    #[test]
    fn moving_to_sibling_branch_is_fine() {
        assert!(!would_create_cycle(3, 4, &tree()));
        assert!(!would_create_cycle(4, 2, &tree()));
    }

    #[test]
    fn existing_loop_is_reported() {
        let parents = HashMap::from([(1, Some(2)), (2, Some(1)), (3, None)]);
        assert!(would_create_cycle(3, 1, &parents));
    }
}
