use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::Account;

/// An account with its nested children, ordered by code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountNode {
    #[serde(flatten)]
    pub account: Account,
    pub children: Vec<AccountNode>,
}

impl AccountNode {
    /// Number of accounts in this subtree, the root included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(AccountNode::size).sum::<usize>()
    }
}

/// Read-only hierarchy view over a flat account list.
///
/// Accounts whose parent is missing from the list are treated as roots.
pub struct AccountTree {
    accounts: BTreeMap<String, Account>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl AccountTree {
    pub fn build(accounts: Vec<Account>) -> Self {
        let accounts: BTreeMap<String, Account> =
            accounts.into_iter().map(|a| (a.code.clone(), a)).collect();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut roots = Vec::new();
        // BTreeMap iteration keeps every child list in code order.
        for (code, account) in &accounts {
            match account.parent_code.as_deref() {
                Some(parent) if accounts.contains_key(parent) => {
                    children.entry(parent.to_string()).or_default().push(code.clone());
                }
                _ => roots.push(code.clone()),
            }
        }

        Self {
            accounts,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    /// Direct children of `code`, ordered by code.
    pub fn children(&self, code: &str) -> Vec<&Account> {
        self.children
            .get(code)
            .map(|codes| codes.iter().filter_map(|c| self.accounts.get(c)).collect())
            .unwrap_or_default()
    }

    pub fn roots(&self) -> Vec<&Account> {
        self.roots.iter().filter_map(|c| self.accounts.get(c)).collect()
    }

    /// The subtree rooted at `code`, or `None` when the code is unknown.
    pub fn subtree(&self, code: &str) -> Option<AccountNode> {
        let account = self.accounts.get(code)?;
        Some(self.node(account))
    }

    pub fn forest(&self) -> Vec<AccountNode> {
        self.roots
            .iter()
            .filter_map(|code| self.subtree(code))
            .collect()
    }

    /// Path from the topmost known ancestor down to `code`, inclusive.
    pub fn ancestors(&self, code: &str) -> Vec<&Account> {
        let mut path = Vec::new();
        let mut current = self.accounts.get(code);
        while let Some(account) = current {
            path.push(account);
            current = account
                .parent_code
                .as_deref()
                .and_then(|p| self.accounts.get(p));
        }
        path.reverse();
        path
    }

    fn node(&self, account: &Account) -> AccountNode {
        let children = self
            .children(&account.code)
            .into_iter()
            .map(|child| self.node(child))
            .collect();
        AccountNode {
            account: account.clone(),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AccountTree {
        let codes = [
            ("110505", "Caja general"),
            ("1", "Activo"),
            ("2", "Pasivo"),
            ("11", "Disponible"),
            ("1105", "Caja"),
            ("1110", "Bancos"),
            ("11050501", "Caja menor"),
            ("2105", "Obligaciones"),
        ];
        AccountTree::build(
            codes
                .iter()
                .map(|(c, n)| Account::from_code(c, n).unwrap())
                .collect(),
        )
    }

    fn codes(accounts: &[&Account]) -> Vec<String> {
        accounts.iter().map(|a| a.code.clone()).collect()
    }

    #[test]
    fn test_roots_and_children() {
        let tree = sample();
        assert_eq!(tree.len(), 8);
        assert_eq!(codes(&tree.roots()), vec!["1", "2", "2105"]);
        assert_eq!(codes(&tree.children("11")), vec!["1105", "1110"]);
        assert!(tree.children("1110").is_empty());
        assert!(tree.children("999").is_empty());
    }

    #[test]
    fn test_orphans_become_roots() {
        let tree = sample();
        assert_eq!(codes(&tree.children("2")), Vec::<String>::new());
        let forest = tree.forest();
        let root_codes: Vec<&str> = forest.iter().map(|n| n.account.code.as_str()).collect();
        // 2105's parent 21 is absent, so it hangs at the top level
        assert_eq!(root_codes, vec!["1", "2", "2105"]);
    }

    #[test]
    fn test_subtree() {
        let tree = sample();
        let node = tree.subtree("11").unwrap();
        assert_eq!(node.size(), 5);
        assert_eq!(node.children[0].account.code, "1105");
        assert_eq!(node.children[0].children[0].children[0].account.code, "11050501");
        assert!(tree.subtree("404").is_none());
    }

    #[test]
    fn test_forest_covers_every_account() {
        let tree = sample();
        let total: usize = tree.forest().iter().map(AccountNode::size).sum();
        assert_eq!(total, tree.len());
    }

    #[test]
    fn test_ancestors() {
        let tree = sample();
        assert_eq!(
            codes(&tree.ancestors("11050501")),
            vec!["1", "11", "1105", "110505", "11050501"]
        );
        assert!(tree.ancestors("nope").is_empty());
    }

    #[test]
    fn test_empty_tree() {
        let tree = AccountTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.forest().is_empty());
    }
}
