use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// 用户引用集合。
///
/// likes / dislikes / matches / blockedUsers 都是集合语义：重复插入是空操作，
/// `insert` 返回本次是否真正改变了集合。匹配引擎依赖这个返回值判定
/// 谁是唯一的通知触发者。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSet(BTreeSet<UserId>);

impl UserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 幂等插入，返回 `true` 表示集合发生了变化。
    pub fn insert(&mut self, id: UserId) -> bool {
        self.0.insert(id)
    }

    /// 幂等移除，返回 `true` 表示集合发生了变化。
    pub fn remove(&mut self, id: &UserId) -> bool {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }
}

impl FromIterator<UserId> for UserSet {
    fn from_iter<T: IntoIterator<Item = UserId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UserSet {
    type Item = UserId;
    type IntoIter = std::collections::btree_set::IntoIter<UserId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
