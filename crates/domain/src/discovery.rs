//! 发现页候选过滤规则
//!
//! 纯读取侧规则，没有并发问题：同一套判定既用于内存存储的逐条过滤，
//! 也用于 PostgreSQL 查询条件的构造。

use std::collections::HashSet;

use crate::user::{AgeRange, Gender, User};
use crate::value_objects::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub actor: UserId,
    /// 自己 + 已喜欢 / 已不喜欢 / 已匹配 / 已屏蔽
    pub excluded: HashSet<UserId>,
    pub age_range: AgeRange,
    /// `None` 表示对任何性别感兴趣，跳过性别过滤
    pub genders: Option<Vec<Gender>>,
}

impl DiscoveryFilter {
    pub fn for_actor(actor: &User) -> Self {
        let excluded = std::iter::once(actor.id)
            .chain(actor.likes.iter().copied())
            .chain(actor.dislikes.iter().copied())
            .chain(actor.matches.iter().copied())
            .chain(actor.blocked_users.iter().copied())
            .collect();

        let genders = if actor.preferences.interested_in_everyone() {
            None
        } else {
            Some(
                actor
                    .preferences
                    .genders
                    .iter()
                    .filter_map(|interest| interest.as_gender())
                    .collect(),
            )
        };

        Self {
            actor: actor.id,
            excluded,
            age_range: actor.preferences.age_range,
            genders,
        }
    }

    pub fn admits(&self, candidate: &User) -> bool {
        if self.excluded.contains(&candidate.id) || !candidate.is_discoverable() {
            return false;
        }
        if candidate.has_blocked(&self.actor) {
            return false;
        }
        match candidate.age {
            Some(age) if self.age_range.contains(age) => {}
            _ => return false,
        }
        match (&self.genders, candidate.gender) {
            (None, _) => true,
            (Some(genders), Some(gender)) => genders.contains(&gender),
            (Some(_), None) => false,
        }
    }
}
