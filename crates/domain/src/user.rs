use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::user_set::UserSet;
use crate::value_objects::{Photo, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Banned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Non-binary")]
    NonBinary,
    Other,
}

/// 用户在偏好里勾选的性别，`Everyone` 表示不过滤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderInterest {
    Male,
    Female,
    #[serde(rename = "Non-binary")]
    NonBinary,
    Other,
    Everyone,
}

impl GenderInterest {
    pub fn as_gender(self) -> Option<Gender> {
        match self {
            GenderInterest::Male => Some(Gender::Male),
            GenderInterest::Female => Some(Gender::Female),
            GenderInterest::NonBinary => Some(Gender::NonBinary),
            GenderInterest::Other => Some(Gender::Other),
            GenderInterest::Everyone => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn new(min: u8, max: u8) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::invalid_argument(
                "age_range",
                "min cannot exceed max",
            ));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, age: u8) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 18, max: 99 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub genders: Vec<GenderInterest>,
    pub age_range: AgeRange,
}

impl Preferences {
    pub fn interested_in_everyone(&self) -> bool {
        self.genders.contains(&GenderInterest::Everyone)
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            genders: vec![GenderInterest::Everyone],
            age_range: AgeRange::default(),
        }
    }
}

/// 用户身上可被原子增删的关系集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationSet {
    Likes,
    Dislikes,
    Matches,
    BlockedUsers,
}

impl RelationSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationSet::Likes => "likes",
            RelationSet::Dislikes => "dislikes",
            RelationSet::Matches => "matches",
            RelationSet::BlockedUsers => "blocked_users",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub profile_image: Photo,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub preferences: Preferences,
    pub role: UserRole,
    pub status: UserStatus,
    pub likes: UserSet,
    pub dislikes: UserSet,
    pub matches: UserSet,
    pub blocked_users: UserSet,
    pub created_at: Timestamp,
}

impl User {
    /// 构造一个新注册的普通用户。注册本身由外部协作方完成，这里只负责
    /// 给目录存储一个结构完整的记录。
    pub fn new(id: UserId, display_name: impl Into<String>, now: Timestamp) -> Result<Self, DomainError> {
        let display_name = display_name.into().trim().to_owned();
        if display_name.is_empty() {
            return Err(DomainError::invalid_argument("display_name", "cannot be empty"));
        }
        Ok(Self {
            id,
            display_name,
            profile_image: Photo::default_avatar(),
            age: None,
            gender: None,
            preferences: Preferences::default(),
            role: UserRole::User,
            status: UserStatus::Active,
            likes: UserSet::new(),
            dislikes: UserSet::new(),
            matches: UserSet::new(),
            blocked_users: UserSet::new(),
            created_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 是否可以出现在别人的发现列表中。
    pub fn is_discoverable(&self) -> bool {
        self.is_active() && self.role == UserRole::User
    }

    pub fn has_blocked(&self, other: &UserId) -> bool {
        self.blocked_users.contains(other)
    }

    pub fn relation(&self, set: RelationSet) -> &UserSet {
        match set {
            RelationSet::Likes => &self.likes,
            RelationSet::Dislikes => &self.dislikes,
            RelationSet::Matches => &self.matches,
            RelationSet::BlockedUsers => &self.blocked_users,
        }
    }

    pub fn relation_mut(&mut self, set: RelationSet) -> &mut UserSet {
        match set {
            RelationSet::Likes => &mut self.likes,
            RelationSet::Dislikes => &mut self.dislikes,
            RelationSet::Matches => &mut self.matches,
            RelationSet::BlockedUsers => &mut self.blocked_users,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// 任一方屏蔽了另一方，这对用户之间的匹配和聊天都必须被拒绝。
pub fn blocked_between(a: &User, b: &User) -> bool {
    a.has_blocked(&b.id) || b.has_blocked(&a.id)
}

/// 对外展示用的最小用户信息（匹配结果、消息发送者、会话列表）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub profile_image: Photo,
}
