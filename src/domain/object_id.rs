//! Graphene 对象ID：`space.type.instance`
//!
//! - `1.2.x`  账户
//! - `1.3.x`  资产
//! - `1.11.x` 操作历史（分页游标）

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AdapterError;

pub const PROTOCOL_SPACE: u8 = 1;
pub const ACCOUNT_TYPE: u8 = 2;
pub const ASSET_TYPE: u8 = 3;
pub const OPERATION_HISTORY_TYPE: u8 = 11;

/// 历史分页的"从头开始"哨兵值
pub const HISTORY_SENTINEL: ObjectId = ObjectId::new(PROTOCOL_SPACE, OPERATION_HISTORY_TYPE, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub space: u8,
    pub type_id: u8,
    pub instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self {
            space,
            type_id,
            instance,
        }
    }

    pub const fn account(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, ACCOUNT_TYPE, instance)
    }

    pub const fn asset(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, ASSET_TYPE, instance)
    }

    pub const fn operation_history(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, OPERATION_HISTORY_TYPE, instance)
    }

    /// instance 减一；到达 0（哨兵）时返回 None
    pub fn previous(&self) -> Option<Self> {
        match self.instance.checked_sub(1) {
            Some(0) | None => None,
            Some(instance) => Some(Self { instance, ..*self }),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AdapterError::DecodeError(format!("invalid object id: {:?}", s));

        let mut parts = s.split('.');
        let (Some(space), Some(type_id), Some(instance), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            space: space.parse().map_err(|_| invalid())?,
            type_id: type_id.parse().map_err(|_| invalid())?,
            instance: instance.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
