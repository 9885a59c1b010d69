//! Common types for domain models

use serde::{Deserialize, Serialize};

/// Monetary amount in integer minor units (e.g. poysha), stored as BIGINT.
/// Prices never go through floating point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build from whole currency units (e.g. 1000 taka -> 100000 minor units)
    pub fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl sqlx::Type<sqlx::MySql> for Money {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <i64 as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for Money {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let minor = <i64 as sqlx::Decode<sqlx::MySql>>::decode(value)?;
        Ok(Money(minor))
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <i64 as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.0, buf)
    }
}
