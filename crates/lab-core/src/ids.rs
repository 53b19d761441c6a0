//! Numeric identifiers for catalog and request entities.
//!
//! Each entity gets its own newtype so a field id can never be passed where an
//! instance id is expected. All ids serialize as plain integers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an [`ExamDefinition`](crate::entities::ExamDefinition).
    DefinitionId
);
define_id!(
    /// Identifier of a [`FieldSchema`](crate::entities::FieldSchema).
    FieldId
);
define_id!(
    /// Identifier of an [`ExamInstance`](crate::entities::ExamInstance).
    InstanceId
);
define_id!(
    /// Identifier of an exam request (owned by the surrounding application).
    RequestId
);
define_id!(
    /// Identifier of an exam category (owned by the surrounding application).
    CategoryId
);
