//! UUID-backed identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($($entity:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Type-safe identifier for a [`" $entity "`](crate::model::" $entity ")."]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
                #[serde(transparent)]
                pub struct [<$entity Id>](pub Uuid);

                impl [<$entity Id>] {
                    /// Generates a random (v4) id.
                    pub fn new() -> Self {
                        Self(Uuid::new_v4())
                    }
                }

                impl Default for [<$entity Id>] {
                    fn default() -> Self {
                        Self::new()
                    }
                }

                impl From<Uuid> for [<$entity Id>] {
                    fn from(id: Uuid) -> Self {
                        Self(id)
                    }
                }

                impl fmt::Display for [<$entity Id>] {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        fmt::Display::fmt(&self.0, f)
                    }
                }

                impl FromStr for [<$entity Id>] {
                    type Err = uuid::Error;

                    fn from_str(s: &str) -> Result<Self, Self::Err> {
                        Uuid::parse_str(s).map(Self)
                    }
                }
            )*
        }
    };
}

define_id!(User, Order, OrderItem, Menu, MenuItem);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_and_serialize_as_bare_uuid() {
        let id = OrderId::new();
        assert_eq!(id.to_string().parse::<OrderId>().unwrap(), id);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            format!("\"{}\"", id.0)
        );
        assert!("not-a-uuid".parse::<MenuId>().is_err());
    }
}
