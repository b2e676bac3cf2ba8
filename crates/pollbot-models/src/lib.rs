/// Declares a fieldless `#[repr]` enum that travels over the wire as its
/// integer discriminant, with serde impls that reject unknown values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $($variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr($repr)]
        $vis enum $name {
            $($variant = $value),+
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&(*self as $repr), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <$repr as serde::Deserialize>::deserialize(deserializer)?;
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(serde::de::Error::custom(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        value
                    ))),
                }
            }
        }
    };
}

pub mod command;
pub mod component;
pub mod config;
pub mod embed;
pub mod interaction;
pub mod message;
pub mod permissions;
pub mod poll;
pub mod snapshot;
pub mod snowflake;
pub mod user;
