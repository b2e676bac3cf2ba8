use bitflags::bitflags;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Member permission bits as reported on interactions. Only the bits the
    /// bot inspects or declares are named; unknown bits are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u64 {
        const ADMINISTRATOR   = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD    = 1 << 5;
        const VIEW_CHANNEL    = 1 << 10;
        const SEND_MESSAGES   = 1 << 11;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS     = 1 << 14;

        const _ = !0;
    }
}

impl Permissions {
    pub fn is_admin(self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.bits())
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let bits = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text
                .parse::<u64>()
                .map_err(|_| de::Error::custom(format!("invalid permission bits: {text:?}")))?,
            Raw::Number(bits) => bits,
        };
        Ok(Self::from_bits_retain(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_bits_and_detects_admin() {
        let perms: Permissions = serde_json::from_str(r#""8""#).unwrap();
        assert!(perms.is_admin());
        let perms: Permissions = serde_json::from_str(r#""3072""#).unwrap();
        assert!(!perms.is_admin());
        assert!(perms.contains(Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn keeps_unknown_bits() {
        let perms: Permissions = serde_json::from_str("1099511627775").unwrap();
        assert_eq!(serde_json::to_string(&perms).unwrap(), r#""1099511627775""#);
    }
}
