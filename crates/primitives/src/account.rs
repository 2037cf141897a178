//! Account identifiers on both sides of the bridge.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

macro_rules! address_type {
    ($(#[$docs:meta])+ $name:ident) => {
        $(#[$docs])+
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(ParseError::EmptyAddress);
                }
                Ok(Self(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

address_type!(
    /// Address of the depositor on the source chain.
    EthAddress
);

address_type!(
    /// Address of the recipient account on the destination chain.
    MinaAddress
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr: EthAddress = " 0xabc ".parse().unwrap();
        assert_eq!(addr.as_str(), "0xabc");
        assert!("".parse::<MinaAddress>().is_err());
    }
}
