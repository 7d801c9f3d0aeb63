//! Deployment environments

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Deployment environment a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Staging stack
    #[default]
    Staging,
    /// Production stack
    Prod,
}

impl Environment {
    /// All environments, in CLI help order
    pub const ALL: [Self; 2] = [Self::Staging, Self::Prod];

    /// Lower-case name as accepted on the command line
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staging" => Ok(Self::Staging),
            "prod" => Ok(Self::Prod),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_environments() {
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
    }

    #[test]
    fn parse_is_case_sensitive() {
        let err = "Prod".parse::<Environment>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnvironment(name) if name == "Prod"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for env in Environment::ALL {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
    }
}
