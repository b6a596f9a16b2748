// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs port shared by courseware hosts (CLI, sandbox, embedders).

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::prefs::PlayerPrefs;

/// Host-facing port for loading/saving player preferences.
pub trait PrefsPort {
    /// Load player preferences (returns None if missing or unreadable).
    fn load_prefs(&self) -> Option<PlayerPrefs>;
    /// Persist player preferences; the caller decides whether a failure matters.
    fn save_prefs(&self, prefs: &PlayerPrefs) -> Result<(), ConfigError>;
}

impl<S> PrefsPort for ConfigService<S>
where
    S: ConfigStore,
{
    fn load_prefs(&self) -> Option<PlayerPrefs> {
        self.load_player_prefs().ok()
    }

    fn save_prefs(&self, prefs: &PlayerPrefs) -> Result<(), ConfigError> {
        self.save_player_prefs(prefs)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::cell::RefCell;

    struct Flaky {
        saved: RefCell<Option<Vec<u8>>>,
        broken: bool,
    }

    impl ConfigStore for Flaky {
        fn load_raw(&self, _key: &str) -> Result<Vec<u8>, ConfigError> {
            if self.broken {
                return Err(ConfigError::Other("offline".into()));
            }
            self.saved.borrow().clone().ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, _key: &str, data: &[u8]) -> Result<(), ConfigError> {
            if self.broken {
                return Err(ConfigError::Other("offline".into()));
            }
            *self.saved.borrow_mut() = Some(data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn port_round_trips_and_reports_save_failures() {
        let ok = ConfigService::new(Flaky {
            saved: RefCell::new(None),
            broken: false,
        });
        let prefs = PlayerPrefs {
            persist_positions: false,
            ..PlayerPrefs::default()
        };
        ok.save_prefs(&prefs).unwrap();
        assert_eq!(ok.load_prefs(), Some(prefs.clone()));

        let broken = ConfigService::new(Flaky {
            saved: RefCell::new(None),
            broken: true,
        });
        assert!(matches!(
            broken.save_prefs(&prefs),
            Err(ConfigError::Other(_))
        ));
        assert_eq!(broken.load_prefs(), None);
    }
}
