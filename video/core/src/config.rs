use cosmo_rcp::tmem::TMEM_TEXTURE_HALF;
use crate::error::ConfigError;

/// How finished display lists are handed to the coprocessor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Rotate through the lists; the CPU builds frame N+1 while the
    /// coprocessor reads frame N.
    #[default]
    RoundRobin,
    /// Wait for each list to retire before building the next one.
    Synchronous,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VideoConfig {
    pub game_width: u16,
    pub game_height: u16,
    pub text_width: u16,
    pub text_height: u16,
    pub display_width: u16,
    pub display_height: u16,
    /// Bytes of texture memory one band may occupy.
    pub tmem_limit: usize,
    pub display_lists: usize,
    pub submit_policy: SubmitPolicy,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            game_width: 320,
            game_height: 200,
            text_width: 640,
            text_height: 400,
            display_width: 320,
            display_height: 240,
            tmem_limit: 2048,
            display_lists: 2,
            submit_policy: SubmitPolicy::RoundRobin,
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game_width == 0 || self.game_height == 0 {
            return Err(ConfigError::ZeroSize("game surface"))
        }
        if self.text_width == 0 || self.text_height == 0 {
            return Err(ConfigError::ZeroSize("text surface"))
        }
        if self.display_width == 0 || self.display_height == 0 {
            return Err(ConfigError::ZeroSize("display"))
        }
        if self.tmem_limit == 0 {
            return Err(ConfigError::ZeroSize("tile memory limit"))
        }
        if self.tmem_limit > TMEM_TEXTURE_HALF {
            return Err(ConfigError::TmemLimitTooLarge(self.tmem_limit))
        }
        if self.display_lists == 0 {
            return Err(ConfigError::NoDisplayLists)
        }
        if self.submit_policy == SubmitPolicy::RoundRobin && self.display_lists < 2 {
            return Err(ConfigError::RoundRobinNeedsTwoLists)
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_console_geometry() {
        let c = VideoConfig::default();
        assert_eq!(c.validate(), Ok(()));
        assert_eq!((c.game_width, c.game_height), (320, 200));
        assert_eq!((c.display_width, c.display_height), (320, 240));
        assert_eq!(c.tmem_limit, 2048);
    }

    #[test]
    fn validation() {
        let c = VideoConfig { display_lists: 1, ..VideoConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::RoundRobinNeedsTwoLists));

        let c = VideoConfig { display_lists: 1, submit_policy: SubmitPolicy::Synchronous, ..VideoConfig::default() };
        assert_eq!(c.validate(), Ok(()));

        let c = VideoConfig { display_lists: 0, submit_policy: SubmitPolicy::Synchronous, ..VideoConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::NoDisplayLists));

        let c = VideoConfig { tmem_limit: 4096, ..VideoConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::TmemLimitTooLarge(4096)));

        let c = VideoConfig { text_height: 0, ..VideoConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::ZeroSize("text surface")));
    }
}
