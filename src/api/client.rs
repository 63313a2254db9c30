use crate::analysis::dictionary::{Category, DictionarySource};
use crate::config::Config;
use crate::error::AppError;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::endpoints::USER_AGENT;
use super::models::DictionaryEntry;

const MAX_RETRIES: u32 = 3;

pub struct StatInkClient {
    agent: ureq::Agent,
    stage_url: String,
    weapon_url: String,
}

impl StatInkClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.dictionary_timeout_secs))
            .user_agent(USER_AGENT)
            .build();

        StatInkClient {
            agent,
            stage_url: config.stage_url.clone(),
            weapon_url: config.weapon_url.clone(),
        }
    }

    fn execute_request(&self, url: &str) -> Result<Vec<DictionaryEntry>, AppError> {
        let mut retry_count = 0;

        loop {
            debug!("GET {}", url);
            match self.agent.get(url).call() {
                Ok(resp) => {
                    return resp
                        .into_json::<Vec<DictionaryEntry>>()
                        .map_err(|e| AppError::JsonError(format!("{}: {}", url, e)));
                }
                Err(ureq::Error::Status(429, _)) => {
                    if retry_count >= MAX_RETRIES {
                        return Err(AppError::HttpError(format!("{}: rate limited", url)));
                    }
                    let wait_ms = 2000 * (retry_count + 1) as u64;
                    warn!("Rate limited by {}, waiting {}ms before retry", url, wait_ms);
                    thread::sleep(Duration::from_millis(wait_ms));
                    retry_count += 1;
                }
                Err(e) => {
                    return Err(AppError::HttpError(format!("{}: {}", url, e)));
                }
            }
        }
    }
}

impl DictionarySource for StatInkClient {
    fn fetch(&self, category: Category) -> Result<Vec<DictionaryEntry>, AppError> {
        let url = match category {
            Category::Stage => &self.stage_url,
            Category::Weapon => &self.weapon_url,
        };
        self.execute_request(url)
    }
}
