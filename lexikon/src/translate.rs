//! Optional translation of resolved definitions through an OpenAI-compatible
//! chat endpoint, with a persistent on-disk cache keyed by the source
//! definition text. Translation failures degrade per item and never abort
//! the batch; the caller appends a failure marker instead.

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::PathBuf;
use xxhash_rust::xxh3::xxh3_64;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o";

const PROMPT: &str = "Translate the following dictionary definition into \
Portuguese. Keep Latin grammatical terms such as ablative, accusative and \
genitive as-is, and do not change the semantic content. If the definition \
looks truncated, repair the sense:";

pub struct DefinitionTranslator {
    client: reqwest::Client,
    api_key: String,
    cache: DashMap<u64, String>, // hash of definition -> translation
    cache_dir: PathBuf,
    master_cache_file: PathBuf,
}

impl DefinitionTranslator {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        std::fs::create_dir_all(&cache_dir)?;

        let master_cache_file = cache_dir.join("master_cache.json");
        let cache: DashMap<u64, String> = if master_cache_file.exists() {
            let master_content = std::fs::read_to_string(&master_cache_file)?;
            serde_json::from_str(&master_content).unwrap_or_default()
        } else {
            DashMap::new()
        };

        let res = Self {
            client: reqwest::Client::new(),
            api_key,
            cache,
            cache_dir,
            master_cache_file,
        };
        res.consolidate_cache();
        Ok(res)
    }

    pub async fn translate(&self, definition: &str) -> Result<String> {
        let hash = xxh3_64(format!("{MODEL}::{definition}").as_bytes());

        // Check in-memory cache (includes master cache loaded on startup)
        if let Some(t) = self.cache.get(&hash) {
            return Ok(t.clone());
        }

        // Not in cache - make API call
        let cache_file = self.cache_dir.join(format!("{hash}.json"));

        let body = serde_json::json!({
            "model": MODEL,
            "messages": [{"role": "user", "content": format!("{PROMPT}\n\n{definition}")}],
            "temperature": 0.3,
            "max_tokens": 500,
        });
        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call translation service")?
            .error_for_status()
            .context("translation service rejected the request")?;
        let value: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse translation service response")?;
        let translated = value["choices"][0]["message"]["content"]
            .as_str()
            .context("translation service response has no content")?
            .trim()
            .to_string();
        self.cache.insert(hash, translated.clone());

        // Write individual cache file with just the translation
        std::fs::write(&cache_file, &translated)?;
        Ok(translated)
    }

    fn consolidate_cache(&self) {
        // Collect individual cache files to delete after consolidation
        let mut files_to_delete = Vec::new();

        // Scan the cache directory for individual cache files and merge them
        if let Ok(entries) = std::fs::read_dir(&self.cache_dir) {
            for entry in entries.flatten() {
                let path = entry.path();

                if path == self.master_cache_file
                    || path.extension().and_then(|s| s.to_str()) != Some("json")
                {
                    continue;
                }

                if let Some(filename) = path.file_stem().and_then(|s| s.to_str())
                    && let Ok(hash) = filename.parse::<u64>()
                    && let Ok(translation) = std::fs::read_to_string(&path)
                {
                    self.cache.entry(hash).or_insert(translation);
                    files_to_delete.push(path);
                }
            }
        }

        // Write the consolidated cache to the master file
        if let Ok(json) = serde_json::to_string_pretty(&self.cache)
            && std::fs::write(&self.master_cache_file, json).is_ok()
        {
            // Only delete individual files once the master cache is on disk
            for file in files_to_delete {
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

impl Drop for DefinitionTranslator {
    fn drop(&mut self) {
        self.consolidate_cache();
    }
}
