use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static POOL_DIR: Dir = include_dir!("src/pool");

/// One garbled phrase and its canonical solution.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Phrase {
    pub gibberish: String,
    pub answer: String,
    #[serde(default)]
    pub hint: Option<String>,
}

impl Phrase {
    /// Case-insensitive, whitespace-trimmed comparison against the answer.
    pub fn matches(&self, guess: &str) -> bool {
        normalize(guess) == normalize(&self.answer)
    }

    /// The explicit hint if the pool provides one, otherwise the first
    /// word of the answer.
    pub fn hint_text(&self) -> String {
        match &self.hint {
            Some(h) => h.clone(),
            None => format!(
                "starts with \"{}\"",
                self.answer.split_whitespace().next().unwrap_or_default()
            ),
        }
    }
}

pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Deserialize, Clone, Debug)]
pub struct PhrasePool {
    pub name: String,
    pub size: u32,
    pub phrases: Vec<Phrase>,
}

impl PhrasePool {
    /// Load an embedded pool by name. Unknown names are a startup error,
    /// reported to the caller rather than panicking mid-session.
    pub fn load(name: &str) -> Result<Self, Box<dyn Error>> {
        let file_name = format!("{name}.json");
        let file = POOL_DIR
            .get_file(&file_name)
            .ok_or_else(|| format!("unknown phrase pool '{name}'"))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| format!("phrase pool '{name}' is not valid utf-8"))?;
        let pool: PhrasePool = from_str(contents)?;
        Ok(pool)
    }

    pub fn available() -> Vec<String> {
        POOL_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }
}
