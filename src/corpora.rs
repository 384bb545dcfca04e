//! Default locations of corpus dumps: where to fetch them, where to keep them.

use std::path::PathBuf;

/// Default directory for downloaded corpora.
pub const DEFAULT_CORPORA_DIR: &str = "local/data/corpora";

/// Default Wikimedia dump mirror.
pub const DEFAULT_MIRROR: &str = "https://dumps.wikimedia.org";

/// Language used when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Supplies default URLs and resource names for known corpora.
///
/// The workflow builders only ask for these when the caller omits a value.
pub trait CorpusProvider {
    /// Language used when none is given.
    fn default_language(&self) -> &str;

    /// Download URL of the Wikipedia dump for `language`.
    fn wikipedia_url(&self, language: &str) -> String;

    /// Resource name (file path) of the Wikipedia dump for `language`.
    fn wikipedia_dump(&self, language: &str) -> String;

    /// Download URL of the Wikidata dump.
    fn wikidata_url(&self) -> String;

    /// Resource name (file path) of the Wikidata dump.
    fn wikidata_dump(&self) -> String;
}

/// Location settings for [`Corpora`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorporaConfig {
    /// Root directory of local corpus files.
    pub corpora_dir: PathBuf,
    /// Base URL of the dump mirror, without trailing slash.
    pub mirror: String,
    /// Language used when none is given.
    pub language: String,
}

impl Default for CorporaConfig {
    fn default() -> Self {
        Self {
            corpora_dir: PathBuf::from(DEFAULT_CORPORA_DIR),
            mirror: DEFAULT_MIRROR.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// [`CorpusProvider`] for the `latest` Wikimedia dumps.
#[derive(Debug, Clone, Default)]
pub struct Corpora {
    config: CorporaConfig,
}

impl Corpora {
    #[must_use]
    pub fn new(mut config: CorporaConfig) -> Self {
        let trimmed = config.mirror.trim_end_matches('/').len();
        config.mirror.truncate(trimmed);
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CorporaConfig {
        &self.config
    }

    fn file_in(&self, subdir: &str, file: &str) -> String {
        self.config
            .corpora_dir
            .join(subdir)
            .join(file)
            .to_string_lossy()
            .into_owned()
    }
}

fn wikipedia_dump_file(language: &str) -> String {
    format!("{language}wiki-latest-pages-articles.xml.bz2")
}

const WIKIDATA_DUMP_FILE: &str = "latest-all.json.bz2";

impl CorpusProvider for Corpora {
    fn default_language(&self) -> &str {
        &self.config.language
    }

    fn wikipedia_url(&self, language: &str) -> String {
        format!(
            "{}/{language}wiki/latest/{}",
            self.config.mirror,
            wikipedia_dump_file(language)
        )
    }

    fn wikipedia_dump(&self, language: &str) -> String {
        self.file_in("wikipedia", &wikipedia_dump_file(language))
    }

    fn wikidata_url(&self) -> String {
        format!(
            "{}/wikidatawiki/entities/{WIKIDATA_DUMP_FILE}",
            self.config.mirror
        )
    }

    fn wikidata_dump(&self) -> String {
        self.file_in("wikidata", WIKIDATA_DUMP_FILE)
    }
}
